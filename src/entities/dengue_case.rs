use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "dengue_cases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub barangay_id: Uuid,
    pub date_reported: DateTime,
    /// SUSPECTED or CONFIRMED
    pub status: String,
    pub source: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::barangay::Entity",
        from = "Column::BarangayId",
        to = "super::barangay::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Barangay,
}

impl Related<super::barangay::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Barangay.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
