use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "environmental_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub barangay_id: Uuid,
    pub date_reported: DateTime,
    pub stagnant_water: bool,
    pub poor_waste_disposal: bool,
    pub clogged_drainage: bool,
    pub housing_congestion: bool,
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
