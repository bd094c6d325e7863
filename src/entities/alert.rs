use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub barangay_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// LOW, MEDIUM or HIGH
    pub risk_level: String,
    /// ACTIVE, RESOLVED or DISMISSED
    pub status: String,
    /// Snapshot of the inputs that produced the alert, for audit only.
    pub metadata: Json,
    pub triggered_at: DateTime,
    pub resolved_at: Option<DateTime>,
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
