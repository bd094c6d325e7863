use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "barangays")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub municipality: String,
    pub province: String,
    pub population: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dengue_case::Entity")]
    DengueCase,
    #[sea_orm(has_many = "super::environmental_report::Entity")]
    EnvironmentalReport,
    #[sea_orm(has_many = "super::alert::Entity")]
    Alert,
}

impl Related<super::dengue_case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DengueCase.def()
    }
}

impl Related<super::environmental_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnvironmentalReport.def()
    }
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alert.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
