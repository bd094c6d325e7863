use sea_orm_migration::prelude::*;

mod m20260810_000001_create_surveillance_tables;
mod m20260810_000002_create_alerts_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260810_000001_create_surveillance_tables::Migration),
            Box::new(m20260810_000002_create_alerts_table::Migration),
        ]
    }
}
