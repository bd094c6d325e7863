use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Alerts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Alerts::BarangayId).uuid().not_null())
                    .col(ColumnDef::new(Alerts::Title).string().not_null())
                    .col(ColumnDef::new(Alerts::Message).text().not_null())
                    .col(ColumnDef::new(Alerts::RiskLevel).string().not_null())
                    .col(ColumnDef::new(Alerts::Status).string().not_null())
                    .col(ColumnDef::new(Alerts::Metadata).json().not_null())
                    .col(ColumnDef::new(Alerts::TriggeredAt).date_time().not_null())
                    .col(ColumnDef::new(Alerts::ResolvedAt).date_time())
                    .col(ColumnDef::new(Alerts::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_barangay")
                            .from(Alerts::Table, Alerts::BarangayId)
                            .to(Barangays::Table, Barangays::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The lifecycle check looks up alerts by barangay + status + level.
        // No uniqueness constraint: concurrent checks may briefly produce
        // duplicates, which the system tolerates.
        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_barangay_status_level")
                    .table(Alerts::Table)
                    .col(Alerts::BarangayId)
                    .col(Alerts::Status)
                    .col(Alerts::RiskLevel)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    BarangayId,
    Title,
    Message,
    RiskLevel,
    Status,
    Metadata,
    TriggeredAt,
    ResolvedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Barangays {
    Table,
    Id,
}
