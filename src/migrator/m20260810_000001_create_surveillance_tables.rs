use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Barangays::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Barangays::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Barangays::Name).string().not_null())
                    .col(ColumnDef::new(Barangays::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Barangays::Municipality).string().not_null())
                    .col(ColumnDef::new(Barangays::Province).string().not_null())
                    .col(ColumnDef::new(Barangays::Population).integer())
                    .col(ColumnDef::new(Barangays::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Barangays::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DengueCases::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DengueCases::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DengueCases::BarangayId).uuid().not_null())
                    .col(ColumnDef::new(DengueCases::DateReported).date_time().not_null())
                    .col(ColumnDef::new(DengueCases::Status).string().not_null())
                    .col(ColumnDef::new(DengueCases::Source).string().not_null())
                    .col(ColumnDef::new(DengueCases::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(DengueCases::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dengue_cases_barangay")
                            .from(DengueCases::Table, DengueCases::BarangayId)
                            .to(Barangays::Table, Barangays::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Every early-warning count query is scoped by barangay + date range.
        manager
            .create_index(
                Index::create()
                    .name("idx_dengue_cases_barangay_date")
                    .table(DengueCases::Table)
                    .col(DengueCases::BarangayId)
                    .col(DengueCases::DateReported)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EnvironmentalReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnvironmentalReports::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EnvironmentalReports::BarangayId).uuid().not_null())
                    .col(
                        ColumnDef::new(EnvironmentalReports::DateReported)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReports::StagnantWater)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReports::PoorWasteDisposal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReports::CloggedDrainage)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReports::HousingCongestion)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EnvironmentalReports::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(EnvironmentalReports::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_environmental_reports_barangay")
                            .from(EnvironmentalReports::Table, EnvironmentalReports::BarangayId)
                            .to(Barangays::Table, Barangays::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_environmental_reports_barangay_date")
                    .table(EnvironmentalReports::Table)
                    .col(EnvironmentalReports::BarangayId)
                    .col(EnvironmentalReports::DateReported)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EnvironmentalReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DengueCases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Barangays::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Barangays {
    Table,
    Id,
    Name,
    Code,
    Municipality,
    Province,
    Population,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DengueCases {
    Table,
    Id,
    BarangayId,
    DateReported,
    Status,
    Source,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EnvironmentalReports {
    Table,
    Id,
    BarangayId,
    DateReported,
    StagnantWater,
    PoorWasteDisposal,
    CloggedDrainage,
    HousingCongestion,
    CreatedAt,
    UpdatedAt,
}
