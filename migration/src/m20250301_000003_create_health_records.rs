use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HealthRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HealthRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HealthRecords::UserId).string().not_null())
                    .col(ColumnDef::new(HealthRecords::Systolic).integer().not_null())
                    .col(ColumnDef::new(HealthRecords::Diastolic).integer().not_null())
                    .col(ColumnDef::new(HealthRecords::HeartRate).integer().null())
                    .col(ColumnDef::new(HealthRecords::RecordedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_health_records_recorded_at")
                    .table(HealthRecords::Table)
                    .col(HealthRecords::RecordedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HealthRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HealthRecords {
    Table,
    Id,
    UserId,
    Systolic,
    Diastolic,
    HeartRate,
    RecordedAt,
}
