use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ThresholdConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ThresholdConfigs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ThresholdConfigs::Config).text().not_null())
                    // Unique so two racing writers cannot both claim the same version
                    .col(ColumnDef::new(ThresholdConfigs::Version).integer().not_null().unique_key())
                    .col(ColumnDef::new(ThresholdConfigs::Status).string().not_null())
                    .col(ColumnDef::new(ThresholdConfigs::CreatedBy).string().null())
                    .col(ColumnDef::new(ThresholdConfigs::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(ThresholdConfigs::PublishedAt).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_threshold_configs_status")
                    .table(ThresholdConfigs::Table)
                    .col(ThresholdConfigs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ThresholdAuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ThresholdAuditLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ThresholdAuditLogs::ConfigId).integer().not_null())
                    .col(ColumnDef::new(ThresholdAuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(ThresholdAuditLogs::OperatorUserId).string().null())
                    .col(ColumnDef::new(ThresholdAuditLogs::OldConfig).text().null())
                    .col(ColumnDef::new(ThresholdAuditLogs::NewConfig).text().not_null())
                    .col(ColumnDef::new(ThresholdAuditLogs::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_threshold_audit_logs_config_id")
                            .from(ThresholdAuditLogs::Table, ThresholdAuditLogs::ConfigId)
                            .to(ThresholdConfigs::Table, ThresholdConfigs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_threshold_audit_logs_created_at")
                    .table(ThresholdAuditLogs::Table)
                    .col(ThresholdAuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ThresholdAuditLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ThresholdConfigs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ThresholdConfigs {
    Table,
    Id,
    Config,
    Version,
    Status,
    CreatedBy,
    CreatedAt,
    PublishedAt,
}

#[derive(DeriveIden)]
enum ThresholdAuditLogs {
    Table,
    Id,
    ConfigId,
    Action,
    OperatorUserId,
    OldConfig,
    NewConfig,
    CreatedAt,
}
