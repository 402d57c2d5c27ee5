use sea_orm_migration::prelude::*;

/// 配置版本（只追加），版本号在 (租户, 配置域) 内连续递增
#[derive(DeriveIden)]
enum ConfigVersions {
    Table,
    Id,
    TenantId,
    Domain,
    Version,
    Payload,
    PublishedAt,
    PublishedBy,
    Description,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConfigVersions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConfigVersions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConfigVersions::TenantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConfigVersions::Domain).text().not_null())
                    .col(
                        ColumnDef::new(ConfigVersions::Version)
                            .integer()
                            .not_null()
                            .check(Expr::col(ConfigVersions::Version).gte(1)),
                    )
                    .col(
                        ColumnDef::new(ConfigVersions::Payload)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConfigVersions::PublishedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(ConfigVersions::PublishedBy)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConfigVersions::Description).text().null())
                    .to_owned(),
            )
            .await?;

        // 并发发布时由唯一索引拒绝重复版本号
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_config_versions")
                    .table(ConfigVersions::Table)
                    .col(ConfigVersions::TenantId)
                    .col(ConfigVersions::Domain)
                    .col(ConfigVersions::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ConfigVersions::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
