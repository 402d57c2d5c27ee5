use sea_orm_migration::prelude::*;

/// 用户（点数、里程余额直接存放在用户行上）
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    TenantId,
    DisplayName,
    Phone,
    PhoneVerifiedAt,
    TermsAcceptedAt,
    Balance,
    Miles,
    LifetimeCharged,
    RewardTier,
    ReferralCode,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    TenantId,
    Name,
    ExchangeValue,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Packs {
    Table,
    Id,
    TenantId,
    Title,
    Price,
    TotalStock,
    RemainingStock,
    Status,
    PerUserLimit,
    StartsAt,
    EndsAt,
    CreatedAt,
    UpdatedAt,
}

/// 卡包奖池槽位
#[derive(DeriveIden)]
enum PackPrizes {
    Table,
    Id,
    TenantId,
    PackId,
    PrizeId,
    Weight,
    TotalQuantity,
    RemainingQuantity,
    SortOrder,
}

#[derive(DeriveIden)]
enum Draws {
    Table,
    Id,
    TenantId,
    UserId,
    PackId,
    PackPrizeId,
    PrizeId,
    BatchId,
    UnitPrice,
    IsTrial,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BalanceTransactions {
    Table,
}

#[derive(DeriveIden)]
enum MileTransactions {
    Table,
}

/// 两种流水表结构相同
#[derive(DeriveIden)]
enum Ledger {
    Id,
    TenantId,
    UserId,
    Amount,
    BalanceAfter,
    Category,
    Description,
    ReferenceId,
    CreatedAt,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn created_at_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::cust("NOW()"))
        .to_owned()
}

fn ledger_table<T: IntoIden + 'static>(table: T) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(&mut id_col(Ledger::Id))
        .col(ColumnDef::new(Ledger::TenantId).big_integer().not_null())
        .col(ColumnDef::new(Ledger::UserId).big_integer().not_null())
        .col(ColumnDef::new(Ledger::Amount).big_integer().not_null())
        .col(ColumnDef::new(Ledger::BalanceAfter).big_integer().not_null())
        .col(ColumnDef::new(Ledger::Category).text().not_null())
        .col(ColumnDef::new(Ledger::Description).text().null())
        .col(ColumnDef::new(Ledger::ReferenceId).string_len(64).null())
        .col(&mut created_at_col(Ledger::CreatedAt))
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(&mut id_col(Users::Id))
                    .col(ColumnDef::new(Users::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string_len(100).not_null())
                    .col(ColumnDef::new(Users::Phone).string_len(20).null())
                    .col(
                        ColumnDef::new(Users::PhoneVerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::TermsAcceptedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Users::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Users::Miles)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Users::Miles).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Users::LifetimeCharged)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::RewardTier).string_len(32).null())
                    .col(ColumnDef::new(Users::ReferralCode).string_len(16).null())
                    .col(&mut created_at_col(Users::CreatedAt))
                    .col(&mut created_at_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // 推荐码在租户内唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_tenant_referral_code")
                    .table(Users::Table)
                    .col(Users::TenantId)
                    .col(Users::ReferralCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(&mut id_col(Prizes::Id))
                    .col(ColumnDef::new(Prizes::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Prizes::ExchangeValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut created_at_col(Prizes::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Packs::Table)
                    .if_not_exists()
                    .col(&mut id_col(Packs::Id))
                    .col(ColumnDef::new(Packs::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(Packs::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Packs::Price).big_integer().not_null())
                    .col(ColumnDef::new(Packs::TotalStock).big_integer().not_null())
                    .col(
                        ColumnDef::new(Packs::RemainingStock)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Packs::RemainingStock).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Packs::Status)
                            .text()
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Packs::PerUserLimit).big_integer().null())
                    .col(ColumnDef::new(Packs::StartsAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Packs::EndsAt).timestamp_with_time_zone().null())
                    .col(&mut created_at_col(Packs::CreatedAt))
                    .col(&mut created_at_col(Packs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_packs_tenant_status")
                    .table(Packs::Table)
                    .col(Packs::TenantId)
                    .col(Packs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PackPrizes::Table)
                    .if_not_exists()
                    .col(&mut id_col(PackPrizes::Id))
                    .col(ColumnDef::new(PackPrizes::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(PackPrizes::PackId).big_integer().not_null())
                    .col(ColumnDef::new(PackPrizes::PrizeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(PackPrizes::Weight)
                            .integer()
                            .not_null()
                            .check(Expr::col(PackPrizes::Weight).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PackPrizes::TotalQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PackPrizes::RemainingQuantity)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(PackPrizes::RemainingQuantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PackPrizes::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pack_prizes_pack")
                            .from(PackPrizes::Table, PackPrizes::PackId)
                            .to(Packs::Table, Packs::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pack_prizes_prize")
                            .from(PackPrizes::Table, PackPrizes::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pack_prizes_pack")
                    .table(PackPrizes::Table)
                    .col(PackPrizes::PackId)
                    .col(PackPrizes::SortOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Draws::Table)
                    .if_not_exists()
                    .col(&mut id_col(Draws::Id))
                    .col(ColumnDef::new(Draws::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(Draws::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Draws::PackId).big_integer().not_null())
                    .col(ColumnDef::new(Draws::PackPrizeId).big_integer().not_null())
                    .col(ColumnDef::new(Draws::PrizeId).big_integer().not_null())
                    .col(ColumnDef::new(Draws::BatchId).uuid().not_null())
                    .col(ColumnDef::new(Draws::UnitPrice).big_integer().not_null())
                    .col(
                        ColumnDef::new(Draws::IsTrial)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut created_at_col(Draws::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draws_user")
                            .from(Draws::Table, Draws::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draws_pack")
                            .from(Draws::Table, Draws::PackId)
                            .to(Packs::Table, Packs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 限购统计与用户记录查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draws_user_pack")
                    .table(Draws::Table)
                    .col(Draws::TenantId)
                    .col(Draws::UserId)
                    .col(Draws::PackId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(ledger_table(BalanceTransactions::Table))
            .await?;
        manager
            .create_table(ledger_table(MileTransactions::Table))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_balance_transactions_user")
                    .table(BalanceTransactions::Table)
                    .col(Ledger::TenantId)
                    .col(Ledger::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_mile_transactions_user")
                    .table(MileTransactions::Table)
                    .col(Ledger::TenantId)
                    .col(Ledger::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序与创建相反
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(MileTransactions::Table)
                    .table(BalanceTransactions::Table)
                    .table(Draws::Table)
                    .table(PackPrizes::Table)
                    .table(Packs::Table)
                    .table(Prizes::Table)
                    .table(Users::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
