use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

/// 等级配置（按租户）
#[derive(DeriveIden)]
enum RewardTierSettings {
    Table,
    Id,
    TenantId,
    Code,
    Name,
    Threshold,
    CreditReturnBp,
    MileReturnBp,
    BonusAmount,
    SortOrder,
    IsActive,
    UpdatedAt,
}

/// 升级奖励发放记录，每个 (用户, 等级) 最多一条
#[derive(DeriveIden)]
enum UserRankBonusGrants {
    Table,
    Id,
    TenantId,
    UserId,
    TierCode,
    Amount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ChargePlans {
    Table,
    Id,
    TenantId,
    Name,
    Price,
    CreditAmount,
    IsActive,
}

#[derive(DeriveIden)]
enum Charges {
    Table,
    Id,
    TenantId,
    UserId,
    PlanId,
    ExternalPaymentId,
    Amount,
    CreditAmount,
    Status,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RewardTierSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RewardTierSettings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::TenantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::Code)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::Threshold)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(RewardTierSettings::Threshold).gte(0)),
                    )
                    // 返还比例使用 basis points，10000bp = 100%
                    .col(
                        ColumnDef::new(RewardTierSettings::CreditReturnBp)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::MileReturnBp)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::BonusAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RewardTierSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_reward_tiers_code")
                    .table(RewardTierSettings::Table)
                    .col(RewardTierSettings::TenantId)
                    .col(RewardTierSettings::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRankBonusGrants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRankBonusGrants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserRankBonusGrants::TenantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRankBonusGrants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRankBonusGrants::TierCode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRankBonusGrants::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRankBonusGrants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(UserRankBonusGrants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rank_bonus_grants_user")
                            .from(UserRankBonusGrants::Table, UserRankBonusGrants::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 发放幂等依赖此唯一索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_rank_bonus_grants")
                    .table(UserRankBonusGrants::Table)
                    .col(UserRankBonusGrants::TenantId)
                    .col(UserRankBonusGrants::UserId)
                    .col(UserRankBonusGrants::TierCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChargePlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChargePlans::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChargePlans::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(ChargePlans::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(ChargePlans::Price)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(ChargePlans::Price).gt(0)),
                    )
                    .col(
                        ColumnDef::new(ChargePlans::CreditAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChargePlans::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Charges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Charges::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Charges::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(Charges::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Charges::PlanId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Charges::ExternalPaymentId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Charges::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Charges::CreditAmount).big_integer().not_null())
                    .col(ColumnDef::new(Charges::Status).text().not_null())
                    .col(ColumnDef::new(Charges::Metadata).json().not_null())
                    .col(
                        ColumnDef::new(Charges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Charges::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charges_user")
                            .from(Charges::Table, Charges::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charges_plan")
                            .from(Charges::Table, Charges::PlanId)
                            .to(ChargePlans::Table, ChargePlans::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一个支付单只入账一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_charges_external_payment")
                    .table(Charges::Table)
                    .col(Charges::TenantId)
                    .col(Charges::ExternalPaymentId)
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
                    .table(Charges::Table)
                    .table(ChargePlans::Table)
                    .table(UserRankBonusGrants::Table)
                    .table(RewardTierSettings::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
