use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Draws {
    Table,
    Id,
}

/// 邀请关系，每个被邀请人只能有一个邀请人
#[derive(DeriveIden)]
enum InviteLinks {
    Table,
    Id,
    TenantId,
    InviterId,
    InviteeId,
    PhoneRewardAt,
    FirstChargeRewardAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PhoneVerificationCodes {
    Table,
    Id,
    TenantId,
    UserId,
    Phone,
    Code,
    ExpiresAt,
    ConsumedAt,
    CreatedAt,
}

/// 奖品兑换点数，每条抽取记录最多一次
#[derive(DeriveIden)]
enum PrizeExchanges {
    Table,
    Id,
    TenantId,
    UserId,
    DrawId,
    Amount,
    CreatedAt,
}

/// 里程兑换目录
#[derive(DeriveIden)]
enum MileRewards {
    Table,
    Id,
    TenantId,
    Code,
    Name,
    RequiredMiles,
    CreditAmount,
    IsActive,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InviteLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InviteLinks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InviteLinks::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(InviteLinks::InviterId).big_integer().not_null())
                    .col(ColumnDef::new(InviteLinks::InviteeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(InviteLinks::PhoneRewardAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InviteLinks::FirstChargeRewardAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InviteLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .check(
                        Expr::col(InviteLinks::InviterId).ne(Expr::col(InviteLinks::InviteeId)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invite_links_inviter")
                            .from(InviteLinks::Table, InviteLinks::InviterId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invite_links_invitee")
                            .from(InviteLinks::Table, InviteLinks::InviteeId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_invite_links_invitee")
                    .table(InviteLinks::Table)
                    .col(InviteLinks::TenantId)
                    .col(InviteLinks::InviteeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invite_links_inviter")
                    .table(InviteLinks::Table)
                    .col(InviteLinks::TenantId)
                    .col(InviteLinks::InviterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhoneVerificationCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::TenantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::Phone)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::Code)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::ConsumedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PhoneVerificationCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 限流窗口统计
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_phone_codes_user_created")
                    .table(PhoneVerificationCodes::Table)
                    .col(PhoneVerificationCodes::TenantId)
                    .col(PhoneVerificationCodes::UserId)
                    .col(PhoneVerificationCodes::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeExchanges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeExchanges::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeExchanges::TenantId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PrizeExchanges::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(PrizeExchanges::DrawId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PrizeExchanges::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(PrizeExchanges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_exchanges_draw")
                            .from(PrizeExchanges::Table, PrizeExchanges::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MileRewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MileRewards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MileRewards::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(MileRewards::Code).string_len(32).not_null())
                    .col(ColumnDef::new(MileRewards::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(MileRewards::RequiredMiles)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(MileRewards::RequiredMiles).gt(0)),
                    )
                    .col(
                        ColumnDef::new(MileRewards::CreditAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MileRewards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_mile_rewards_code")
                    .table(MileRewards::Table)
                    .col(MileRewards::TenantId)
                    .col(MileRewards::Code)
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
                    .table(MileRewards::Table)
                    .table(PrizeExchanges::Table)
                    .table(PhoneVerificationCodes::Table)
                    .table(InviteLinks::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
