//! In-memory SQLite fixture for service tests.
//!
//! Tables are derived from the entities; composite unique keys that the
//! migrations create on PostgreSQL are added by hand so idempotency guards
//! behave the same way.

use crate::entities::*;
use crate::models::TenantContext;
use chrono::Utc;
use sea_orm::sea_query::Index;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    Schema, Set,
};

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    // one shared connection keeps a single in-memory database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();

    create_table(&db, user_entity::Entity).await;
    create_table(&db, pack_entity::Entity).await;
    create_table(&db, prize_entity::Entity).await;
    create_table(&db, pack_prize_entity::Entity).await;
    create_table(&db, draw_entity::Entity).await;
    create_table(&db, balance_transaction_entity::Entity).await;
    create_table(&db, mile_transaction_entity::Entity).await;
    create_table(&db, reward_tier_entity::Entity).await;
    create_table(&db, rank_bonus_grant_entity::Entity).await;
    create_table(&db, invite_link_entity::Entity).await;
    create_table(&db, config_version_entity::Entity).await;
    create_table(&db, charge_plan_entity::Entity).await;
    create_table(&db, charge_entity::Entity).await;
    create_table(&db, phone_verification_code_entity::Entity).await;
    create_table(&db, prize_exchange_entity::Entity).await;
    create_table(&db, mile_reward_entity::Entity).await;

    let backend = db.get_database_backend();
    let indexes = [
        Index::create()
            .name("uq_users_tenant_referral_code")
            .table(user_entity::Entity)
            .col(user_entity::Column::TenantId)
            .col(user_entity::Column::ReferralCode)
            .unique()
            .to_owned(),
        Index::create()
            .name("uq_rank_bonus_grants")
            .table(rank_bonus_grant_entity::Entity)
            .col(rank_bonus_grant_entity::Column::TenantId)
            .col(rank_bonus_grant_entity::Column::UserId)
            .col(rank_bonus_grant_entity::Column::TierCode)
            .unique()
            .to_owned(),
        Index::create()
            .name("uq_config_versions")
            .table(config_version_entity::Entity)
            .col(config_version_entity::Column::TenantId)
            .col(config_version_entity::Column::Domain)
            .col(config_version_entity::Column::Version)
            .unique()
            .to_owned(),
        Index::create()
            .name("uq_invite_links_invitee")
            .table(invite_link_entity::Entity)
            .col(invite_link_entity::Column::TenantId)
            .col(invite_link_entity::Column::InviteeId)
            .unique()
            .to_owned(),
        Index::create()
            .name("uq_charges_external_payment")
            .table(charge_entity::Entity)
            .col(charge_entity::Column::TenantId)
            .col(charge_entity::Column::ExternalPaymentId)
            .unique()
            .to_owned(),
        Index::create()
            .name("uq_reward_tiers_code")
            .table(reward_tier_entity::Entity)
            .col(reward_tier_entity::Column::TenantId)
            .col(reward_tier_entity::Column::Code)
            .unique()
            .to_owned(),
    ];
    for index in indexes {
        db.execute(backend.build(&index)).await.unwrap();
    }

    db
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = schema.create_table_from_entity(entity);
    db.execute(backend.build(&stmt)).await.unwrap();
}

pub async fn insert_user(
    db: &DatabaseConnection,
    ctx: TenantContext,
    balance: i64,
) -> user_entity::Model {
    let now = Utc::now();
    user_entity::ActiveModel {
        tenant_id: Set(ctx.tenant_id),
        display_name: Set("tester".to_string()),
        terms_accepted_at: Set(Some(now)),
        balance: Set(balance),
        miles: Set(0),
        lifetime_charged: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_pack(
    db: &DatabaseConnection,
    ctx: TenantContext,
    price: i64,
    stock: i64,
    status: PackStatus,
) -> pack_entity::Model {
    let now = Utc::now();
    pack_entity::ActiveModel {
        tenant_id: Set(ctx.tenant_id),
        title: Set("Test pack".to_string()),
        price: Set(price),
        total_stock: Set(stock),
        remaining_stock: Set(stock),
        status: Set(status),
        per_user_limit: Set(None),
        starts_at: Set(None),
        ends_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Inserts a prize and attaches it to `pack` as a slot.
pub async fn insert_slot(
    db: &DatabaseConnection,
    ctx: TenantContext,
    pack: &pack_entity::Model,
    name: &str,
    weight: i32,
    quantity: i64,
) -> pack_prize_entity::Model {
    let prize = prize_entity::ActiveModel {
        tenant_id: Set(ctx.tenant_id),
        name: Set(name.to_string()),
        exchange_value: Set(10),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    pack_prize_entity::ActiveModel {
        tenant_id: Set(ctx.tenant_id),
        pack_id: Set(pack.id),
        prize_id: Set(prize.id),
        weight: Set(weight),
        total_quantity: Set(quantity),
        remaining_quantity: Set(quantity),
        sort_order: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_tier(
    db: &DatabaseConnection,
    ctx: TenantContext,
    code: &str,
    threshold: i64,
    bonus_amount: i64,
) -> reward_tier_entity::Model {
    reward_tier_entity::ActiveModel {
        tenant_id: Set(ctx.tenant_id),
        code: Set(code.to_string()),
        name: Set(code.to_string()),
        threshold: Set(threshold),
        credit_return_bp: Set(0),
        mile_return_bp: Set(0),
        bonus_amount: Set(bonus_amount),
        sort_order: Set(0),
        is_active: Set(true),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
