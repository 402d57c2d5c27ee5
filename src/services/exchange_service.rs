use crate::entities::{
    LedgerCategory, draw_entity as draws, mile_reward_entity as mile_rewards,
    prize_entity as prizes, prize_exchange_entity as exchanges,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    MileExchangeResponse, MileRewardCatalogSnapshot, MileRewardResponse, PrizeExchangeResponse,
    TenantContext,
};
use crate::services::ledger_service::{self, Currency, LedgerPosting};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashSet;

/// 将快照写回里程兑换目录，按 code 匹配，快照中没有的条目停用
pub async fn restore_mile_catalog<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    snapshot: &MileRewardCatalogSnapshot,
) -> AppResult<()> {
    let mut codes = HashSet::new();
    for reward in &snapshot.rewards {
        if !codes.insert(reward.code.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate mile reward code {}",
                reward.code
            )));
        }
        if reward.required_miles <= 0 || reward.credit_amount < 0 {
            return Err(AppError::ValidationError(format!(
                "Mile reward {} has invalid amounts",
                reward.code
            )));
        }
    }

    let existing = mile_rewards::Entity::find()
        .filter(mile_rewards::Column::TenantId.eq(ctx.tenant_id))
        .all(conn)
        .await?;

    for reward in &snapshot.rewards {
        let mut am = match existing.iter().find(|r| r.code == reward.code) {
            Some(model) => model.clone().into_active_model(),
            None => mile_rewards::ActiveModel {
                tenant_id: Set(ctx.tenant_id),
                code: Set(reward.code.clone()),
                ..Default::default()
            },
        };
        am.name = Set(reward.name.clone());
        am.required_miles = Set(reward.required_miles);
        am.credit_amount = Set(reward.credit_amount);
        am.is_active = Set(reward.is_active);
        am.save(conn).await?;
    }

    let dropped: Vec<i64> = existing
        .iter()
        .filter(|r| !codes.contains(r.code.as_str()))
        .map(|r| r.id)
        .collect();
    if !dropped.is_empty() {
        mile_rewards::Entity::update_many()
            .col_expr(mile_rewards::Column::IsActive, Expr::value(false))
            .filter(mile_rewards::Column::Id.is_in(dropped))
            .exec(conn)
            .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct ExchangeService {
    pool: DatabaseConnection,
}

impl ExchangeService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 将抽中的奖品兑换为点数，每条抽取记录只能兑换一次
    pub async fn exchange_draw(
        &self,
        ctx: TenantContext,
        user_id: i64,
        draw_id: i64,
    ) -> AppResult<PrizeExchangeResponse> {
        let txn = self.pool.begin().await?;

        let draw = draws::Entity::find_by_id(draw_id)
            .filter(draws::Column::TenantId.eq(ctx.tenant_id))
            .filter(draws::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Draw not found".to_string()))?;
        if draw.is_trial {
            return Err(AppError::ValidationError(
                "Trial draws cannot be exchanged".to_string(),
            ));
        }

        let prize = prizes::Entity::find_by_id(draw.prize_id)
            .filter(prizes::Column::TenantId.eq(ctx.tenant_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))?;

        let inserted = exchanges::Entity::insert(exchanges::ActiveModel {
            tenant_id: Set(ctx.tenant_id),
            user_id: Set(user_id),
            draw_id: Set(draw.id),
            amount: Set(prize.exchange_value),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(exchanges::Column::DrawId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(AppError::Conflict("Draw already exchanged".to_string()));
        }

        let balance = ledger_service::post(
            &txn,
            ctx,
            Currency::Credits,
            LedgerPosting::new(user_id, prize.exchange_value, LedgerCategory::Exchange)
                .describe(format!("exchange {}", prize.name))
                .reference(draw.id),
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "draw exchanged: tenant={} user={} draw={} credited={}",
            ctx.tenant_id,
            user_id,
            draw_id,
            prize.exchange_value
        );
        Ok(PrizeExchangeResponse {
            draw_id,
            credited: prize.exchange_value,
            balance,
        })
    }

    pub async fn list_mile_rewards(
        &self,
        ctx: TenantContext,
    ) -> AppResult<Vec<MileRewardResponse>> {
        let list = mile_rewards::Entity::find()
            .filter(mile_rewards::Column::TenantId.eq(ctx.tenant_id))
            .filter(mile_rewards::Column::IsActive.eq(true))
            .order_by_asc(mile_rewards::Column::RequiredMiles)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 用里程兑换点数：里程流水记负数，点数流水记正数，类别都是 MILE_EXCHANGE
    pub async fn exchange_mile_reward(
        &self,
        ctx: TenantContext,
        user_id: i64,
        reward_id: i64,
    ) -> AppResult<MileExchangeResponse> {
        let txn = self.pool.begin().await?;

        let reward = mile_rewards::Entity::find_by_id(reward_id)
            .filter(mile_rewards::Column::TenantId.eq(ctx.tenant_id))
            .filter(mile_rewards::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Mile reward not found".to_string()))?;

        let miles = ledger_service::post(
            &txn,
            ctx,
            Currency::Miles,
            LedgerPosting::new(user_id, -reward.required_miles, LedgerCategory::MileExchange)
                .describe(reward.name.clone())
                .reference(&reward.code),
        )
        .await?;
        let balance = ledger_service::post(
            &txn,
            ctx,
            Currency::Credits,
            LedgerPosting::new(user_id, reward.credit_amount, LedgerCategory::MileExchange)
                .describe(reward.name.clone())
                .reference(&reward.code),
        )
        .await?;

        txn.commit().await?;

        Ok(MileExchangeResponse {
            reward_id,
            miles_spent: reward.required_miles,
            credited: reward.credit_amount,
            miles,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        PackStatus, balance_transaction_entity as bt, mile_transaction_entity as mt,
        user_entity as users,
    };
    use crate::config::DrawConfig;
    use crate::models::{DrawRequest, MileRewardSnapshot};
    use crate::services::DrawService;
    use crate::test_support::*;
    use sea_orm::PaginatorTrait;

    async fn mile_catalog_snapshot(
        db: &DatabaseConnection,
        ctx: TenantContext,
    ) -> AppResult<MileRewardCatalogSnapshot> {
        let list = mile_rewards::Entity::find()
            .filter(mile_rewards::Column::TenantId.eq(ctx.tenant_id))
            .order_by_asc(mile_rewards::Column::Id)
            .all(db)
            .await?;
        Ok(MileRewardCatalogSnapshot {
            rewards: list.iter().map(MileRewardSnapshot::from).collect(),
        })
    }

    async fn insert_mile_reward(
        db: &DatabaseConnection,
        ctx: TenantContext,
        code: &str,
        required_miles: i64,
        credit_amount: i64,
    ) -> mile_rewards::Model {
        mile_rewards::ActiveModel {
            tenant_id: Set(ctx.tenant_id),
            code: Set(code.to_string()),
            name: Set(code.to_string()),
            required_miles: Set(required_miles),
            credit_amount: Set(credit_amount),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn draw_once(
        db: &DatabaseConnection,
        ctx: TenantContext,
        user_id: i64,
        trial: bool,
    ) -> i64 {
        let pack = insert_pack(db, ctx, 10, 5, PackStatus::Active).await;
        insert_slot(db, ctx, &pack, "Holo", 1, 5).await;
        let res = DrawService::new(db.clone(), DrawConfig::default())
            .settle_draw(ctx, user_id, pack.id, DrawRequest { count: 1, trial })
            .await
            .unwrap();
        res.prizes[0].draw_id
    }

    #[tokio::test]
    async fn draw_can_be_exchanged_only_once() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 100).await;
        let draw_id = draw_once(&db, ctx, user.id, false).await;
        let svc = ExchangeService::new(db.clone());

        let res = svc.exchange_draw(ctx, user.id, draw_id).await.unwrap();
        assert_eq!(res.credited, 10);
        assert_eq!(res.balance, 100);

        let err = svc.exchange_draw(ctx, user.id, draw_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let entries = bt::Entity::find()
            .filter(bt::Column::Category.eq(LedgerCategory::Exchange))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn foreign_and_trial_draws_are_rejected() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let owner = insert_user(&db, ctx, 100).await;
        let other = insert_user(&db, ctx, 100).await;
        let svc = ExchangeService::new(db.clone());

        let draw_id = draw_once(&db, ctx, owner.id, false).await;
        let err = svc.exchange_draw(ctx, other.id, draw_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let trial_id = draw_once(&db, ctx, owner.id, true).await;
        let err = svc.exchange_draw(ctx, owner.id, trial_id).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn mile_exchange_moves_both_ledgers() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        ledger_service::post(
            &db,
            ctx,
            Currency::Miles,
            LedgerPosting::new(user.id, 300, LedgerCategory::Referral),
        )
        .await
        .unwrap();
        let reward = insert_mile_reward(&db, ctx, "CREDIT_50", 200, 50).await;
        let svc = ExchangeService::new(db.clone());

        let res = svc.exchange_mile_reward(ctx, user.id, reward.id).await.unwrap();
        assert_eq!(res.miles, 100);
        assert_eq!(res.balance, 50);

        let err = svc
            .exchange_mile_reward(ctx, user.id, reward.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientMiles));

        let user = users::Entity::find_by_id(user.id).one(&db).await.unwrap().unwrap();
        assert_eq!(user.miles, 100);
        assert_eq!(user.balance, 50);
        let mile_entries = mt::Entity::find()
            .filter(mt::Column::Category.eq(LedgerCategory::MileExchange))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(mile_entries.len(), 1);
        assert_eq!(mile_entries[0].amount, -200);
        assert_eq!(bt::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn catalog_restore_matches_by_code() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        insert_mile_reward(&db, ctx, "A", 100, 10).await;
        insert_mile_reward(&db, ctx, "B", 200, 25).await;

        let mut snapshot = mile_catalog_snapshot(&db, ctx).await.unwrap();
        snapshot.rewards.retain(|r| r.code == "A");
        snapshot.rewards[0].credit_amount = 12;
        snapshot.rewards.push(MileRewardSnapshot {
            code: "C".into(),
            name: "C".into(),
            required_miles: 500,
            credit_amount: 70,
            is_active: true,
        });
        restore_mile_catalog(&db, ctx, &snapshot).await.unwrap();

        let visible = ExchangeService::new(db.clone())
            .list_mile_rewards(ctx)
            .await
            .unwrap();
        let codes: Vec<&str> = visible.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "C"]);
        assert_eq!(visible[0].credit_amount, 12);
    }
}
