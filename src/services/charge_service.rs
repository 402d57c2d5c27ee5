use crate::config::ReferralConfig;
use crate::entities::{
    ChargeMetadata, ChargeMetadataPatch, ChargeStatus, LedgerCategory, charge_entity as charges,
    charge_plan_entity as plans, reward_tier_entity as tiers, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{ChargeCallback, ChargeResponse, TenantContext};
use crate::services::RewardService;
use crate::services::ledger_service::{self, Currency, LedgerPosting};
use crate::services::referral_service::{self, ReferralEvent};
use crate::services::reward_service::tier_for_lifetime_charge;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QuerySelect, Set, TransactionTrait,
};

/// basis points 换算，100% = 10000
fn basis_points(amount: i64, bp: i32) -> i64 {
    amount * i64::from(bp) / 10_000
}

#[derive(Clone)]
pub struct ChargeService {
    pool: DatabaseConnection,
    reward_service: RewardService,
    referral_config: ReferralConfig,
}

impl ChargeService {
    pub fn new(
        pool: DatabaseConnection,
        reward_service: RewardService,
        referral_config: ReferralConfig,
    ) -> Self {
        Self {
            pool,
            reward_service,
            referral_config,
        }
    }

    /// 支付完成回调
    ///
    /// 同一个 external_payment_id 只入账一次，重复回调直接返回已有记录。
    /// 事务内：到账点数 (CHARGE)、等级返还点数 (BONUS)、里程 (CHARGE)、
    /// 累计充值、首充邀请奖励；提交后重新计算用户等级。
    pub async fn complete_charge(
        &self,
        ctx: TenantContext,
        callback: &ChargeCallback,
    ) -> AppResult<ChargeResponse> {
        let payment_id = callback.external_payment_id.trim();
        if payment_id.is_empty() {
            return Err(AppError::ValidationError(
                "external_payment_id is required".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        let user = users::Entity::find_by_id(callback.user_id)
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let existing = find_charge(&txn, ctx, payment_id).await?;
        if let Some(charge) = &existing
            && charge.status == ChargeStatus::Completed
        {
            log::info!(
                "charge {} of tenant {} already completed",
                payment_id,
                ctx.tenant_id
            );
            return Ok(charge.clone().into());
        }

        let plan = find_plan(&txn, ctx, callback.plan_id).await?;
        let settings = tiers::Entity::find()
            .filter(tiers::Column::TenantId.eq(ctx.tenant_id))
            .filter(tiers::Column::IsActive.eq(true))
            .all(&txn)
            .await?;
        let (credit_bp, mile_bp) = tier_for_lifetime_charge(user.lifetime_charged, &settings)
            .map(|t| (t.credit_return_bp, t.mile_return_bp))
            .unwrap_or((0, 0));
        let bonus = basis_points(plan.price, credit_bp);
        let miles = basis_points(plan.price, mile_bp);

        let patch = ChargeMetadataPatch {
            plan_name: Some(plan.name.clone()),
            external_status: Some("completed".to_string()),
            bonus_credits: Some(bonus),
            accrued_miles: Some(miles),
            ..Default::default()
        };
        let now = Utc::now();

        match existing {
            Some(failed) => {
                // 之前记录为失败，支付方随后确认成功
                let res = charges::Entity::update_many()
                    .col_expr(charges::Column::Status, Expr::value(ChargeStatus::Completed))
                    .col_expr(charges::Column::CreditAmount, Expr::value(plan.credit_amount))
                    .col_expr(charges::Column::UpdatedAt, Expr::value(now))
                    .filter(charges::Column::Id.eq(failed.id))
                    .filter(charges::Column::Status.eq(ChargeStatus::Failed))
                    .exec(&txn)
                    .await?;
                if res.rows_affected == 0 {
                    return Err(AppError::Conflict(format!(
                        "Charge {payment_id} changed concurrently"
                    )));
                }
                let mut am = failed.clone().into_active_model();
                am.metadata = Set(failed.metadata.apply(patch));
                am.update(&txn).await?;
            }
            None => {
                let inserted = charges::Entity::insert(charges::ActiveModel {
                    tenant_id: Set(ctx.tenant_id),
                    user_id: Set(user.id),
                    plan_id: Set(plan.id),
                    external_payment_id: Set(payment_id.to_string()),
                    amount: Set(plan.price),
                    credit_amount: Set(plan.credit_amount),
                    status: Set(ChargeStatus::Completed),
                    metadata: Set(ChargeMetadata::default().apply(patch)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([
                        charges::Column::TenantId,
                        charges::Column::ExternalPaymentId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
                if inserted == 0 {
                    // 并发回调已经写入，放弃本次事务
                    drop(txn);
                    let charge = find_charge(&self.pool, ctx, payment_id)
                        .await?
                        .ok_or_else(|| AppError::InternalError("Charge vanished".to_string()))?;
                    return Ok(charge.into());
                }
            }
        }

        ledger_service::post(
            &txn,
            ctx,
            Currency::Credits,
            LedgerPosting::new(user.id, plan.credit_amount, LedgerCategory::Charge)
                .describe(plan.name.clone())
                .reference(payment_id),
        )
        .await?;
        if bonus > 0 {
            ledger_service::post(
                &txn,
                ctx,
                Currency::Credits,
                LedgerPosting::new(user.id, bonus, LedgerCategory::Bonus)
                    .describe("charge tier bonus")
                    .reference(payment_id),
            )
            .await?;
        }
        if miles > 0 {
            ledger_service::post(
                &txn,
                ctx,
                Currency::Miles,
                LedgerPosting::new(user.id, miles, LedgerCategory::Charge)
                    .describe(plan.name.clone())
                    .reference(payment_id),
            )
            .await?;
        }

        users::Entity::update_many()
            .col_expr(
                users::Column::LifetimeCharged,
                Expr::col(users::Column::LifetimeCharged).add(plan.price),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .exec(&txn)
            .await?;

        referral_service::reward_invitee_event(
            &txn,
            ctx,
            &self.referral_config,
            user.id,
            ReferralEvent::FirstCharge,
        )
        .await?;

        let charge = find_charge(&txn, ctx, payment_id)
            .await?
            .ok_or_else(|| AppError::InternalError("Charge vanished".to_string()))?;
        txn.commit().await?;

        log::info!(
            "charge completed: tenant={} user={} payment={} credits={} bonus={} miles={}",
            ctx.tenant_id,
            user.id,
            payment_id,
            plan.credit_amount,
            bonus,
            miles
        );

        // 等级重新计算可以重跑，失败只记录
        if let Err(e) = self.reward_service.recalculate_user(ctx, user.id).await {
            log::error!(
                "reward recalculation after charge {} failed: {}",
                payment_id,
                e
            );
        }

        Ok(charge.into())
    }

    /// 支付失败回调，只记录，不影响余额
    pub async fn fail_charge(
        &self,
        ctx: TenantContext,
        callback: &ChargeCallback,
    ) -> AppResult<ChargeResponse> {
        let payment_id = callback.external_payment_id.trim();
        if payment_id.is_empty() {
            return Err(AppError::ValidationError(
                "external_payment_id is required".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let plan = find_plan(&txn, ctx, callback.plan_id).await?;
        ledger_service::find_user(&txn, ctx, callback.user_id).await?;

        let patch = ChargeMetadataPatch {
            plan_name: Some(plan.name.clone()),
            external_status: Some("failed".to_string()),
            failure_reason: callback.reason.clone(),
            ..Default::default()
        };
        let now = Utc::now();

        let charge = match find_charge(&txn, ctx, payment_id).await? {
            Some(charge) if charge.status == ChargeStatus::Completed => {
                log::warn!(
                    "ignoring failure callback for completed charge {} of tenant {}",
                    payment_id,
                    ctx.tenant_id
                );
                return Ok(charge.into());
            }
            Some(charge) => {
                let metadata = charge.metadata.clone().apply(patch);
                let mut am = charge.into_active_model();
                am.metadata = Set(metadata);
                am.updated_at = Set(now);
                am.update(&txn).await?
            }
            None => {
                charges::ActiveModel {
                    tenant_id: Set(ctx.tenant_id),
                    user_id: Set(callback.user_id),
                    plan_id: Set(plan.id),
                    external_payment_id: Set(payment_id.to_string()),
                    amount: Set(plan.price),
                    credit_amount: Set(0),
                    status: Set(ChargeStatus::Failed),
                    metadata: Set(ChargeMetadata::default().apply(patch)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };
        txn.commit().await?;

        log::warn!(
            "charge failed: tenant={} user={} payment={} reason={:?}",
            ctx.tenant_id,
            callback.user_id,
            payment_id,
            callback.reason
        );
        Ok(charge.into())
    }
}

/// 结算不看 is_active：下架前已付款的订单仍需入账
async fn find_plan<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    plan_id: i64,
) -> AppResult<plans::Model> {
    plans::Entity::find_by_id(plan_id)
        .filter(plans::Column::TenantId.eq(ctx.tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Charge plan not found".to_string()))
}

async fn find_charge<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    payment_id: &str,
) -> AppResult<Option<charges::Model>> {
    Ok(charges::Entity::find()
        .filter(charges::Column::TenantId.eq(ctx.tenant_id))
        .filter(charges::Column::ExternalPaymentId.eq(payment_id))
        .one(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        balance_transaction_entity as bt, mile_transaction_entity as mt,
        rank_bonus_grant_entity as grants,
    };
    use crate::services::ReferralService;
    use crate::test_support::*;
    use sea_orm::PaginatorTrait;

    fn service(db: &DatabaseConnection) -> ChargeService {
        ChargeService::new(
            db.clone(),
            RewardService::new(db.clone()),
            ReferralConfig::default(),
        )
    }

    async fn insert_plan(
        db: &DatabaseConnection,
        ctx: TenantContext,
        price: i64,
        credit_amount: i64,
    ) -> plans::Model {
        plans::ActiveModel {
            tenant_id: Set(ctx.tenant_id),
            name: Set(format!("plan {price}")),
            price: Set(price),
            credit_amount: Set(credit_amount),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn callback(user: &users::Model, plan: &plans::Model, payment_id: &str) -> ChargeCallback {
        ChargeCallback {
            tenant_id: user.tenant_id,
            user_id: user.id,
            plan_id: plan.id,
            external_payment_id: payment_id.to_string(),
            reason: None,
        }
    }

    async fn reload(db: &DatabaseConnection, id: i64) -> users::Model {
        users::Entity::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn charge_crossing_threshold_grants_one_tier_bonus() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        insert_tier(&db, ctx, "BRONZE", 0, 0).await;
        insert_tier(&db, ctx, "SILVER", 100_000, 1_000).await;
        insert_tier(&db, ctx, "GOLD", 800_000, 5_000).await;
        let user = insert_user(&db, ctx, 0).await;
        let mut am = user.clone().into_active_model();
        am.lifetime_charged = Set(90_000);
        let user = am.update(&db).await.unwrap();
        let plan = insert_plan(&db, ctx, 30_000, 30_000).await;
        let svc = service(&db);

        let charge = svc
            .complete_charge(ctx, &callback(&user, &plan, "pay_1"))
            .await
            .unwrap();
        assert_eq!(charge.status, ChargeStatus::Completed);

        let user = reload(&db, user.id).await;
        assert_eq!(user.lifetime_charged, 120_000);
        assert_eq!(user.reward_tier.as_deref(), Some("SILVER"));
        assert_eq!(user.balance, 31_000);

        let again = RewardService::new(db.clone())
            .recalculate_user(ctx, user.id)
            .await
            .unwrap();
        assert_eq!(again.bonus_credited, 0);
        assert_eq!(grants::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_callback_credits_once() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let plan = insert_plan(&db, ctx, 1_000, 1_100).await;
        let svc = service(&db);

        let first = svc
            .complete_charge(ctx, &callback(&user, &plan, "pay_dup"))
            .await
            .unwrap();
        let second = svc
            .complete_charge(ctx, &callback(&user, &plan, "pay_dup"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let user = reload(&db, user.id).await;
        assert_eq!(user.balance, 1_100);
        assert_eq!(user.lifetime_charged, 1_000);
        let entries = bt::Entity::find()
            .filter(bt::Column::Category.eq(LedgerCategory::Charge))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn tier_rates_accrue_bonus_credits_and_miles() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let base = insert_tier(&db, ctx, "BRONZE", 0, 0).await;
        let mut am = base.into_active_model();
        am.credit_return_bp = Set(500);
        am.mile_return_bp = Set(100);
        am.update(&db).await.unwrap();
        let user = insert_user(&db, ctx, 0).await;
        let plan = insert_plan(&db, ctx, 10_000, 10_000).await;

        let charge = service(&db)
            .complete_charge(ctx, &callback(&user, &plan, "pay_rate"))
            .await
            .unwrap();
        assert_eq!(charge.metadata.bonus_credits, Some(500));
        assert_eq!(charge.metadata.accrued_miles, Some(100));

        let user = reload(&db, user.id).await;
        assert_eq!(user.balance, 10_500);
        assert_eq!(user.miles, 100);
        let mile_entry = mt::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(mile_entry.category, LedgerCategory::Charge);
    }

    #[tokio::test]
    async fn first_charge_rewards_inviter_once() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let inviter = insert_user(&db, ctx, 0).await;
        let invitee = insert_user(&db, ctx, 0).await;
        let referrals = ReferralService::new(db.clone(), ReferralConfig::default());
        let code = referrals
            .ensure_referral_code(ctx, inviter.id)
            .await
            .unwrap()
            .referral_code;
        referrals.link_invitee(ctx, invitee.id, &code).await.unwrap();
        let plan = insert_plan(&db, ctx, 1_000, 1_000).await;
        let svc = service(&db);

        svc.complete_charge(ctx, &callback(&invitee, &plan, "pay_a"))
            .await
            .unwrap();
        svc.complete_charge(ctx, &callback(&invitee, &plan, "pay_b"))
            .await
            .unwrap();

        let inviter = reload(&db, inviter.id).await;
        assert_eq!(inviter.miles, ReferralConfig::default().first_charge_miles);
    }

    #[tokio::test]
    async fn failed_then_completed_charge_is_credited_once() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let plan = insert_plan(&db, ctx, 500, 500).await;
        let svc = service(&db);

        let mut cb = callback(&user, &plan, "pay_retry");
        cb.reason = Some("card_declined".to_string());
        let failed = svc.fail_charge(ctx, &cb).await.unwrap();
        assert_eq!(failed.status, ChargeStatus::Failed);
        assert_eq!(failed.metadata.failure_reason.as_deref(), Some("card_declined"));
        assert_eq!(reload(&db, user.id).await.balance, 0);

        let done = svc.complete_charge(ctx, &cb).await.unwrap();
        assert_eq!(done.id, failed.id);
        assert_eq!(done.status, ChargeStatus::Completed);
        // 失败原因保留在元数据中
        assert_eq!(done.metadata.failure_reason.as_deref(), Some("card_declined"));
        assert_eq!(done.metadata.external_status.as_deref(), Some("completed"));
        assert_eq!(reload(&db, user.id).await.balance, 500);

        let ignored = svc.fail_charge(ctx, &cb).await.unwrap();
        assert_eq!(ignored.status, ChargeStatus::Completed);
    }

    #[tokio::test]
    async fn plans_of_other_tenants_are_not_found() {
        let db = setup_db().await;
        let user = insert_user(&db, TenantContext::new(1), 0).await;
        let plan = insert_plan(&db, TenantContext::new(2), 500, 500).await;

        let err = service(&db)
            .complete_charge(TenantContext::new(1), &callback(&user, &plan, "pay_x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deactivated_plan_still_settles_and_replays() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let plan = insert_plan(&db, ctx, 2_000, 2_000).await;
        let svc = service(&db);

        let first = svc
            .complete_charge(ctx, &callback(&user, &plan, "pay_before"))
            .await
            .unwrap();

        let mut am = plan.clone().into_active_model();
        am.is_active = Set(false);
        let plan = am.update(&db).await.unwrap();

        // 已完成的回调重放返回原记录
        let replay = svc
            .complete_charge(ctx, &callback(&user, &plan, "pay_before"))
            .await
            .unwrap();
        assert_eq!(replay.id, first.id);

        // 下架前付款、下架后才到的回调仍然入账
        let late = svc
            .complete_charge(ctx, &callback(&user, &plan, "pay_late"))
            .await
            .unwrap();
        assert_eq!(late.status, ChargeStatus::Completed);
        assert_eq!(reload(&db, user.id).await.balance, 4_000);
    }
}
