use crate::entities::{
    ConfigDomain, LedgerCategory, rank_bonus_grant_entity as grants, reward_tier_entity as tiers,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    RankTableSnapshot, RankTierSnapshot, RecalculationFailure, RecalculationSummary,
    RewardTierPatch, RewardTierResponse, TenantContext, TierUpdateResponse, UserRecalcOutcome,
};
use crate::services::config_version_service;
use crate::services::ledger_service::{self, Currency, LedgerPosting};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;

/// 根据累计充值金额确定等级
///
/// 只考虑启用的等级，从最高门槛向下查找第一个 `threshold <= amount` 的等级；
/// 都不满足时返回最低等级。
pub fn tier_for_lifetime_charge(amount: i64, settings: &[tiers::Model]) -> Option<&tiers::Model> {
    let mut active: Vec<&tiers::Model> = settings.iter().filter(|t| t.is_active).collect();
    active.sort_by(|a, b| b.threshold.cmp(&a.threshold));
    active
        .iter()
        .find(|t| t.threshold <= amount)
        .or(active.last())
        .copied()
}

/// 当前等级表的快照（按 sort_order、门槛排序）
pub async fn rank_table_snapshot<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
) -> AppResult<RankTableSnapshot> {
    let list = tiers::Entity::find()
        .filter(tiers::Column::TenantId.eq(ctx.tenant_id))
        .order_by_asc(tiers::Column::SortOrder)
        .order_by_asc(tiers::Column::Threshold)
        .all(conn)
        .await?;
    Ok(RankTableSnapshot {
        tiers: list.iter().map(RankTierSnapshot::from).collect(),
    })
}

/// 将快照写回等级表
///
/// 按 code 匹配：存在则覆盖，不存在则新建；快照中没有的等级停用而不删除，
/// 已有的发放记录仍然指向它。
pub async fn restore_rank_table<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    snapshot: &RankTableSnapshot,
) -> AppResult<()> {
    validate_rank_table(snapshot)?;

    let existing = tiers::Entity::find()
        .filter(tiers::Column::TenantId.eq(ctx.tenant_id))
        .all(conn)
        .await?;
    let now = Utc::now();

    for tier in &snapshot.tiers {
        let mut am = match existing.iter().find(|t| t.code == tier.code) {
            Some(model) => model.clone().into_active_model(),
            None => tiers::ActiveModel {
                tenant_id: Set(ctx.tenant_id),
                code: Set(tier.code.clone()),
                ..Default::default()
            },
        };
        am.name = Set(tier.name.clone());
        am.threshold = Set(tier.threshold);
        am.credit_return_bp = Set(tier.credit_return_bp);
        am.mile_return_bp = Set(tier.mile_return_bp);
        am.bonus_amount = Set(tier.bonus_amount);
        am.sort_order = Set(tier.sort_order);
        am.is_active = Set(tier.is_active);
        am.updated_at = Set(now);
        am.save(conn).await?;
    }

    let kept: HashSet<&str> = snapshot.tiers.iter().map(|t| t.code.as_str()).collect();
    let dropped: Vec<i64> = existing
        .iter()
        .filter(|t| !kept.contains(t.code.as_str()))
        .map(|t| t.id)
        .collect();
    if !dropped.is_empty() {
        tiers::Entity::update_many()
            .col_expr(tiers::Column::IsActive, Expr::value(false))
            .col_expr(tiers::Column::UpdatedAt, Expr::value(now))
            .filter(tiers::Column::Id.is_in(dropped))
            .exec(conn)
            .await?;
    }
    Ok(())
}

fn validate_rank_table(snapshot: &RankTableSnapshot) -> AppResult<()> {
    let mut codes = HashSet::new();
    for tier in &snapshot.tiers {
        if tier.code.trim().is_empty() {
            return Err(AppError::ValidationError("Tier code is required".into()));
        }
        if !codes.insert(tier.code.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate tier code {}",
                tier.code
            )));
        }
        if tier.threshold < 0
            || tier.credit_return_bp < 0
            || tier.mile_return_bp < 0
            || tier.bonus_amount < 0
        {
            return Err(AppError::ValidationError(format!(
                "Tier {} has negative values",
                tier.code
            )));
        }
    }
    validate_ladder(snapshot)
}

/// 启用的等级必须构成严格递增的阶梯，最低门槛为 0
fn validate_ladder(snapshot: &RankTableSnapshot) -> AppResult<()> {
    let mut thresholds: Vec<i64> = snapshot
        .tiers
        .iter()
        .filter(|t| t.is_active)
        .map(|t| t.threshold)
        .collect();
    if thresholds.is_empty() {
        return Ok(());
    }
    thresholds.sort_unstable();
    if thresholds[0] != 0 {
        return Err(AppError::ValidationError(
            "The lowest active tier must have threshold 0".into(),
        ));
    }
    if let Some(pair) = thresholds.windows(2).find(|w| w[0] == w[1]) {
        return Err(AppError::ValidationError(format!(
            "Active tiers share threshold {}",
            pair[0]
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RewardService {
    pool: DatabaseConnection,
}

impl RewardService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_tiers(&self, ctx: TenantContext) -> AppResult<Vec<RewardTierResponse>> {
        let list = tiers::Entity::find()
            .filter(tiers::Column::TenantId.eq(ctx.tenant_id))
            .order_by_asc(tiers::Column::SortOrder)
            .order_by_asc(tiers::Column::Threshold)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 单个用户重新计算等级并发放升级奖励（独立事务）
    ///
    /// 新等级及以下的每个等级（最低等级除外）：
    /// - 没有发放记录：写入记录并发放 bonus_amount
    /// - 已发放但金额低于当前配置：只补发差额并上调记录金额
    /// - 不会扣回已发放的奖励
    pub async fn recalculate_user(
        &self,
        ctx: TenantContext,
        user_id: i64,
    ) -> AppResult<UserRecalcOutcome> {
        let txn = self.pool.begin().await?;

        let user = users::Entity::find_by_id(user_id)
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let settings = tiers::Entity::find()
            .filter(tiers::Column::TenantId.eq(ctx.tenant_id))
            .filter(tiers::Column::IsActive.eq(true))
            .all(&txn)
            .await?;

        let mut outcome = UserRecalcOutcome {
            user_id,
            previous_tier: user.reward_tier.clone(),
            tier: user.reward_tier.clone(),
            bonus_credited: 0,
        };

        let Some(tier) = tier_for_lifetime_charge(user.lifetime_charged, &settings) else {
            // 未配置等级
            txn.commit().await?;
            return Ok(outcome);
        };
        outcome.tier = Some(tier.code.clone());

        if outcome.tier_changed() {
            users::Entity::update_many()
                .col_expr(users::Column::RewardTier, Expr::value(tier.code.clone()))
                .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(users::Column::Id.eq(user_id))
                .filter(users::Column::TenantId.eq(ctx.tenant_id))
                .exec(&txn)
                .await?;
        }

        let base_threshold = settings.iter().map(|t| t.threshold).min().unwrap_or(0);
        let reached: Vec<&tiers::Model> = settings
            .iter()
            .filter(|t| t.threshold <= tier.threshold && t.threshold > base_threshold)
            .collect();

        for reached_tier in reached {
            let credited = grant_tier_bonus(&txn, ctx, user_id, reached_tier).await?;
            outcome.bonus_credited += credited;
        }

        txn.commit().await?;

        if outcome.tier_changed() || outcome.bonus_credited > 0 {
            log::info!(
                "reward recalculated: tenant={} user={} tier={:?}->{:?} bonus={}",
                ctx.tenant_id,
                user_id,
                outcome.previous_tier,
                outcome.tier,
                outcome.bonus_credited
            );
        }
        Ok(outcome)
    }

    /// 全租户重新计算，逐个用户执行，单个失败只记录不中断
    pub async fn recalculate_tenant(&self, ctx: TenantContext) -> AppResult<RecalculationSummary> {
        let user_ids: Vec<i64> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .order_by_asc(users::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut summary = RecalculationSummary::default();
        for user_id in user_ids {
            summary.processed += 1;
            match self.recalculate_user(ctx, user_id).await {
                Ok(outcome) => {
                    if outcome.tier_changed() {
                        summary.tier_changes += 1;
                    }
                    summary.bonus_credited += outcome.bonus_credited;
                }
                Err(e) => {
                    log::warn!(
                        "reward recalculation failed: tenant={} user={} error={}",
                        ctx.tenant_id,
                        user_id,
                        e
                    );
                    summary.failures.push(RecalculationFailure {
                        user_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "tenant {} recalculated: processed={} tier_changes={} bonus={} failures={}",
            ctx.tenant_id,
            summary.processed,
            summary.tier_changes,
            summary.bonus_credited,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// 部分更新等级配置，发布 rank_table 新版本后全租户重新计算
    pub async fn update_tier_setting(
        &self,
        ctx: TenantContext,
        code: &str,
        patch: RewardTierPatch,
        actor: &str,
    ) -> AppResult<TierUpdateResponse> {
        if patch.is_empty() {
            return Err(AppError::ValidationError("Nothing to update".into()));
        }
        if patch.threshold.is_some_and(|v| v < 0)
            || patch.credit_return_bp.is_some_and(|v| v < 0)
            || patch.mile_return_bp.is_some_and(|v| v < 0)
            || patch.bonus_amount.is_some_and(|v| v < 0)
        {
            return Err(AppError::ValidationError(
                "Tier values must not be negative".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        let tier = tiers::Entity::find()
            .filter(tiers::Column::TenantId.eq(ctx.tenant_id))
            .filter(tiers::Column::Code.eq(code))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reward tier {code} not found")))?;

        let mut am = tier.into_active_model();
        if let Some(name) = patch.name {
            am.name = Set(name);
        }
        if let Some(threshold) = patch.threshold {
            am.threshold = Set(threshold);
        }
        if let Some(bp) = patch.credit_return_bp {
            am.credit_return_bp = Set(bp);
        }
        if let Some(bp) = patch.mile_return_bp {
            am.mile_return_bp = Set(bp);
        }
        if let Some(amount) = patch.bonus_amount {
            am.bonus_amount = Set(amount);
        }
        if let Some(order) = patch.sort_order {
            am.sort_order = Set(order);
        }
        if let Some(active) = patch.is_active {
            am.is_active = Set(active);
        }
        am.updated_at = Set(Utc::now());
        let updated = am.update(&txn).await?;

        let snapshot = rank_table_snapshot(&txn, ctx).await?;
        validate_ladder(&snapshot)?;
        let version = config_version_service::publish_in(
            &txn,
            ctx,
            ConfigDomain::RankTable,
            serde_json::to_value(&snapshot)?,
            actor,
            Some(format!("update tier {code}")),
        )
        .await?;

        txn.commit().await?;

        let recalculation = self.recalculate_tenant(ctx).await?;

        Ok(TierUpdateResponse {
            tier: updated.into(),
            published_version: version.version,
            recalculation,
        })
    }
}

/// 发放（或补发）某个等级的升级奖励，返回本次实际发放的点数
async fn grant_tier_bonus<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    user_id: i64,
    tier: &tiers::Model,
) -> AppResult<i64> {
    let now = Utc::now();
    let inserted = grants::Entity::insert(grants::ActiveModel {
        tenant_id: Set(ctx.tenant_id),
        user_id: Set(user_id),
        tier_code: Set(tier.code.clone()),
        amount: Set(tier.bonus_amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            grants::Column::TenantId,
            grants::Column::UserId,
            grants::Column::TierCode,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    let credited = if inserted > 0 {
        tier.bonus_amount
    } else {
        let existing = grants::Entity::find()
            .filter(grants::Column::TenantId.eq(ctx.tenant_id))
            .filter(grants::Column::UserId.eq(user_id))
            .filter(grants::Column::TierCode.eq(tier.code.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::InternalError("Bonus grant vanished".into()))?;
        if existing.amount >= tier.bonus_amount {
            return Ok(0);
        }
        // 只上调，不扣回
        let res = grants::Entity::update_many()
            .col_expr(grants::Column::Amount, Expr::value(tier.bonus_amount))
            .col_expr(grants::Column::UpdatedAt, Expr::value(now))
            .filter(grants::Column::Id.eq(existing.id))
            .filter(grants::Column::Amount.lt(tier.bonus_amount))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Ok(0);
        }
        tier.bonus_amount - existing.amount
    };

    if credited > 0 {
        ledger_service::post(
            conn,
            ctx,
            Currency::Credits,
            LedgerPosting::new(user_id, credited, LedgerCategory::Bonus)
                .describe(format!("{} tier bonus", tier.name))
                .reference(&tier.code),
        )
        .await?;
    }
    Ok(credited)
}
