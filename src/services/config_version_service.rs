use crate::entities::{ConfigDomain, config_version_entity as versions};
use crate::error::{AppError, AppResult};
use crate::models::{
    ConfigVersionResponse, MileRewardCatalogSnapshot, RankTableSnapshot, TenantContext,
};
use crate::services::{RewardService, exchange_service, reward_service};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde_json::Value;

/// 分配版本号时遇到唯一键冲突的最大重试次数
const MAX_PUBLISH_ATTEMPTS: u32 = 3;

/// 在调用方事务内追加一个新版本，返回写入的版本记录
///
/// 先锁定当前最大版本行再取 `max + 1`，并由 (tenant_id, domain, version)
/// 唯一索引兜底；冲突时回滚到保存点后重试。
pub async fn publish_in<C>(
    conn: &C,
    ctx: TenantContext,
    domain: ConfigDomain,
    payload: Value,
    actor: &str,
    description: Option<String>,
) -> AppResult<versions::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    for attempt in 1..=MAX_PUBLISH_ATTEMPTS {
        let savepoint = conn.begin().await?;

        let latest = versions::Entity::find()
            .filter(versions::Column::TenantId.eq(ctx.tenant_id))
            .filter(versions::Column::Domain.eq(domain))
            .order_by_desc(versions::Column::Version)
            .lock_exclusive()
            .one(&savepoint)
            .await?;
        let next = latest.map(|v| v.version + 1).unwrap_or(1);

        let inserted = versions::ActiveModel {
            tenant_id: Set(ctx.tenant_id),
            domain: Set(domain),
            version: Set(next),
            payload: Set(payload.clone()),
            published_at: Set(Utc::now()),
            published_by: Set(actor.to_string()),
            description: Set(description.clone()),
            ..Default::default()
        }
        .insert(&savepoint)
        .await;

        match inserted {
            Ok(model) => {
                savepoint.commit().await?;
                log::info!(
                    "config published: tenant={} domain={} version={} by={}",
                    ctx.tenant_id,
                    domain,
                    next,
                    actor
                );
                return Ok(model);
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                log::warn!(
                    "config version {} of {} already taken (attempt {}), retrying",
                    next,
                    domain,
                    attempt
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Conflict(format!(
        "Could not allocate a new {domain} version"
    )))
}

/// 把快照应用到对应的业务表；只有等级表与里程奖励目录有对应的表
async fn apply_snapshot<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    domain: ConfigDomain,
    payload: &Value,
) -> AppResult<()> {
    if payload.is_null() {
        return Err(AppError::ValidationError("Snapshot is required".into()));
    }
    match domain {
        ConfigDomain::RankTable => {
            let snapshot: RankTableSnapshot = serde_json::from_value(payload.clone())
                .map_err(|e| AppError::ValidationError(format!("Invalid rank table: {e}")))?;
            reward_service::restore_rank_table(conn, ctx, &snapshot).await
        }
        ConfigDomain::MileRewards => {
            let snapshot: MileRewardCatalogSnapshot = serde_json::from_value(payload.clone())
                .map_err(|e| AppError::ValidationError(format!("Invalid mile rewards: {e}")))?;
            exchange_service::restore_mile_catalog(conn, ctx, &snapshot).await
        }
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct ConfigVersionService {
    pool: DatabaseConnection,
    reward_service: RewardService,
}

impl ConfigVersionService {
    pub fn new(pool: DatabaseConnection, reward_service: RewardService) -> Self {
        Self {
            pool,
            reward_service,
        }
    }

    /// 发布新版本
    pub async fn publish(
        &self,
        ctx: TenantContext,
        domain: ConfigDomain,
        snapshot: Value,
        actor: &str,
        description: Option<String>,
    ) -> AppResult<ConfigVersionResponse> {
        let txn = self.pool.begin().await?;
        apply_snapshot(&txn, ctx, domain, &snapshot).await?;
        let version = publish_in(&txn, ctx, domain, snapshot, actor, description).await?;
        txn.commit().await?;

        self.after_apply(ctx, domain).await;
        Ok(version.into())
    }

    /// 回滚：把目标版本的快照作为新版本重新发布，历史记录不会被改写
    pub async fn rollback(
        &self,
        ctx: TenantContext,
        domain: ConfigDomain,
        target_version: i32,
        actor: &str,
    ) -> AppResult<ConfigVersionResponse> {
        let txn = self.pool.begin().await?;

        let target = versions::Entity::find()
            .filter(versions::Column::TenantId.eq(ctx.tenant_id))
            .filter(versions::Column::Domain.eq(domain))
            .filter(versions::Column::Version.eq(target_version))
            .one(&txn)
            .await?
            .ok_or(AppError::VersionNotFound(target_version))?;

        apply_snapshot(&txn, ctx, domain, &target.payload).await?;
        let version = publish_in(
            &txn,
            ctx,
            domain,
            target.payload,
            actor,
            Some(format!("rollback to v{target_version}")),
        )
        .await?;
        txn.commit().await?;

        self.after_apply(ctx, domain).await;
        Ok(version.into())
    }

    /// 版本历史，最新在前
    pub async fn history(
        &self,
        ctx: TenantContext,
        domain: Option<ConfigDomain>,
    ) -> AppResult<Vec<ConfigVersionResponse>> {
        let mut query =
            versions::Entity::find().filter(versions::Column::TenantId.eq(ctx.tenant_id));
        if let Some(domain) = domain {
            query = query.filter(versions::Column::Domain.eq(domain));
        }
        let list = query
            .order_by_desc(versions::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn current(
        &self,
        ctx: TenantContext,
        domain: ConfigDomain,
    ) -> AppResult<ConfigVersionResponse> {
        versions::Entity::find()
            .filter(versions::Column::TenantId.eq(ctx.tenant_id))
            .filter(versions::Column::Domain.eq(domain))
            .order_by_desc(versions::Column::Version)
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("No published {domain} version")))
    }

    // 等级表变化后需要全租户重新计算；失败可以重跑，只记日志
    async fn after_apply(&self, ctx: TenantContext, domain: ConfigDomain) {
        if domain != ConfigDomain::RankTable {
            return;
        }
        if let Err(e) = self.reward_service.recalculate_tenant(ctx).await {
            log::error!(
                "recalculation after rank_table change failed: tenant={} error={}",
                ctx.tenant_id,
                e
            );
        }
    }
}
