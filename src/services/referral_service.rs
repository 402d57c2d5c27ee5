use crate::config::ReferralConfig;
use crate::entities::{LedgerCategory, invite_link_entity as links, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{InviteLinkResponse, ReferralCodeResponse, TenantContext};
use crate::services::ledger_service::{self, Currency, LedgerPosting};
use crate::utils::generate_referral_code;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

/// 邀请奖励事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralEvent {
    PhoneVerified,
    FirstCharge,
}

impl ReferralEvent {
    fn column(self) -> links::Column {
        match self {
            ReferralEvent::PhoneVerified => links::Column::PhoneRewardAt,
            ReferralEvent::FirstCharge => links::Column::FirstChargeRewardAt,
        }
    }

    fn miles(self, cfg: &ReferralConfig) -> i64 {
        match self {
            ReferralEvent::PhoneVerified => cfg.phone_verified_miles,
            ReferralEvent::FirstCharge => cfg.first_charge_miles,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ReferralEvent::PhoneVerified => "phone_verified",
            ReferralEvent::FirstCharge => "first_charge",
        }
    }
}

/// 被邀请人达成事件时给邀请人发放里程，返回发放的里程数
///
/// 先以 `WHERE ... IS NULL` 设置事件时间戳，只有确实更新到一行才发放，
/// 重复触发不会重复发放。没有邀请关系时返回 0。
pub async fn reward_invitee_event<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    cfg: &ReferralConfig,
    invitee_id: i64,
    event: ReferralEvent,
) -> AppResult<i64> {
    let Some(link) = links::Entity::find()
        .filter(links::Column::TenantId.eq(ctx.tenant_id))
        .filter(links::Column::InviteeId.eq(invitee_id))
        .one(conn)
        .await?
    else {
        return Ok(0);
    };

    let column = event.column();
    let res = links::Entity::update_many()
        .col_expr(column, Expr::value(Utc::now()))
        .filter(links::Column::Id.eq(link.id))
        .filter(column.is_null())
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Ok(0);
    }

    let miles = event.miles(cfg);
    if miles > 0 {
        ledger_service::post(
            conn,
            ctx,
            Currency::Miles,
            LedgerPosting::new(link.inviter_id, miles, LedgerCategory::Referral)
                .describe(format!("referral {}", event.label()))
                .reference(invitee_id),
        )
        .await?;
    }
    log::info!(
        "referral reward: tenant={} inviter={} invitee={} event={} miles={}",
        ctx.tenant_id,
        link.inviter_id,
        invitee_id,
        event.label(),
        miles
    );
    Ok(miles)
}

#[derive(Clone)]
pub struct ReferralService {
    pool: DatabaseConnection,
    referral_config: ReferralConfig,
}

impl ReferralService {
    pub fn new(pool: DatabaseConnection, referral_config: ReferralConfig) -> Self {
        Self {
            pool,
            referral_config,
        }
    }

    /// 获取（必要时生成）用户的推荐码
    ///
    /// 生成后以 `WHERE referral_code IS NULL` 写入，先写入者生效；
    /// 与其它用户冲突时重新生成，最多尝试 `max_code_attempts` 次。
    pub async fn ensure_referral_code(
        &self,
        ctx: TenantContext,
        user_id: i64,
    ) -> AppResult<ReferralCodeResponse> {
        let user = ledger_service::find_user(&self.pool, ctx, user_id).await?;
        if let Some(code) = user.referral_code {
            return Ok(ReferralCodeResponse {
                referral_code: code,
            });
        }

        for attempt in 1..=self.referral_config.max_code_attempts {
            let candidate = generate_referral_code(self.referral_config.code_length);
            let res = users::Entity::update_many()
                .col_expr(users::Column::ReferralCode, Expr::value(candidate.clone()))
                .filter(users::Column::Id.eq(user_id))
                .filter(users::Column::TenantId.eq(ctx.tenant_id))
                .filter(users::Column::ReferralCode.is_null())
                .exec(&self.pool)
                .await;

            match res {
                Ok(_) => {
                    // 无论是否由本次写入，重新读取即为最终结果
                    let user = ledger_service::find_user(&self.pool, ctx, user_id).await?;
                    if let Some(code) = user.referral_code {
                        return Ok(ReferralCodeResponse {
                            referral_code: code,
                        });
                    }
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    log::warn!(
                        "referral code collision for user {} (attempt {})",
                        user_id,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a unique referral code".to_string(),
        ))
    }

    /// 记录邀请关系：不能邀请自己，每个被邀请人只能绑定一次
    pub async fn link_invitee(
        &self,
        ctx: TenantContext,
        invitee_id: i64,
        referral_code: &str,
    ) -> AppResult<InviteLinkResponse> {
        let code = referral_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(AppError::ValidationError(
                "Referral code is required".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        ledger_service::find_user(&txn, ctx, invitee_id).await?;
        let inviter = users::Entity::find()
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .filter(users::Column::ReferralCode.eq(code.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Referral code not found".to_string()))?;
        if inviter.id == invitee_id {
            return Err(AppError::ValidationError(
                "Cannot use your own referral code".to_string(),
            ));
        }

        let inserted = links::Entity::insert(links::ActiveModel {
            tenant_id: Set(ctx.tenant_id),
            inviter_id: Set(inviter.id),
            invitee_id: Set(invitee_id),
            phone_reward_at: Set(None),
            first_charge_reward_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([links::Column::TenantId, links::Column::InviteeId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(AppError::Conflict("Invitee is already linked".to_string()));
        }

        txn.commit().await?;
        log::info!(
            "invite linked: tenant={} inviter={} invitee={}",
            ctx.tenant_id,
            inviter.id,
            invitee_id
        );
        Ok(InviteLinkResponse {
            inviter_id: inviter.id,
            invitee_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::mile_transaction_entity as mt;
    use crate::test_support::*;
    use crate::utils::REFERRAL_ALPHABET;
    use sea_orm::PaginatorTrait;
    use std::collections::HashSet;

    fn service(db: &DatabaseConnection) -> ReferralService {
        ReferralService::new(db.clone(), ReferralConfig::default())
    }

    #[tokio::test]
    async fn referral_code_is_generated_once() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let svc = service(&db);

        let first = svc.ensure_referral_code(ctx, user.id).await.unwrap();
        assert_eq!(first.referral_code.len(), 8);
        assert!(
            first
                .referral_code
                .bytes()
                .all(|b| REFERRAL_ALPHABET.contains(&b))
        );

        let second = svc.ensure_referral_code(ctx, user.id).await.unwrap();
        assert_eq!(first.referral_code, second.referral_code);
    }

    #[tokio::test]
    async fn colliding_codes_are_retried_until_the_space_is_exhausted() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        // 单字符推荐码只有 32 种，冲突必然发生
        let tiny = ReferralConfig {
            code_length: 1,
            max_code_attempts: 1_000,
            ..ReferralConfig::default()
        };
        let svc = ReferralService::new(db.clone(), tiny.clone());

        let mut codes = HashSet::new();
        for _ in 0..REFERRAL_ALPHABET.len() {
            let user = insert_user(&db, ctx, 0).await;
            let code = svc.ensure_referral_code(ctx, user.id).await.unwrap();
            assert!(codes.insert(code.referral_code));
        }
        assert_eq!(codes.len(), REFERRAL_ALPHABET.len());

        let late = insert_user(&db, ctx, 0).await;
        let limited = ReferralService::new(
            db.clone(),
            ReferralConfig {
                max_code_attempts: 5,
                ..tiny.clone()
            },
        );
        let err = limited
            .ensure_referral_code(ctx, late.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let late = users::Entity::find_by_id(late.id).one(&db).await.unwrap().unwrap();
        assert!(late.referral_code.is_none());

        // 唯一性按租户划分
        let other_ctx = TenantContext::new(2);
        let other = insert_user(&db, other_ctx, 0).await;
        svc.ensure_referral_code(other_ctx, other.id).await.unwrap();
    }

    #[tokio::test]
    async fn invitee_links_once_and_never_to_self() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let inviter = insert_user(&db, ctx, 0).await;
        let invitee = insert_user(&db, ctx, 0).await;
        let svc = service(&db);
        let code = svc.ensure_referral_code(ctx, inviter.id).await.unwrap().referral_code;

        let err = svc.link_invitee(ctx, inviter.id, &code).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let link = svc
            .link_invitee(ctx, invitee.id, &code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(link.inviter_id, inviter.id);

        let err = svc.link_invitee(ctx, invitee.id, &code).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // 推荐码只在本租户内有效
        let outsider = insert_user(&db, TenantContext::new(2), 0).await;
        let err = svc
            .link_invitee(TenantContext::new(2), outsider.id, &code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn each_event_rewards_inviter_exactly_once() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let cfg = ReferralConfig::default();
        let inviter = insert_user(&db, ctx, 0).await;
        let invitee = insert_user(&db, ctx, 0).await;
        let svc = service(&db);
        let code = svc.ensure_referral_code(ctx, inviter.id).await.unwrap().referral_code;
        svc.link_invitee(ctx, invitee.id, &code).await.unwrap();

        let first = reward_invitee_event(&db, ctx, &cfg, invitee.id, ReferralEvent::PhoneVerified)
            .await
            .unwrap();
        assert_eq!(first, cfg.phone_verified_miles);
        let again = reward_invitee_event(&db, ctx, &cfg, invitee.id, ReferralEvent::PhoneVerified)
            .await
            .unwrap();
        assert_eq!(again, 0);

        let charge = reward_invitee_event(&db, ctx, &cfg, invitee.id, ReferralEvent::FirstCharge)
            .await
            .unwrap();
        assert_eq!(charge, cfg.first_charge_miles);

        let inviter = users::Entity::find_by_id(inviter.id).one(&db).await.unwrap().unwrap();
        assert_eq!(
            inviter.miles,
            cfg.phone_verified_miles + cfg.first_charge_miles
        );
        assert_eq!(mt::Entity::find().count(&db).await.unwrap(), 2);

        // 没有邀请关系的用户不触发奖励
        let loner = insert_user(&db, ctx, 0).await;
        let none = reward_invitee_event(&db, ctx, &cfg, loner.id, ReferralEvent::FirstCharge)
            .await
            .unwrap();
        assert_eq!(none, 0);
    }
}
