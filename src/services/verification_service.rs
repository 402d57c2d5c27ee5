use crate::config::{ReferralConfig, SmsConfig};
use crate::entities::{phone_verification_code_entity as codes, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::SmsSender;
use crate::models::{SendCodeResponse, TenantContext, VerifyCodeResponse};
use crate::services::referral_service::{self, ReferralEvent};
use crate::utils::{generate_numeric_code, normalize_phone, validate_phone};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct VerificationService {
    pool: DatabaseConnection,
    sender: Arc<dyn SmsSender>,
    sms_config: SmsConfig,
    referral_config: ReferralConfig,
}

impl VerificationService {
    pub fn new(
        pool: DatabaseConnection,
        sender: Arc<dyn SmsSender>,
        sms_config: SmsConfig,
        referral_config: ReferralConfig,
    ) -> Self {
        Self {
            pool,
            sender,
            sms_config,
            referral_config,
        }
    }

    /// 发送手机验证码（按用户滚动窗口限流）
    pub async fn send_code(
        &self,
        ctx: TenantContext,
        user_id: i64,
        phone: &str,
    ) -> AppResult<SendCodeResponse> {
        let phone = normalize_phone(phone);
        validate_phone(&phone)?;

        // 锁住用户行，计数与写入之间不会有并发请求插队
        let txn = self.pool.begin().await?;
        users::Entity::find_by_id(user_id)
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let now = Utc::now();
        let window_start = now - Duration::minutes(self.sms_config.rate_limit_window_minutes);
        let recent = codes::Entity::find()
            .filter(codes::Column::TenantId.eq(ctx.tenant_id))
            .filter(codes::Column::UserId.eq(user_id))
            .filter(codes::Column::CreatedAt.gte(window_start))
            .count(&txn)
            .await?;
        if recent >= self.sms_config.rate_limit_max {
            return Err(AppError::RateLimited(format!(
                "At most {} codes per {} minutes",
                self.sms_config.rate_limit_max, self.sms_config.rate_limit_window_minutes
            )));
        }

        let code = generate_numeric_code(self.sms_config.code_length);
        codes::ActiveModel {
            tenant_id: Set(ctx.tenant_id),
            user_id: Set(user_id),
            phone: Set(phone.clone()),
            code: Set(code.clone()),
            expires_at: Set(now + Duration::minutes(self.sms_config.code_ttl_minutes)),
            consumed_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 短信发送失败时回滚，不占用限流额度
        self.sender
            .send_verification_code(&phone, &code, self.sms_config.code_ttl_minutes)
            .await?;
        txn.commit().await?;

        Ok(SendCodeResponse {
            expires_in: self.sms_config.code_ttl_minutes * 60,
        })
    }

    /// 校验验证码：只接受最新一条未使用且未过期的验证码
    pub async fn verify_code(
        &self,
        ctx: TenantContext,
        user_id: i64,
        code: &str,
    ) -> AppResult<VerifyCodeResponse> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::ValidationError(
                "Verification code is required".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let latest = codes::Entity::find()
            .filter(codes::Column::TenantId.eq(ctx.tenant_id))
            .filter(codes::Column::UserId.eq(user_id))
            .filter(codes::Column::ConsumedAt.is_null())
            .filter(codes::Column::ExpiresAt.gt(now))
            .order_by_desc(codes::Column::Id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError("No active verification code".to_string())
            })?;
        if latest.code != code {
            return Err(AppError::ValidationError(
                "Invalid verification code".to_string(),
            ));
        }

        let consumed = codes::Entity::update_many()
            .col_expr(codes::Column::ConsumedAt, Expr::value(now))
            .filter(codes::Column::Id.eq(latest.id))
            .filter(codes::Column::ConsumedAt.is_null())
            .exec(&txn)
            .await?;
        if consumed.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Verification code already used".to_string(),
            ));
        }

        users::Entity::update_many()
            .col_expr(users::Column::Phone, Expr::value(latest.phone.clone()))
            .col_expr(users::Column::PhoneVerifiedAt, Expr::value(now))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .exec(&txn)
            .await?;

        let referral_miles = referral_service::reward_invitee_event(
            &txn,
            ctx,
            &self.referral_config,
            user_id,
            ReferralEvent::PhoneVerified,
        )
        .await?;

        txn.commit().await?;
        log::info!(
            "phone verified: tenant={} user={}",
            ctx.tenant_id,
            user_id
        );

        Ok(VerifyCodeResponse {
            phone: latest.phone,
            verified_at: now,
            referral_miles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ReferralService;
    use crate::test_support::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSender {
        fn last_code(&self) -> String {
            self.sent.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl SmsSender for RecordingSender {
        async fn send_verification_code(
            &self,
            phone: &str,
            code: &str,
            _ttl_minutes: i64,
        ) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), code.to_string()));
            Ok(())
        }
    }

    fn service(db: &DatabaseConnection, sender: Arc<RecordingSender>) -> VerificationService {
        let sms = SmsConfig {
            rate_limit_max: 2,
            ..SmsConfig::default()
        };
        VerificationService::new(db.clone(), sender, sms, ReferralConfig::default())
    }

    #[tokio::test]
    async fn verified_code_marks_phone_and_rewards_inviter() {
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

        let sender = Arc::new(RecordingSender::default());
        let svc = service(&db, sender.clone());
        let res = svc
            .send_code(ctx, invitee.id, "+1 (555) 010-2030")
            .await
            .unwrap();
        assert_eq!(res.expires_in, 300);
        let sms_code = sender.last_code();
        assert_eq!(sms_code.len(), 6);

        let err = svc.verify_code(ctx, invitee.id, "not-it").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let verified = svc.verify_code(ctx, invitee.id, &sms_code).await.unwrap();
        assert_eq!(verified.phone, "+15550102030");
        assert_eq!(
            verified.referral_miles,
            ReferralConfig::default().phone_verified_miles
        );

        // 同一验证码不能再次使用
        let err = svc.verify_code(ctx, invitee.id, &sms_code).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let invitee = users::Entity::find_by_id(invitee.id).one(&db).await.unwrap().unwrap();
        assert!(invitee.phone_verified_at.is_some());
        let inviter = users::Entity::find_by_id(inviter.id).one(&db).await.unwrap().unwrap();
        assert_eq!(inviter.miles, ReferralConfig::default().phone_verified_miles);
    }

    #[tokio::test]
    async fn send_code_is_rate_limited_per_user() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let other = insert_user(&db, ctx, 0).await;
        let sender = Arc::new(RecordingSender::default());
        let svc = service(&db, sender.clone());

        svc.send_code(ctx, user.id, "+15550102030").await.unwrap();
        svc.send_code(ctx, user.id, "+15550102030").await.unwrap();
        let err = svc.send_code(ctx, user.id, "+15550102030").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));

        svc.send_code(ctx, other.id, "+15550102031").await.unwrap();
        assert_eq!(sender.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_sends_respect_the_window_limit() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let sender = Arc::new(RecordingSender::default());
        let svc = service(&db, sender.clone());

        let (a, b, c) = tokio::join!(
            svc.send_code(ctx, user.id, "+15550102030"),
            svc.send_code(ctx, user.id, "+15550102030"),
            svc.send_code(ctx, user.id, "+15550102030"),
        );
        let results = [a, b, c];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AppError::RateLimited(_))))
        );
        let stored = codes::Entity::find().count(&db).await.unwrap();
        assert_eq!(stored, 2);
    }

    struct FailingSender;

    #[async_trait]
    impl SmsSender for FailingSender {
        async fn send_verification_code(&self, _: &str, _: &str, _: i64) -> AppResult<()> {
            Err(AppError::ExternalApiError("gateway down".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_delivery_does_not_use_up_the_limit() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let failing = VerificationService::new(
            db.clone(),
            Arc::new(FailingSender),
            SmsConfig::default(),
            ReferralConfig::default(),
        );

        let err = failing
            .send_code(ctx, user.id, "+15550102030")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
        assert_eq!(codes::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn only_the_newest_code_is_accepted() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let sender = Arc::new(RecordingSender::default());
        let svc = service(&db, sender.clone());

        svc.send_code(ctx, user.id, "+15550102030").await.unwrap();
        let first = sender.last_code();
        svc.send_code(ctx, user.id, "+15550102030").await.unwrap();
        let second = sender.last_code();

        if first != second {
            let err = svc.verify_code(ctx, user.id, &first).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
        svc.verify_code(ctx, user.id, &second).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_phone_is_rejected() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let sender = Arc::new(RecordingSender::default());

        let err = service(&db, sender.clone())
            .send_code(ctx, user.id, "5550102030")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
