use crate::entities::{invite_link_entity as links, user_entity as users};
use crate::error::AppResult;
use crate::models::{TenantContext, UserProfileResponse};
use crate::services::ledger_service;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 获取用户资料
    pub async fn get_user_profile(
        &self,
        ctx: TenantContext,
        user_id: i64,
    ) -> AppResult<UserProfileResponse> {
        let user = ledger_service::find_user(&self.pool, ctx, user_id).await?;

        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let total_invitees = links::Entity::find()
            .filter(links::Column::TenantId.eq(ctx.tenant_id))
            .filter(links::Column::InviterId.eq(user_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let mut profile = UserProfileResponse::from(user);
        profile.total_invitees = total_invitees;
        Ok(profile)
    }

    /// 记录同意条款；已同意时保留最早的时间
    pub async fn accept_terms(
        &self,
        ctx: TenantContext,
        user_id: i64,
    ) -> AppResult<UserProfileResponse> {
        users::Entity::update_many()
            .col_expr(users::Column::TermsAcceptedAt, Expr::value(Utc::now()))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .filter(users::Column::TermsAcceptedAt.is_null())
            .exec(&self.pool)
            .await?;
        self.get_user_profile(ctx, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::test_support::*;
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    #[tokio::test]
    async fn accepting_terms_is_idempotent() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let mut am = user.clone().into_active_model();
        am.terms_accepted_at = Set(None);
        am.update(&db).await.unwrap();
        let svc = UserService::new(db.clone());

        let first = svc.accept_terms(ctx, user.id).await.unwrap();
        let accepted_at = first.terms_accepted_at.unwrap();
        let second = svc.accept_terms(ctx, user.id).await.unwrap();
        assert_eq!(second.terms_accepted_at, Some(accepted_at));

        let err = svc
            .accept_terms(TenantContext::new(2), user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_counts_invitees() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let inviter = insert_user(&db, ctx, 0).await;
        for _ in 0..2 {
            let invitee = insert_user(&db, ctx, 0).await;
            links::ActiveModel {
                tenant_id: Set(ctx.tenant_id),
                inviter_id: Set(inviter.id),
                invitee_id: Set(invitee.id),
                phone_reward_at: Set(None),
                first_charge_reward_at: Set(None),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let profile = UserService::new(db.clone())
            .get_user_profile(ctx, inviter.id)
            .await
            .unwrap();
        assert_eq!(profile.total_invitees, 2);
        assert!(!profile.phone_verified);
    }
}
