use crate::entities::{
    LedgerCategory, balance_transaction_entity as bt, mile_transaction_entity as mt,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerEntryResponse, LedgerQuery, PaginatedResponse, PaginationParams, TenantContext,
    WalletResponse,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// 两种独立的账户余额
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Credits,
    Miles,
}

impl Currency {
    fn column(self) -> users::Column {
        match self {
            Currency::Credits => users::Column::Balance,
            Currency::Miles => users::Column::Miles,
        }
    }

    fn read(self, user: &users::Model) -> i64 {
        match self {
            Currency::Credits => user.balance,
            Currency::Miles => user.miles,
        }
    }

    fn insufficient(self) -> AppError {
        match self {
            Currency::Credits => AppError::InsufficientBalance,
            Currency::Miles => AppError::InsufficientMiles,
        }
    }
}

/// 一条待记账的余额变动
#[derive(Debug, Clone)]
pub struct LedgerPosting {
    pub user_id: i64,
    /// 有符号金额，扣减为负数
    pub amount: i64,
    pub category: LedgerCategory,
    pub description: Option<String>,
    pub reference_id: Option<String>,
}

impl LedgerPosting {
    pub fn new(user_id: i64, amount: i64, category: LedgerCategory) -> Self {
        Self {
            user_id,
            amount,
            category,
            description: None,
            reference_id: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn reference(mut self, reference_id: impl ToString) -> Self {
        self.reference_id = Some(reference_id.to_string());
        self
    }
}

/// 变更余额并追加一条流水，返回变动后的余额。
///
/// 必须在调用方的事务内执行。扣减使用带条件的 UPDATE
/// (`col >= -amount`)，余额永远不会变为负数。
pub async fn post<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    currency: Currency,
    posting: LedgerPosting,
) -> AppResult<i64> {
    let column = currency.column();

    let mut update = users::Entity::update_many()
        .col_expr(column, Expr::col(column).add(posting.amount))
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(posting.user_id))
        .filter(users::Column::TenantId.eq(ctx.tenant_id));
    if posting.amount < 0 {
        update = update.filter(column.gte(-posting.amount));
    }
    let result = update.exec(conn).await?;

    let user = find_user(conn, ctx, posting.user_id).await?;
    if result.rows_affected == 0 {
        // 用户存在但更新失败，说明余额不足
        return Err(currency.insufficient());
    }
    let balance_after = currency.read(&user);

    let now = Utc::now();
    match currency {
        Currency::Credits => {
            bt::ActiveModel {
                tenant_id: Set(ctx.tenant_id),
                user_id: Set(posting.user_id),
                amount: Set(posting.amount),
                balance_after: Set(balance_after),
                category: Set(posting.category),
                description: Set(posting.description),
                reference_id: Set(posting.reference_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
        Currency::Miles => {
            mt::ActiveModel {
                tenant_id: Set(ctx.tenant_id),
                user_id: Set(posting.user_id),
                amount: Set(posting.amount),
                balance_after: Set(balance_after),
                category: Set(posting.category),
                description: Set(posting.description),
                reference_id: Set(posting.reference_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(balance_after)
}

/// 按租户查找用户，其它租户的用户视为不存在
pub async fn find_user<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    user_id: i64,
) -> AppResult<users::Model> {
    users::Entity::find_by_id(user_id)
        .filter(users::Column::TenantId.eq(ctx.tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_wallet(&self, ctx: TenantContext, user_id: i64) -> AppResult<WalletResponse> {
        let user = find_user(&self.pool, ctx, user_id).await?;
        Ok(WalletResponse {
            balance: user.balance,
            miles: user.miles,
            lifetime_charged: user.lifetime_charged,
            reward_tier: user.reward_tier,
        })
    }

    /// 点数流水（倒序分页）
    pub async fn list_balance_transactions(
        &self,
        ctx: TenantContext,
        user_id: i64,
        query: &LedgerQuery,
    ) -> AppResult<PaginatedResponse<LedgerEntryResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base = bt::Entity::find()
            .filter(bt::Column::TenantId.eq(ctx.tenant_id))
            .filter(bt::Column::UserId.eq(user_id));

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(bt::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 里程流水（倒序分页）
    pub async fn list_mile_transactions(
        &self,
        ctx: TenantContext,
        user_id: i64,
        query: &LedgerQuery,
    ) -> AppResult<PaginatedResponse<LedgerEntryResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base = mt::Entity::find()
            .filter(mt::Column::TenantId.eq(ctx.tenant_id))
            .filter(mt::Column::UserId.eq(user_id));

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(mt::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }
}
