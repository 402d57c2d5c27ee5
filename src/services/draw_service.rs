use crate::config::DrawConfig;
use crate::entities::{
    LedgerCategory, PackStatus, draw_entity as draws, pack_entity as packs,
    pack_prize_entity as slots, prize_entity as prizes, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    DrawRecordQuery, DrawRecordResponse, DrawRequest, DrawSettlementResponse, PackResponse,
    PackSlotResponse, PaginatedResponse, PaginationParams, TenantContext, WonPrize,
};
use crate::services::ledger_service::{self, Currency, LedgerPosting};
use crate::utils::{pick_secure, total_weight};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct DrawService {
    pool: DatabaseConnection,
    draw_config: DrawConfig,
}

impl DrawService {
    pub fn new(pool: DatabaseConnection, draw_config: DrawConfig) -> Self {
        Self { pool, draw_config }
    }

    /// 抽取结算
    ///
    /// 逻辑:
    /// 1. 校验抽取次数 (1 或连抽数)
    /// 2. 锁定卡包、用户与全部槽位 (FOR UPDATE)
    /// 3. 校验开放状态、同意条款、每人上限、余额
    /// 4. 逐次在内存视图上加权抽取，并以 `>= 1` 条件扣减槽位与卡包库存
    /// 5. 扣减点数并写入一条 DRAW 流水，库存归零时标记 sold_out
    /// 6. 每次抽取写一条记录，全部在同一事务内提交
    ///
    /// 试抽只写抽取记录 (is_trial = true)，不动库存、余额与流水。
    pub async fn settle_draw(
        &self,
        ctx: TenantContext,
        user_id: i64,
        pack_id: i64,
        req: DrawRequest,
    ) -> AppResult<DrawSettlementResponse> {
        if req.count != 1 && req.count != self.draw_config.bulk_size {
            return Err(AppError::ValidationError(format!(
                "Draw count must be 1 or {}",
                self.draw_config.bulk_size
            )));
        }
        let n = i64::from(req.count);

        let txn = self.pool.begin().await?;

        let pack = packs::Entity::find_by_id(pack_id)
            .filter(packs::Column::TenantId.eq(ctx.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Pack not found".to_string()))?;
        if !pack.is_open_at(Utc::now()) {
            return Err(AppError::PackNotActive);
        }

        let user = users::Entity::find_by_id(user_id)
            .filter(users::Column::TenantId.eq(ctx.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let cost = pack
            .price
            .checked_mul(n)
            .ok_or_else(|| AppError::ValidationError("Draw cost overflows".to_string()))?;

        if !req.trial {
            if user.terms_accepted_at.is_none() {
                return Err(AppError::ConsentRequired);
            }
            if let Some(limit) = pack.per_user_limit {
                let drawn = count_real_draws(&txn, ctx, user_id, pack_id).await?;
                if drawn + n > limit {
                    return Err(AppError::PerUserLimitExceeded);
                }
            }
            if user.balance < cost {
                return Err(AppError::InsufficientBalance);
            }
            if pack.remaining_stock < n {
                return Err(AppError::InsufficientStock);
            }
        }

        let mut pool_view = slots::Entity::find()
            .filter(slots::Column::TenantId.eq(ctx.tenant_id))
            .filter(slots::Column::PackId.eq(pack_id))
            .order_by_asc(slots::Column::SortOrder)
            .order_by_asc(slots::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;
        if total_weight(&pool_view) == 0 {
            log::error!(
                "pack {} of tenant {} has no selectable prize slots",
                pack_id,
                ctx.tenant_id
            );
            return Err(AppError::InternalError(
                "Pack has no selectable prize slots".to_string(),
            ));
        }

        let batch_id = Uuid::new_v4();
        let mut won: Vec<(i64, i64)> = Vec::with_capacity(req.count as usize);

        for _ in 0..n {
            let idx = pick_secure(&pool_view).ok_or(AppError::InsufficientStock)?;
            pool_view[idx].remaining_quantity -= 1;
            let slot_id = pool_view[idx].id;
            won.push((slot_id, pool_view[idx].prize_id));

            if !req.trial {
                decrement_slot(&txn, slot_id).await?;
                decrement_pack(&txn, pack.id).await?;
            }
        }

        let (balance, remaining_stock, pack_status) = if req.trial {
            (user.balance, pack.remaining_stock, pack.status)
        } else {
            let balance = ledger_service::post(
                &txn,
                ctx,
                Currency::Credits,
                LedgerPosting::new(user_id, -cost, LedgerCategory::Draw)
                    .describe(format!("{} x {}", pack.title, n))
                    .reference(batch_id),
            )
            .await?;

            let remaining_stock = pack.remaining_stock - n;
            let mut status = pack.status;
            if remaining_stock == 0 {
                let mut am = pack.clone().into_active_model();
                am.status = Set(PackStatus::SoldOut);
                am.updated_at = Set(Utc::now());
                am.update(&txn).await?;
                status = PackStatus::SoldOut;
                log::info!("pack {} of tenant {} sold out", pack.id, ctx.tenant_id);
            }
            (balance, remaining_stock, status)
        };

        let prize_ids: Vec<i64> = won.iter().map(|(_, prize_id)| *prize_id).collect();
        let prize_map: HashMap<i64, prizes::Model> = prizes::Entity::find()
            .filter(prizes::Column::TenantId.eq(ctx.tenant_id))
            .filter(prizes::Column::Id.is_in(prize_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let now = Utc::now();
        let mut won_prizes = Vec::with_capacity(won.len());
        for (slot_id, prize_id) in won {
            let record = draws::ActiveModel {
                tenant_id: Set(ctx.tenant_id),
                user_id: Set(user_id),
                pack_id: Set(pack.id),
                pack_prize_id: Set(slot_id),
                prize_id: Set(prize_id),
                batch_id: Set(batch_id),
                unit_price: Set(pack.price),
                is_trial: Set(req.trial),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let prize = prize_map.get(&prize_id).ok_or_else(|| {
                AppError::InternalError(format!("Prize {prize_id} missing for slot {slot_id}"))
            })?;
            won_prizes.push(WonPrize {
                draw_id: record.id,
                prize_id,
                prize_name: prize.name.clone(),
                exchange_value: prize.exchange_value,
            });
        }

        txn.commit().await?;

        log::info!(
            "draw settled: tenant={} user={} pack={} count={} trial={} batch={}",
            ctx.tenant_id,
            user_id,
            pack_id,
            n,
            req.trial,
            batch_id
        );

        Ok(DrawSettlementResponse {
            batch_id,
            is_trial: req.trial,
            prizes: won_prizes,
            remaining_stock,
            pack_status,
            balance,
        })
    }

    /// 上架卡包：draft -> active
    ///
    /// 要求剩余库存大于 0，且可抽槽位的剩余数量之和不少于卡包剩余库存。
    pub async fn activate_pack(&self, ctx: TenantContext, pack_id: i64) -> AppResult<PackResponse> {
        let txn = self.pool.begin().await?;

        let pack = packs::Entity::find_by_id(pack_id)
            .filter(packs::Column::TenantId.eq(ctx.tenant_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Pack not found".to_string()))?;
        if pack.status != PackStatus::Draft {
            return Err(AppError::Conflict(format!(
                "Pack is {} and cannot be activated",
                pack.status
            )));
        }
        if pack.remaining_stock <= 0 {
            return Err(AppError::ValidationError(
                "Pack has no stock to activate".to_string(),
            ));
        }

        let slot_list = slots::Entity::find()
            .filter(slots::Column::TenantId.eq(ctx.tenant_id))
            .filter(slots::Column::PackId.eq(pack_id))
            .all(&txn)
            .await?;
        let slot_stock: i64 = slot_list
            .iter()
            .filter(|s| s.is_eligible())
            .map(|s| s.remaining_quantity)
            .sum();
        if slot_stock < pack.remaining_stock {
            return Err(AppError::ValidationError(format!(
                "Prize slots hold {} units but pack stock is {}",
                slot_stock, pack.remaining_stock
            )));
        }

        let mut am = pack.into_active_model();
        am.status = Set(PackStatus::Active);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&txn).await?;
        txn.commit().await?;

        log::info!("pack {} of tenant {} activated", pack_id, ctx.tenant_id);
        Ok(updated.into())
    }

    pub async fn get_pack(&self, ctx: TenantContext, pack_id: i64) -> AppResult<PackResponse> {
        let pack = packs::Entity::find_by_id(pack_id)
            .filter(packs::Column::TenantId.eq(ctx.tenant_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Pack not found".to_string()))?;
        Ok(pack.into())
    }

    /// 奖池槽位列表（包含已抽完的槽位）
    pub async fn list_slots(
        &self,
        ctx: TenantContext,
        pack_id: i64,
    ) -> AppResult<Vec<PackSlotResponse>> {
        self.get_pack(ctx, pack_id).await?;
        let list = slots::Entity::find()
            .filter(slots::Column::TenantId.eq(ctx.tenant_id))
            .filter(slots::Column::PackId.eq(pack_id))
            .order_by_asc(slots::Column::SortOrder)
            .order_by_asc(slots::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 用户抽取记录（分页，最新在前）
    pub async fn list_user_draws(
        &self,
        ctx: TenantContext,
        user_id: i64,
        query: &DrawRecordQuery,
    ) -> AppResult<PaginatedResponse<DrawRecordResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base = draws::Entity::find()
            .filter(draws::Column::TenantId.eq(ctx.tenant_id))
            .filter(draws::Column::UserId.eq(user_id));

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(draws::Column::Id)
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

async fn count_real_draws<C: ConnectionTrait>(
    conn: &C,
    ctx: TenantContext,
    user_id: i64,
    pack_id: i64,
) -> AppResult<i64> {
    let count = draws::Entity::find()
        .filter(draws::Column::TenantId.eq(ctx.tenant_id))
        .filter(draws::Column::UserId.eq(user_id))
        .filter(draws::Column::PackId.eq(pack_id))
        .filter(draws::Column::IsTrial.eq(false))
        .count(conn)
        .await?;
    Ok(count as i64)
}

// 乐观扣减: update where remaining_quantity >= 1
async fn decrement_slot<C: ConnectionTrait>(conn: &C, slot_id: i64) -> AppResult<()> {
    let res = slots::Entity::update_many()
        .col_expr(
            slots::Column::RemainingQuantity,
            Expr::col(slots::Column::RemainingQuantity).sub(1),
        )
        .filter(slots::Column::Id.eq(slot_id))
        .filter(slots::Column::RemainingQuantity.gte(1))
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::InsufficientStock);
    }
    Ok(())
}

async fn decrement_pack<C: ConnectionTrait>(conn: &C, pack_id: i64) -> AppResult<()> {
    let res = packs::Entity::update_many()
        .col_expr(
            packs::Column::RemainingStock,
            Expr::col(packs::Column::RemainingStock).sub(1),
        )
        .filter(packs::Column::Id.eq(pack_id))
        .filter(packs::Column::RemainingStock.gte(1))
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::InsufficientStock);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::balance_transaction_entity as bt;
    use crate::test_support::*;

    fn service(db: &DatabaseConnection) -> DrawService {
        DrawService::new(db.clone(), DrawConfig { bulk_size: 10 })
    }

    fn single() -> DrawRequest {
        DrawRequest {
            count: 1,
            trial: false,
        }
    }

    async fn reload_pack(db: &DatabaseConnection, id: i64) -> packs::Model {
        packs::Entity::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn single_draw_settles_stock_balance_and_ledger() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 500).await;
        let pack = insert_pack(&db, ctx, 100, 3, PackStatus::Active).await;
        let slot = insert_slot(&db, ctx, &pack, "Holo", 1, 3).await;

        let res = service(&db)
            .settle_draw(ctx, user.id, pack.id, single())
            .await
            .unwrap();
        assert_eq!(res.prizes.len(), 1);
        assert_eq!(res.prizes[0].prize_name, "Holo");
        assert_eq!(res.balance, 400);
        assert_eq!(res.remaining_stock, 2);

        let slot = slots::Entity::find_by_id(slot.id).one(&db).await.unwrap().unwrap();
        assert_eq!(slot.remaining_quantity, 2);
        let entries = bt::Entity::find().all(&db).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, -100);
        assert_eq!(entries[0].balance_after, 400);
        assert_eq!(entries[0].category, LedgerCategory::Draw);
        assert_eq!(entries[0].reference_id, Some(res.batch_id.to_string()));
    }

    #[tokio::test]
    async fn bulk_draw_shares_one_batch_and_one_ledger_entry() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 1000).await;
        let pack = insert_pack(&db, ctx, 10, 20, PackStatus::Active).await;
        insert_slot(&db, ctx, &pack, "A", 1, 10).await;
        insert_slot(&db, ctx, &pack, "B", 1, 10).await;

        let res = service(&db)
            .settle_draw(
                ctx,
                user.id,
                pack.id,
                DrawRequest {
                    count: 10,
                    trial: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(res.prizes.len(), 10);
        assert_eq!(res.balance, 900);

        let records = draws::Entity::find().all(&db).await.unwrap();
        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.batch_id == res.batch_id));
        assert_eq!(bt::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn draw_count_must_be_single_or_bulk() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 1000).await;
        let pack = insert_pack(&db, ctx, 10, 20, PackStatus::Active).await;
        insert_slot(&db, ctx, &pack, "A", 1, 20).await;

        let err = service(&db)
            .settle_draw(
                ctx,
                user.id,
                pack.id,
                DrawRequest {
                    count: 3,
                    trial: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn trial_draws_leave_stock_balance_and_ledger_untouched() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 0).await;
        let pack = insert_pack(&db, ctx, 100, 5, PackStatus::Active).await;
        let slot = insert_slot(&db, ctx, &pack, "A", 1, 5).await;

        let res = service(&db)
            .settle_draw(
                ctx,
                user.id,
                pack.id,
                DrawRequest {
                    count: 1,
                    trial: true,
                },
            )
            .await
            .unwrap();
        assert!(res.is_trial);
        assert_eq!(res.balance, 0);
        assert_eq!(res.remaining_stock, 5);

        assert_eq!(reload_pack(&db, pack.id).await.remaining_stock, 5);
        let slot = slots::Entity::find_by_id(slot.id).one(&db).await.unwrap().unwrap();
        assert_eq!(slot.remaining_quantity, 5);
        assert_eq!(bt::Entity::find().count(&db).await.unwrap(), 0);
        let records = draws::Entity::find().all(&db).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_trial);
    }

    #[tokio::test]
    async fn exhausted_slot_is_never_over_awarded() {
        // A(1,1) / B(99,1000)，抽 1000 次
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 1000).await;
        let pack = insert_pack(&db, ctx, 1, 1001, PackStatus::Active).await;
        let a = insert_slot(&db, ctx, &pack, "A", 1, 1).await;
        let b = insert_slot(&db, ctx, &pack, "B", 99, 1000).await;

        let svc = service(&db);
        let mut a_wins = 0i64;
        for _ in 0..100 {
            let res = svc
                .settle_draw(
                    ctx,
                    user.id,
                    pack.id,
                    DrawRequest {
                        count: 10,
                        trial: false,
                    },
                )
                .await
                .unwrap();
            a_wins += res.prizes.iter().filter(|p| p.prize_name == "A").count() as i64;
        }
        assert!(a_wins <= 1);

        let a = slots::Entity::find_by_id(a.id).one(&db).await.unwrap().unwrap();
        let b = slots::Entity::find_by_id(b.id).one(&db).await.unwrap().unwrap();
        assert_eq!(a.remaining_quantity, 1 - a_wins);
        assert_eq!(b.remaining_quantity, 1000 - (1000 - a_wins));

        let pack = reload_pack(&db, pack.id).await;
        let real = count_real_draws(&db, ctx, user.id, pack.id).await.unwrap();
        assert_eq!(pack.remaining_stock, pack.total_stock - real);
        assert_eq!(pack.remaining_stock, 1);
    }

    #[tokio::test]
    async fn concurrent_draws_never_overdraw_balance() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 100).await;
        let pack = insert_pack(&db, ctx, 60, 10, PackStatus::Active).await;
        insert_slot(&db, ctx, &pack, "A", 1, 10).await;

        let svc = service(&db);
        let (first, second) = tokio::join!(
            svc.settle_draw(ctx, user.id, pack.id, single()),
            svc.settle_draw(ctx, user.id, pack.id, single()),
        );

        let results = [first, second];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AppError::InsufficientBalance)))
        );

        let user = users::Entity::find_by_id(user.id).one(&db).await.unwrap().unwrap();
        assert_eq!(user.balance, 40);
        assert_eq!(reload_pack(&db, pack.id).await.remaining_stock, 9);
    }

    #[tokio::test]
    async fn last_unit_marks_pack_sold_out() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 100).await;
        let pack = insert_pack(&db, ctx, 10, 1, PackStatus::Active).await;
        insert_slot(&db, ctx, &pack, "A", 1, 1).await;

        let svc = service(&db);
        let res = svc.settle_draw(ctx, user.id, pack.id, single()).await.unwrap();
        assert_eq!(res.remaining_stock, 0);
        assert_eq!(res.pack_status, PackStatus::SoldOut);

        let err = svc
            .settle_draw(ctx, user.id, pack.id, single())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PackNotActive));
    }

    #[tokio::test]
    async fn bulk_draw_beyond_stock_is_rejected_atomically() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 1000).await;
        let pack = insert_pack(&db, ctx, 10, 5, PackStatus::Active).await;
        insert_slot(&db, ctx, &pack, "A", 1, 5).await;

        let err = service(&db)
            .settle_draw(
                ctx,
                user.id,
                pack.id,
                DrawRequest {
                    count: 10,
                    trial: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock));
        assert_eq!(reload_pack(&db, pack.id).await.remaining_stock, 5);
        assert_eq!(draws::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn preconditions_have_distinct_errors() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let user = insert_user(&db, ctx, 1000).await;
        let svc = service(&db);

        let draft = insert_pack(&db, ctx, 10, 5, PackStatus::Draft).await;
        insert_slot(&db, ctx, &draft, "A", 1, 5).await;
        let err = svc.settle_draw(ctx, user.id, draft.id, single()).await.unwrap_err();
        assert!(matches!(err, AppError::PackNotActive));

        let limited = insert_pack(&db, ctx, 10, 5, PackStatus::Active).await;
        insert_slot(&db, ctx, &limited, "A", 1, 5).await;
        let mut am = limited.clone().into_active_model();
        am.per_user_limit = Set(Some(1));
        am.update(&db).await.unwrap();
        svc.settle_draw(ctx, user.id, limited.id, single()).await.unwrap();
        let err = svc
            .settle_draw(ctx, user.id, limited.id, single())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PerUserLimitExceeded));

        let open = insert_pack(&db, ctx, 10, 5, PackStatus::Active).await;
        insert_slot(&db, ctx, &open, "A", 1, 5).await;
        let poor = insert_user(&db, ctx, 5).await;
        let err = svc.settle_draw(ctx, poor.id, open.id, single()).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));

        let mut am = user.clone().into_active_model();
        am.terms_accepted_at = Set(None);
        am.update(&db).await.unwrap();
        let err = svc.settle_draw(ctx, user.id, open.id, single()).await.unwrap_err();
        assert!(matches!(err, AppError::ConsentRequired));

        let err = svc
            .settle_draw(TenantContext::new(2), user.id, open.id, single())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn activation_requires_consistent_slot_stock() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let svc = service(&db);

        let pack = insert_pack(&db, ctx, 10, 10, PackStatus::Draft).await;
        insert_slot(&db, ctx, &pack, "A", 1, 4).await;
        insert_slot(&db, ctx, &pack, "B", 0, 6).await;
        let err = svc.activate_pack(ctx, pack.id).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        insert_slot(&db, ctx, &pack, "C", 2, 6).await;
        let activated = svc.activate_pack(ctx, pack.id).await.unwrap();
        assert_eq!(activated.status, PackStatus::Active);

        let err = svc.activate_pack(ctx, pack.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn slot_listing_includes_exhausted_slots() {
        let db = setup_db().await;
        let ctx = TenantContext::new(1);
        let pack = insert_pack(&db, ctx, 10, 5, PackStatus::Active).await;
        insert_slot(&db, ctx, &pack, "A", 1, 5).await;
        insert_slot(&db, ctx, &pack, "B", 1, 0).await;

        let list = service(&db).list_slots(ctx, pack.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().filter(|s| s.selectable).count(), 1);

        let err = service(&db)
            .list_slots(TenantContext::new(2), pack.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
