use crate::handlers::auth_from_request;
use crate::models::*;
use crate::services::{LedgerService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/me",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取用户资料成功", body = UserProfileResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match user_service.get_user_profile(auth.tenant, auth.user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": profile }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/me/consent",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已同意条款", body = UserProfileResponse),
        (status = 401, description = "未授权")
    )
)]
/// 同意条款后才能进行真实抽取
pub async fn accept_terms(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match user_service.accept_terms(auth.tenant, auth.user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": profile }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/wallet",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取钱包成功", body = WalletResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_wallet(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger_service.get_wallet(auth.tenant, auth.user_id).await {
        Ok(wallet) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": wallet }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/transactions",
    tag = "user",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取点数流水成功", body = LedgerEntryPage),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_balance_transactions(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    query: web::Query<LedgerQuery>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger_service
        .list_balance_transactions(auth.tenant, auth.user_id, &query.into_inner())
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/miles",
    tag = "user",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取里程流水成功", body = LedgerEntryPage),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_mile_transactions(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    query: web::Query<LedgerQuery>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match ledger_service
        .list_mile_transactions(auth.tenant, auth.user_id, &query.into_inner())
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// `/me` 下的路由分散在多个模块，这里不使用 scope
pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(get_profile))
        .route("/me/consent", web::post().to(accept_terms))
        .route("/me/wallet", web::get().to(get_wallet))
        .route("/me/transactions", web::get().to(list_balance_transactions))
        .route("/me/miles", web::get().to(list_mile_transactions));
}
