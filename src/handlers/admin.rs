use crate::entities::ConfigDomain;
use crate::error::AppError;
use crate::handlers::auth_from_request;
use crate::models::*;
use crate::services::{ConfigVersionService, DrawService, RewardService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 管理员身份校验
fn admin_from_request(req: &HttpRequest) -> Result<AuthContext, AppError> {
    let auth = auth_from_request(req)?;
    if !auth.is_admin {
        return Err(AppError::PermissionDenied);
    }
    Ok(auth)
}

/// 版本记录中的操作人
fn actor(auth: &AuthContext) -> String {
    format!("admin:{}", auth.user_id)
}

#[utoipa::path(
    post,
    path = "/admin/packs/{id}/activate",
    tag = "admin",
    params(("id" = i64, Path, description = "卡包ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "卡包已开售", body = PackResponse),
        (status = 400, description = "库存与奖池不一致"),
        (status = 403, description = "无权限"),
        (status = 409, description = "卡包不是草稿状态")
    )
)]
pub async fn activate_pack(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.activate_pack(auth.tenant, path.into_inner()).await {
        Ok(pack) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": pack }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/reward-tiers",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取等级配置成功", body = [RewardTierResponse]),
        (status = 403, description = "无权限")
    )
)]
pub async fn list_tiers(
    service: web::Data<RewardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_tiers(auth.tenant).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/reward-tiers/{code}",
    tag = "admin",
    params(("code" = String, Path, description = "等级代码")),
    request_body = RewardTierPatch,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "等级配置已更新", body = TierUpdateResponse),
        (status = 400, description = "参数错误"),
        (status = 403, description = "无权限"),
        (status = 404, description = "等级不存在")
    )
)]
/// 部分更新等级配置：
/// 1. 只修改请求中提供的字段
/// 2. 发布 rank_table 新版本
/// 3. 全租户重新计算等级，返回汇总
pub async fn update_tier(
    service: web::Data<RewardService>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<RewardTierPatch>,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .update_tier_setting(auth.tenant, &path.into_inner(), body.into_inner(), &actor(&auth))
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/reward-tiers/recalculate",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "重新计算完成", body = RecalculationSummary),
        (status = 403, description = "无权限")
    )
)]
pub async fn recalculate_tenant(
    service: web::Data<RewardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.recalculate_tenant(auth.tenant).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": summary }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/config/{domain}/publish",
    tag = "admin",
    params(("domain" = ConfigDomain, Path, description = "配置域")),
    request_body = PublishConfigRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "发布成功", body = ConfigVersionResponse),
        (status = 400, description = "快照格式错误"),
        (status = 409, description = "版本号冲突")
    )
)]
pub async fn publish_config(
    service: web::Data<ConfigVersionService>,
    req: HttpRequest,
    path: web::Path<ConfigDomain>,
    body: web::Json<PublishConfigRequest>,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    let body = body.into_inner();
    match service
        .publish(
            auth.tenant,
            path.into_inner(),
            body.snapshot,
            &actor(&auth),
            body.description,
        )
        .await
    {
        Ok(version) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": version }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/config/{domain}/rollback",
    tag = "admin",
    params(("domain" = ConfigDomain, Path, description = "配置域")),
    request_body = RollbackConfigRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已回滚（以新版本发布）", body = ConfigVersionResponse),
        (status = 404, description = "目标版本不存在")
    )
)]
/// 回滚不会删除历史，而是把目标版本的内容发布为新版本
pub async fn rollback_config(
    service: web::Data<ConfigVersionService>,
    req: HttpRequest,
    path: web::Path<ConfigDomain>,
    body: web::Json<RollbackConfigRequest>,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .rollback(
            auth.tenant,
            path.into_inner(),
            body.target_version,
            &actor(&auth),
        )
        .await
    {
        Ok(version) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": version }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/config/history",
    tag = "admin",
    params(("domain" = Option<ConfigDomain>, Query, description = "按配置域过滤")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取版本历史成功", body = [ConfigVersionResponse])
    )
)]
pub async fn config_history(
    service: web::Data<ConfigVersionService>,
    req: HttpRequest,
    query: web::Query<ConfigHistoryQuery>,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.history(auth.tenant, query.domain).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/config/{domain}/current",
    tag = "admin",
    params(("domain" = ConfigDomain, Path, description = "配置域")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取当前版本成功", body = ConfigVersionResponse),
        (status = 404, description = "尚未发布")
    )
)]
pub async fn current_config(
    service: web::Data<ConfigVersionService>,
    req: HttpRequest,
    path: web::Path<ConfigDomain>,
) -> Result<HttpResponse> {
    let auth = match admin_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.current(auth.tenant, path.into_inner()).await {
        Ok(version) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": version }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 管理员路由配置
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/packs/{id}/activate", web::post().to(activate_pack))
            .route("/reward-tiers", web::get().to(list_tiers))
            .route("/reward-tiers/recalculate", web::post().to(recalculate_tenant))
            .route("/reward-tiers/{code}", web::patch().to(update_tier))
            .route("/config/history", web::get().to(config_history))
            .route("/config/{domain}/publish", web::post().to(publish_config))
            .route("/config/{domain}/rollback", web::post().to(rollback_config))
            .route("/config/{domain}/current", web::get().to(current_config)),
    );
}
