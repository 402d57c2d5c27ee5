use crate::handlers::auth_from_request;
use crate::models::*;
use crate::services::DrawService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/packs/{id}",
    tag = "draw",
    params(("id" = i64, Path, description = "卡包ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取卡包成功", body = PackResponse),
        (status = 404, description = "卡包不存在")
    )
)]
pub async fn get_pack(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_pack(auth.tenant, path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/packs/{id}/slots",
    tag = "draw",
    params(("id" = i64, Path, description = "卡包ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取奖池槽位成功", body = [PackSlotResponse]),
        (status = 404, description = "卡包不存在")
    )
)]
/// 奖池槽位及剩余数量，已抽完的槽位也会返回
pub async fn list_slots(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_slots(auth.tenant, path.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/packs/{id}/draw",
    tag = "draw",
    params(("id" = i64, Path, description = "卡包ID")),
    request_body = DrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽取成功", body = DrawSettlementResponse),
        (status = 400, description = "抽取次数不合法"),
        (status = 403, description = "未同意条款"),
        (status = 409, description = "余额不足、库存不足、卡包未开售或超出限购")
    )
)]
/// 抽取并结算：
/// 1. 锁定卡包与用户，检查开售状态、条款、限购、余额与库存
/// 2. 按剩余数量加权随机选出奖品（系统安全随机数）
/// 3. 扣库存、扣点数、写流水和抽取记录，同一事务提交
pub async fn draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .settle_draw(auth.tenant, auth.user_id, path.into_inner(), body.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/draws",
    tag = "draw",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽取记录成功", body = DrawRecordPage),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取用户抽取记录（倒序）
pub async fn list_my_draws(
    service: web::Data<DrawService>,
    req: HttpRequest,
    query: web::Query<DrawRecordQuery>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .list_user_draws(auth.tenant, auth.user_id, &query.into_inner())
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/packs")
            .route("/{id}", web::get().to(get_pack))
            .route("/{id}/slots", web::get().to(list_slots))
            .route("/{id}/draw", web::post().to(draw)),
    )
    .route("/me/draws", web::get().to(list_my_draws));
}
