use crate::handlers::auth_from_request;
use crate::models::*;
use crate::services::ExchangeService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/draws/{id}/exchange",
    tag = "exchange",
    params(("id" = i64, Path, description = "抽取记录ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "奖品兑换点数成功", body = PrizeExchangeResponse),
        (status = 404, description = "抽取记录不存在"),
        (status = 409, description = "已兑换过")
    )
)]
/// 将抽中的奖品按兑换价值换回点数，每条记录只能兑换一次
pub async fn exchange_draw(
    service: web::Data<ExchangeService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .exchange_draw(auth.tenant, auth.user_id, path.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/mile-rewards",
    tag = "exchange",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取里程兑换目录成功", body = [MileRewardResponse])
    )
)]
pub async fn list_mile_rewards(
    service: web::Data<ExchangeService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_mile_rewards(auth.tenant).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/mile-rewards/{id}/exchange",
    tag = "exchange",
    params(("id" = i64, Path, description = "里程奖励ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "里程兑换成功", body = MileExchangeResponse),
        (status = 404, description = "奖励不存在"),
        (status = 409, description = "里程不足")
    )
)]
pub async fn exchange_mile_reward(
    service: web::Data<ExchangeService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .exchange_mile_reward(auth.tenant, auth.user_id, path.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn exchange_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/draws/{id}/exchange", web::post().to(exchange_draw))
        .service(
            web::scope("/mile-rewards")
                .route("", web::get().to(list_mile_rewards))
                .route("/{id}/exchange", web::post().to(exchange_mile_reward)),
        );
}
