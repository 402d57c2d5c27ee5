use crate::handlers::auth_from_request;
use crate::models::*;
use crate::services::ReferralService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/me/referral-code",
    tag = "referral",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取推荐码成功", body = ReferralCodeResponse),
        (status = 401, description = "未授权")
    )
)]
/// 获取推荐码，第一次调用时生成
pub async fn get_referral_code(
    service: web::Data<ReferralService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.ensure_referral_code(auth.tenant, auth.user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/me/invite",
    tag = "referral",
    request_body = LinkInviteeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "绑定邀请人成功", body = InviteLinkResponse),
        (status = 400, description = "不能使用自己的推荐码"),
        (status = 404, description = "推荐码不存在"),
        (status = 409, description = "已绑定过邀请人")
    )
)]
pub async fn link_invitee(
    service: web::Data<ReferralService>,
    req: HttpRequest,
    body: web::Json<LinkInviteeRequest>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .link_invitee(auth.tenant, auth.user_id, &body.referral_code)
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn referral_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/me/referral-code", web::get().to(get_referral_code))
        .route("/me/invite", web::post().to(link_invitee));
}
