use crate::handlers::auth_from_request;
use crate::models::*;
use crate::services::VerificationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/me/phone/send-code",
    tag = "verification",
    request_body = SendCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "验证码发送成功", body = SendCodeResponse),
        (status = 400, description = "手机号格式错误"),
        (status = 429, description = "发送过于频繁")
    )
)]
pub async fn send_code(
    service: web::Data<VerificationService>,
    req: HttpRequest,
    body: web::Json<SendCodeRequest>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.send_code(auth.tenant, auth.user_id, &body.phone).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "验证码已发送",
            "data": data
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/me/phone/verify",
    tag = "verification",
    request_body = VerifyCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "手机号验证成功", body = VerifyCodeResponse),
        (status = 400, description = "验证码错误或已过期")
    )
)]
/// 验证手机号；有邀请关系时给邀请人发放里程
pub async fn verify_code(
    service: web::Data<VerificationService>,
    req: HttpRequest,
    body: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse> {
    let auth = match auth_from_request(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };
    match service.verify_code(auth.tenant, auth.user_id, &body.code).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn verification_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/me/phone/send-code", web::post().to(send_code))
        .route("/me/phone/verify", web::post().to(verify_code));
}
