use crate::config::PaymentConfig;
use crate::error::AppError;
use crate::models::{ChargeCallback, TenantContext};
use crate::services::ChargeService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use log::{error, info, warn};
use serde_json::json;

const SECRET_HEADER: &str = "X-Webhook-Secret";

/// 校验支付方共享密钥；未配置密钥时拒绝所有回调
fn verify_secret(req: &HttpRequest, payment: &PaymentConfig) -> Result<(), AppError> {
    if payment.webhook_secret.is_empty() {
        return Err(AppError::AuthError(
            "Payment webhook secret is not configured".to_string(),
        ));
    }
    let provided = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided.len() != payment.webhook_secret.len()
        || !provided
            .bytes()
            .zip(payment.webhook_secret.bytes())
            .fold(true, |ok, (a, b)| ok & (a == b))
    {
        return Err(AppError::AuthError("Invalid webhook secret".to_string()));
    }
    Ok(())
}

/// 充值成功回调
///
/// 同一个 external_payment_id 重复回调只入账一次，返回已有记录。
/// 处理失败时返回错误状态码，由支付方重试。
pub async fn charge_completed(
    req: HttpRequest,
    payment: web::Data<PaymentConfig>,
    service: web::Data<ChargeService>,
    body: web::Json<ChargeCallback>,
) -> Result<HttpResponse> {
    if let Err(e) = verify_secret(&req, &payment) {
        warn!("Rejected charge callback: {e}");
        return Ok(e.error_response());
    }
    let callback = body.into_inner();
    let ctx = TenantContext::new(callback.tenant_id);
    info!(
        "Received charge completed callback: tenant={} payment={}",
        callback.tenant_id, callback.external_payment_id
    );

    match service.complete_charge(ctx, &callback).await {
        Ok(charge) => Ok(HttpResponse::Ok().json(json!({
            "received": true,
            "data": charge
        }))),
        Err(e) => {
            error!(
                "Failed to process charge {}: {e}",
                callback.external_payment_id
            );
            Ok(e.error_response())
        }
    }
}

/// 充值失败回调，只记录不入账
pub async fn charge_failed(
    req: HttpRequest,
    payment: web::Data<PaymentConfig>,
    service: web::Data<ChargeService>,
    body: web::Json<ChargeCallback>,
) -> Result<HttpResponse> {
    if let Err(e) = verify_secret(&req, &payment) {
        warn!("Rejected charge callback: {e}");
        return Ok(e.error_response());
    }
    let callback = body.into_inner();
    let ctx = TenantContext::new(callback.tenant_id);

    match service.fail_charge(ctx, &callback).await {
        Ok(charge) => Ok(HttpResponse::Ok().json(json!({
            "received": true,
            "data": charge
        }))),
        Err(e) => {
            error!(
                "Failed to record failed charge {}: {e}",
                callback.external_payment_id
            );
            Ok(e.error_response())
        }
    }
}

/// Webhook路由配置
pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook")
            .route("/charges/completed", web::post().to(charge_completed))
            .route("/charges/failed", web::post().to(charge_failed)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn payment(secret: &str) -> PaymentConfig {
        PaymentConfig {
            webhook_secret: secret.to_string(),
        }
    }

    #[test]
    fn secret_must_match_exactly() {
        let req = TestRequest::default()
            .insert_header((SECRET_HEADER, "s3cret"))
            .to_http_request();
        assert!(verify_secret(&req, &payment("s3cret")).is_ok());
        assert!(verify_secret(&req, &payment("s3cret2")).is_err());
        assert!(verify_secret(&req, &payment("other!")).is_err());
    }

    #[test]
    fn missing_or_unconfigured_secret_is_rejected() {
        let req = TestRequest::default().to_http_request();
        assert!(verify_secret(&req, &payment("s3cret")).is_err());

        let req = TestRequest::default()
            .insert_header((SECRET_HEADER, ""))
            .to_http_request();
        assert!(verify_secret(&req, &payment("")).is_err());
    }
}
