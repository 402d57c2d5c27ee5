use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // 在生产环境中应该限制允许的域名
            true
        })
        .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
        .allowed_headers(vec!["Authorization", "Content-Type", "X-Webhook-Secret"])
        .max_age(3600)
}
