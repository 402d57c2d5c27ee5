use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use packdraw_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{LogSmsSender, SmsSender, TwilioService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务（只校验，令牌由外部签发）
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 短信发送：未配置 Twilio 时只写日志
    let twilio_service = TwilioService::new(config.twilio.clone());
    let sms_sender: Arc<dyn SmsSender> = if twilio_service.is_configured() {
        Arc::new(twilio_service)
    } else {
        log::warn!("Twilio is not configured, verification codes will only be logged");
        Arc::new(LogSmsSender)
    };

    // 创建服务
    let reward_service = RewardService::new(pool.clone());
    let config_version_service = ConfigVersionService::new(pool.clone(), reward_service.clone());
    let draw_service = DrawService::new(pool.clone(), config.draw.clone());
    let ledger_service = LedgerService::new(pool.clone());
    let user_service = UserService::new(pool.clone());
    let exchange_service = ExchangeService::new(pool.clone());
    let referral_service = ReferralService::new(pool.clone(), config.referral.clone());
    let charge_service = ChargeService::new(
        pool.clone(),
        reward_service.clone(),
        config.referral.clone(),
    );
    let verification_service = VerificationService::new(
        pool.clone(),
        sms_sender,
        config.sms.clone(),
        config.referral.clone(),
    );
    let payment_config = config.payment.clone();

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(payment_config.clone()))
            .app_data(web::Data::new(reward_service.clone()))
            .app_data(web::Data::new(config_version_service.clone()))
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(ledger_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(exchange_service.clone()))
            .app_data(web::Data::new(referral_service.clone()))
            .app_data(web::Data::new(charge_service.clone()))
            .app_data(web::Data::new(verification_service.clone()))
            .route("/health", web::get().to(|| async { HttpResponse::Ok().body("ok") }))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::user_config)
                    .configure(handlers::draw_config)
                    .configure(handlers::exchange_config)
                    .configure(handlers::referral_config)
                    .configure(handlers::verification_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
