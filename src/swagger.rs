use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{ChargeMetadata, ChargeStatus, ConfigDomain, LedgerCategory, PackStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::user::get_profile,
        handlers::user::accept_terms,
        handlers::user::get_wallet,
        handlers::user::list_balance_transactions,
        handlers::user::list_mile_transactions,
        handlers::draw::get_pack,
        handlers::draw::list_slots,
        handlers::draw::draw,
        handlers::draw::list_my_draws,
        handlers::exchange::exchange_draw,
        handlers::exchange::list_mile_rewards,
        handlers::exchange::exchange_mile_reward,
        handlers::referral::get_referral_code,
        handlers::referral::link_invitee,
        handlers::verification::send_code,
        handlers::verification::verify_code,
        handlers::admin::activate_pack,
        handlers::admin::list_tiers,
        handlers::admin::update_tier,
        handlers::admin::recalculate_tenant,
        handlers::admin::publish_config,
        handlers::admin::rollback_config,
        handlers::admin::config_history,
        handlers::admin::current_config,
    ),
    components(
        schemas(
            UserProfileResponse,
            WalletResponse,
            LedgerEntryResponse,
            LedgerEntryPage,
            LedgerCategory,
            PackResponse,
            PackSlotResponse,
            PackStatus,
            DrawRequest,
            DrawSettlementResponse,
            WonPrize,
            DrawRecordResponse,
            DrawRecordPage,
            PrizeExchangeResponse,
            MileRewardResponse,
            MileExchangeResponse,
            ReferralCodeResponse,
            LinkInviteeRequest,
            InviteLinkResponse,
            SendCodeRequest,
            SendCodeResponse,
            VerifyCodeRequest,
            VerifyCodeResponse,
            RewardTierResponse,
            RewardTierPatch,
            TierUpdateResponse,
            RecalculationSummary,
            RecalculationFailure,
            ConfigDomain,
            PublishConfigRequest,
            RollbackConfigRequest,
            ConfigVersionResponse,
            ChargeCallback,
            ChargeResponse,
            ChargeStatus,
            ChargeMetadata,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "user", description = "Profile, consent and ledgers"),
        (name = "draw", description = "Packs and draw settlement"),
        (name = "exchange", description = "Prize and mile exchanges"),
        (name = "referral", description = "Referral codes and invites"),
        (name = "verification", description = "Phone verification"),
        (name = "admin", description = "Reward tiers, pack activation and config versions"),
    ),
    info(
        title = "Packdraw Backend API",
        version = "1.0.0",
        description = "Pack draw marketplace REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_draw_and_admin_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/packs/{id}/draw"));
        assert!(doc.paths.paths.contains_key("/admin/config/{domain}/rollback"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("DrawRecordPage"));
    }
}
