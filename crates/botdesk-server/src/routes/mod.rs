pub mod auth;
pub mod billing;
pub mod chat;
pub mod health;
pub mod impersonation;
pub mod moderation;
pub mod onboarding;

use axum::Extension;
use axum::http::{HeaderName, Method, header};
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::IdentityHandle;
use crate::state::AppState;
use botdesk_core::traits::*;

pub fn build_router<A, S, O>(state: AppState<A, S, O>) -> axum::Router
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let identity = IdentityHandle(state.identity.clone());

    // Wildcard origin with the fixed header set browser clients send.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    axum::Router::new()
        .route("/api/health", get(health::health_check))
        // Identity
        .route("/api/auth/otp", post(auth::request_sign_in_code::<A, S, O>))
        .route("/api/auth/verify", post(auth::verify_sign_in_code::<A, S, O>))
        .route("/api/auth/session", get(auth::get_session::<A, S, O>))
        // Impersonation
        .route(
            "/api/admin/impersonate",
            post(impersonation::issue_impersonation_token::<A, S, O>),
        )
        .route(
            "/impersonate/{token}",
            get(impersonation::redeem_impersonation_token::<A, S, O>),
        )
        // Moderation
        .route(
            "/api/admin/moderation",
            post(moderation::record_moderation_action::<A, S, O>),
        )
        .route(
            "/api/admin/moderation/{user_id}",
            get(moderation::list_moderation_actions::<A, S, O>),
        )
        // Billing
        .route("/api/billing/trial", post(billing::start_trial::<A, S, O>))
        .route("/api/billing/status", get(billing::billing_status::<A, S, O>))
        // Onboarding
        .route("/api/onboarding", get(onboarding::get_progress::<A, S, O>))
        .route(
            "/api/onboarding/steps/{step_id}",
            put(onboarding::record_step::<A, S, O>),
        )
        // Chat widget
        .route("/api/chat", post(chat::send_message::<A, S, O>))
        .layer(Extension(identity))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request body size limit: 1 MiB.
        .layer(tower_http::limit::RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state)
}
