use crate::adapters::database::DbPool;
use crate::api::middleware::{enforce_deadline, log_rate_limit_events};
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::conversation_service::ConversationService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use crate::services::rate_limit_service::{Quota, RateLimitService};
use crate::services::report_service::ReportService;
use crate::services::typing::TypingService;
use axum::body::Body;
use axum::http::Request;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod docs;
pub mod extract;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod reports;
pub mod schemas;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub message_service: MessageService,
    pub conversation_service: ConversationService,
    pub typing_service: TypingService,
    pub report_service: ReportService,
    pub rate_limit_service: RateLimitService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Clone, Debug)]
pub struct ServiceContainer {
    pub pool: DbPool,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub message_service: MessageService,
    pub conversation_service: ConversationService,
    pub typing_service: TypingService,
    pub report_service: ReportService,
    pub health_service: HealthService,
    pub rate_limit_service: RateLimitService,
}

/// Configures and returns the public API router.
///
/// # Panics
/// Panics if a rate limiter configuration cannot be constructed, which `Quota` rules out.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let standard = Quota::per_second(config.rate_limit.per_second, config.rate_limit.burst);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(standard.replenish_every_ns)
            .burst_size(standard.burst)
            .key_extractor(services.rate_limit_service.client_key.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Registration and login hash passwords, so they get a tighter budget
    let auth = Quota::per_second(config.rate_limit.auth_per_second, config.rate_limit.auth_burst);
    let auth_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(auth.replenish_every_ns)
            .burst_size(auth.burst)
            .key_extractor(services.rate_limit_service.client_key.clone())
            .finish()
            .expect("Failed to build auth rate limiter config"),
    );

    let state = AppState {
        config,
        account_service: services.account_service,
        auth_service: services.auth_service,
        message_service: services.message_service,
        conversation_service: services.conversation_service,
        typing_service: services.typing_service,
        report_service: services.report_service,
        rate_limit_service: services.rate_limit_service,
    };

    let auth_routes = Router::new()
        .route("/users", post(auth::register))
        .route("/sessions", post(auth::login))
        .layer(GovernorLayer::new(auth_conf));

    let api_routes = Router::new()
        .route("/users/me", get(auth::me))
        .route("/messages", post(messages::send_message))
        .route("/messages/typing", post(messages::set_typing))
        .route("/messages/typing-status/{sender_id}/{receiver_id}", get(messages::typing_status))
        .route("/messages/conversations/{user_id}", get(messages::list_conversations))
        .route("/messages/unread/{user_id}", get(messages::unread_count))
        .route("/messages/conversation/read", patch(messages::mark_conversation_read))
        .route("/messages/{id}/read", patch(messages::mark_message_read))
        .route("/messages/{id}/{other_id}", get(messages::messages_between))
        .route("/reports", post(reports::submit_report))
        .route("/reports/nearby", get(reports::nearby))
        .route("/reports/{report_id}", get(reports::get_report))
        .layer(GovernorLayer::new(standard_conf));

    Router::new()
        .route("/openapi.yaml", get(docs::openapi_yaml))
        .merge(auth_routes)
        .merge(api_routes)
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events))
        .layer(from_fn_with_state(state.clone(), enforce_deadline))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
