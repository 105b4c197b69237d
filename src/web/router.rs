//! Route table.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_attachment, delete_message, download_attachment, drafts, get_attachment, get_message,
    health, inbox, login, mark_read, register, save_draft, send_message, sent, update_message,
    user_by_email, AppState,
};
use super::middleware::{
    auth_rate_limit, create_cors_layer, jwt_auth, security_headers, RateLimitState,
};

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the `/api` router.
///
/// `rate_limit` guards register and login when given.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    rate_limit: Option<Arc<RateLimitState>>,
) -> Router {
    let mut credential_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    if let Some(limiter) = rate_limit {
        credential_routes = credential_routes.route_layer(middleware::from_fn(move |req, next| {
            auth_rate_limit(limiter.clone(), req, next)
        }));
    }

    let auth_routes = credential_routes.route("/user-by-email", get(user_by_email));

    let upload_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let email_routes = Router::new()
        .route("/send", post(send_message))
        .route("/draft", post(save_draft))
        .route("/inbox", get(inbox))
        .route("/sent", get(sent))
        .route("/drafts", get(drafts))
        .route(
            "/:id",
            get(get_message).put(update_message).delete(delete_message),
        )
        .route("/:id/read", put(mark_read))
        .route(
            "/:id/attachments",
            post(add_attachment).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/attachments/:id", get(get_attachment))
        .route("/attachments/:id/download", get(download_attachment));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/email", email_routes);

    let issuer = app_state.tokens.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(move |req, next| {
                    jwt_auth(issuer.clone(), req, next)
                })),
        )
        .with_state(app_state)
}

/// Create the `/health` router.
pub fn create_health_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(app_state)
}
