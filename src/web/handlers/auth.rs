//! Registration, login and user lookup.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::auth::RegistrationRequest;
use crate::web::dto::{
    AuthResponse, LoginRequest, RegisterRequest, UserByEmailQuery, UserLookupResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let registration: RegistrationRequest = req.into();
    let issued = state.auth_service().register(&registration).await?;
    Ok(Json(issued.into()))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let issued = state
        .auth_service()
        .login(&req.email, &req.password)
        .await?;
    Ok(Json(issued.into()))
}

/// GET /api/auth/user-by-email?email=
pub async fn user_by_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserByEmailQuery>,
) -> Result<Json<UserLookupResponse>, ApiError> {
    if query.email.trim().is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }

    state
        .auth_service()
        .get_user_by_email(&query.email)
        .await?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found("user not found"))
}
