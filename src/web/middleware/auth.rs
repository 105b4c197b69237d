//! Bearer token authentication.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{Claims, TokenIssuer};
use crate::web::error::ApiError;

/// Extractor for authenticated users.
///
/// Reads `Authorization: Bearer <token>`, falling back to a `token` query
/// parameter so browsers can follow plain download links.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Authenticated user ID.
    pub fn id(&self) -> i64 {
        self.0.sub
    }

    /// Authenticated user's email.
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        let issuer = parts
            .extensions
            .get::<Arc<TokenIssuer>>()
            .ok_or_else(|| ApiError::internal("Token issuer not configured"))?;

        let claims = issuer
            .verify(&token)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(AuthUser(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn query_token(parts: &Parts) -> Option<String> {
    parts.uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != "token" || value.is_empty() {
            return None;
        }
        urlencoding::decode(value).ok().map(|s| s.into_owned())
    })
}

/// Middleware that makes the token issuer available to [`AuthUser`].
pub async fn jwt_auth(
    issuer: Arc<TokenIssuer>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(issuer);
    next.run(request).await
}
