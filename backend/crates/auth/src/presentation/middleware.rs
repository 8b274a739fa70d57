//! Auth Middleware
//!
//! Middleware that requires a valid Bearer access token on protected
//! routes and exposes the verified claims to downstream handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::error::AuthError;
use crate::token::TokenIssuer;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid access token
///
/// On success the verified [`AccessClaims`](crate::token::AccessClaims)
/// are inserted into request extensions.
pub async fn require_access_token(
    State(state): State<AuthMiddlewareState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(&req).ok_or_else(|| AuthError::TokenInvalid.into_response())?;

    let issuer = TokenIssuer::from_config(&state.config);
    let claims = issuer
        .verify_access(&token, Utc::now())
        .map_err(|e| AuthError::from(e).into_response())?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
