//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AccountRepository, LoginRecordRepository};
use crate::infra::postgres::PgAuthStore;
use crate::notify::{Notifier, TracingNotifier};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_access_token};

/// Create the Auth router with the PostgreSQL store and tracing notifier
pub fn auth_router(store: PgAuthStore, config: AuthConfig) -> Router {
    auth_router_generic(store, TracingNotifier, config)
}

/// Create a generic Auth router for any store and notifier implementation
pub fn auth_router_generic<R, N>(store: R, notifier: N, config: AuthConfig) -> Router
where
    R: AccountRepository + LoginRecordRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let config = Arc::new(config);
    let state = AuthAppState {
        repo: Arc::new(store),
        notifier: Arc::new(notifier),
        config: config.clone(),
    };
    let mw_state = AuthMiddlewareState { config };

    let protected = Router::new()
        .route("/signout", post(handlers::sign_out::<R, N>))
        .route("/me", get(handlers::me::<R, N>))
        .route_layer(middleware::from_fn_with_state(
            mw_state,
            require_access_token,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/signup", post(handlers::sign_up::<R, N>))
        .route("/verify-otp", post(handlers::verify_otp::<R, N>))
        .route("/signin", post(handlers::sign_in::<R, N>))
        .route("/refresh", post(handlers::refresh_token::<R, N>))
        .route(
            "/password/request-reset",
            post(handlers::request_password_reset::<R, N>),
        )
        .route(
            "/password/verify-otp",
            post(handlers::verify_password_reset_otp::<R, N>),
        )
        .route("/password/reset", post(handlers::set_new_password::<R, N>))
        .with_state(state)
        .merge(protected)
}
