use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::current_user::current_user;
use super::handlers::get_user::get_user;
use super::handlers::login::login;
use super::handlers::register_user::register_user;
use super::middleware::authenticate as auth_middleware;
use crate::domain::user::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
}

/// Build the HTTP application.
///
/// Routes live under `api_prefix` (for example `/api/v1`); an empty prefix or
/// `/` mounts them at the root.
pub fn create_router(auth_service: Arc<dyn AuthServicePort>, api_prefix: &str) -> Router {
    let state = AppState { auth_service };

    let public_routes = Router::new()
        .route("/auth", post(register_user))
        .route("/auth/", post(register_user))
        .route("/auth/token", post(login))
        .route("/auth/:user_id", get(get_user));

    let protected_routes = Router::new()
        .route("/auth/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes);

    let prefix = api_prefix.trim_end_matches('/');
    let api_routes = if prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(prefix, api_routes)
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    api_routes
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
