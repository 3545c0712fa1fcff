use axum::{
    extract::State,
    http::{HeaderName, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use zurusasa_store::redis_repo::rate_limit_key;

pub mod bookings;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod functions;
pub mod middleware;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            HeaderName::from_static(middleware::auth::VIEW_MODE_HEADER),
        ]);

    let authenticated = Router::new()
        .merge(bookings::routes())
        .merge(checkout::authenticated_routes())
        .merge(catalog::host_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_auth_middleware,
        ));

    let checkout = checkout::routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::optional_auth_middleware,
    ));

    let mut router = Router::new()
        .route("/health", get(health))
        .merge(catalog::routes())
        .merge(functions::routes())
        .merge(checkout)
        .merge(authenticated)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if state.redis.is_some() {
        router = router.layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware));
    }

    router.with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<SocketAddr>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let Some(redis) = state.redis.as_ref() else {
        return Ok(next.run(req).await);
    };
    let key = rate_limit_key(&addr.ip().to_string());

    match redis.check_rate_limit(&key, state.rate_limit_per_minute, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((axum::http::StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            Ok(next.run(req).await) // Fail open
        }
    }
}
