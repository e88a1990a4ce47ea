//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::{ApiContext, ApiLimits};
use crate::pipeline::evaluation::Evaluator;

/// Build the API router around a shared evaluator.
///
/// Layers are applied from bottom (innermost) to top (outermost):
///   CORS → Audit → Timeout → Body limit → Handler
pub fn api_router(evaluator: Arc<Evaluator>, limits: ApiLimits) -> Router {
    let ctx = ApiContext::new(evaluator);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/evaluate", post(endpoints::evaluate::evaluate))
        .route("/rewrite", post(endpoints::evaluate::rewrite))
        .route("/review", post(endpoints::evaluate::review))
        .route("/batch", post(endpoints::evaluate::batch))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(limits.max_body_bytes))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(cors)
}
