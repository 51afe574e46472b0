//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! No authentication layer; CORS is open for dashboard front-ends.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router over a pre-constructed context.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::AllowMethods::any())
        .allow_headers(Any)
        .allow_origin(Any);

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/patients", post(endpoints::patients::register))
        .route("/recalls", get(endpoints::recalls::list))
        .route("/recalls/priority/:level", get(endpoints::recalls::by_priority))
        .route("/qof/summary", get(endpoints::qof::summary))
        .route("/qof/disease/:type", get(endpoints::qof::by_disease))
        .route("/qof/records", post(endpoints::qof::create))
        .route("/qof/records/:id/metrics", post(endpoints::qof::add_metric))
        .route(
            "/qof/records/:id/recalculate",
            post(endpoints::qof::recalculate),
        )
        .route("/dashboard/overview", get(endpoints::dashboard::overview))
        .with_state(ctx);

    Router::new().nest("/api", routes).layer(cors)
}
