//! Web application router and middleware setup.

use crate::metrics::{LoadCollector, LoadSource};
use crate::web::config::WebConfig;
use crate::web::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the axum application exposing a collector.
pub fn create_app<S: LoadSource + 'static>(config: &WebConfig, collector: LoadCollector<S>) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/meta", get(handlers::plugin_meta))
        .route("/v1/config-policy", get(handlers::config_policy::<S>))
        .route("/v1/metric-types", post(handlers::metric_types::<S>))
        .route("/v1/collect", post(handlers::collect::<S>))
        .with_state(AppState::new(collector));

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
