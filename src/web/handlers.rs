//! HTTP handlers for the plugin endpoints.

use crate::error::LoadError;
use crate::metrics::{
    plugin::{self, ConfigPolicy, MetricType, PluginConfig, PluginMeta},
    LoadCollector, LoadSource,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Shared handler state.
///
/// The collector serves one request at a time; the mutex serializes callers.
pub struct AppState<S> {
    pub collector: Arc<Mutex<LoadCollector<S>>>,
}

impl<S> AppState<S> {
    pub fn new(collector: LoadCollector<S>) -> Self {
        Self {
            collector: Arc::new(Mutex::new(collector)),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
        }
    }
}

/// Error returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Collector(LoadError),
    Internal(String),
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        ApiError::Collector(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Collector(err) => {
                let status = match err {
                    LoadError::Namespace { .. } | LoadError::UnknownField(_) | LoadError::Config(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        error!("Request failed ({}): {}", status, message);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run a collector call on the blocking pool while holding the lock.
async fn with_collector<S, T, F>(state: &AppState<S>, f: F) -> Result<T, ApiError>
where
    S: LoadSource + 'static,
    T: Send + 'static,
    F: FnOnce(&mut LoadCollector<S>) -> crate::Result<T> + Send + 'static,
{
    let collector = Arc::clone(&state.collector);
    tokio::task::spawn_blocking(move || {
        let mut guard = collector.blocking_lock();
        f(&mut *guard)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("collector task failed: {}", e)))?
    .map_err(ApiError::from)
}

/// List available metric types.
pub async fn metric_types<S: LoadSource + 'static>(
    State(state): State<AppState<S>>,
    config: Option<Json<PluginConfig>>,
) -> Result<Json<Vec<MetricType>>, ApiError> {
    let config = config.map(|Json(c)| c).unwrap_or_default();
    let types = with_collector(&state, move |c| c.get_metric_types(&config)).await?;
    Ok(Json(types))
}

/// Collect values for the requested metrics.
pub async fn collect<S: LoadSource + 'static>(
    State(state): State<AppState<S>>,
    Json(requested): Json<Vec<MetricType>>,
) -> Result<Json<Vec<MetricType>>, ApiError> {
    let metrics = with_collector(&state, move |c| c.collect_metrics(&requested)).await?;
    Ok(Json(metrics))
}

/// The recognized configuration options.
pub async fn config_policy<S: LoadSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ConfigPolicy> {
    Json(state.collector.lock().await.get_config_policy())
}

/// Static plugin metadata.
pub async fn plugin_meta() -> Json<PluginMeta> {
    Json(plugin::meta())
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "load-collector",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
