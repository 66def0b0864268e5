pub mod handlers;

pub use handlers::{auth_config, chart_data, health_check};

use crate::service::ChartSource;
use axum::{middleware, routing::get, Router};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// 图表服务: /api/chart-data + 工作目录静态文件
pub fn chart_router(source: Arc<ChartSource>, static_dir: &Path) -> Router {
    let chart_routes = Router::new()
        .route("/api/chart-data", get(chart_data))
        .with_state(source);

    Router::new()
        .route("/health", get(health_check))
        .merge(chart_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(handlers::log_request)))
}

/// 凭据服务: /auth-config, 允许任意来源跨域
pub fn auth_router(credentials_file: PathBuf) -> Router {
    let auth_routes = Router::new()
        .route("/auth-config", get(auth_config))
        .with_state(Arc::new(credentials_file));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(handlers::log_request))
                .layer(CorsLayer::permissive()),
        )
}
