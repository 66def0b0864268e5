use crate::client::read_client_id;
use crate::service::ChartSource;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// /auth-config 响应体
#[derive(Debug, Serialize)]
pub struct AuthConfigResponse {
    pub client_id: String,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 记录每个请求的路径
pub async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!("Received request for: {} {}", request.method(), request.uri().path());
    next.run(request).await
}

/// 图表数据接口; 上游失败时返回空列表, 状态码仍为 200
pub async fn chart_data(State(source): State<Arc<ChartSource>>) -> Response {
    let points = match source.serve_chart_data(Local::now().date_naive()).await {
        Ok(points) => points,
        Err(e) => {
            tracing::error!("Error getting chart data: {}", e);
            Vec::new()
        }
    };

    (
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(points),
    )
        .into_response()
}

/// 返回 OAuth client_id; 失败细节只写日志
pub async fn auth_config(State(credentials_file): State<Arc<PathBuf>>) -> Response {
    match read_client_id(&credentials_file) {
        Ok(client_id) => {
            tracing::info!("Successfully retrieved client ID");
            (StatusCode::OK, Json(AuthConfigResponse { client_id })).into_response()
        }
        Err(e) => {
            tracing::error!("Error reading credentials: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read credentials" })),
            )
                .into_response()
        }
    }
}
