//! 健康检查处理器
//!
//! 处理服务存活检查和外部ML后端可达性检查

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::business::domain::BackendProbe;
use crate::presentation::routes::AppState;
use crate::shared::constants::server::SERVICE_NAME;

/// 后端健康状态
#[derive(Debug, Serialize)]
pub struct BackendHealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub backend: BackendProbe,
}

/// 基础健康检查
#[instrument]
pub async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    info!("🏥 基础健康检查请求");

    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// 外部ML后端健康检查
///
/// 后端不可达时仍返回200，通过 `status` 字段报告 `degraded`
#[instrument(skip(state))]
pub async fn get_backend_health(State(state): State<AppState>) -> Json<BackendHealthResponse> {
    info!("🏥 后端健康检查请求");

    let probe = state.backend.probe().await;
    let status = if probe.reachable { "healthy" } else { "degraded" };

    if probe.reachable {
        info!("✅ 后端可达: {} ({}ms)", probe.origin, probe.response_time_ms);
    } else {
        warn!("⚠️ 后端不可达: {}", probe.origin);
    }

    Json(BackendHealthResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        backend: probe,
    })
}
