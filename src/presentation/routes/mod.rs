//! 路由配置模块
//!
//! 组织和配置所有HTTP路由

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::business::services::VerificationBackend;
use crate::infrastructure::UploadConfig;
use crate::presentation::handlers;

/// 路由共享状态
///
/// 只包含后端代理和不可变配置，请求之间没有可变共享状态
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn VerificationBackend>,
    pub upload: UploadConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn VerificationBackend>, upload: UploadConfig) -> Self {
        Self { backend, upload }
    }
}

/// 创建应用路由
pub fn create_routes(state: AppState, static_dir: Option<PathBuf>) -> Router {
    // 验证代理路由
    let verification_routes = Router::new()
        .route("/api/predict", post(handlers::verify::predict))
        .route(
            "/api/verify-ocr",
            post(handlers::verify::verify_ocr)
                .layer(DefaultBodyLimit::max(state.upload.body_limit())),
        )
        .route("/api/news", get(handlers::news::get_news));

    // 公开路由
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/health/backend", get(handlers::health::get_backend_health));

    let app = Router::new()
        .merge(public_routes)
        .merge(verification_routes)
        .with_state(state);

    // 检查是否存在构建的前端文件
    let app = match static_dir {
        Some(dist_path) if dist_path.exists() => {
            tracing::info!("🌐 生产模式：服务静态文件从 {}", dist_path.display());
            app.fallback_service(ServeDir::new(dist_path).append_index_html_on_directories(true))
        }
        Some(dist_path) => {
            tracing::warn!("⚠️ 静态文件目录不存在: {}，仅提供 API 服务", dist_path.display());
            app
        }
        None => {
            tracing::info!("🔧 开发模式：仅提供 API 服务");
            app
        }
    };

    app
        // 全局中间件
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
