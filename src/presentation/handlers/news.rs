//! 新闻处理器

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use crate::presentation::routes::AppState;
use crate::shared::utils::generate_request_id;
use crate::shared::AppResult;

/// 获取新闻
///
/// `GET /api/news`，每次都重新请求后端，响应不可缓存
#[instrument(skip(state))]
pub async fn get_news(State(state): State<AppState>) -> AppResult<Response> {
    let request_id = generate_request_id();
    info!("📰 [{}] 新闻请求", request_id);

    let payload = state.backend.fetch_news().await?;

    info!("✅ [{}] 新闻获取完成", request_id);
    Ok(payload.into_response())
}
