//! 验证代理处理器
//!
//! 文本预测和图片OCR验证，请求直接转发到外部ML后端

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use crate::presentation::dto::{read_file_field, PredictRequest};
use crate::presentation::routes::AppState;
use crate::shared::constants::messages;
use crate::shared::utils::{format_bytes, generate_request_id, truncate_for_log};
use crate::shared::{AppError, AppResult};

/// 文本预测
///
/// `POST /api/predict`，请求体 `{ "text": "..." }`
#[instrument(skip(state, body))]
pub async fn predict(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let request_id = generate_request_id();
    let request = PredictRequest::from_body(&body)?;

    info!(
        "🔍 [{}] 文本预测请求: \"{}\"",
        request_id,
        truncate_for_log(&request.text, 80)
    );

    let payload = state.backend.forward_text(&request.text).await?;

    info!("✅ [{}] 文本预测完成", request_id);
    Ok(payload.into_response())
}

/// 图片OCR验证
///
/// `POST /api/verify-ocr`，multipart 表单字段 `file`
#[instrument(skip(state, multipart))]
pub async fn verify_ocr(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let request_id = generate_request_id();

    // 非 multipart 请求同样视为缺少文件
    let mut multipart = multipart.map_err(|_| AppError::invalid_input(messages::FILE_REQUIRED))?;
    let file = read_file_field(&mut multipart, state.upload.max_file_bytes).await?;

    info!(
        "🖼️ [{}] 图片验证请求: {} ({})",
        request_id,
        file.file_name,
        format_bytes(file.len() as u64)
    );

    let payload = state.backend.forward_file(file).await?;

    info!("✅ [{}] 图片验证完成", request_id);
    Ok(payload.into_response())
}
