//! 请求/响应数据传输对象

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::business::domain::{BackendPayload, BinaryPayload, UploadedField};
use crate::shared::constants::{http, messages, upload};
use crate::shared::utils::format_bytes;
use crate::shared::{AppError, AppResult};

/// 文本预测请求
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

impl PredictRequest {
    /// 解析请求体；`text` 缺失、为空或不是字符串都视为缺失
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        let raw_json: serde_json::Value = serde_json::from_slice(body)
            .map_err(|_| AppError::invalid_input(messages::INVALID_JSON_BODY))?;

        let text = raw_json
            .get("text")
            .and_then(|v| v.as_str())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::invalid_input(messages::TEXT_REQUIRED))?;

        Ok(Self {
            text: text.to_string(),
        })
    }
}

/// 从 multipart 表单中读取第一个 `file` 字段
///
/// 字段必须带文件名，且不超过 `max_file_bytes`
pub async fn read_file_field(
    multipart: &mut Multipart,
    max_file_bytes: usize,
) -> AppResult<BinaryPayload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_bytes))?
    {
        if field.name() != Some(upload::FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_file_bytes))?;

        if data.len() > max_file_bytes {
            return Err(file_too_large(max_file_bytes));
        }

        return UploadedField {
            file_name,
            content_type,
            data,
        }
        .into_binary_payload();
    }

    Err(AppError::invalid_input(messages::FILE_REQUIRED))
}

fn multipart_error(error: MultipartError, max_file_bytes: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        file_too_large(max_file_bytes)
    } else {
        crate::invalid_input!("Invalid multipart body: {}", error.body_text())
    }
}

fn file_too_large(max_file_bytes: usize) -> AppError {
    crate::invalid_input!(
        "File size exceeds {} limit",
        format_bytes(max_file_bytes as u64)
    )
}

/// 后端响应原样返回，并禁止客户端和中间层缓存
impl IntoResponse for BackendPayload {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, http::APPLICATION_JSON),
                (header::CACHE_CONTROL, http::RESPONSE_NO_STORE),
            ],
            self.into_bytes(),
        )
            .into_response()
    }
}
