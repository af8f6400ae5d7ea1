//! 领域模型模块
//!
//! 代理层不持有任何持久实体，这里只有出站调用的描述和透传载荷

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use std::fmt;

use crate::shared::constants::{backend, http, messages};
use crate::shared::{AppError, AppResult};

/// 外部ML后端的端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendEndpoint {
    /// `POST /predict?text=...`
    Predict,
    /// `GET /news`
    News,
    /// `POST /verify-ocr`（multipart，字段 `file`）
    VerifyOcr,
}

impl BackendEndpoint {
    /// 相对于后端源的路径（不带前导斜杠，便于 `Url::join` 保留前缀）
    pub fn path(&self) -> &'static str {
        match self {
            BackendEndpoint::Predict => backend::PREDICT_PATH,
            BackendEndpoint::News => backend::NEWS_PATH,
            BackendEndpoint::VerifyOcr => backend::VERIFY_OCR_PATH,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            BackendEndpoint::News => Method::GET,
            BackendEndpoint::Predict | BackendEndpoint::VerifyOcr => Method::POST,
        }
    }

    /// 出站调用的缓存策略；新闻每次都必须重新获取
    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            BackendEndpoint::News => CachePolicy::NoStore,
            BackendEndpoint::Predict | BackendEndpoint::VerifyOcr => CachePolicy::Default,
        }
    }

    fn failure_summary(&self) -> &'static str {
        match self {
            BackendEndpoint::Predict => "Failed to analyze text.",
            BackendEndpoint::News => "Failed to fetch news.",
            BackendEndpoint::VerifyOcr => "Failed to verify image.",
        }
    }

    /// 返回给调用方的错误消息，附带后端可能未运行的提示
    pub fn failure_message(&self) -> String {
        format!("{} {}", self.failure_summary(), backend::UNAVAILABLE_HINT)
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// 出站调用的缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// 不附加任何缓存指令
    #[default]
    Default,
    /// 绕过所有中间缓存
    NoStore,
}

impl CachePolicy {
    /// 该策略需要附加到出站请求上的头部
    pub fn request_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            CachePolicy::Default => &[],
            CachePolicy::NoStore => &[
                ("cache-control", http::OUTBOUND_NO_CACHE),
                ("pragma", http::PRAGMA_NO_CACHE),
            ],
        }
    }
}

/// 上传文件：原始字节加元数据，代理不解析内容
#[derive(Debug, Clone)]
pub struct BinaryPayload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl BinaryPayload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 表单中读到的一个字段
///
/// 只有带文件名的字段才是文件；普通文本字段不能作为上传文件转发
#[derive(Debug, Clone)]
pub struct UploadedField {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedField {
    pub fn into_binary_payload(self) -> AppResult<BinaryPayload> {
        match self.file_name {
            Some(file_name) => Ok(BinaryPayload::new(file_name, self.content_type, self.data)),
            None => Err(AppError::invalid_input(messages::FILE_REQUIRED)),
        }
    }
}

/// 后端返回的JSON响应体，按原始字节透传
#[derive(Debug, Clone, PartialEq)]
pub struct BackendPayload(Bytes);

pub type PredictionResult = BackendPayload;
pub type VerificationResult = BackendPayload;
pub type NewsPayload = BackendPayload;

impl BackendPayload {
    /// 校验响应体是合法JSON；不合法时视为后端错误
    pub fn from_json_bytes(endpoint: BackendEndpoint, status: u16, body: Bytes) -> AppResult<Self> {
        serde_json::from_slice::<serde::de::IgnoredAny>(&body).map_err(|e| AppError::BackendError {
            endpoint,
            status,
            reason: format!("Backend returned invalid JSON: {}", e),
        })?;
        Ok(Self(body))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.0)
    }
}

/// 后端可达性探测结果
#[derive(Debug, Clone, Serialize)]
pub struct BackendProbe {
    pub origin: String,
    pub reachable: bool,
    pub status: Option<u16>,
    pub response_time_ms: u64,
    pub error: Option<String>,
}
