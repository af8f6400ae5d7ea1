//! 统一错误处理模块
//!
//! 代理层只有三类错误：调用方输入错误、后端返回失败状态、后端不可达。
//! HTTP状态码只在 `IntoResponse` 中决定。

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::business::domain::BackendEndpoint;
use crate::shared::constants::http::RESPONSE_NO_STORE;

/// 应用程序统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 调用方输入缺失或无效，在任何网络调用之前检测
    #[error("输入无效: {message}")]
    InvalidInput { message: String },

    /// 后端返回了非成功状态（或无法解析的成功响应）
    #[error("后端 {endpoint} 返回错误: {status} ({reason})")]
    BackendError {
        endpoint: BackendEndpoint,
        status: u16,
        reason: String,
    },

    /// 网络层失败：超时、连接被拒绝、DNS失败
    #[error("后端 {endpoint} 不可达: {message}")]
    BackendUnreachable {
        endpoint: BackendEndpoint,
        message: String,
    },
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
        }
    }

    /// 后端返回非2xx状态
    pub fn backend_status(endpoint: BackendEndpoint, status: u16) -> Self {
        AppError::BackendError {
            endpoint,
            status,
            reason: format!("Backend returned {}", status),
        }
    }

    pub fn unreachable(endpoint: BackendEndpoint, message: impl Into<String>) -> Self {
        AppError::BackendUnreachable {
            endpoint,
            message: message.into(),
        }
    }

    /// 获取HTTP状态码
    ///
    /// 后端失败统一为503，不透传后端原始状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::BackendError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BackendUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// 获取错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::BackendError { .. } => "BACKEND_ERROR",
            AppError::BackendUnreachable { .. } => "BACKEND_UNREACHABLE",
        }
    }

    /// 构造返回给调用方的JSON错误体
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            AppError::InvalidInput { message } => json!({ "error": message }),
            AppError::BackendError {
                endpoint,
                status,
                reason,
            } => json!({
                "error": endpoint.failure_message(),
                "details": reason,
                "backend_status": status,
            }),
            AppError::BackendUnreachable { endpoint, message } => json!({
                "error": endpoint.failure_message(),
                "details": message,
            }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_code = self.error_code();

        match &self {
            AppError::InvalidInput { .. } => tracing::warn!(
                status = ?status_code,
                error_code = error_code,
                error = %self,
                "拒绝无效请求"
            ),
            AppError::BackendError { .. } | AppError::BackendUnreachable { .. } => tracing::error!(
                status = ?status_code,
                error_code = error_code,
                error = %self,
                "转发到后端失败"
            ),
        }

        (
            status_code,
            [(header::CACHE_CONTROL, RESPONSE_NO_STORE)],
            Json(self.to_body()),
        )
            .into_response()
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 输入错误构造宏
#[macro_export]
macro_rules! invalid_input {
    ($msg:expr) => {
        $crate::shared::error::AppError::invalid_input($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::shared::error::AppError::invalid_input(format!($fmt, $($arg)*))
    };
}
