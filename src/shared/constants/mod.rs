//! 常量定义模块

/// 服务相关常量
pub mod server {
    pub const SERVICE_NAME: &str = "zintel-gateway";
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 3000;
}

/// 外部ML后端相关常量
pub mod backend {
    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
    /// 后端失败时附加给调用方的提示
    pub const UNAVAILABLE_HINT: &str = "Make sure Python backend is running.";
    pub const PREDICT_PATH: &str = "predict";
    pub const NEWS_PATH: &str = "news";
    pub const VERIFY_OCR_PATH: &str = "verify-ocr";
    pub const PREDICT_TEXT_PARAM: &str = "text";
}

/// 面向调用方的错误消息
pub mod messages {
    pub const TEXT_REQUIRED: &str = "Text parameter is required";
    pub const FILE_REQUIRED: &str = "Image file is required";
    pub const INVALID_JSON_BODY: &str = "Request body must be valid JSON";
}

/// 文件上传相关常量
pub mod upload {
    pub const FILE_FIELD: &str = "file";
    pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024; // 10MB
    /// multipart 边界和头部的额外开销
    pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
}

/// HTTP相关常量
pub mod http {
    pub const APPLICATION_JSON: &str = "application/json";
    /// 代理响应的缓存头
    pub const RESPONSE_NO_STORE: &str = "no-store";
    /// 出站请求绕过中间缓存
    pub const OUTBOUND_NO_CACHE: &str = "no-store, no-cache, max-age=0";
    pub const PRAGMA_NO_CACHE: &str = "no-cache";
}
