//! 业务服务模块
//!
//! 后端代理服务：把入站请求转换为对外部ML后端的单次调用

pub mod backend_client_factory;
pub mod backend_proxy;

use async_trait::async_trait;

use crate::business::domain::{
    BackendProbe, BinaryPayload, NewsPayload, PredictionResult, VerificationResult,
};
use crate::shared::AppResult;

pub use backend_client_factory::BackendClientFactory;
pub use backend_proxy::BackendProxy;

/// 验证后端接口
///
/// 实现必须是无状态的：每次调用相互独立，失败不重试
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// 转发文本到预测端点
    async fn forward_text(&self, text: &str) -> AppResult<PredictionResult>;

    /// 以 multipart 形式转发上传文件到图片验证端点
    async fn forward_file(&self, file: BinaryPayload) -> AppResult<VerificationResult>;

    /// 获取新闻，每次调用都重新请求后端
    async fn fetch_news(&self) -> AppResult<NewsPayload>;

    /// 探测后端是否可达
    async fn probe(&self) -> BackendProbe;
}
