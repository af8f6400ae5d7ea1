//! 后端代理服务
//!
//! 把验证请求转发到外部ML后端并原样返回响应。
//! 不缓存、不重试，一次失败立即返回给调用方。

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::business::domain::{
    BackendEndpoint, BackendPayload, BackendProbe, BinaryPayload, NewsPayload, PredictionResult,
    VerificationResult,
};
use crate::business::services::{BackendClientFactory, VerificationBackend};
use crate::infrastructure::BackendConfig;
use crate::shared::constants::{backend, http, messages, upload};
use crate::shared::utils::{format_bytes, format_duration_ms};
use crate::shared::{AppError, AppResult};

/// 后端代理
///
/// 构造时注入后端配置，各端点地址在构造时一次性解析
pub struct BackendProxy {
    client: Client,
    origin: Url,
    predict_url: Url,
    news_url: Url,
    verify_ocr_url: Url,
}

impl BackendProxy {
    /// 根据后端配置创建代理
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let client = BackendClientFactory::create_client(config)?;
        Self::with_client(client, config)
    }

    /// 使用已有的HTTP客户端创建代理
    pub fn with_client(client: Client, config: &BackendConfig) -> anyhow::Result<Self> {
        let proxy = Self {
            client,
            origin: config.origin()?,
            predict_url: config.endpoint_url(BackendEndpoint::Predict)?,
            news_url: config.endpoint_url(BackendEndpoint::News)?,
            verify_ocr_url: config.endpoint_url(BackendEndpoint::VerifyOcr)?,
        };
        info!("🔗 后端代理已就绪: {}", proxy.origin);
        Ok(proxy)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn endpoint_url(&self, endpoint: BackendEndpoint) -> &Url {
        match endpoint {
            BackendEndpoint::Predict => &self.predict_url,
            BackendEndpoint::News => &self.news_url,
            BackendEndpoint::VerifyOcr => &self.verify_ocr_url,
        }
    }

    /// 构建出站请求，附加端点的缓存策略
    fn request(&self, endpoint: BackendEndpoint) -> RequestBuilder {
        let mut builder = self
            .client
            .request(endpoint.method(), self.endpoint_url(endpoint).clone())
            .header(ACCEPT, http::APPLICATION_JSON);

        for (name, value) in endpoint.cache_policy().request_headers() {
            builder = builder.header(*name, *value);
        }
        builder
    }

    /// 发送请求并把结果映射到错误分类
    #[instrument(skip(self, builder))]
    async fn dispatch(
        &self,
        endpoint: BackendEndpoint,
        builder: RequestBuilder,
    ) -> AppResult<BackendPayload> {
        let start_time = Instant::now();
        debug!("➡️  转发到后端: {} {}", endpoint.method(), self.endpoint_url(endpoint));

        let response = builder.send().await.map_err(|e| {
            debug!("❌ 后端 {} 不可达: {}", endpoint, e);
            AppError::unreachable(endpoint, describe_transport_error(&e))
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                "❌ 后端 {} 返回错误状态: {} (耗时 {})",
                endpoint,
                status,
                format_duration_ms(start_time.elapsed().as_millis() as u64)
            );
            return Err(AppError::backend_status(endpoint, status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            debug!("❌ 读取后端 {} 响应失败: {}", endpoint, e);
            AppError::unreachable(endpoint, describe_transport_error(&e))
        })?;

        let payload = BackendPayload::from_json_bytes(endpoint, status.as_u16(), body)?;

        info!(
            "✅ 后端 {} 响应成功: {} ({}, 耗时 {})",
            endpoint,
            status,
            format_bytes(payload.as_bytes().len() as u64),
            format_duration_ms(start_time.elapsed().as_millis() as u64)
        );

        Ok(payload)
    }
}

#[async_trait]
impl VerificationBackend for BackendProxy {
    async fn forward_text(&self, text: &str) -> AppResult<PredictionResult> {
        if text.is_empty() {
            return Err(AppError::invalid_input(messages::TEXT_REQUIRED));
        }

        let builder = self
            .request(BackendEndpoint::Predict)
            .query(&[(backend::PREDICT_TEXT_PARAM, text)])
            .header(CONTENT_TYPE, http::APPLICATION_JSON);

        self.dispatch(BackendEndpoint::Predict, builder).await
    }

    async fn forward_file(&self, file: BinaryPayload) -> AppResult<VerificationResult> {
        let BinaryPayload {
            file_name,
            content_type,
            data,
        } = file;

        debug!("📎 转发上传文件: {} ({})", file_name, format_bytes(data.len() as u64));

        let part = Part::stream(data).file_name(file_name);
        let part = match content_type {
            Some(content_type) => part.mime_str(&content_type).map_err(|e| {
                crate::invalid_input!("Invalid file content type '{}': {}", content_type, e)
            })?,
            None => part,
        };
        let form = Form::new().part(upload::FILE_FIELD, part);

        let builder = self.request(BackendEndpoint::VerifyOcr).multipart(form);
        self.dispatch(BackendEndpoint::VerifyOcr, builder).await
    }

    async fn fetch_news(&self) -> AppResult<NewsPayload> {
        let builder = self.request(BackendEndpoint::News);
        self.dispatch(BackendEndpoint::News, builder).await
    }

    async fn probe(&self) -> BackendProbe {
        let start_time = Instant::now();
        let result = self
            .client
            .get(self.origin.clone())
            .header(ACCEPT, http::APPLICATION_JSON)
            .send()
            .await;
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(response) => BackendProbe {
                origin: self.origin.to_string(),
                reachable: true,
                status: Some(response.status().as_u16()),
                response_time_ms,
                error: None,
            },
            Err(e) => {
                error!("🔌 后端探测失败: {}", e);
                BackendProbe {
                    origin: self.origin.to_string(),
                    reachable: false,
                    status: None,
                    response_time_ms,
                    error: Some(describe_transport_error(&e)),
                }
            }
        }
    }
}

/// 把传输层错误转换为可读的诊断信息
fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
