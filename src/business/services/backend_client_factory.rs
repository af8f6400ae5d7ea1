//! 后端HTTP客户端工厂
//!
//! 根据后端配置创建共享的 reqwest 客户端

use anyhow::Context;
use reqwest::Client;
use tracing::{debug, info};

use crate::infrastructure::BackendConfig;

/// 后端HTTP客户端工厂
pub struct BackendClientFactory;

impl BackendClientFactory {
    /// 根据后端配置创建HTTP客户端
    ///
    /// 只有显式配置了超时才会设置，否则沿用传输层默认值
    pub fn create_client(config: &BackendConfig) -> anyhow::Result<Client> {
        let mut client_builder = Client::builder()
            .user_agent(concat!("zintel-gateway/", env!("CARGO_PKG_VERSION")));

        match config.timeout() {
            Some(timeout) => {
                info!("⏱️  后端请求超时: {:?}", timeout);
                client_builder = client_builder.timeout(timeout);
            }
            None => debug!("未配置后端超时，使用传输层默认值"),
        }

        client_builder.build().context("创建HTTP客户端失败")
    }
}
