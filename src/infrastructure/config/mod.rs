use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::business::domain::BackendEndpoint;
use crate::shared::constants::{backend, server, upload};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 构建好的前端静态文件目录（可选）
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// 未设置时使用传输层默认值
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_bytes: usize,
}

/// 命令行参数对配置的覆盖
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend_url: Option<String>,
    pub static_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// 去掉空字符串值（例如 `.env` 中的 `LLM_BACKEND_URL=`）
    pub fn without_blank_values(self) -> Self {
        let not_blank = |value: &String| !value.trim().is_empty();
        Self {
            host: self.host.filter(not_blank),
            port: self.port,
            backend_url: self.backend_url.filter(not_blank),
            static_dir: self
                .static_dir
                .filter(|dir| !dir.as_os_str().is_empty()),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        // 从环境变量加载配置
        dotenv::dotenv().ok();

        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// 通过键查找函数构建配置，空值视为未设置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Config {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| server::DEFAULT_HOST.to_string()),
                port: get("PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(server::DEFAULT_PORT),
                static_dir: get("FRONTEND_DIST_PATH").map(PathBuf::from),
            },

            backend: BackendConfig {
                base_url: get("LLM_BACKEND_URL")
                    .unwrap_or_else(|| backend::DEFAULT_BASE_URL.to_string()),
                timeout_seconds: get("LLM_BACKEND_TIMEOUT").and_then(|v| v.parse().ok()),
            },

            upload: UploadConfig {
                max_file_bytes: get("MAX_UPLOAD_BYTES")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(upload::DEFAULT_MAX_FILE_BYTES),
            },
        }
    }

    /// 应用命令行覆盖，空值与环境变量一样视为未设置
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let overrides = overrides.without_blank_values();
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(backend_url) = overrides.backend_url {
            self.backend.base_url = backend_url;
        }
        if let Some(static_dir) = overrides.static_dir {
            self.server.static_dir = Some(static_dir);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.backend.origin()?;
        if self.upload.max_file_bytes == 0 {
            bail!("MAX_UPLOAD_BYTES 必须大于0");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// 解析后端源地址，路径统一以 `/` 结尾
    pub fn origin(&self) -> anyhow::Result<Url> {
        let mut origin = Url::parse(self.base_url.trim())
            .with_context(|| format!("无效的后端地址: {}", self.base_url))?;

        if !matches!(origin.scheme(), "http" | "https") {
            bail!("后端地址必须是 http 或 https: {}", self.base_url);
        }

        if !origin.path().ends_with('/') {
            let path = format!("{}/", origin.path());
            origin.set_path(&path);
        }
        Ok(origin)
    }

    /// 端点的完整地址，保留后端源上的路径前缀
    pub fn endpoint_url(&self, endpoint: BackendEndpoint) -> anyhow::Result<Url> {
        let origin = self.origin()?;
        origin
            .join(endpoint.path())
            .with_context(|| format!("无法构建 {} 端点地址", endpoint))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(backend::DEFAULT_BASE_URL)
    }
}

impl UploadConfig {
    /// 上传路由的请求体上限，为 multipart 框架预留余量
    pub fn body_limit(&self) -> usize {
        self.max_file_bytes
            .saturating_add(upload::MULTIPART_OVERHEAD_BYTES)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: upload::DEFAULT_MAX_FILE_BYTES,
        }
    }
}
