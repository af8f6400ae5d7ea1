//! 基础设施层模块
//! 
//! 负责配置管理等基础设施相关功能

pub mod config;

// 重新导出常用类型
pub use config::{BackendConfig, Config, ConfigOverrides, ServerConfig, UploadConfig};
