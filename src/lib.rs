//! Zintel Gateway 服务
//! 
//! 把验证请求转发到外部ML后端的代理服务，基于三层架构设计

// 核心模块
pub mod shared;          // 共享模块（错误处理、常量、工具函数）
pub mod infrastructure;  // 基础设施层（配置）
pub mod business;        // 业务逻辑层（领域模型、后端代理）
pub mod presentation;    // 表示层（HTTP处理、路由）

// 重新导出核心类型
pub use infrastructure::Config;
pub use shared::{AppError, AppResult};
pub use presentation::{create_routes, AppState};
