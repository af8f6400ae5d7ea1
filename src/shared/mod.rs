//! 共享模块
//! 
//! 包含跨层共享的错误处理、常量、工具函数等

pub mod error;
pub mod utils;
pub mod constants;

// 重新导出常用类型
pub use error::{AppError, AppResult};
