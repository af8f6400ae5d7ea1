//! HTTP请求处理器模块
//! 
//! 实现所有API端点的处理逻辑

pub mod health;
pub mod news;
pub mod verify;
