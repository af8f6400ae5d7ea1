//! 工具函数模块

use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 生成请求ID，用于日志关联
///
/// 格式 `req_<微秒时间戳>_<序号>`，同一微秒内的请求靠序号区分
pub fn generate_request_id() -> String {
    let sequence = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("req_{}_{}", chrono::Utc::now().timestamp_micros(), sequence)
}

/// 格式化字节数
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;
    
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }
    
    format!("{:.2} {}", size, UNITS[unit_index])
}

/// 格式化持续时间
pub fn format_duration_ms(milliseconds: u64) -> String {
    if milliseconds < 1000 {
        format!("{}ms", milliseconds)
    } else if milliseconds < 60_000 {
        let seconds = milliseconds as f64 / 1000.0;
        format!("{:.1}s", seconds)
    } else {
        let minutes = milliseconds / 60_000;
        let seconds = (milliseconds % 60_000) / 1000;
        format!("{}m{}s", minutes, seconds)
    }
}

/// 截断过长的文本用于日志输出（按字符边界）
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}…", truncated)
}
