//! 日志初始化
//!
//! 默认输出到 stdout；LOG_DIR 指向已存在目录时改为写入按天滚动的
//! 文件。过滤优先级: RUST_LOG > LOG_LEVEL > info。

use std::path::Path;

pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// 初始化全局 subscriber
///
/// `json` 为 true 时整行输出 JSON，供外部采集器摄取。
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // 目录不存在时静默回落到 stdout
    let appender = log_dir
        .map(Path::new)
        .filter(|p| p.is_dir())
        .map(|p| tracing_appender::rolling::daily(p, "bursar-server"));

    match (appender, json.unwrap_or(false)) {
        (Some(file), true) => builder.json().with_writer(file).init(),
        (Some(file), false) => builder.with_writer(file).init(),
        (None, true) => builder.json().init(),
        (None, false) => builder.init(),
    }
}
