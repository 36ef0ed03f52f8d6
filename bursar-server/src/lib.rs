//! Bursar Server 主库
//!
//! 面向高校行政后台的学生档案与缴费管理服务，对外只暴露 JSON REST
//! 接口。核心约束是账本一致性：缴费流水 (payment_record) 与学生聚合
//! 字段 (paid_amount) 双写，由 `ledger` 模块协调并提供对账修复。
//!
//! 模块划分：
//!
//! - `core`: 配置加载、ServerState 装配、启动入口
//! - `db`: 嵌入式 SurrealDB，schema 定义与种子数据
//! - `auth`: JWT 签发校验与角色中间件
//! - `api`: axum 路由与 handler
//! - `ledger`: 缴费账本双写与对账
//! - `stats`: 全局财务汇总
//! - `money`: Decimal 金额运算与宽容比较
//! - `services`: HTTP 服务装配
//! - `utils`: 日志初始化，shared 错误类型 re-export

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod ledger;
pub mod money;
pub mod services;
pub mod stats;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use ledger::LedgerService;
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// 安全事件日志，固定打到 `security` target，供审计侧单独收集
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ____
   / __ ) __  __   _____  _____  ____ _   _____
  / __  |/ / / /  / ___/ / ___/ / __ `/  / ___/
 / /_/ / / /_/ / / /    (__  ) / /_/ /  / /
/_____/  \__,_/ /_/     /____/ \__,_/  /_/
    "#
    );
}

/// 初始化进程环境: .env 文件 + 日志
///
/// 识别的环境变量：
///
/// - `LOG_LEVEL`，默认 info，`RUST_LOG` 设置时优先
/// - `LOG_JSON`，默认 false，true 时输出 JSON 格式日志
/// - `LOG_DIR`，设置后按天滚动写入文件
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok());
    let log_dir = std::env::var("LOG_DIR").ok();

    utils::logger::init_logger_with_file(log_level.as_deref(), log_json, log_dir.as_deref());

    Ok(())
}
