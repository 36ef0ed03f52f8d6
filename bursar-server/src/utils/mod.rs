//! 工具模块
//!
//! 日志初始化、时间窗口计算、输入校验，外加 shared 统一错误类型的
//! re-export，调用侧统一从 `crate::utils` 取用。

pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
