//! 跨 crate 共享类型
//!
//! 统一错误体系、认证 DTO 与时间戳工具。server 与未来的客户端都
//! 从这里取定义，错误码和响应结构只存在一份。

pub mod client;
pub mod error;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use util::now_millis;
