//! HTTP 接口层
//!
//! 每个子模块负责一组 `/api` 前缀的路由。handler 只做参数解析、
//! 权限判断和响应包装，业务逻辑在 ledger / stats / db 层。

pub mod auth;
pub mod health;
pub mod payment_records;
pub mod stats;
pub mod students;
pub mod users;
