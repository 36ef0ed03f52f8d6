//! 核心模块 - 配置、状态与启动
//!
//! [`Config`] 读环境变量，[`ServerState`] 聚合数据库与各服务，
//! [`Server`] 负责绑定端口和优雅停机。

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
