//! 服务层
//!
//! 目前只有 HTTP 一个服务，路由装配与端口绑定都在 [`HttpService`]。

pub mod http;

pub use http::HttpService;
