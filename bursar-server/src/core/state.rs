use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::services::HttpService;

/// 服务器状态
///
/// 所有 handler 通过它访问配置、数据库与 JWT 服务。Clone 只复制
/// Arc 与句柄，可以随意传递。
///
/// 初始化分两段：先建好数据库和各服务得到 state，再把 state 注入
/// [`HttpService`] 补建路由，因为路由本身依赖完整的 state。
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 启动时装配好的配置
    pub config: Config,
    /// 嵌入式 SurrealDB 句柄
    pub db: Surreal<Db>,
    /// HTTP 服务
    pub http: HttpService,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 装配全部服务
    ///
    /// 依次：建工作目录、打开 work_dir/database/bursar.db（含 schema
    /// 定义与管理员种子账号）、装配服务、补建 HTTP 路由。
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic，服务器无法降级运行。
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("work directory creation failed");

        let db_path = config.database_dir().join("bursar.db");
        let db_service = DbService::new(&db_path)
            .await
            .expect("database initialization failed");

        let http = HttpService::new(config.clone());
        let state = Self {
            config: config.clone(),
            db: db_service.db,
            http: http.clone(),
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
        };

        // 路由依赖 state，最后补建
        http.initialize(state.clone());

        state
    }

    /// JWT 服务句柄
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
