use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 进程级配置
///
/// 全部来自环境变量，未设置时取默认值：
///
/// - `WORK_DIR`，默认 `/var/lib/bursar`，数据库与日志的根目录
/// - `HTTP_PORT`，默认 3000
/// - `ENVIRONMENT`，默认 `development`
/// - `SHUTDOWN_TIMEOUT_MS`，默认 10000，优雅关停的 drain 上限
///
/// JWT 相关变量见 [`JwtConfig`]，管理员种子账号变量
/// (`ADMIN_USERNAME` / `ADMIN_PASSWORD` / `ADMIN_EMAIL`) 见 `db` 模块。
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP 监听端口
    pub http_port: u16,
    /// JWT 签发与校验参数
    pub jwt: JwtConfig,
    /// 运行环境，development / staging / production
    pub environment: String,
    /// 关停前等待在途请求的毫秒数
    pub shutdown_timeout_ms: u64,
}

fn env_str(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

impl Config {
    /// 读取环境变量装配配置
    pub fn from_env() -> Self {
        Self {
            work_dir: env_str("WORK_DIR", "/var/lib/bursar"),
            http_port: env_parse("HTTP_PORT", 3000),
            jwt: JwtConfig::default(),
            environment: env_str("ENVIRONMENT", "development"),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10_000),
        }
    }

    /// 在环境配置的基础上覆盖工作目录与端口，测试用
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录: `<work_dir>/database`
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录: `<work_dir>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
