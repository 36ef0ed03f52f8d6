//! 嵌入式数据库
//!
//! Handles the embedded SurrealDB (RocksDB) instance, schema definition
//! and first-run seeding.

pub mod models;
pub mod repository;

use crate::db::models::{Role, UserCreate};
use crate::db::repository::UserRepository;
use shared::error::AppError;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Owns the embedded SurrealDB handle and its startup routine
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database under `db_path` and prepare it
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Database open failed: {e}")))?;
        db.use_ns("bursar")
            .use_db("bursar")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        tracing::info!("Database connection established (SurrealDB RocksDB)");

        let service = Self { db };
        service.define_schema().await?;
        service.seed_admin().await?;
        Ok(service)
    }

    /// Clone of the underlying database handle
    pub fn db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// Define tables and indexes (idempotent)
    ///
    /// Tables are SCHEMALESS; model structs are the schema of record.
    /// UNIQUE indexes back up the application-level duplicate checks.
    async fn define_schema(&self) -> Result<(), AppError> {
        let statements = [
            "DEFINE TABLE IF NOT EXISTS student SCHEMALESS",
            "DEFINE INDEX IF NOT EXISTS student_code_unique ON student FIELDS student_code UNIQUE",
            "DEFINE INDEX IF NOT EXISTS student_email_unique ON student FIELDS email UNIQUE",
            "DEFINE INDEX IF NOT EXISTS student_phone_unique ON student FIELDS phone UNIQUE",
            "DEFINE TABLE IF NOT EXISTS payment_record SCHEMALESS",
            "DEFINE INDEX IF NOT EXISTS payment_record_student ON payment_record FIELDS student_id",
            "DEFINE TABLE IF NOT EXISTS user SCHEMALESS",
            "DEFINE INDEX IF NOT EXISTS user_username_unique ON user FIELDS username UNIQUE",
            "DEFINE INDEX IF NOT EXISTS user_email_unique ON user FIELDS email UNIQUE",
        ];
        for stmt in statements {
            self.db
                .query(stmt)
                .await
                .map_err(|e| AppError::database(format!("Schema definition failed: {e}")))?;
        }
        tracing::info!("Database schema defined");
        Ok(())
    }

    /// Seed the admin account on first run
    ///
    /// 管理员账号只在用户表为空时创建。
    async fn seed_admin(&self) -> Result<(), AppError> {
        let users = UserRepository::new(self.db.clone());
        if users.count().await.map_err(AppError::from)? > 0 {
            return Ok(());
        }

        let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@bursar.local".to_string());
        let password = load_admin_password();

        users
            .create(UserCreate {
                username: username.clone(),
                password,
                display_name: Some("Administrator".to_string()),
                email,
                role: Role::Admin,
            })
            .await
            .map_err(AppError::from)?;

        tracing::info!(username = %username, "Seeded initial admin account");
        Ok(())
    }
}

/// Admin password from `ADMIN_PASSWORD`
///
/// 生产环境必须显式设置；开发环境回退到固定默认值。
fn load_admin_password() -> String {
    match std::env::var("ADMIN_PASSWORD") {
        Ok(p) if !p.is_empty() => p,
        _ => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!("ADMIN_PASSWORD not set, using development default");
                "admin123".to_string()
            }
            #[cfg(not(debug_assertions))]
            {
                panic!("ADMIN_PASSWORD environment variable must be set in production")
            }
        }
    }
}
