//! 数据访问层
//!
//! 每张表一个 repository：user (账号)、student (学籍与聚合字段)、
//! payment_record (缴费流水)。handler 不直接拼 SurrealQL，读写都
//! 经过这里。
//!
//! ID 全栈统一 `table:key` 字符串，进库前解析成 [`surrealdb::RecordId`]，
//! select/delete 直接拿 RecordId 寻址，不手写 WHERE id 查询。

pub mod payment_record;
pub mod student;
pub mod user;

pub use payment_record::PaymentRecordRepository;
pub use student::{StudentFilter, StudentRepository};
pub use user::UserRepository;

use shared::error::{AppError, ErrorCode};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// 仓储层错误
///
/// 业务变体都带着精确的 [`ErrorCode`]，handler 用 `?` 上抛后由
/// [`AppError`] 统一转成响应，不在各处重复映射。
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {1}")]
    NotFound(ErrorCode, String),

    #[error("Duplicate: {1}")]
    Duplicate(ErrorCode, String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {1}")]
    Validation(ErrorCode, String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(code, msg)
            | RepoError::Duplicate(code, msg)
            | RepoError::Validation(code, msg) => AppError::with_message(code, msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// 各 repository 共用的数据库句柄
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
