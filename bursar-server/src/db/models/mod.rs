//! 数据模型，存储层的 schema of record

pub mod payment_record;
pub mod serde_helpers;
pub mod student;
pub mod user;

pub use payment_record::{PaymentRecord, PaymentRecordCreate, PaymentRecordId};
pub use student::{
    Gender, PaymentStatus, Student, StudentCreate, StudentId, StudentResponse, StudentUpdate,
};
pub use user::{Role, User, UserCreate, UserId, UserUpdate};
