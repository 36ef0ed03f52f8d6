//! 按千位数字分组的错误类别

use super::codes::ErrorCode;

/// Coarse error grouping derived from the code's thousands digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 0xxx, validation and generic resource errors
    General,
    /// 1xxx, login and token errors
    Auth,
    /// 2xxx, authorization errors
    Permission,
    /// 3xxx, student record errors
    Student,
    /// 4xxx, payment ledger errors
    Payment,
    /// 5xxx, account management errors
    User,
    /// 9xxx, infrastructure errors
    System,
}

impl ErrorCategory {
    /// Get the category for an error code
    pub const fn from_code(code: ErrorCode) -> Self {
        let code_value = code.code();
        match code_value {
            0..1000 => ErrorCategory::General,
            1000..2000 => ErrorCategory::Auth,
            2000..3000 => ErrorCategory::Permission,
            3000..4000 => ErrorCategory::Student,
            4000..5000 => ErrorCategory::Payment,
            5000..6000 => ErrorCategory::User,
            _ => ErrorCategory::System,
        }
    }

    /// Get a human-readable name for this category
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorCategory::General => "General",
            ErrorCategory::Auth => "Authentication",
            ErrorCategory::Permission => "Permission",
            ErrorCategory::Student => "Student",
            ErrorCategory::Payment => "Payment",
            ErrorCategory::User => "User",
            ErrorCategory::System => "System",
        }
    }
}
