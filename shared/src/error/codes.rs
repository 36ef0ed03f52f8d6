//! 统一错误码表
//!
//! Every error leaving the server carries one of these codes. The numeric
//! space is split by the thousands digit:
//!
//! - 0xxx   general / validation
//! - 1xxx   authentication
//! - 2xxx   permission
//! - 3xxx   student records
//! - 4xxx   payment ledger
//! - 5xxx   user accounts
//! - 9xxx   system
//!
//! Codes are append-only. Never renumber an existing code, clients match
//! on the numeric value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire-level error code carried in every error response body.
///
/// Serialized as the bare `u16` (`4002`, not `"Overpayment"`) so that
/// non-Rust clients can match on it without knowing variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ---- 0xxx general ----
    /// Reserved success value, never attached to an error response
    Success = 0,
    /// Fallback when no more precise code applies
    Unknown = 1,
    /// Request payload failed validation
    ValidationFailed = 2,
    /// Generic lookup miss for non-domain resources
    NotFound = 3,
    /// Generic uniqueness conflict
    AlreadyExists = 4,
    /// Request is structurally unusable
    InvalidRequest = 5,
    /// A field value has the wrong shape (dates, enums, record ids)
    InvalidFormat = 6,
    /// A mandatory field was omitted
    RequiredField = 7,
    /// A numeric field is outside its allowed range
    ValueOutOfRange = 8,

    // ---- 1xxx authentication ----
    /// No usable credentials on the request
    NotAuthenticated = 1001,
    /// Username/password pair rejected at login
    InvalidCredentials = 1002,
    /// JWT expired
    TokenExpired = 1003,
    /// JWT failed signature or claim checks
    TokenInvalid = 1004,
    /// Login session no longer valid
    SessionExpired = 1005,

    // ---- 2xxx permission ----
    /// Authenticated but not allowed
    PermissionDenied = 2001,
    /// Endpoint needs a specific role
    RoleRequired = 2002,
    /// Endpoint is admin-only
    AdminRequired = 2003,

    // ---- 3xxx student records ----
    /// No student under the given id
    StudentNotFound = 3001,
    /// Student code is already taken
    StudentCodeExists = 3002,
    /// Email already bound to another student
    StudentEmailExists = 3003,
    /// Phone already bound to another student
    StudentPhoneExists = 3004,
    /// paid_amount would exceed total_amount
    PaidExceedsTotal = 3005,
    /// Deletion blocked by existing payment records
    StudentHasPayments = 3006,

    // ---- 4xxx payment ledger ----
    /// No payment record under the given id
    PaymentRecordNotFound = 4001,
    /// Recording this payment would push paid past total
    Overpayment = 4002,
    /// Amount is zero, negative, or malformed
    PaymentInvalidAmount = 4003,

    // ---- 5xxx user accounts ----
    /// No user account under the given id
    UserNotFound = 5001,
    /// Username is already taken
    UsernameExists = 5002,
    /// Email already bound to another account
    UserEmailExists = 5003,
    /// A user may not delete their own account
    CannotDeleteSelf = 5004,

    // ---- 9xxx system ----
    /// Unclassified server fault
    InternalError = 9001,
    /// Database query or connection failure
    DatabaseError = 9002,
    /// Upstream network failure
    NetworkError = 9003,
    /// Operation exceeded its deadline
    TimeoutError = 9004,
    /// Bad or missing configuration at startup
    ConfigError = 9005,
}

impl ErrorCode {
    /// Every defined code, in ascending wire order.
    ///
    /// Drives the `TryFrom<u16>` lookup and the exhaustive serde tests.
    pub const ALL: &'static [Self] = &[
        Self::Success,
        Self::Unknown,
        Self::ValidationFailed,
        Self::NotFound,
        Self::AlreadyExists,
        Self::InvalidRequest,
        Self::InvalidFormat,
        Self::RequiredField,
        Self::ValueOutOfRange,
        Self::NotAuthenticated,
        Self::InvalidCredentials,
        Self::TokenExpired,
        Self::TokenInvalid,
        Self::SessionExpired,
        Self::PermissionDenied,
        Self::RoleRequired,
        Self::AdminRequired,
        Self::StudentNotFound,
        Self::StudentCodeExists,
        Self::StudentEmailExists,
        Self::StudentPhoneExists,
        Self::PaidExceedsTotal,
        Self::StudentHasPayments,
        Self::PaymentRecordNotFound,
        Self::Overpayment,
        Self::PaymentInvalidAmount,
        Self::UserNotFound,
        Self::UsernameExists,
        Self::UserEmailExists,
        Self::CannotDeleteSelf,
        Self::InternalError,
        Self::DatabaseError,
        Self::NetworkError,
        Self::TimeoutError,
        Self::ConfigError,
    ];

    /// Numeric wire value.
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// True only for [`ErrorCode::Success`].
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message used when a handler does not supply its own.
    pub const fn message(&self) -> &'static str {
        match self {
            // 0xxx
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // 1xxx
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionExpired => "Session has expired",

            // 2xxx
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // 3xxx
            ErrorCode::StudentNotFound => "Student not found",
            ErrorCode::StudentCodeExists => "Student code already exists",
            ErrorCode::StudentEmailExists => "Student email already exists",
            ErrorCode::StudentPhoneExists => "Student phone already exists",
            ErrorCode::PaidExceedsTotal => "Paid amount cannot exceed total amount",
            ErrorCode::StudentHasPayments => "Student still has payment records",

            // 4xxx
            ErrorCode::PaymentRecordNotFound => "Payment record not found",
            ErrorCode::Overpayment => "Payment would exceed total amount owed",
            ErrorCode::PaymentInvalidAmount => "Payment amount is invalid",

            // 5xxx
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::UserEmailExists => "User email already exists",
            ErrorCode::CannotDeleteSelf => "Cannot delete own account",

            // 9xxx
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rejected numeric value from `TryFrom<u16>` / deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized error code {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}
