//! Unified error system for the Bursar server
//!
//! One numeric `ErrorCode` namespace covers the whole API surface: services
//! raise [`AppError`]s, the HTTP layer renders them as [`ApiResponse`] bodies
//! with the status derived from the code, and clients switch on the number
//! instead of parsing message text.
//!
//! Code ranges: 0xxx general, 1xxx auth, 2xxx permission, 3xxx student,
//! 4xxx payment, 5xxx user, 9xxx system.
//!
//! # Example
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::overpayment(600.0, 500.0);
//! assert_eq!(err.code, ErrorCode::Overpayment);
//! assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
//!
//! let body = ApiResponse::<()>::error(&err);
//! assert_eq!(body.code, Some(4002));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
