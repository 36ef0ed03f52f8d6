//! ErrorCode 到 HTTP 状态码的映射
//!
//! 状态码只承载 HTTP 语义层，客户端做精确分支依据的是 body 里的数字码。

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        use ErrorCode::*;

        match self {
            Success => StatusCode::OK,

            NotAuthenticated | InvalidCredentials | TokenExpired | TokenInvalid
            | SessionExpired => StatusCode::UNAUTHORIZED,

            PermissionDenied | RoleRequired | AdminRequired => StatusCode::FORBIDDEN,

            NotFound | StudentNotFound | PaymentRecordNotFound | UserNotFound => {
                StatusCode::NOT_FOUND
            }

            // Uniqueness and referential conflicts
            AlreadyExists | StudentCodeExists | StudentEmailExists | StudentPhoneExists
            | StudentHasPayments | UsernameExists | UserEmailExists | CannotDeleteSelf => {
                StatusCode::CONFLICT
            }

            NetworkError | TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            Unknown | InternalError | DatabaseError | ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // Remaining validation and ledger-rule failures
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
