//! 字段校验
//!
//! 文本长度上限和格式检查集中在这个模块，handler 层逐字段调用。
//! SurrealDB 的 string 不带长度约束，超长输入必须拦在入库之前；
//! 收据号这类财务处发放的引用本身就短，上限跟着业务走。

use std::collections::HashMap;

use shared::error::{AppError, AppResult};

// ── Length ceilings ─────────────────────────────────────────────────

/// Person names: first/last/guardian names, school names
pub const MAX_NAME_LEN: usize = 200;

/// Payment descriptions
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Receipt numbers issued by the finance office
pub const MAX_RECEIPT_LEN: usize = 50;

/// Short identifiers: phone, city, academic year, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses, the RFC 5321 ceiling
pub const MAX_EMAIL_LEN: usize = 254;

/// Plaintext passwords, checked before hashing
pub const MAX_PASSWORD_LEN: usize = 128;

/// Street addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// The fixed program catalogue students can enroll in
pub const PROGRAMS: [&str; 4] = [
    "Computer Science",
    "Business Administration",
    "Finance",
    "Marketing",
];

// ── Generic text checks ─────────────────────────────────────────────

/// Required text: non-empty after trim, and within the ceiling.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Optional text: only the ceiling applies, and only when present.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> AppResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

// ── Student field formats ───────────────────────────────────────────

/// Validate the student code format `NN/NNN/NN` (region/sequence/year)
pub fn validate_student_code(code: &str) -> AppResult<()> {
    let bytes = code.as_bytes();
    let well_formed = bytes.len() == 9
        && bytes[2] == b'/'
        && bytes[6] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 2 | 6) || b.is_ascii_digit());
    if !well_formed {
        return Err(AppError::validation(format!(
            "student_code must match NN/NNN/NN (region/sequence/year), got '{}'",
            code
        )));
    }
    Ok(())
}

/// Validate an academic year string `YYYY-YYYY` (two consecutive years)
pub fn validate_academic_year(value: &str) -> AppResult<()> {
    let invalid = || {
        AppError::validation(format!(
            "academic_year must match YYYY-YYYY (two consecutive years), got '{}'",
            value
        ))
    };
    let (start, end) = value.split_once('-').ok_or_else(invalid)?;
    if start.len() != 4 || end.len() != 4 {
        return Err(invalid());
    }
    let start: i32 = start.parse().map_err(|_| invalid())?;
    let end: i32 = end.parse().map_err(|_| invalid())?;
    if end != start + 1 {
        return Err(invalid());
    }
    Ok(())
}

/// Validate a program against the fixed catalogue
pub fn validate_program(value: &str) -> AppResult<()> {
    if !PROGRAMS.contains(&value) {
        return Err(AppError::validation(format!(
            "program must be one of {:?}, got '{}'",
            PROGRAMS, value
        )));
    }
    Ok(())
}

/// Minimal email shape check (local@domain with a dotted domain)
pub fn validate_email(value: &str) -> AppResult<()> {
    validate_required_text(value, "email", MAX_EMAIL_LEN)?;
    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !valid {
        return Err(AppError::validation(format!("email is not valid: '{}'", value)));
    }
    Ok(())
}

// ── Multi-field validation ──────────────────────────────────────────

/// Collects per-field validation failures so a request reports every
/// violated field at once instead of stopping at the first.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, serde_json::Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a single-field check and keep its message on failure.
    ///
    /// The first failure per field wins; later checks do not overwrite it.
    pub fn check(&mut self, field: &str, result: AppResult<()>) {
        if let Err(e) = result {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| serde_json::Value::String(e.message));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail with a validation error listing every violated field.
    pub fn into_result(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation_fields(self.errors))
        }
    }
}
