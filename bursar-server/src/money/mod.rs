//! 金额运算，全部走 `Decimal`
//!
//! f64 只存在于存储与序列化边界上，进了这个模块先转 `Decimal` 再算，
//! 算完四舍五入到分转回去，浮点误差不会进账面。金额上限与校验也集中在这里。

use crate::db::models::payment_record::PaymentRecord;
use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};

/// Everything leaving this module is rounded to this many decimal places
const DECIMAL_PLACES: u32 = 2;

/// Amounts closer than one cent count as equal
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed tuition total per student (€10,000,000)
const MAX_TOTAL_AMOUNT: f64 = 10_000_000.0;
/// Maximum allowed single payment amount (€1,000,000)
const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

/// Reject NaN and infinities before they reach any arithmetic
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{} must be a finite number, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Validate a tuition amount field (totalAmount / paidAmount on a student)
///
/// Must be finite, non-negative and below the per-student ceiling.
pub fn validate_tuition_amount(value: f64, field_name: &str) -> AppResult<()> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{} must be non-negative, got {}", field_name, value),
        ));
    }
    if value > MAX_TOTAL_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!(
                "{} exceeds maximum allowed ({}), got {}",
                field_name, MAX_TOTAL_AMOUNT, value
            ),
        ));
    }
    Ok(())
}

/// Validate a single payment amount before recording it
///
/// Must be finite, strictly positive and below the per-payment ceiling.
pub fn validate_payment_amount(amount: f64) -> AppResult<()> {
    require_finite(amount, "amount")?;
    if amount <= 0.0 {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            format!("amount must be positive, got {}", amount),
        ));
    }
    if amount > MAX_PAYMENT_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            format!(
                "amount exceeds maximum allowed ({}), got {}",
                MAX_PAYMENT_AMOUNT, amount
            ),
        ));
    }
    Ok(())
}

/// Stored f64 into `Decimal`
///
/// Finiteness is checked at the API boundary via `require_finite()`; a
/// non-finite value that still lands here is logged and treated as zero
/// instead of poisoning the surrounding calculation.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite amount reached decimal conversion, treating as zero");
        Decimal::ZERO
    })
}

/// Back to f64 for storage, rounded half away from zero to cents
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // Decimal 上限 ~7.9e28，远在 f64 可表示范围内
        .expect("Decimal always fits in f64")
}

/// Remaining debt for a student: total - paid, clamped to zero
pub fn remaining_debt(total_amount: f64, paid_amount: f64) -> f64 {
    let remaining = to_decimal(total_amount) - to_decimal(paid_amount);
    to_f64(remaining.max(Decimal::ZERO))
}

/// Payment progress as a percentage in [0, 100]
///
/// A student with no tuition due reports 0 progress rather than dividing by zero.
pub fn payment_progress(total_amount: f64, paid_amount: f64) -> f64 {
    let total = to_decimal(total_amount);
    if total <= Decimal::ZERO {
        return 0.0;
    }
    let progress = to_decimal(paid_amount) * Decimal::ONE_HUNDRED / total;
    to_f64(progress.min(Decimal::ONE_HUNDRED))
}

/// Check whether a paid amount exceeds the total (beyond tolerance)
pub fn paid_exceeds_total(paid_amount: f64, total_amount: f64) -> bool {
    to_decimal(paid_amount) > to_decimal(total_amount) + MONEY_TOLERANCE
}

/// Check whether adding `amount` to `paid` would exceed `total` (beyond tolerance)
pub fn would_overpay(paid_amount: f64, amount: f64, total_amount: f64) -> bool {
    let new_paid = to_decimal(paid_amount) + to_decimal(amount);
    new_paid > to_decimal(total_amount) + MONEY_TOLERANCE
}

/// Add a payment to the running paid total
pub fn add_payment(paid_amount: f64, amount: f64) -> f64 {
    to_f64(to_decimal(paid_amount) + to_decimal(amount))
}

/// Remove a payment from the running paid total, clamped to zero
///
/// Clamping covers ledgers that drifted out of sync with the stored aggregate.
pub fn subtract_payment(paid_amount: f64, amount: f64) -> f64 {
    let remaining = to_decimal(paid_amount) - to_decimal(amount);
    to_f64(remaining.max(Decimal::ZERO))
}

/// Sum payment record amounts with precise arithmetic
pub fn sum_payments(records: &[PaymentRecord]) -> f64 {
    let total: Decimal = records.iter().map(|r| to_decimal(r.amount)).sum();
    to_f64(total)
}

/// Paid covers required, give or take the one-cent tolerance
pub fn is_payment_sufficient(paid: f64, required: f64) -> bool {
    let paid_dec = to_decimal(paid);
    let required_dec = to_decimal(required);
    paid_dec >= required_dec - MONEY_TOLERANCE
}

/// Equality up to the one-cent tolerance
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}
