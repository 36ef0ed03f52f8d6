//! Financial Aggregation
//!
//! Read-only summary statistics over the full student and payment
//! collections. Everything here is a pure function over an in-memory scan
//! of query results; callers supply "now" so the same inputs always produce
//! the same output. Correctness leans on the reconciliation invariant, the
//! numbers trust `paid_amount` and the ledger to agree.

use serde::Serialize;
use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::db::models::{Gender, PaymentRecord, PaymentStatus, Student};
use crate::money;
use crate::utils::time;

/// Global financial overview (for frontend)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_students: i64,
    /// Students with `paid_amount >= total_amount`
    pub paid_students: i64,
    pub debt_students: i64,
    /// Sum of `paid_amount` across all students
    pub total_revenue: f64,
    /// Sum of `max(0, total_amount - paid_amount)` across all students
    pub total_outstanding: f64,
    /// `round(paid_students / total_students * 100)`, 0 with no students
    pub collection_rate: i64,
    /// `round(total_outstanding / debt_students)`, 0 with no debt students
    pub average_debt: i64,
    pub program_stats: Vec<ProgramCount>,
    pub gender_stats: GenderStats,
    pub age_stats: AgeStats,
    pub payment_stats: PaymentStatusStats,
    /// Trailing 12-month payment volume across all ledger entries
    pub monthly_payments: Vec<MonthlyPayment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramCount {
    pub program: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenderStats {
    pub male: i64,
    pub female: i64,
}

/// Fixed age buckets derived from the current date. Students younger than
/// 18 fall outside all three buckets.
#[derive(Debug, Clone, Serialize)]
pub struct AgeStats {
    #[serde(rename = "18-20")]
    pub age_18_20: i64,
    #[serde(rename = "21-23")]
    pub age_21_23: i64,
    #[serde(rename = "24+")]
    pub age_24_plus: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusStats {
    pub paid: i64,
    pub partial: i64,
    pub unpaid: i64,
}

/// One month of payment volume, key format "YYYY-MM"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPayment {
    pub month: String,
    pub total: f64,
}

/// Compute the global overview from a full student and ledger scan
pub fn global_stats(
    students: &[Student],
    records: &[PaymentRecord],
    today: NaiveDate,
    now_millis: i64,
) -> GlobalStats {
    let total_students = students.len() as i64;

    let mut paid_students = 0i64;
    let mut revenue = Decimal::ZERO;
    let mut outstanding = Decimal::ZERO;
    let mut by_program: HashMap<&str, i64> = HashMap::new();
    let mut gender_stats = GenderStats { male: 0, female: 0 };
    let mut age_stats = AgeStats {
        age_18_20: 0,
        age_21_23: 0,
        age_24_plus: 0,
    };
    let mut payment_stats = PaymentStatusStats {
        paid: 0,
        partial: 0,
        unpaid: 0,
    };

    for student in students {
        if money::is_payment_sufficient(student.paid_amount, student.total_amount) {
            paid_students += 1;
        }
        revenue += money::to_decimal(student.paid_amount);
        outstanding += money::to_decimal(money::remaining_debt(
            student.total_amount,
            student.paid_amount,
        ));

        *by_program.entry(student.program.as_str()).or_insert(0) += 1;

        match student.gender {
            Gender::M => gender_stats.male += 1,
            Gender::F => gender_stats.female += 1,
        }

        match time::age_on(student.date_of_birth, today) {
            18..=20 => age_stats.age_18_20 += 1,
            21..=23 => age_stats.age_21_23 += 1,
            age if age >= 24 => age_stats.age_24_plus += 1,
            _ => {}
        }

        match PaymentStatus::from_amounts(student.total_amount, student.paid_amount) {
            PaymentStatus::Paid => payment_stats.paid += 1,
            PaymentStatus::Partial => payment_stats.partial += 1,
            PaymentStatus::Unpaid => payment_stats.unpaid += 1,
        }
    }

    let debt_students = total_students - paid_students;
    let total_revenue = money::to_f64(revenue);
    let total_outstanding = money::to_f64(outstanding);

    let collection_rate = if total_students == 0 {
        0
    } else {
        (paid_students as f64 / total_students as f64 * 100.0).round() as i64
    };
    let average_debt = if debt_students == 0 {
        0
    } else {
        (total_outstanding / debt_students as f64).round() as i64
    };

    let mut program_stats: Vec<ProgramCount> = by_program
        .into_iter()
        .map(|(program, count)| ProgramCount {
            program: program.to_string(),
            count,
        })
        .collect();
    // 人数降序，同数按名称排序 / Descending by count, ties by name
    program_stats.sort_by(|a, b| b.count.cmp(&a.count).then(a.program.cmp(&b.program)));

    GlobalStats {
        total_students,
        paid_students,
        debt_students,
        total_revenue,
        total_outstanding,
        collection_rate,
        average_debt,
        program_stats,
        gender_stats,
        age_stats,
        payment_stats,
        monthly_payments: monthly_payments(records, now_millis),
    }
}

/// Payment volume per calendar month over the trailing 12 months
///
/// Months with no payments are omitted, the result is sorted oldest first.
/// Entries dated after `now_millis` are ignored.
pub fn monthly_payments(records: &[PaymentRecord], now_millis: i64) -> Vec<MonthlyPayment> {
    let window_start = time::trailing_months_start(now_millis, 12);

    let mut by_month: HashMap<String, Decimal> = HashMap::new();
    for record in records {
        if record.payment_date < window_start || record.payment_date > now_millis {
            continue;
        }
        *by_month
            .entry(time::month_key(record.payment_date))
            .or_insert(Decimal::ZERO) += money::to_decimal(record.amount);
    }

    let mut months: Vec<MonthlyPayment> = by_month
        .into_iter()
        .map(|(month, total)| MonthlyPayment {
            month,
            total: money::to_f64(total),
        })
        .collect();
    months.sort_by(|a, b| a.month.cmp(&b.month));
    months
}

#[cfg(test)]
mod tests;
