use super::*;
use crate::db::models::{Gender, PaymentRecord, Student};
use crate::utils::time;
use chrono::NaiveDate;

fn student(total_amount: f64, paid_amount: f64) -> Student {
    Student {
        id: None,
        student_code: "01/001/24".to_string(),
        first_name: "Test".to_string(),
        last_name: "Student".to_string(),
        guardian_name: "Guardian".to_string(),
        gender: Gender::M,
        date_of_birth: NaiveDate::from_ymd_opt(2004, 5, 10).unwrap(),
        address: "1 Campus Way".to_string(),
        city: "Springfield".to_string(),
        phone: "0900000000".to_string(),
        email: "test@example.com".to_string(),
        previous_school: None,
        program: "Computer Science".to_string(),
        academic_year: "2024-2025".to_string(),
        total_amount,
        paid_amount,
        created_at: 0,
        updated_at: 0,
    }
}

fn record(amount: f64, payment_date: i64) -> PaymentRecord {
    PaymentRecord {
        id: None,
        student_id: "student:test".to_string(),
        amount,
        payment_date,
        description: String::new(),
        receipt_number: None,
        recorded_by: "user:admin".to_string(),
        recorded_by_name: "Admin".to_string(),
        created_at: payment_date,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn now() -> i64 {
    time::day_start_millis(today())
}

#[test]
fn test_global_stats_overview() {
    let students = vec![
        student(1000.0, 1000.0),
        student(500.0, 0.0),
        student(800.0, 400.0),
    ];

    let stats = global_stats(&students, &[], today(), now());
    assert_eq!(stats.total_students, 3);
    assert_eq!(stats.paid_students, 1);
    assert_eq!(stats.debt_students, 2);
    assert_eq!(stats.total_revenue, 1400.0);
    assert_eq!(stats.total_outstanding, 900.0);
    assert_eq!(stats.collection_rate, 33);
    assert_eq!(stats.average_debt, 450);
    assert_eq!(stats.payment_stats.paid, 1);
    assert_eq!(stats.payment_stats.partial, 1);
    assert_eq!(stats.payment_stats.unpaid, 1);
    assert_eq!(stats.gender_stats.male, 3);
    assert_eq!(stats.gender_stats.female, 0);
}

#[test]
fn test_global_stats_includes_monthly_trend() {
    let records = vec![record(200.0, now()), record(100.0, now())];
    let stats = global_stats(&[student(1000.0, 300.0)], &records, today(), now());
    assert_eq!(stats.monthly_payments.len(), 1);
    assert_eq!(stats.monthly_payments[0].month, "2024-06");
    assert_eq!(stats.monthly_payments[0].total, 300.0);
}

#[test]
fn test_global_stats_empty() {
    let stats = global_stats(&[], &[], today(), now());
    assert_eq!(stats.total_students, 0);
    assert_eq!(stats.collection_rate, 0);
    assert_eq!(stats.average_debt, 0);
    assert_eq!(stats.total_revenue, 0.0);
    assert!(stats.program_stats.is_empty());
}

#[test]
fn test_paid_student_within_tolerance_counts_as_paid() {
    let students = vec![student(1000.0, 999.999)];
    let stats = global_stats(&students, &[], today(), now());
    assert_eq!(stats.paid_students, 1);
    assert_eq!(stats.debt_students, 0);
}

#[test]
fn test_program_stats_sorted_descending() {
    let mut a = student(100.0, 0.0);
    a.program = "Finance".to_string();
    let mut b = student(100.0, 0.0);
    b.program = "Business Administration".to_string();
    let students = vec![
        student(100.0, 0.0),
        student(100.0, 0.0),
        student(100.0, 0.0),
        b.clone(),
        b,
        a,
    ];

    let stats = global_stats(&students, &[], today(), now());
    let programs: Vec<(&str, i64)> = stats
        .program_stats
        .iter()
        .map(|p| (p.program.as_str(), p.count))
        .collect();
    assert_eq!(
        programs,
        vec![
            ("Computer Science", 3),
            ("Business Administration", 2),
            ("Finance", 1),
        ]
    );
}

#[test]
fn test_program_stats_ties_sorted_by_name() {
    let mut a = student(100.0, 0.0);
    a.program = "Marketing".to_string();
    let mut b = student(100.0, 0.0);
    b.program = "Finance".to_string();

    let stats = global_stats(&[a, b], &[], today(), now());
    assert_eq!(stats.program_stats[0].program, "Finance");
    assert_eq!(stats.program_stats[1].program, "Marketing");
}

#[test]
fn test_age_buckets() {
    let dob = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    let mut nineteen = student(100.0, 0.0);
    nineteen.date_of_birth = dob(2005, 1, 1);
    let mut twenty_two = student(100.0, 0.0);
    twenty_two.date_of_birth = dob(2002, 3, 10);
    let mut twenty_six = student(100.0, 0.0);
    twenty_six.date_of_birth = dob(1998, 1, 1);
    let mut fourteen = student(100.0, 0.0);
    fourteen.date_of_birth = dob(2010, 1, 1);

    let stats = global_stats(&[nineteen, twenty_two, twenty_six, fourteen], &[], today(), now());
    assert_eq!(stats.age_stats.age_18_20, 1);
    assert_eq!(stats.age_stats.age_21_23, 1);
    assert_eq!(stats.age_stats.age_24_plus, 1);
    // Under-18 counts toward totals but no age bucket
    assert_eq!(stats.total_students, 4);
}

#[test]
fn test_monthly_payments_trailing_window() {
    let date = |y, m, d| time::day_start_millis(NaiveDate::from_ymd_opt(y, m, d).unwrap());
    let now = date(2024, 6, 15);
    let records = vec![
        record(100.0, date(2024, 6, 1)),
        record(50.5, date(2024, 5, 10)),
        record(25.0, date(2023, 7, 1)),
        // Outside the window on both sides
        record(999.0, date(2023, 6, 30)),
        record(888.0, date(2024, 7, 1)),
    ];

    let months = monthly_payments(&records, now);
    assert_eq!(
        months,
        vec![
            MonthlyPayment {
                month: "2023-07".to_string(),
                total: 25.0
            },
            MonthlyPayment {
                month: "2024-05".to_string(),
                total: 50.5
            },
            MonthlyPayment {
                month: "2024-06".to_string(),
                total: 100.0
            },
        ]
    );
}

#[test]
fn test_monthly_payments_sums_within_month() {
    let date = |y, m, d| time::day_start_millis(NaiveDate::from_ymd_opt(y, m, d).unwrap());
    let now = date(2024, 6, 15);
    let records = vec![
        record(0.1, date(2024, 6, 1)),
        record(0.2, date(2024, 6, 10)),
    ];

    let months = monthly_payments(&records, now);
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].total, 0.3);
}

#[test]
fn test_monthly_payments_empty() {
    let months = monthly_payments(&[], 1_705_276_800_000);
    assert!(months.is_empty());
}
