//! 账本一致性集成测试
//!
//! 直接驱动 LedgerService + 嵌入式数据库，覆盖双写协调的关键路径：
//! 聚合与流水的同步更新、超额拒绝、virtual 初始记录的合成与消失。

use bursar_server::ErrorCode;
use bursar_server::db::DbService;
use bursar_server::db::models::{Gender, PaymentRecord, PaymentRecordCreate, Student, StudentCreate};
use bursar_server::ledger::{
    INITIAL_PAYMENT_DESCRIPTION, INITIAL_RECEIPT_NUMBER, LedgerService, SYSTEM_USER_ID,
    VIRTUAL_RECORD_ID,
};
use bursar_server::utils::time;
use tempfile::TempDir;

const STAFF_ID: &str = "user:staff1";
const STAFF_NAME: &str = "Maria Lopez";

async fn open_ledger() -> (TempDir, LedgerService) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = DbService::new(&tmp.path().join("bursar.db"))
        .await
        .expect("database");
    (tmp, LedgerService::new(db.db()))
}

fn enrollment(seq: u32, total: f64, paid: f64) -> StudentCreate {
    StudentCreate {
        student_code: format!("01/{:03}/24", seq),
        first_name: "Ana".to_string(),
        last_name: format!("García {}", seq),
        guardian_name: "Luis García".to_string(),
        gender: Gender::F,
        date_of_birth: "2004-05-10".to_string(),
        address: "Calle Mayor 1".to_string(),
        city: "Madrid".to_string(),
        phone: format!("+34 600 000 {:03}", seq),
        email: format!("ana{}@example.com", seq),
        previous_school: None,
        program: "Computer Science".to_string(),
        academic_year: "2024-2025".to_string(),
        total_amount: total,
        paid_amount: paid,
    }
}

fn payment(student_id: &str, amount: f64) -> PaymentRecordCreate {
    PaymentRecordCreate {
        student_id: student_id.to_string(),
        amount,
        payment_date: None,
        description: None,
        receipt_number: None,
    }
}

fn id_of(student: &Student) -> String {
    student.id.as_ref().expect("persisted id").to_string()
}

#[tokio::test]
async fn test_record_payment_updates_aggregate_and_appends_entry() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    let mut data = payment(&id, 200.0);
    data.payment_date = Some("2024-03-01".to_string());
    data.description = Some("second installment".to_string());
    data.receipt_number = Some("RCPT-042".to_string());
    let record = ledger.record_payment(data, STAFF_ID, STAFF_NAME).await.unwrap();

    assert_eq!(record.amount, 200.0);
    assert_eq!(record.student_id, id);
    assert_eq!(record.description, "second installment");
    assert_eq!(record.receipt_number.as_deref(), Some("RCPT-042"));
    assert_eq!(record.recorded_by, STAFF_ID);
    assert_eq!(record.recorded_by_name, STAFF_NAME);
    assert_eq!(
        record.payment_date,
        time::day_start_millis(time::parse_date("2024-03-01").unwrap())
    );

    let stored = ledger.students().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.paid_amount, 200.0);

    let view = ledger.ledger_view(&id).await.unwrap();
    assert_eq!(view.len(), 1);
    assert_ne!(view[0].id, VIRTUAL_RECORD_ID);
}

#[tokio::test]
async fn test_record_payment_defaults() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    let before = shared::util::now_millis();
    let record = ledger
        .record_payment(payment(&id, 50.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let after = shared::util::now_millis();

    // 省略的字段取默认值：日期为当前时刻，描述为空串
    assert!(record.payment_date >= before && record.payment_date <= after);
    assert_eq!(record.description, "");
    assert_eq!(record.receipt_number, None);
}

#[tokio::test]
async fn test_overpayment_rejected_without_state_change() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    ledger
        .record_payment(payment(&id, 600.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();

    let err = ledger
        .record_payment(payment(&id, 500.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Overpayment);

    // 拒绝后既不改聚合也不写流水
    let stored = ledger.students().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.paid_amount, 600.0);
    assert_eq!(ledger.ledger_view(&id).await.unwrap().len(), 1);

    // 恰好付清不算超额
    ledger
        .record_payment(payment(&id, 400.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let stored = ledger.students().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.paid_amount, 1000.0);
}

#[tokio::test]
async fn test_record_payment_rejects_non_positive_amount() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    let err = ledger
        .record_payment(payment(&id, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);

    let err = ledger
        .record_payment(payment(&id, -5.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);
}

#[tokio::test]
async fn test_record_payment_unknown_student() {
    let (_tmp, ledger) = open_ledger().await;
    let err = ledger
        .record_payment(payment("student:nope", 100.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StudentNotFound);
}

#[tokio::test]
async fn test_delete_payment_rolls_back_aggregate() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    let record = ledger
        .record_payment(payment(&id, 300.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let record_id = record.id.as_ref().unwrap().to_string();

    ledger.delete_payment(&record_id).await.unwrap();

    let stored = ledger.students().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.paid_amount, 0.0);
    // paid 归零后也不再合成 virtual 记录
    assert!(ledger.ledger_view(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_payment_clamps_aggregate_at_zero() {
    let (_tmp, ledger) = open_ledger().await;
    // 预账本学生：paid 与流水无对应关系
    let student = ledger
        .students()
        .create(enrollment(1, 1000.0, 100.0))
        .await
        .unwrap();
    let id = id_of(&student);

    let record = ledger
        .payments()
        .create(PaymentRecord {
            id: None,
            student_id: id.clone(),
            amount: 500.0,
            payment_date: student.created_at,
            description: "imported".to_string(),
            receipt_number: None,
            recorded_by: STAFF_ID.to_string(),
            recorded_by_name: STAFF_NAME.to_string(),
            created_at: student.created_at,
        })
        .await
        .unwrap();

    ledger
        .delete_payment(&record.id.as_ref().unwrap().to_string())
        .await
        .unwrap();

    let stored = ledger.students().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.paid_amount, 0.0, "100 - 500 clamps to zero");
}

#[tokio::test]
async fn test_delete_missing_payment() {
    let (_tmp, ledger) = open_ledger().await;
    let err = ledger
        .delete_payment("payment_record:missing")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentRecordNotFound);
}

#[tokio::test]
async fn test_delete_orphaned_payment_fails_and_keeps_record() {
    let (_tmp, ledger) = open_ledger().await;
    let record = ledger
        .payments()
        .create(PaymentRecord {
            id: None,
            student_id: "student:departed".to_string(),
            amount: 80.0,
            payment_date: 0,
            description: String::new(),
            receipt_number: None,
            recorded_by: STAFF_ID.to_string(),
            recorded_by_name: STAFF_NAME.to_string(),
            created_at: 0,
        })
        .await
        .unwrap();
    let record_id = record.id.as_ref().unwrap().to_string();

    let err = ledger.delete_payment(&record_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StudentNotFound);

    // 孤儿流水保留原样，等待人工处理
    assert!(
        ledger
            .payments()
            .find_by_id(&record_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_enroll_with_initial_payment_writes_real_entry() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 300.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    let view = ledger.ledger_view(&id).await.unwrap();
    assert_eq!(view.len(), 1);
    let entry = &view[0];
    assert_ne!(entry.id, VIRTUAL_RECORD_ID, "a real record is stored");
    assert_eq!(entry.amount, 300.0);
    assert_eq!(entry.description, INITIAL_PAYMENT_DESCRIPTION);
    assert_eq!(entry.receipt_number.as_deref(), Some(INITIAL_RECEIPT_NUMBER));
    assert_eq!(entry.recorded_by, STAFF_ID);
    assert_eq!(entry.recorded_by_name, STAFF_NAME);
    assert_eq!(entry.payment_date, student.created_at);
}

#[tokio::test]
async fn test_enroll_without_payment_has_empty_ledger() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();

    let view = ledger.ledger_view(&id_of(&student)).await.unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn test_virtual_record_for_pre_ledger_student() {
    let (_tmp, ledger) = open_ledger().await;
    // 绕过 LedgerService 直接建档，模拟账本功能上线前的存量数据
    let student = ledger
        .students()
        .create(enrollment(1, 1000.0, 300.0))
        .await
        .unwrap();
    let id = id_of(&student);

    let view = ledger.ledger_view(&id).await.unwrap();
    assert_eq!(view.len(), 1);
    let entry = &view[0];
    assert_eq!(entry.id, VIRTUAL_RECORD_ID);
    assert_eq!(entry.amount, 300.0);
    assert_eq!(entry.payment_date, student.created_at);
    assert_eq!(entry.description, INITIAL_PAYMENT_DESCRIPTION);
    assert_eq!(entry.receipt_number.as_deref(), Some(INITIAL_RECEIPT_NUMBER));
    assert_eq!(entry.recorded_by, SYSTEM_USER_ID);

    // 合成记录从不落库
    assert_eq!(ledger.payments().count_by_student(&id).await.unwrap(), 0);

    // 重复读取得到同一条合成记录
    let again = ledger.ledger_view(&id).await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].id, VIRTUAL_RECORD_ID);
    assert_eq!(again[0].amount, 300.0);
    assert_eq!(again[0].payment_date, entry.payment_date);
}

#[tokio::test]
async fn test_virtual_record_replaced_by_first_real_entry() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .students()
        .create(enrollment(1, 1000.0, 300.0))
        .await
        .unwrap();
    let id = id_of(&student);

    ledger
        .record_payment(payment(&id, 200.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();

    let stored = ledger.students().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.paid_amount, 500.0);

    // 一旦有真实流水，virtual 记录不再出现；历史 300 成为未入账差额
    let view = ledger.ledger_view(&id).await.unwrap();
    assert_eq!(view.len(), 1);
    assert_ne!(view[0].id, VIRTUAL_RECORD_ID);
    assert_eq!(view[0].amount, 200.0);

    let summary = ledger.student_summary(&id).await.unwrap();
    assert_eq!(summary.paid_amount, 500.0);
    assert_eq!(summary.records_total, 200.0);
}

#[tokio::test]
async fn test_delete_student_blocked_by_entries() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 300.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    let err = ledger.delete_student(&id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StudentHasPayments);
    assert!(ledger.students().find_by_id(&id).await.unwrap().is_some());

    // 清空流水后可以删除
    let view = ledger.ledger_view(&id).await.unwrap();
    ledger.delete_payment(&view[0].id).await.unwrap();
    ledger.delete_student(&id).await.unwrap();
    assert!(ledger.students().find_by_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_student_summary_reports_real_entries_only() {
    let (_tmp, ledger) = open_ledger().await;
    let student = ledger
        .enroll_student(enrollment(1, 1000.0, 0.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    let id = id_of(&student);

    ledger
        .record_payment(payment(&id, 100.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();
    ledger
        .record_payment(payment(&id, 200.0), STAFF_ID, STAFF_NAME)
        .await
        .unwrap();

    let summary = ledger.student_summary(&id).await.unwrap();
    assert_eq!(summary.total_amount, 1000.0);
    assert_eq!(summary.paid_amount, 300.0);
    assert_eq!(summary.remaining_debt, 700.0);
    assert_eq!(summary.payment_progress, 30.0);
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.records_total, 300.0);
    assert_eq!(summary.monthly_payments.len(), 1);
    assert_eq!(summary.monthly_payments[0].total, 300.0);
}
