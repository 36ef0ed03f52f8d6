//! HTTP 路由集成测试
//!
//! 通过 `HttpService::oneshot` 走完整的中间件栈（认证、角色、CORS、
//! 压缩、日志），验证各路由的鉴权规则和 JSON 响应形状。
//! 除登录流程外，令牌直接由 JwtService 签发以绕过登录的固定延迟。

use axum::body::Body;
use http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;

use bursar_server::core::{Config, ServerState};
use bursar_server::db::models::{Role, User, UserCreate};
use bursar_server::db::repository::UserRepository;

const PASSWORD: &str = "registrar-pass-1";

async fn setup() -> (TempDir, ServerState) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = Config::with_overrides(tmp.path().to_string_lossy().to_string(), 0);
    let state = ServerState::initialize(&config).await;
    (tmp, state)
}

async fn create_account(state: &ServerState, username: &str, role: Role) -> User {
    UserRepository::new(state.db.clone())
        .create(UserCreate {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            display_name: None,
            email: format!("{}@bursar.local", username),
            role,
        })
        .await
        .expect("create account")
}

fn token_for(state: &ServerState, user: &User) -> String {
    let id = user.id.as_ref().expect("user id").to_string();
    state
        .get_jwt_service()
        .generate_token(&id, &user.username, user.role.as_str())
        .expect("token")
}

fn request(method: Method, path: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).expect("body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(state: &ServerState, req: Request<Body>) -> (StatusCode, Value) {
    let response = state.http.oneshot(req).await.expect("oneshot");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

fn student_payload(seq: u32) -> Value {
    json!({
        "student_code": format!("01/{:03}/24", seq),
        "first_name": "Ana",
        "last_name": format!("Garcia {}", seq),
        "guardian_name": "Luis Garcia",
        "gender": "F",
        "date_of_birth": "2004-05-10",
        "address": "Calle Mayor 1",
        "city": "Madrid",
        "phone": format!("+34 600 000 {:03}", seq),
        "email": format!("student{}@example.com", seq),
        "program": "Computer Science",
        "academic_year": "2024-2025",
        "total_amount": 1000.0,
        "paid_amount": 0.0
    })
}

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let (_tmp, state) = setup().await;

    let (status, body) = send(&state, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    let (status, body) = send(&state, request(Method::GET, "/health/detailed", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (_tmp, state) = setup().await;

    let (status, body) = send(&state, request(Method::GET, "/api/students", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, body) = send(
        &state,
        request(Method::GET, "/api/students", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_login_and_me_roundtrip() {
    let (_tmp, state) = setup().await;
    create_account(&state, "registrar", Role::Staff).await;

    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(&json!({"username": "registrar", "password": PASSWORD})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token").to_string();
    assert_eq!(body["user"]["username"], "registrar");
    assert_eq!(body["user"]["role"], "staff");

    let (status, body) = send(
        &state,
        request(Method::GET, "/api/auth/me", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "registrar");

    // 登出是无状态的确认，需要有效令牌
    let (status, body) = send(
        &state,
        request(Method::POST, "/api/auth/logout", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&state, request(Method::POST, "/api/auth/logout", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 错误口令与未知用户返回同一错误
    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(&json!({"username": "registrar", "password": "wrong-password"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_student_role_cannot_mutate() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let viewer = create_account(&state, "viewer", Role::Student).await;
    let staff_token = token_for(&state, &staff);
    let viewer_token = token_for(&state, &viewer);

    let (status, created) = send(
        &state,
        request(
            Method::POST,
            "/api/students",
            Some(&staff_token),
            Some(&student_payload(1)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let student_id = created["id"].as_str().expect("id").to_string();

    // student 角色可以读
    let (status, list) = send(
        &state,
        request(Method::GET, "/api/students", Some(&viewer_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (status, _) = send(
        &state,
        request(
            Method::GET,
            &format!("/api/students/{}", student_id),
            Some(&viewer_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 写接口一律 403
    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/students",
            Some(&viewer_token),
            Some(&student_payload(2)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2002);

    let (status, _) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/students/{}", student_id),
            Some(&viewer_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        request(
            Method::POST,
            "/api/payment-records",
            Some(&viewer_token),
            Some(&json!({"student_id": student_id, "amount": 100.0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_enrollment_and_payment_flow() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let token = token_for(&state, &staff);
    let staff_id = staff.id.as_ref().unwrap().to_string();

    let mut payload = student_payload(1);
    payload["paid_amount"] = json!(300.0);
    let (status, created) = send(
        &state,
        request(Method::POST, "/api/students", Some(&token), Some(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["remaining_debt"], 700.0);
    assert_eq!(created["payment_status"], "partial");
    let student_id = created["id"].as_str().expect("id").to_string();

    // 入学预付款生成了真实的初始流水
    let (status, entries) = send(
        &state,
        request(
            Method::GET,
            &format!("/api/payment-records/student/{}", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = entries.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["description"], "initial payment");
    assert_eq!(entries[0]["receipt_number"], "INITIAL");
    assert_eq!(entries[0]["recorded_by"], staff_id);
    assert_ne!(entries[0]["id"], "virtual-initial-payment");

    let (status, record) = send(
        &state,
        request(
            Method::POST,
            "/api/payment-records",
            Some(&token),
            Some(&json!({
                "student_id": student_id,
                "amount": 200.0,
                "description": "second installment"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["amount"], 200.0);

    let (status, student) = send(
        &state,
        request(
            Method::GET,
            &format!("/api/students/{}", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["paid_amount"], 500.0);
    assert_eq!(student["remaining_debt"], 500.0);

    let (status, summary) = send(
        &state,
        request(
            Method::GET,
            &format!("/api/payment-records/student/{}/stats", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["paidAmount"], 500.0);
    assert_eq!(summary["recordCount"], 2);
    assert_eq!(summary["recordsTotal"], 500.0);

    // 超出剩余欠款的缴费被拒，账目不动
    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/payment-records",
            Some(&token),
            Some(&json!({"student_id": student_id, "amount": 600.0})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);
    assert_eq!(body["details"]["remaining"], 500.0);
}

#[tokio::test]
async fn test_delete_student_guarded_by_ledger() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let token = token_for(&state, &staff);

    let mut payload = student_payload(1);
    payload["paid_amount"] = json!(100.0);
    let (_, created) = send(
        &state,
        request(Method::POST, "/api/students", Some(&token), Some(&payload)),
    )
    .await;
    let student_id = created["id"].as_str().expect("id").to_string();

    let (status, body) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/students/{}", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 3006);

    // 清空流水后学生可以删除
    let (_, entries) = send(
        &state,
        request(
            Method::GET,
            &format!("/api/payment-records/student/{}", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    let entry_id = entries[0]["id"].as_str().expect("entry id").to_string();

    let (status, deleted) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/payment-records/{}", entry_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, Value::Bool(true));

    let (status, _) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/students/{}", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &state,
        request(
            Method::GET,
            &format!("/api/students/{}", student_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3001);
}

#[tokio::test]
async fn test_user_management_requires_admin() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let admin = create_account(&state, "director", Role::Admin).await;

    let staff_token = token_for(&state, &staff);
    let (status, body) = send(
        &state,
        request(Method::GET, "/api/users", Some(&staff_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let admin_token = token_for(&state, &admin);
    let (status, users) = send(
        &state,
        request(Method::GET, "/api/users", Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let usernames: Vec<&str> = users
        .as_array()
        .expect("array")
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"registrar"));
    assert!(usernames.contains(&"director"));
    // 密码散列绝不能出现在响应里
    assert!(users[0].get("hash_pass").is_none());

    let (status, created) = send(
        &state,
        request(
            Method::POST,
            "/api/users",
            Some(&admin_token),
            Some(&json!({
                "username": "clerk",
                "password": "clerk-password-1",
                "email": "clerk@bursar.local",
                "role": "staff"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["role"], "staff");

    // 过短口令被字段级校验拦下
    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/users",
            Some(&admin_token),
            Some(&json!({
                "username": "shorty",
                "password": "short",
                "email": "shorty@bursar.local",
                "role": "staff"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert!(body["details"]["password"].is_string());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let (_tmp, state) = setup().await;
    let admin = create_account(&state, "director", Role::Admin).await;
    let other = create_account(&state, "clerk", Role::Staff).await;
    let token = token_for(&state, &admin);
    let admin_id = admin.id.as_ref().unwrap().to_string();
    let other_id = other.id.as_ref().unwrap().to_string();

    let (status, body) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/users/{}", admin_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5004);

    // 删别人没有限制
    let (status, deleted) = send(
        &state,
        request(
            Method::DELETE,
            &format!("/api/users/{}", other_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, Value::Bool(true));
}

#[tokio::test]
async fn test_validation_reports_every_field() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let token = token_for(&state, &staff);

    let mut payload = student_payload(1);
    payload["student_code"] = json!("XX");
    payload["email"] = json!("not-an-email");
    payload["program"] = json!("Astrology");

    let (status, body) = send(
        &state,
        request(Method::POST, "/api/students", Some(&token), Some(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    let details = body["details"].as_object().expect("details");
    assert!(details.contains_key("student_code"));
    assert!(details.contains_key("email"));
    assert!(details.contains_key("program"));
    assert!(!details.contains_key("first_name"));
}

#[tokio::test]
async fn test_student_list_pagination() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let token = token_for(&state, &staff);

    for seq in 1..=3 {
        let (status, _) = send(
            &state,
            request(
                Method::POST,
                "/api/students",
                Some(&token),
                Some(&student_payload(seq)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, page1) = send(
        &state,
        request(Method::GET, "/api/students?pageSize=2", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page1["items"].as_array().unwrap().len(), 2);
    assert_eq!(page1["total"], 3);
    assert_eq!(page1["totalPages"], 2);
    assert_eq!(page1["page"], 1);

    let (status, page2) = send(
        &state,
        request(
            Method::GET,
            "/api/students?page=2&pageSize=2",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page2["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stats_needs_login_only() {
    let (_tmp, state) = setup().await;
    let staff = create_account(&state, "registrar", Role::Staff).await;
    let viewer = create_account(&state, "viewer", Role::Student).await;
    let staff_token = token_for(&state, &staff);

    let mut payload = student_payload(1);
    payload["paid_amount"] = json!(1000.0);
    let (status, _) = send(
        &state,
        request(
            Method::POST,
            "/api/students",
            Some(&staff_token),
            Some(&payload),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let viewer_token = token_for(&state, &viewer);
    let (status, stats) = send(
        &state,
        request(Method::GET, "/api/stats", Some(&viewer_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalStudents"], 1);
    assert_eq!(stats["paidStudents"], 1);
    assert_eq!(stats["collectionRate"], 100);
    assert!(stats["monthlyPayments"].is_array());
}
