//! Student API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    Gender, PaymentStatus, StudentCreate, StudentResponse, StudentUpdate,
};
use crate::db::repository::{StudentFilter, StudentRepository};
use crate::ledger::LedgerService;
use crate::money;
use crate::utils::time;
use crate::utils::validation::{self, FieldErrors};
use shared::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct StudentListQuery {
    pub q: Option<String>,
    pub gender: Option<Gender>,
    pub program: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "paymentStatus")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(rename = "minAge")]
    pub min_age: Option<u32>,
    #[serde(rename = "maxAge")]
    pub max_age: Option<u32>,
    #[serde(default = "default_page")]
    pub page: i32,
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: i32,
}

fn default_page() -> i32 {
    1
}

fn default_page_size() -> i32 {
    10
}

/// Paged student list
#[derive(Debug, Clone, Serialize)]
pub struct StudentListResponse {
    pub items: Vec<StudentResponse>,
    pub total: i32,
    pub page: i32,
    #[serde(rename = "pageSize")]
    pub page_size: i32,
    #[serde(rename = "totalPages")]
    pub total_pages: i32,
}

/// List students with search filters and pagination
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<StudentListQuery>,
) -> AppResult<Json<StudentListResponse>> {
    let repo = StudentRepository::new(state.db.clone());
    let filter = StudentFilter {
        q: query.q,
        gender: query.gender,
        program: query.program,
        address: query.address,
        payment_status: query.payment_status,
        min_age: query.min_age,
        max_age: query.max_age,
    };
    let students = repo.find_filtered(&filter).await?;

    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 100);
    let offset = (page - 1) * page_size;

    let total = students.len() as i32;
    let total_pages = if total > 0 {
        (total + page_size - 1) / page_size
    } else {
        1
    };
    let items: Vec<StudentResponse> = students
        .into_iter()
        .skip(offset as usize)
        .take(page_size as usize)
        .map(StudentResponse::from)
        .collect();

    Ok(Json(StudentListResponse {
        items,
        total,
        page,
        page_size,
        total_pages,
    }))
}

/// Get student by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<StudentResponse>> {
    let repo = StudentRepository::new(state.db.clone());
    let student = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::student_not_found(&id))?;
    Ok(Json(StudentResponse::from(student)))
}

/// Create a new student, with an initial payment entry when paid_amount > 0
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<StudentCreate>,
) -> AppResult<Json<StudentResponse>> {
    validate_create(&payload)?;

    let ledger = LedgerService::new(state.db.clone());
    let student = ledger
        .enroll_student(payload, &user.id, &user.username)
        .await?;
    Ok(Json(StudentResponse::from(student)))
}

/// Update a student
///
/// A direct paid_amount edit through here bypasses the ledger; the store
/// still enforces paid <= total on the merged values.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StudentUpdate>,
) -> AppResult<Json<StudentResponse>> {
    validate_update(&payload)?;

    let repo = StudentRepository::new(state.db.clone());
    let student = repo.update(&id, payload).await?;
    Ok(Json(StudentResponse::from(student)))
}

/// Delete a student (refused while payment records exist)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let ledger = LedgerService::new(state.db.clone());
    ledger.delete_student(&id).await?;
    Ok(Json(true))
}

/// Field-level validation for creation, reporting every violation at once
fn validate_create(payload: &StudentCreate) -> AppResult<()> {
    let mut errors = FieldErrors::new();

    errors.check(
        "student_code",
        validation::validate_student_code(&payload.student_code),
    );
    errors.check(
        "first_name",
        validation::validate_required_text(
            &payload.first_name,
            "first_name",
            validation::MAX_NAME_LEN,
        ),
    );
    errors.check(
        "last_name",
        validation::validate_required_text(
            &payload.last_name,
            "last_name",
            validation::MAX_NAME_LEN,
        ),
    );
    errors.check(
        "guardian_name",
        validation::validate_required_text(
            &payload.guardian_name,
            "guardian_name",
            validation::MAX_NAME_LEN,
        ),
    );
    errors.check(
        "date_of_birth",
        time::parse_date(&payload.date_of_birth)
            .and_then(|date| time::validate_past_date(date, "date_of_birth")),
    );
    errors.check(
        "address",
        validation::validate_required_text(
            &payload.address,
            "address",
            validation::MAX_ADDRESS_LEN,
        ),
    );
    errors.check(
        "city",
        validation::validate_required_text(&payload.city, "city", validation::MAX_SHORT_TEXT_LEN),
    );
    errors.check(
        "phone",
        validation::validate_required_text(&payload.phone, "phone", validation::MAX_SHORT_TEXT_LEN),
    );
    errors.check("email", validation::validate_email(&payload.email));
    errors.check(
        "previous_school",
        validation::validate_optional_text(
            &payload.previous_school,
            "previous_school",
            validation::MAX_NAME_LEN,
        ),
    );
    errors.check("program", validation::validate_program(&payload.program));
    errors.check(
        "academic_year",
        validation::validate_academic_year(&payload.academic_year),
    );
    errors.check(
        "total_amount",
        money::validate_tuition_amount(payload.total_amount, "total_amount"),
    );
    errors.check(
        "paid_amount",
        money::validate_tuition_amount(payload.paid_amount, "paid_amount"),
    );

    errors.into_result()
}

/// Field-level validation for partial updates, only checking supplied fields
fn validate_update(payload: &StudentUpdate) -> AppResult<()> {
    let mut errors = FieldErrors::new();

    if let Some(v) = &payload.student_code {
        errors.check("student_code", validation::validate_student_code(v));
    }
    if let Some(v) = &payload.first_name {
        errors.check(
            "first_name",
            validation::validate_required_text(v, "first_name", validation::MAX_NAME_LEN),
        );
    }
    if let Some(v) = &payload.last_name {
        errors.check(
            "last_name",
            validation::validate_required_text(v, "last_name", validation::MAX_NAME_LEN),
        );
    }
    if let Some(v) = &payload.guardian_name {
        errors.check(
            "guardian_name",
            validation::validate_required_text(v, "guardian_name", validation::MAX_NAME_LEN),
        );
    }
    if let Some(v) = &payload.date_of_birth {
        errors.check(
            "date_of_birth",
            time::parse_date(v).and_then(|date| time::validate_past_date(date, "date_of_birth")),
        );
    }
    if let Some(v) = &payload.address {
        errors.check(
            "address",
            validation::validate_required_text(v, "address", validation::MAX_ADDRESS_LEN),
        );
    }
    if let Some(v) = &payload.city {
        errors.check(
            "city",
            validation::validate_required_text(v, "city", validation::MAX_SHORT_TEXT_LEN),
        );
    }
    if let Some(v) = &payload.phone {
        errors.check(
            "phone",
            validation::validate_required_text(v, "phone", validation::MAX_SHORT_TEXT_LEN),
        );
    }
    if let Some(v) = &payload.email {
        errors.check("email", validation::validate_email(v));
    }
    errors.check(
        "previous_school",
        validation::validate_optional_text(
            &payload.previous_school,
            "previous_school",
            validation::MAX_NAME_LEN,
        ),
    );
    if let Some(v) = &payload.program {
        errors.check("program", validation::validate_program(v));
    }
    if let Some(v) = &payload.academic_year {
        errors.check("academic_year", validation::validate_academic_year(v));
    }
    if let Some(v) = payload.total_amount {
        errors.check(
            "total_amount",
            money::validate_tuition_amount(v, "total_amount"),
        );
    }
    if let Some(v) = payload.paid_amount {
        errors.check(
            "paid_amount",
            money::validate_tuition_amount(v, "paid_amount"),
        );
    }

    errors.into_result()
}
