//! Student Repository
//!
//! Uniqueness of `student_code` / `email` / `phone` is checked here before
//! every write, on top of the UNIQUE indexes defined on the table. The
//! invariant `paid_amount <= total_amount` is enforced on create and on
//! update against the merged field values.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Gender, PaymentStatus, Student, StudentCreate, StudentUpdate};
use crate::money;
use crate::utils::time;
use chrono::{NaiveDate, Utc};
use shared::error::ErrorCode;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

/// Search criteria for students. All filters are optional and combine
/// with AND.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Case-insensitive substring across names, email and program
    pub q: Option<String>,
    pub gender: Option<Gender>,
    /// Exact program match
    pub program: Option<String>,
    /// Substring match on address or city
    pub address: Option<String>,
    /// Derived field, computed per row after the scan
    pub payment_status: Option<PaymentStatus>,
    /// Age window against the current date
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student, today: NaiveDate) -> bool {
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            let name = format!("{} {}", student.first_name, student.last_name).to_lowercase();
            let hit = name.contains(&q)
                || student.email.to_lowercase().contains(&q)
                || student.program.to_lowercase().contains(&q);
            if !hit {
                return false;
            }
        }
        if let Some(gender) = self.gender
            && student.gender != gender
        {
            return false;
        }
        if let Some(program) = &self.program
            && &student.program != program
        {
            return false;
        }
        if let Some(address) = &self.address {
            let needle = address.to_lowercase();
            if !student.address.to_lowercase().contains(&needle)
                && !student.city.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(status) = self.payment_status
            && PaymentStatus::from_amounts(student.total_amount, student.paid_amount) != status
        {
            return false;
        }
        let age = time::age_on(student.date_of_birth, today);
        if let Some(min_age) = self.min_age
            && age < min_age
        {
            return false;
        }
        if let Some(max_age) = self.max_age
            && age > max_age
        {
            return false;
        }
        true
    }
}

#[derive(Clone)]
pub struct StudentRepository {
    base: BaseRepository,
}

impl StudentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all students, newest registration first
    pub async fn find_all(&self) -> RepoResult<Vec<Student>> {
        let students: Vec<Student> = self
            .base
            .db()
            .query("SELECT * FROM student ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(students)
    }

    /// Search students with combined filters, newest registration first
    ///
    /// payment_status is computed from the amounts rather than stored, so it
    /// cannot go into the WHERE clause; the scan pulls every row and filters
    /// in memory. SurrealDB embedded mode (kv-rocksdb) also drops the first
    /// record when LIMIT is combined with computed fields, so pagination
    /// stays in memory at the caller too.
    pub async fn find_filtered(&self, filter: &StudentFilter) -> RepoResult<Vec<Student>> {
        let today = Utc::now().date_naive();
        let students = self.find_all().await?;
        Ok(students
            .into_iter()
            .filter(|s| filter.matches(s, today))
            .collect())
    }

    /// Find student by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Student>> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        let student: Option<Student> = self.base.db().select(thing).await?;
        Ok(student)
    }

    /// Find student by the human-readable student code
    pub async fn find_by_code(&self, student_code: &str) -> RepoResult<Option<Student>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM student WHERE student_code = $student_code LIMIT 1")
            .bind(("student_code", student_code.to_string()))
            .await?;
        let students: Vec<Student> = result.take(0)?;
        Ok(students.into_iter().next())
    }

    /// Find student by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM student WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?;
        let students: Vec<Student> = result.take(0)?;
        Ok(students.into_iter().next())
    }

    /// Find student by phone
    pub async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Student>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM student WHERE phone = $phone LIMIT 1")
            .bind(("phone", phone.to_string()))
            .await?;
        let students: Vec<Student> = result.take(0)?;
        Ok(students.into_iter().next())
    }

    /// Create a new student
    ///
    /// Field formats are validated at the handler layer; this checks the
    /// unique keys and the financial invariant.
    pub async fn create(&self, data: StudentCreate) -> RepoResult<Student> {
        // Check duplicate unique keys, first offending field wins
        if self.find_by_code(&data.student_code).await?.is_some() {
            return Err(RepoError::Duplicate(
                ErrorCode::StudentCodeExists,
                format!("student_code '{}' already exists", data.student_code),
            ));
        }
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate(
                ErrorCode::StudentEmailExists,
                format!("email '{}' already exists", data.email),
            ));
        }
        if self.find_by_phone(&data.phone).await?.is_some() {
            return Err(RepoError::Duplicate(
                ErrorCode::StudentPhoneExists,
                format!("phone '{}' already exists", data.phone),
            ));
        }

        if money::paid_exceeds_total(data.paid_amount, data.total_amount) {
            return Err(RepoError::Validation(
                ErrorCode::PaidExceedsTotal,
                format!(
                    "paid_amount ({}) cannot exceed total_amount ({})",
                    data.paid_amount, data.total_amount
                ),
            ));
        }

        let now = shared::util::now_millis();

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE student SET
                    student_code    = $student_code,
                    first_name      = $first_name,
                    last_name       = $last_name,
                    guardian_name   = $guardian_name,
                    gender          = $gender,
                    date_of_birth   = $date_of_birth,
                    address         = $address,
                    city            = $city,
                    phone           = $phone,
                    email           = $email,
                    previous_school = $previous_school,
                    program         = $program,
                    academic_year   = $academic_year,
                    total_amount    = $total_amount,
                    paid_amount     = $paid_amount,
                    created_at      = $created_at,
                    updated_at      = $updated_at
                RETURN AFTER"#,
            )
            .bind(("student_code", data.student_code))
            .bind(("first_name", data.first_name))
            .bind(("last_name", data.last_name))
            .bind(("guardian_name", data.guardian_name))
            .bind(("gender", data.gender))
            .bind(("date_of_birth", data.date_of_birth))
            .bind(("address", data.address))
            .bind(("city", data.city))
            .bind(("phone", data.phone))
            .bind(("email", data.email))
            .bind(("previous_school", data.previous_school))
            .bind(("program", data.program))
            .bind(("academic_year", data.academic_year))
            .bind(("total_amount", data.total_amount))
            .bind(("paid_amount", data.paid_amount))
            .bind(("created_at", now))
            .bind(("updated_at", now))
            .await?;

        let created: Option<Student> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create student".to_string()))
    }

    /// Update a student (partial)
    ///
    /// The financial invariant is checked against the merged values: an
    /// update changing only `total_amount` must still respect the stored
    /// `paid_amount`, and vice versa.
    pub async fn update(&self, id: &str, data: StudentUpdate) -> RepoResult<Student> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            RepoError::NotFound(
                ErrorCode::StudentNotFound,
                format!("Student {} not found", id),
            )
        })?;

        // Check duplicate unique keys if changing
        if let Some(ref new_code) = data.student_code
            && new_code != &existing.student_code
            && self.find_by_code(new_code).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                ErrorCode::StudentCodeExists,
                format!("student_code '{}' already exists", new_code),
            ));
        }
        if let Some(ref new_email) = data.email
            && new_email != &existing.email
            && self.find_by_email(new_email).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                ErrorCode::StudentEmailExists,
                format!("email '{}' already exists", new_email),
            ));
        }
        if let Some(ref new_phone) = data.phone
            && new_phone != &existing.phone
            && self.find_by_phone(new_phone).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                ErrorCode::StudentPhoneExists,
                format!("phone '{}' already exists", new_phone),
            ));
        }

        let merged_total = data.total_amount.unwrap_or(existing.total_amount);
        let merged_paid = data.paid_amount.unwrap_or(existing.paid_amount);
        if money::paid_exceeds_total(merged_paid, merged_total) {
            return Err(RepoError::Validation(
                ErrorCode::PaidExceedsTotal,
                format!(
                    "paid_amount ({}) cannot exceed total_amount ({})",
                    merged_paid, merged_total
                ),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    student_code    = $student_code OR student_code,
                    first_name      = $first_name OR first_name,
                    last_name       = $last_name OR last_name,
                    guardian_name   = $guardian_name OR guardian_name,
                    gender          = $gender OR gender,
                    date_of_birth   = $date_of_birth OR date_of_birth,
                    address         = $address OR address,
                    city            = $city OR city,
                    phone           = $phone OR phone,
                    email           = $email OR email,
                    previous_school = $previous_school OR previous_school,
                    program         = $program OR program,
                    academic_year   = $academic_year OR academic_year,
                    total_amount    = IF $has_total THEN $total_amount ELSE total_amount END,
                    paid_amount     = IF $has_paid THEN $paid_amount ELSE paid_amount END,
                    updated_at      = $updated_at
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("student_code", data.student_code))
            .bind(("first_name", data.first_name))
            .bind(("last_name", data.last_name))
            .bind(("guardian_name", data.guardian_name))
            .bind(("gender", data.gender))
            .bind(("date_of_birth", data.date_of_birth))
            .bind(("address", data.address))
            .bind(("city", data.city))
            .bind(("phone", data.phone))
            .bind(("email", data.email))
            .bind(("previous_school", data.previous_school))
            .bind(("program", data.program))
            .bind(("academic_year", data.academic_year))
            .bind(("has_total", data.total_amount.is_some()))
            .bind(("total_amount", data.total_amount))
            .bind(("has_paid", data.paid_amount.is_some()))
            .bind(("paid_amount", data.paid_amount))
            .bind(("updated_at", shared::util::now_millis()))
            .await?;

        result.take::<Option<Student>>(0)?.ok_or_else(|| {
            RepoError::NotFound(
                ErrorCode::StudentNotFound,
                format!("Student {} not found", id),
            )
        })
    }

    /// Compare-and-set the paid aggregate
    ///
    /// Writes only when the stored `paid_amount` still equals `expected`.
    /// Returns `None` when a concurrent writer got there first; callers
    /// re-read and retry.
    pub async fn update_paid_amount_cas(
        &self,
        id: &str,
        expected: f64,
        new_paid: f64,
    ) -> RepoResult<Option<Student>> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    paid_amount = $new_paid,
                    updated_at  = $updated_at
                WHERE paid_amount = $expected
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("new_paid", new_paid))
            .bind(("updated_at", shared::util::now_millis()))
            .bind(("expected", expected))
            .await?;
        Ok(result.take::<Option<Student>>(0)?)
    }

    /// Hard delete a student
    ///
    /// Ledger-level guards (no delete while payment records exist) live in
    /// the ledger service, not here.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        self.find_by_id(id).await?.ok_or_else(|| {
            RepoError::NotFound(
                ErrorCode::StudentNotFound,
                format!("Student {} not found", id),
            )
        })?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
