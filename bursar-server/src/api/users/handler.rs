//! User Management API Handlers
//!
//! `User` skips `hash_pass` on serialization, so models go straight out
//! as responses.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{self, FieldErrors};
use shared::error::{AppError, AppResult, ErrorCode};

/// Passwords shorter than this are rejected at creation and on change
const MIN_PASSWORD_LEN: usize = 8;

/// List all user accounts
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let repo = UserRepository::new(state.db.clone());
    let users = repo.find_all().await?;
    Ok(Json(users))
}

/// Get user by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user))
}

/// Create a user account
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    let mut errors = FieldErrors::new();
    errors.check(
        "username",
        validation::validate_required_text(
            &payload.username,
            "username",
            validation::MAX_SHORT_TEXT_LEN,
        ),
    );
    errors.check("password", validate_password(&payload.password));
    errors.check("email", validation::validate_email(&payload.email));
    errors.check(
        "display_name",
        validation::validate_optional_text(
            &payload.display_name,
            "display_name",
            validation::MAX_NAME_LEN,
        ),
    );
    errors.into_result()?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.create(payload).await?;
    tracing::info!(username = %user.username, role = %user.role.as_str(), "User created");
    Ok(Json(user))
}

/// Update a user account
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    let mut errors = FieldErrors::new();
    if let Some(v) = &payload.username {
        errors.check(
            "username",
            validation::validate_required_text(v, "username", validation::MAX_SHORT_TEXT_LEN),
        );
    }
    if let Some(v) = &payload.password {
        errors.check("password", validate_password(v));
    }
    if let Some(v) = &payload.email {
        errors.check("email", validation::validate_email(v));
    }
    errors.check(
        "display_name",
        validation::validate_optional_text(
            &payload.display_name,
            "display_name",
            validation::MAX_NAME_LEN,
        ),
    );
    errors.into_result()?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(&id, payload).await?;
    Ok(Json(user))
}

/// Delete a user account
///
/// An admin cannot delete their own account; locking everyone out of
/// user management would need a database edit to undo.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Json<bool>> {
    if user.id == id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf));
    }

    let repo = UserRepository::new(state.db.clone());
    repo.delete(&id).await?;
    tracing::info!(user_id = %id, deleted_by = %user.username, "User deleted");
    Ok(Json(true))
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.len() > validation::MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long ({} chars, max {})",
            password.len(),
            validation::MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}
