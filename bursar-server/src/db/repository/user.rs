//! User Repository
//!
//! Uniqueness of `username` / `email` is checked before every write, and
//! plaintext passwords never reach the database: both create and update
//! hash them with argon2 first.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{User, UserCreate, UserUpdate};
use shared::error::ErrorCode;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all users
    pub async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY username")
            .await?
            .take(0)?;
        Ok(users)
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username.to_string()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Number of users in the table
    pub async fn count(&self) -> RepoResult<i64> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            total: i64,
        }
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await?;
        let row: Option<CountRow> = result.take(0)?;
        Ok(row.map(|r| r.total).unwrap_or(0))
    }

    /// Create a new user
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        // Check duplicate unique keys
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(
                ErrorCode::UsernameExists,
                format!("Username '{}' already exists", data.username),
            ));
        }
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate(
                ErrorCode::UserEmailExists,
                format!("email '{}' already exists", data.email),
            ));
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Password hashing failed: {e}")))?;

        let display_name = data.display_name.unwrap_or_else(|| data.username.clone());

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    username     = $username,
                    display_name = $display_name,
                    email        = $email,
                    hash_pass    = $hash_pass,
                    role         = $role,
                    is_active    = true
                RETURN AFTER"#,
            )
            .bind(("username", data.username))
            .bind(("display_name", display_name))
            .bind(("email", data.email))
            .bind(("hash_pass", hash_pass))
            .bind(("role", data.role))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Update a user
    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<User> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            RepoError::NotFound(ErrorCode::UserNotFound, format!("User {} not found", id))
        })?;

        // Check duplicate unique keys if changing
        if let Some(ref new_username) = data.username
            && new_username != &existing.username
            && self.find_by_username(new_username).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                ErrorCode::UsernameExists,
                format!("Username '{}' already exists", new_username),
            ));
        }
        if let Some(ref new_email) = data.email
            && new_email != &existing.email
            && self.find_by_email(new_email).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                ErrorCode::UserEmailExists,
                format!("email '{}' already exists", new_email),
            ));
        }

        let hash_pass = if let Some(ref password) = data.password {
            Some(
                User::hash_password(password)
                    .map_err(|e| RepoError::Database(format!("Password hashing failed: {e}")))?,
            )
        } else {
            None
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    username     = $username OR username,
                    display_name = $display_name OR display_name,
                    email        = $email OR email,
                    hash_pass    = $hash_pass OR hash_pass,
                    role         = $role OR role,
                    is_active    = IF $has_is_active THEN $is_active ELSE is_active END
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("username", data.username))
            .bind(("display_name", data.display_name))
            .bind(("email", data.email))
            .bind(("hash_pass", hash_pass))
            .bind(("role", data.role))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .await?;

        result.take::<Option<User>>(0)?.ok_or_else(|| {
            RepoError::NotFound(ErrorCode::UserNotFound, format!("User {} not found", id))
        })
    }

    /// Hard delete a user
    ///
    /// The self-delete guard lives in the handler, where the caller
    /// identity is known.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id.parse().map_err(|_| {
            RepoError::Validation(ErrorCode::InvalidFormat, format!("Invalid ID: {}", id))
        })?;
        self.find_by_id(id).await?.ok_or_else(|| {
            RepoError::NotFound(ErrorCode::UserNotFound, format!("User {} not found", id))
        })?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
