use lazy_static::lazy_static;
use regex::Regex;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;

pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_PASSWORD_LEN: usize = 64;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Form input refused before it gets anywhere near the database.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("Please enter both a username and a password.")]
    Missing,
    #[error("Usernames can be at most {} characters long.", MAX_USERNAME_LEN)]
    UsernameTooLong,
    #[error("Passwords can be at most {} characters long.", MAX_PASSWORD_LEN)]
    PasswordTooLong,
    #[error("Usernames may only contain letters, digits, '-' and '_'.")]
    UsernameCharacters,
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn validate_login(username: &str, password: &str) -> Result<(), InvalidInput> {
    if username.is_empty() || password.is_empty() {
        return Err(InvalidInput::Missing);
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(InvalidInput::UsernameTooLong);
    }
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(InvalidInput::PasswordTooLong);
    }
    Ok(())
}

pub fn validate_signup(username: &str, password: &str) -> Result<(), InvalidInput> {
    validate_login(username, password)?;
    if !is_valid_username(username) {
        return Err(InvalidInput::UsernameCharacters);
    }
    Ok(())
}

pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, password_hash FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, password_hash FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Insert a new user. `Ok(None)` means the username is already taken.
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, password_hash) VALUES (?, ?)
         RETURNING id, username, password_hash",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(Some(user)),
        Err(sqlx::Error::Database(e)) if is_unique_violation(e.as_ref()) => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_unique_violation(e: &dyn sqlx::error::DatabaseError) -> bool {
    // SQLITE_CONSTRAINT_UNIQUE
    e.code().as_deref() == Some("2067") || e.message().contains("UNIQUE constraint failed")
}
