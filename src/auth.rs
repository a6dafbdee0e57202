//! Session-based authentication
//!
//! This module implements account registration, login/logout and request
//! identity resolution. Passwords are hashed with argon2id and sessions are
//! opaque random tokens persisted in the database and transported via an
//! HttpOnly cookie.
//!
//! There is deliberately no rate limiting, lockout or password reset; the
//! only state change on the happy path is session establishment.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use redb::{Database, ReadableDatabase, ReadableTable};

use crate::database::{next_id, TABLE_EMAILS, TABLE_SESSIONS, TABLE_USERNAMES, TABLE_USERS};
use crate::model::{Session, User};

/// Length of generated session tokens
const TOKEN_LEN: usize = 32;

/// Failures surfaced by the authentication operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The requested username is already registered
    DuplicateUsername,

    /// The requested email address is already registered
    DuplicateEmail,

    /// Unknown username or wrong password; the two cases are not
    /// distinguished to the caller
    InvalidCredentials,
}

/// Hashes a password with argon2id and a fresh random salt
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

/// Verifies a password against a stored PHC hash string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Generates a fresh random session token
fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Creates a new user account
///
/// Checks both uniqueness indexes inside the same write transaction that
/// inserts the record, so two concurrent registrations cannot both claim a
/// name.
pub fn register(db: &Database, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
    let write_txn = db.begin_write().unwrap();

    let user = {
        let mut table_usernames = write_txn.open_table(TABLE_USERNAMES).unwrap();
        if table_usernames.get(username).unwrap().is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let mut table_emails = write_txn.open_table(TABLE_EMAILS).unwrap();
        if table_emails.get(email).unwrap().is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let user = User {
            id: next_id(&write_txn, "users"),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
            created_at: Utc::now(),
        };
        let user_json = serde_json::to_string(&user).unwrap();

        let mut table_users = write_txn.open_table(TABLE_USERS).unwrap();
        table_users.insert(user.id, user_json.as_str()).unwrap();
        table_usernames.insert(username, user.id).unwrap();
        table_emails.insert(email, user.id).unwrap();

        user
    };

    write_txn.commit().unwrap();

    tracing::info!(user_id = user.id, username, "registered new user");
    Ok(user)
}

/// Verifies credentials and establishes a session
///
/// Returns the session token to be set as a cookie alongside the
/// authenticated user.
pub fn login(db: &Database, username: &str, password: &str) -> Result<(String, User), AuthError> {
    // Credential check under a read transaction
    let user = {
        let read_txn = db.begin_read().unwrap();

        let table_usernames = read_txn.open_table(TABLE_USERNAMES).unwrap();
        let user_id = table_usernames
            .get(username)
            .unwrap()
            .map(|g| g.value())
            .ok_or(AuthError::InvalidCredentials)?;

        let table_users = read_txn.open_table(TABLE_USERS).unwrap();
        let user_json = table_users.get(user_id).unwrap().unwrap().value().to_string();
        serde_json::from_str::<User>(&user_json).unwrap()
    };

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_token();
    let session = Session {
        user_id: user.id,
        created_at: Utc::now(),
    };
    let session_json = serde_json::to_string(&session).unwrap();

    let write_txn = db.begin_write().unwrap();
    {
        let mut table_sessions = write_txn.open_table(TABLE_SESSIONS).unwrap();
        table_sessions.insert(token.as_str(), session_json.as_str()).unwrap();
    }
    write_txn.commit().unwrap();

    tracing::debug!(user_id = user.id, "session established");
    Ok((token, user))
}

/// Invalidates a session token
///
/// Removing an unknown token is a no-op.
pub fn logout(db: &Database, token: &str) {
    let write_txn = db.begin_write().unwrap();
    {
        let mut table_sessions = write_txn.open_table(TABLE_SESSIONS).unwrap();
        table_sessions.remove(token).unwrap();
    }
    write_txn.commit().unwrap();
}

/// Looks up a user account by id
pub fn user_by_id(db: &Database, id: u64) -> Option<User> {
    let read_txn = db.begin_read().unwrap();
    let table_users = read_txn.open_table(TABLE_USERS).unwrap();
    let user_json = table_users.get(id).unwrap()?.value().to_string();
    serde_json::from_str(&user_json).ok()
}

/// Resolves the authenticated identity behind a session token
///
/// Returns `None` for unknown or invalidated tokens, i.e. anonymous
/// requests.
pub fn current_user(db: &Database, token: &str) -> Option<User> {
    let read_txn = db.begin_read().unwrap();

    let table_sessions = read_txn.open_table(TABLE_SESSIONS).unwrap();
    let session_json = table_sessions.get(token).unwrap()?.value().to_string();
    let session: Session = serde_json::from_str(&session_json).unwrap();

    let table_users = read_txn.open_table(TABLE_USERS).unwrap();
    let user_json = table_users.get(session.user_id).unwrap()?.value().to_string();
    serde_json::from_str(&user_json).ok()
}
