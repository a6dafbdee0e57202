//! Data models for the notebook dashboard
//!
//! This module defines all the data structures used throughout the application,
//! including database record structures, the public JSON projection, and
//! request payloads for the HTML forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a registered user account stored in the database
///
/// Accounts are created at registration and never edited or deleted
/// afterwards; there is no profile-edit path.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    /// Numeric id assigned by the storage layer on creation
    pub id: u64,

    /// Unique login name
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id hash of the password in PHC string format
    ///
    /// Plaintext passwords are never stored.
    pub password_hash: String,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,
}

/// Represents a notebook catalog record stored in the database
///
/// A notebook is either a stored file under the upload directory or an
/// externally-hosted artifact referenced by URL. Records are permanent once
/// created; there is no deletion path.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Notebook {
    /// Numeric id assigned by the storage layer on creation
    pub id: u64,

    /// Display title, extracted from notebook metadata or derived from the
    /// filename
    pub title: String,

    /// Free-text description (may be empty)
    pub description: String,

    /// Sanitized original filename
    pub filename: String,

    /// Path of the stored file relative to the upload directory
    ///
    /// Empty for externally-hosted notebooks.
    pub file_path: String,

    /// Link to an externally-hosted notebook (e.g. a Colab URL)
    pub external_url: Option<String>,

    /// Display attribution when the notebook was uploaded on someone's
    /// behalf; distinct from the owning user
    pub author_name: Option<String>,

    /// Comma-separated tag string, stored verbatim as given
    pub tags: String,

    /// Whether the notebook is listed and searchable by anyone
    pub is_public: bool,

    /// Id of the owning user
    pub user_id: u64,

    /// Timestamp when this record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation (including view-counter bumps)
    pub updated_at: DateTime<Utc>,

    /// Number of times the detail view has been served
    /// Defaults to 0 if not present during deserialization
    #[serde(default)]
    pub views: u64,

    /// Like counter; present in the schema but nothing increments it
    #[serde(default)]
    pub likes: u64,
}

/// Represents an active login session
///
/// Stored keyed by its opaque token; binds a request carrying the session
/// cookie to a user id. Sessions do not expire, they only end at logout.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    /// Id of the authenticated user
    pub user_id: u64,

    /// Timestamp when the session was established
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a notebook record
///
/// Built by the upload handler for stored files, or directly for
/// externally-hosted notebooks seeded by maintenance code.
#[derive(Debug, Clone)]
pub struct NewNotebook {
    pub title: String,
    pub description: String,
    pub filename: String,
    pub file_path: String,
    pub external_url: Option<String>,
    pub author_name: Option<String>,
    pub tags: String,
    pub is_public: bool,
    pub user_id: u64,
}

/// Public-facing summary of a notebook returned by the JSON listing
///
/// # Example
/// ```json
/// {
///   "id": 1,
///   "title": "Ngoc - DAI Analysis",
///   "description": "Analysis of DAI stablecoin by Ngoc",
///   "author": "admin",
///   "tags": ["stablecoin", "dai", "ngoc", "external"],
///   "views": 3,
///   "likes": 0,
///   "created_at": "2026-01-17T13:40:00+00:00"
/// }
/// ```
#[derive(Serialize, Debug)]
pub struct NotebookSummary {
    pub id: u64,
    pub title: String,
    pub description: String,

    /// Username of the owning user, resolved with a second lookup
    pub author: String,

    /// Tag string split on commas; empty tag string yields an empty list
    pub tags: Vec<String>,

    pub views: u64,
    pub likes: u64,

    /// Creation timestamp in RFC 3339 text form
    pub created_at: String,
}

/// Form payload for the registration page
#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Form payload for the login page
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Query parameters for the search page
///
/// # Example
/// Query string: `?q=DAI&tag=stablecoin`
#[derive(Deserialize)]
pub struct SearchParams {
    /// Free-text query matched as a substring against title, description
    /// and tags
    #[serde(default)]
    pub q: String,

    /// Tag filter matched as a substring against the tag string
    #[serde(default)]
    pub tag: String,
}
