//! Database initialization and table definitions
//!
//! This module handles the setup and configuration of the embedded redb database.
//! It defines the database tables, the shared application state, and the
//! initialization function that creates everything on first start.

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use std::path::PathBuf;
use std::sync::Arc;

/// Main table for user accounts
///
/// Key: numeric user id
/// Value: JSON-serialized User as string
pub const TABLE_USERS: TableDefinition<u64, &str> = TableDefinition::new("users_v1");

/// Index table mapping usernames to user ids
///
/// Enforces username uniqueness: registration checks this table before
/// inserting, and login resolves the id through it.
pub const TABLE_USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames_v1");

/// Index table mapping email addresses to user ids
pub const TABLE_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("emails_v1");

/// Main table for notebook catalog records
///
/// Key: numeric notebook id
/// Value: JSON-serialized Notebook as string
pub const TABLE_NOTEBOOKS: TableDefinition<u64, &str> = TableDefinition::new("notebooks_v1");

/// Index table for public notebooks in creation order
///
/// Key: composite key in format "{created_at_micros:020}:{id:020}"
/// Value: notebook id
///
/// Zero-padding keeps lexicographic order equal to numeric order, so a
/// reverse iteration yields newest-created first. Only public notebooks are
/// indexed here; visibility never changes after creation, so membership is
/// stable. The value is just the primary key — the record itself is fetched
/// from TABLE_NOTEBOOKS with a second lookup, because records mutate (view
/// counter) and a duplicated copy in the index would go stale.
pub const TABLE_PUBLIC_INDEX: TableDefinition<&str, u64> = TableDefinition::new("public_index_v1");

/// Index table for notebooks by owner
///
/// Key: composite key in format "{user_id:020}:{id:020}"
/// Value: notebook id
///
/// Enables range queries for all notebooks owned by one user regardless of
/// visibility.
pub const TABLE_OWNER_INDEX: TableDefinition<&str, u64> = TableDefinition::new("owner_index_v1");

/// Table for active login sessions
///
/// Key: opaque session token
/// Value: JSON-serialized Session as string
pub const TABLE_SESSIONS: TableDefinition<&str, &str> = TableDefinition::new("sessions_v1");

/// Sequence table for numeric id allocation
///
/// Key: entity name ("users" or "notebooks")
/// Value: last id handed out
pub const TABLE_SEQ: TableDefinition<&str, u64> = TableDefinition::new("seq_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database
    pub db: Arc<Database>,

    /// Directory where uploaded notebook files are written
    pub upload_dir: PathBuf,
}

/// Allocates the next numeric id for the given sequence
///
/// Must be called inside an open write transaction so the increment commits
/// atomically with the record that uses it.
pub fn next_id(txn: &WriteTransaction, seq: &str) -> u64 {
    let mut table = txn.open_table(TABLE_SEQ).unwrap();
    let next = table.get(seq).unwrap().map(|g| g.value()).unwrap_or(0) + 1;
    table.insert(seq, next).unwrap();
    next
}

/// Initializes the embedded database and creates required tables
///
/// Creates or opens the database file at the specified path, opens every
/// table once so the definitions are persisted, and commits.
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_USERS)?;
        write_txn.open_table(TABLE_USERNAMES)?;
        write_txn.open_table(TABLE_EMAILS)?;
        write_txn.open_table(TABLE_NOTEBOOKS)?;
        write_txn.open_table(TABLE_PUBLIC_INDEX)?;
        write_txn.open_table(TABLE_OWNER_INDEX)?;
        write_txn.open_table(TABLE_SESSIONS)?;
        write_txn.open_table(TABLE_SEQ)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Builds the composite key for the public creation-order index
pub fn public_index_key(created_at_micros: i64, id: u64) -> String {
    format!("{:020}:{:020}", created_at_micros, id)
}

/// Builds the composite key for the owner index
pub fn owner_index_key(user_id: u64, id: u64) -> String {
    format!("{:020}:{:020}", user_id, id)
}
