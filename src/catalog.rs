//! Notebook catalog: creation, listing, detail access and search
//!
//! This is the data core of the application. All reads and writes of
//! notebook records go through here; handlers never touch the tables
//! directly. Ordering is provided by the composite-key index tables (see
//! `database`), iterated in reverse for newest-first results.

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable};

use crate::database::{
    next_id, owner_index_key, public_index_key, TABLE_NOTEBOOKS, TABLE_OWNER_INDEX,
    TABLE_PUBLIC_INDEX, TABLE_USERS,
};
use crate::model::{NewNotebook, Notebook, NotebookSummary, User};

/// Failures surfaced by catalog reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogError {
    /// No record with the requested id exists
    NotFound,

    /// The record is private and the requester is not the owner
    AccessDenied,
}

/// Creates a notebook record
///
/// Allocates the numeric id, stamps both timestamps, and writes the record
/// together with its index entries in one transaction. Counters start at
/// zero. Also used to seed externally-hosted notebooks (empty `file_path`,
/// `external_url` set).
pub fn create(db: &Database, new: NewNotebook) -> Notebook {
    let now = Utc::now();

    let write_txn = db.begin_write().unwrap();

    let notebook = {
        let notebook = Notebook {
            id: next_id(&write_txn, "notebooks"),
            title: new.title,
            description: new.description,
            filename: new.filename,
            file_path: new.file_path,
            external_url: new.external_url,
            author_name: new.author_name,
            tags: new.tags,
            is_public: new.is_public,
            user_id: new.user_id,
            created_at: now,
            updated_at: now,
            views: 0,
            likes: 0,
        };
        let notebook_json = serde_json::to_string(&notebook).unwrap();

        let mut table_main = write_txn.open_table(TABLE_NOTEBOOKS).unwrap();
        table_main.insert(notebook.id, notebook_json.as_str()).unwrap();

        let mut table_owner = write_txn.open_table(TABLE_OWNER_INDEX).unwrap();
        table_owner
            .insert(owner_index_key(notebook.user_id, notebook.id).as_str(), notebook.id)
            .unwrap();

        // Private notebooks never enter the public index; visibility does
        // not change after creation.
        if notebook.is_public {
            let mut table_public = write_txn.open_table(TABLE_PUBLIC_INDEX).unwrap();
            table_public
                .insert(
                    public_index_key(notebook.created_at.timestamp_micros(), notebook.id).as_str(),
                    notebook.id,
                )
                .unwrap();
        }

        notebook
    };

    write_txn.commit().unwrap();

    tracing::info!(notebook_id = notebook.id, user_id = notebook.user_id, "notebook created");
    notebook
}

/// Returns public notebooks, newest-created first, truncated to `limit`
pub fn list_public(db: &Database, limit: usize) -> Vec<Notebook> {
    let read_txn = db.begin_read().unwrap();
    let table_index = read_txn.open_table(TABLE_PUBLIC_INDEX).unwrap();
    let table_main = read_txn.open_table(TABLE_NOTEBOOKS).unwrap();

    table_index
        .iter()
        .unwrap()
        .rev()
        .take(limit)
        .filter_map(|res| {
            res.ok().and_then(|(_, id)| {
                let json = table_main.get(id.value()).unwrap()?.value().to_string();
                serde_json::from_str::<Notebook>(&json).ok()
            })
        })
        .collect()
}

/// Returns every notebook owned by `user_id`, regardless of visibility,
/// ordered by last update descending
///
/// The view counter refreshes `updated_at`, so recently-read notebooks
/// float to the top of the owner's dashboard.
pub fn list_owned(db: &Database, user_id: u64) -> Vec<Notebook> {
    let read_txn = db.begin_read().unwrap();
    let table_index = read_txn.open_table(TABLE_OWNER_INDEX).unwrap();
    let table_main = read_txn.open_table(TABLE_NOTEBOOKS).unwrap();

    // Range over the owner's key prefix: '{' sorts after every digit and
    // after ':', so "{prefix}:{{" is a tight upper bound.
    let start_key = format!("{:020}:", user_id);
    let end_key = format!("{:020}:{{", user_id);

    let mut notebooks: Vec<Notebook> = table_index
        .range(start_key.as_str()..end_key.as_str())
        .unwrap()
        .filter_map(|res| {
            res.ok().and_then(|(_, id)| {
                let json = table_main.get(id.value()).unwrap()?.value().to_string();
                serde_json::from_str::<Notebook>(&json).ok()
            })
        })
        .collect();

    notebooks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    notebooks
}

/// Fetches one notebook for its detail view
///
/// Enforces the visibility rule: private notebooks are readable by their
/// owner only. A successful read increments the view counter by exactly 1
/// and refreshes `updated_at`; denied or missing reads leave the record
/// untouched (the transaction aborts on early return).
pub fn get(db: &Database, id: u64, requester: Option<u64>) -> Result<Notebook, CatalogError> {
    let write_txn = db.begin_write().unwrap();

    let notebook = {
        let mut table_main = write_txn.open_table(TABLE_NOTEBOOKS).unwrap();

        let json = table_main
            .get(id)
            .unwrap()
            .map(|g| g.value().to_string())
            .ok_or(CatalogError::NotFound)?;
        let mut notebook: Notebook = serde_json::from_str(&json).unwrap();

        if !notebook.is_public && requester != Some(notebook.user_id) {
            tracing::debug!(notebook_id = id, ?requester, "denied access to private notebook");
            return Err(CatalogError::AccessDenied);
        }

        notebook.views += 1;
        notebook.updated_at = Utc::now();

        let notebook_json = serde_json::to_string(&notebook).unwrap();
        table_main.insert(id, notebook_json.as_str()).unwrap();

        notebook
    };

    write_txn.commit().unwrap();
    Ok(notebook)
}

/// Substring search over the public subset
///
/// `query` matches title, description or the tag string; `tag` additionally
/// restricts on the tag string. Matching is case-sensitive. With both
/// arguments empty the result is empty — search is not "browse all".
/// Results are ordered newest-created first.
pub fn search(db: &Database, query: &str, tag: &str) -> Vec<Notebook> {
    if query.is_empty() && tag.is_empty() {
        return Vec::new();
    }

    let read_txn = db.begin_read().unwrap();
    let table_index = read_txn.open_table(TABLE_PUBLIC_INDEX).unwrap();
    let table_main = read_txn.open_table(TABLE_NOTEBOOKS).unwrap();

    table_index
        .iter()
        .unwrap()
        .rev()
        .filter_map(|res| {
            res.ok().and_then(|(_, id)| {
                let json = table_main.get(id.value()).unwrap()?.value().to_string();
                serde_json::from_str::<Notebook>(&json).ok()
            })
        })
        .filter(|nb| {
            query.is_empty()
                || nb.title.contains(query)
                || nb.description.contains(query)
                || nb.tags.contains(query)
        })
        .filter(|nb| tag.is_empty() || nb.tags.contains(tag))
        .collect()
}

/// Returns public-facing summaries of the most recent public notebooks
///
/// Same subset and ordering as [`list_public`], projected for the JSON
/// listing. The owner's username is resolved with an explicit lookup per
/// record; entity structs carry no back-references.
pub fn list_summaries(db: &Database, limit: usize) -> Vec<NotebookSummary> {
    let read_txn = db.begin_read().unwrap();
    let table_users = read_txn.open_table(TABLE_USERS).unwrap();

    list_public(db, limit)
        .into_iter()
        .map(|nb| {
            let author = table_users
                .get(nb.user_id)
                .unwrap()
                .and_then(|g| serde_json::from_str::<User>(g.value()).ok())
                .map(|u| u.username)
                .unwrap_or_default();

            let tags = if nb.tags.is_empty() {
                Vec::new()
            } else {
                nb.tags.split(',').map(str::to_string).collect()
            };

            NotebookSummary {
                id: nb.id,
                title: nb.title,
                description: nb.description,
                author,
                tags,
                views: nb.views,
                likes: nb.likes,
                created_at: nb.created_at.to_rfc3339(),
            }
        })
        .collect()
}
