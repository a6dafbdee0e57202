//! Notebook file uploads
//!
//! Validates the uploaded filename, writes the bytes under the upload
//! directory with a collision-free storage name, extracts best-effort
//! metadata from the nbformat JSON, and creates the catalog record. The
//! file is written before the record exists; a failed write produces no
//! record.

use rand::{distr::Alphanumeric, Rng};

use crate::catalog;
use crate::database::AppState;
use crate::model::{NewNotebook, Notebook};

/// Only Jupyter notebooks are accepted
const ALLOWED_EXTENSION: &str = "ipynb";

/// Length of the random prefix on stored filenames
const STORAGE_PREFIX_LEN: usize = 12;

/// Failures surfaced by the upload handler
#[derive(Debug)]
pub enum UploadError {
    /// No file part was attached, or its filename is empty
    NoFileProvided,

    /// The filename's extension is not an accepted notebook format
    InvalidFileType,

    /// The file could not be written to the upload directory
    Io(std::io::Error),
}

/// Checks whether a filename carries the accepted notebook extension
/// (case-insensitive)
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION))
}

/// Sanitizes an uploaded filename for storage
///
/// Keeps only ASCII alphanumerics, dots, dashes and underscores from the
/// final path component; spaces become underscores, everything else is
/// dropped. Leading dots are stripped so a stored name can never be hidden
/// or refer upward.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => Some(c),
            ' ' => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

/// Extracts a title and description from nbformat JSON
///
/// Reads `metadata.title` and `metadata.description` from the document.
/// Any parse failure — invalid JSON, missing keys, wrong types — falls back
/// to the given title and an empty description. This is the one place where
/// metadata errors are swallowed; callers never see them.
pub fn extract_metadata(bytes: &[u8], fallback_title: &str) -> (String, String) {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(bytes).ok();

    let metadata = parsed.as_ref().and_then(|doc| doc.get("metadata"));

    let title = metadata
        .and_then(|m| m.get("title"))
        .and_then(|v| v.as_str())
        .unwrap_or(fallback_title)
        .to_string();

    let description = metadata
        .and_then(|m| m.get("description"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    (title, description)
}

/// Generates the random prefix that makes storage names globally unique
fn storage_prefix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STORAGE_PREFIX_LEN)
        .map(char::from)
        .collect()
}

/// Strips the notebook extension for the fallback title
fn title_from_filename(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    match lower.strip_suffix(".ipynb") {
        Some(_) => filename[..filename.len() - ".ipynb".len()].to_string(),
        None => filename.to_string(),
    }
}

/// Stores an uploaded notebook file and creates its catalog record
///
/// Tags are persisted verbatim as given; no normalization of duplicates or
/// whitespace.
pub async fn store_upload(
    state: &AppState,
    user_id: u64,
    filename: Option<&str>,
    bytes: &[u8],
    tags: &str,
    is_public: bool,
) -> Result<Notebook, UploadError> {
    let filename = match filename {
        Some(name) if !name.is_empty() => name,
        _ => return Err(UploadError::NoFileProvided),
    };

    if !allowed_file(filename) {
        return Err(UploadError::InvalidFileType);
    }

    let sanitized = sanitize_filename(filename);
    if sanitized.is_empty() {
        return Err(UploadError::NoFileProvided);
    }

    let storage_name = format!("{}_{}", storage_prefix(), sanitized);
    let target = state.upload_dir.join(&storage_name);

    tokio::fs::write(&target, bytes).await.map_err(UploadError::Io)?;
    tracing::debug!(path = %target.display(), size = bytes.len(), "stored uploaded file");

    let (title, description) = extract_metadata(bytes, &title_from_filename(&sanitized));

    Ok(catalog::create(
        &state.db,
        NewNotebook {
            title,
            description,
            filename: sanitized,
            file_path: storage_name,
            external_url: None,
            author_name: None,
            tags: tags.to_string(),
            is_public,
            user_id,
        },
    ))
}
