//! HTTP request handlers for the notebook dashboard
//!
//! This module wires the HTTP surface to the auth, upload and catalog
//! components:
//! - Public catalog listing, detail views and search
//! - Session login/logout and account registration
//! - Authenticated dashboard and multipart notebook upload
//! - The read-only JSON listing and the health probe
//!
//! Validation and authorization failures re-render the originating form or
//! return an error page; they are never retried.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde_json::json;

use crate::auth::{self, AuthError};
use crate::catalog::{self, CatalogError};
use crate::database::AppState;
use crate::middleware::{session_token, CurrentUser};
use crate::model::{LoginForm, RegisterForm, SearchParams};
use crate::upload::{self, UploadError};
use crate::view;

/// Notebooks shown on the landing page
const INDEX_LIMIT: usize = 12;

/// Summaries returned by the JSON listing
const API_LIMIT: usize = 20;

/// `GET /` — most recent public notebooks
pub async fn index(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Html<String> {
    let notebooks = catalog::list_public(&state.db, INDEX_LIMIT);
    view::index_page(user.as_ref(), &notebooks)
}

/// `GET /dashboard` — the caller's own notebooks, any visibility
///
/// Reached only through the auth gate, so the current user is always
/// present.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };

    let notebooks = catalog::list_owned(&state.db, user.id);
    view::dashboard_page(&user, &notebooks).into_response()
}

/// `GET /upload` — the upload form
pub async fn upload_form(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Html<String> {
    view::upload_page(user.as_ref(), None)
}

/// `POST /upload` — multipart notebook upload
///
/// Form fields: `notebook` (the file), `tags`, `is_public` checkbox. The
/// router caps the request body at 16 MiB; an oversized body surfaces here
/// as a field read error carrying 413.
pub async fn upload_submit(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Response {
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };

    let mut filename: Option<String> = None;
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut tags = String::new();
    let mut is_public = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                return (
                    status,
                    view::upload_page(Some(&user), Some("Upload failed: request too large or malformed")),
                )
                    .into_response();
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("notebook") => {
                filename = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => file_bytes = bytes.to_vec(),
                    Err(err) => {
                        let status = err.status();
                        return (
                            status,
                            view::upload_page(Some(&user), Some("Upload failed: request too large or malformed")),
                        )
                            .into_response();
                    }
                }
            }
            Some("tags") => tags = field.text().await.unwrap_or_default(),
            Some("is_public") => {
                is_public = field.text().await.map(|v| v == "on").unwrap_or(false)
            }
            _ => {}
        }
    }

    match upload::store_upload(&state, user.id, filename.as_deref(), &file_bytes, &tags, is_public).await
    {
        Ok(_) => Redirect::to("/dashboard").into_response(),
        Err(UploadError::NoFileProvided) => (
            StatusCode::BAD_REQUEST,
            view::upload_page(Some(&user), Some("No file selected")),
        )
            .into_response(),
        Err(UploadError::InvalidFileType) => (
            StatusCode::BAD_REQUEST,
            view::upload_page(Some(&user), Some("Invalid file type. Please upload a .ipynb file.")),
        )
            .into_response(),
        Err(UploadError::Io(err)) => {
            tracing::error!(error = %err, "failed to store uploaded file");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                view::upload_page(Some(&user), Some("Failed to store the uploaded file")),
            )
                .into_response()
        }
    }
}

/// `GET /notebook/{id}` — detail view
///
/// Increments the view counter on every successful read. Private notebooks
/// are visible to their owner only.
pub async fn notebook_detail(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> Response {
    let requester = user.as_ref().map(|u| u.id);

    match catalog::get(&state.db, id, requester) {
        Ok(notebook) => {
            let owner_username = auth::user_by_id(&state.db, notebook.user_id)
                .map(|owner| owner.username)
                .unwrap_or_default();
            view::notebook_page(user.as_ref(), &notebook, &owner_username).into_response()
        }
        Err(CatalogError::NotFound) => (
            StatusCode::NOT_FOUND,
            view::error_page(user.as_ref(), "Notebook not found"),
        )
            .into_response(),
        Err(CatalogError::AccessDenied) => (
            StatusCode::FORBIDDEN,
            view::error_page(user.as_ref(), "Access denied"),
        )
            .into_response(),
    }
}

/// `GET /search?q=&tag=` — substring search over public notebooks
pub async fn search(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let notebooks = catalog::search(&state.db, &params.q, &params.tag);
    view::search_page(user.as_ref(), &notebooks, &params.q, &params.tag)
}

/// `GET /login`
pub async fn login_form(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    view::login_page(None).into_response()
}

/// `POST /login` — establishes a session and sets the cookie
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth::login(&state.db, &form.username, &form.password) {
        Ok((token, _)) => (
            AppendHeaders([(
                header::SET_COOKIE,
                format!("session={}; Path=/; HttpOnly", token),
            )]),
            Redirect::to("/dashboard"),
        )
            .into_response(),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            view::login_page(Some("Invalid username or password")),
        )
            .into_response(),
    }
}

/// `GET /register`
pub async fn register_form(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    view::register_page(None).into_response()
}

/// `POST /register` — creates the account, then sends the user to login
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match auth::register(&state.db, &form.username, &form.email, &form.password) {
        Ok(_) => Redirect::to("/login").into_response(),
        Err(err) => {
            let message = match err {
                AuthError::DuplicateUsername => "Username already exists",
                AuthError::DuplicateEmail => "Email already registered",
                AuthError::InvalidCredentials => "Registration failed",
            };
            (StatusCode::CONFLICT, view::register_page(Some(message))).into_response()
        }
    }
}

/// `GET /logout` — invalidates the session and clears the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        auth::logout(&state.db, &token);
    }

    (
        AppendHeaders([(
            header::SET_COOKIE,
            "session=; Path=/; HttpOnly; Max-Age=0".to_string(),
        )]),
        Redirect::to("/"),
    )
        .into_response()
}

/// `GET /api/notebooks` — JSON summaries of recent public notebooks
pub async fn api_notebooks(State(state): State<AppState>) -> Response {
    Json(catalog::list_summaries(&state.db, API_LIMIT)).into_response()
}

/// `GET /api/health` — liveness probe
pub async fn api_health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}
