//! Route definitions for the notebook dashboard
//!
//! This module configures all HTTP routes and maps them to their respective handlers.
//! It creates the Axum router with the application state, the session
//! middleware and the request body cap.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use axum::middleware;

use crate::database::AppState;
use crate::handler::{
    api_health, api_notebooks, dashboard, index, login_form, login_submit, logout,
    notebook_detail, register_form, register_submit, search, upload_form, upload_submit,
};
use crate::middleware::{require_auth, resolve_session};

/// Maximum accepted request body size (covers the multipart upload)
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /` - Public notebook listing (12 most recent)
/// - `GET /notebook/{id}` - Detail view, increments the view counter
/// - `GET /search` - Substring search over public notebooks
/// - `GET,POST /login` - Session establishment
/// - `GET,POST /register` - Account creation
/// - `GET /api/notebooks` - JSON listing of public notebook summaries
/// - `GET /api/health` - Liveness probe
/// - `GET /dashboard` - Caller's own notebooks (auth required)
/// - `GET,POST /upload` - Multipart notebook upload (auth required)
/// - `GET /logout` - Ends the session (auth required)
///
/// The session-resolution middleware runs on every route; the pages under
/// the auth gate additionally redirect anonymous requests to `/login`.
pub fn create_app(state: AppState) -> Router {
    // Pages that require a logged-in user
    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/upload", get(upload_form).post(upload_submit))
        .route("/logout", get(logout))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/", get(index))
        .route("/notebook/{id}", get(notebook_detail))
        .route("/search", get(search))
        .route("/login", get(login_form).post(login_submit))
        .route("/register", get(register_form).post(register_submit))
        .route("/api/notebooks", get(api_notebooks))
        .route("/api/health", get(api_health))
        .merge(protected)
        // Resolve the session cookie before any handler or auth gate runs
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
