use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth;
use crate::database::AppState;
use crate::model::User;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// The identity resolved for the current request, or `None` for anonymous
/// requests
///
/// Inserted into request extensions by [`resolve_session`] so every handler
/// can read it without touching the session store again.
#[derive(Clone)]
pub struct CurrentUser(pub Option<User>);

/// Extracts the session token from the `Cookie` header, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('=')))
        .map(str::to_string)
}

/// Middleware that resolves the session cookie into a [`CurrentUser`]
///
/// Runs on every route. Unknown or missing tokens resolve to an anonymous
/// request; the check never rejects by itself.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = session_token(request.headers())
        .and_then(|token| auth::current_user(&state.db, &token));

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Middleware guarding the pages that require a logged-in user
///
/// Anonymous requests are redirected to the login page.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, Response> {
    let authenticated = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.is_some());

    if !authenticated {
        return Err(Redirect::to("/login").into_response());
    }

    Ok(next.run(request).await)
}
