//! Server-rendered HTML pages
//!
//! Presentation glue: small formatted-string templates over the catalog
//! data. All user-supplied content passes through [`escape`] before it is
//! interpolated.

use axum::response::Html;

use crate::model::{Notebook, User};

/// Escapes text for safe interpolation into HTML
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps page content in the shared layout with the navigation bar
fn layout(title: &str, user: Option<&User>, body: &str) -> Html<String> {
    let nav = match user {
        Some(user) => format!(
            r#"<span>Signed in as {}</span> <a href="/dashboard">Dashboard</a> <a href="/upload">Upload</a> <a href="/logout">Logout</a>"#,
            escape(&user.username)
        ),
        None => r#"<a href="/login">Login</a> <a href="/register">Register</a>"#.to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Notebook Dashboard</title>
</head>
<body>
<header>
<h1><a href="/">Notebook Dashboard</a></h1>
<nav><a href="/search">Search</a> {nav}</nav>
</header>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        nav = nav,
        body = body
    ))
}

/// Renders an error banner, or nothing
fn flash(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!(r#"<p class="error">{}</p>"#, escape(msg)),
        None => String::new(),
    }
}

/// Renders a list of notebooks as linked cards
fn notebook_cards(notebooks: &[Notebook]) -> String {
    if notebooks.is_empty() {
        return "<p>No notebooks yet.</p>".to_string();
    }

    let mut out = String::from("<ul class=\"notebooks\">\n");
    for nb in notebooks {
        let visibility = if nb.is_public { "public" } else { "private" };
        out.push_str(&format!(
            r#"<li><a href="/notebook/{id}">{title}</a> <small>[{visibility}] tags: {tags} | views: {views}</small></li>
"#,
            id = nb.id,
            title = escape(&nb.title),
            visibility = visibility,
            tags = escape(&nb.tags),
            views = nb.views,
        ));
    }
    out.push_str("</ul>");
    out
}

pub fn index_page(user: Option<&User>, notebooks: &[Notebook]) -> Html<String> {
    let body = format!("<h2>Recent public notebooks</h2>\n{}", notebook_cards(notebooks));
    layout("Home", user, &body)
}

pub fn dashboard_page(user: &User, notebooks: &[Notebook]) -> Html<String> {
    let body = format!("<h2>Your notebooks</h2>\n{}", notebook_cards(notebooks));
    layout("Dashboard", Some(user), &body)
}

pub fn upload_page(user: Option<&User>, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h2>Upload a notebook</h2>
{flash}
<form method="post" action="/upload" enctype="multipart/form-data">
<label>Notebook file (.ipynb): <input type="file" name="notebook"></label><br>
<label>Tags (comma-separated): <input type="text" name="tags"></label><br>
<label>Public: <input type="checkbox" name="is_public" value="on" checked></label><br>
<button type="submit">Upload</button>
</form>"#,
        flash = flash(error)
    );
    layout("Upload", user, &body)
}

pub fn notebook_page(user: Option<&User>, notebook: &Notebook, owner_username: &str) -> Html<String> {
    // Display attribution prefers the explicit author name over the owner
    let author = notebook.author_name.as_deref().unwrap_or(owner_username);

    let source = match &notebook.external_url {
        Some(url) => format!(
            r#"<p><a href="{}">Open externally hosted notebook</a></p>"#,
            escape(url)
        ),
        None => format!("<p>File: {}</p>", escape(&notebook.filename)),
    };

    let body = format!(
        r#"<h2>{title}</h2>
<p>by {author} | tags: {tags} | views: {views} | likes: {likes}</p>
<p>{description}</p>
{source}"#,
        title = escape(&notebook.title),
        author = escape(author),
        tags = escape(&notebook.tags),
        views = notebook.views,
        likes = notebook.likes,
        description = escape(&notebook.description),
        source = source,
    );
    layout(&notebook.title, user, &body)
}

pub fn search_page(user: Option<&User>, notebooks: &[Notebook], query: &str, tag: &str) -> Html<String> {
    let body = format!(
        r#"<h2>Search notebooks</h2>
<form method="get" action="/search">
<input type="text" name="q" value="{query}" placeholder="Search text">
<input type="text" name="tag" value="{tag}" placeholder="Tag">
<button type="submit">Search</button>
</form>
{results}"#,
        query = escape(query),
        tag = escape(tag),
        results = notebook_cards(notebooks),
    );
    layout("Search", user, &body)
}

pub fn login_page(error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h2>Login</h2>
{flash}
<form method="post" action="/login">
<label>Username: <input type="text" name="username"></label><br>
<label>Password: <input type="password" name="password"></label><br>
<button type="submit">Login</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
        flash = flash(error)
    );
    layout("Login", None, &body)
}

pub fn register_page(error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h2>Register</h2>
{flash}
<form method="post" action="/register">
<label>Username: <input type="text" name="username"></label><br>
<label>Email: <input type="email" name="email"></label><br>
<label>Password: <input type="password" name="password"></label><br>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Login</a></p>"#,
        flash = flash(error)
    );
    layout("Register", None, &body)
}

pub fn error_page(user: Option<&User>, message: &str) -> Html<String> {
    let body = format!("<h2>Error</h2>\n<p>{}</p>", escape(message));
    layout("Error", user, &body)
}
