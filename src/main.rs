//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Initializes the database and the upload directory
//! - Starts the HTTP server with graceful shutdown support

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

// Module declarations
mod auth;
mod catalog;
mod database;
mod handler;
mod middleware;
mod model;
mod route;
mod upload;
mod view;

use database::{init_db, AppState};
use route::create_app;

/// Application entry point
///
/// 1. Loads environment variables from a .env file if present
/// 2. Reads configuration (PORT, DATABASE_URL, UPLOAD_DIR)
/// 3. Initializes the embedded database and creates the upload directory
/// 4. Creates the application state and router
/// 5. Starts the HTTP server with graceful shutdown handling
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "notebooks.db")
/// - `UPLOAD_DIR` - Directory for uploaded notebook files (default: "uploads")
#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("nbshare=debug,tower_http=debug")
        .init();

    let port_str = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let port: u16 = port_str.parse().unwrap_or(8080);

    let db_name = env::var("DATABASE_URL").unwrap_or_else(|_| "notebooks.db".to_string());
    let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));

    // Uploaded files land here; create it before the first request
    std::fs::create_dir_all(&upload_dir).expect("Failed to create upload directory");

    let db = init_db(&db_name).expect("Failed to initialize database");

    let state = AppState {
        db: Arc::new(db),
        upload_dir: upload_dir.clone(),
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.unwrap();

    println!("🚀 Server running at http://localhost:{}", port);
    println!("📂 Using database: {}", db_name);
    println!("📁 Uploads stored in: {}", upload_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

/// Handles graceful shutdown signals
///
/// Returns when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received. Open
/// connections are allowed to complete and pending database transactions
/// close cleanly before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("\n🛑 Shutdown signal received, stopping server.");
}
