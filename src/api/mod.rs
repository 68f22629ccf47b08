pub mod admin;
pub mod auth;
pub mod books;
pub mod health;
pub mod profile;
pub mod progress;

use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;

pub fn api_router(db: DatabaseConnection) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_me))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/reader", get(books::read_book))
        // Reading progress
        .route("/progress", post(progress::save_progress))
        .route("/progress/:book_id", get(progress::get_progress))
        // Profile / settings
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile))
        // Admin panel
        .route("/admin/users", get(admin::list_users))
        .with_state(db)
}

/// Full application router: the JSON API under /api plus the top-level
/// admin ingestion endpoint.
pub fn app_router(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/upload_books_data", post(admin::upload_books_data))
        .with_state(db.clone())
        .nest("/api", api_router(db))
}
