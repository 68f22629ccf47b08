use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde_json::json;

use crate::auth::AdminUser;
use crate::import;
use crate::models::book;
use crate::models::user::Entity as User;

/// Admin panel data: every account. Password hashes are never serialized.
pub async fn list_users(
    AdminUser(_claims): AdminUser,
    State(db): State<DatabaseConnection>,
) -> impl IntoResponse {
    match User::find().all(&db).await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => {
            tracing::error!("Error listing users: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error fetching users" })),
            )
                .into_response()
        }
    }
}

/// Bulk catalog ingestion: a csv of book rows or a raw sql script,
/// admin-only. Each upload is an independent all-or-nothing batch.
pub async fn upload_books_data(
    AdminUser(claims): AdminUser,
    State(db): State<DatabaseConnection>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    tracing::debug!("Processing file upload for user {}", claims.uid);

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_owned();
        if filename.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No selected file" })),
            )
                .into_response();
        }

        let Some(kind) = import::allowed_upload(&filename) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid file type. Only .sql and .csv files are allowed." })),
            )
                .into_response();
        };

        let data = field.bytes().await.unwrap_or_default();

        return match kind {
            "csv" => ingest_csv(&db, &data).await,
            _ => ingest_sql(&db, &data).await,
        };
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No file part" })),
    )
        .into_response()
}

async fn ingest_csv(db: &DatabaseConnection, data: &[u8]) -> axum::response::Response {
    // Parse everything first so a bad row aborts before any write
    let books = match import::parse_books_csv(data) {
        Ok(books) => books,
        Err(e) => {
            tracing::error!("Error processing CSV file: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Error processing CSV file" })),
            )
                .into_response();
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(e) => {
            tracing::error!("Failed to open ingestion transaction: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error processing CSV file" })),
            )
                .into_response();
        }
    };

    let imported = books.len();
    for req in books {
        let now = chrono::Utc::now().to_rfc3339();
        let record = book::ActiveModel {
            title: Set(req.title),
            author: Set(req.author),
            translator: Set(req.translator),
            description: Set(req.description),
            pdf_loc: Set(req.pdf_loc),
            cover_img_loc: Set(req.cover_img_loc),
            published_on: Set(req.published_on),
            genre: Set(req.genre),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        if let Err(e) = record.insert(&txn).await {
            tracing::error!("Error inserting book row: {}", e);
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error processing CSV file" })),
            )
                .into_response();
        }
    }

    if let Err(e) = txn.commit().await {
        tracing::error!("Error committing CSV batch: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Error processing CSV file" })),
        )
            .into_response();
    }

    tracing::info!("Books data uploaded: {} records", imported);
    (
        StatusCode::OK,
        Json(json!({
            "message": "Books data uploaded successfully",
            "imported": imported
        })),
    )
        .into_response()
}

async fn ingest_sql(db: &DatabaseConnection, data: &[u8]) -> axum::response::Response {
    // Verbatim execution is an explicit trust decision: the caller has
    // already been verified as admin.
    let script = match std::str::from_utf8(data) {
        Ok(s) => s.to_owned(),
        Err(e) => {
            tracing::error!("Uploaded SQL script is not valid UTF-8: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Error executing SQL script" })),
            )
                .into_response();
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(e) => {
            tracing::error!("Failed to open ingestion transaction: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error executing SQL script" })),
            )
                .into_response();
        }
    };

    if let Err(e) = txn.execute_unprepared(&script).await {
        tracing::error!("Error executing SQL script: {}", e);
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Error executing SQL script" })),
        )
            .into_response();
    }

    if let Err(e) = txn.commit().await {
        tracing::error!("Error committing SQL script: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Error executing SQL script" })),
        )
            .into_response();
    }

    tracing::info!("SQL script executed");
    (
        StatusCode::OK,
        Json(json!({ "message": "SQL script executed successfully" })),
    )
        .into_response()
}
