use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::{Value, json};

use crate::auth::Claims;
use crate::models::book::Entity as BookEntity;
use crate::models::reading_progress;

pub async fn list_books(State(db): State<DatabaseConnection>) -> Result<Json<Value>, StatusCode> {
    let books = BookEntity::find()
        .all(&db)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let total = books.len();
    Ok(Json(json!({
        "books": books,
        "total": total
    })))
}

pub async fn get_book(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let book = BookEntity::find_by_id(id).one(&db).await.unwrap_or(None);
    match book {
        Some(book) => (StatusCode::OK, Json(book)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
    }
}

/// Reader page payload: the book plus where the caller left off.
/// Falls back to page 1 when no progress has been saved yet.
pub async fn read_book(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let book = match BookEntity::find_by_id(id).one(&db).await {
        Ok(Some(book)) => book,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Book not found" })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Error fetching book {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error fetching book" })),
            )
                .into_response();
        }
    };

    let last_read_page = reading_progress::Entity::find()
        .filter(reading_progress::Column::UserId.eq(claims.uid))
        .filter(reading_progress::Column::BookId.eq(id))
        .one(&db)
        .await
        .ok()
        .flatten()
        .and_then(|p| p.last_read_page)
        .unwrap_or(1);

    (
        StatusCode::OK,
        Json(json!({
            "book": book,
            "last_read_page": last_read_page
        })),
    )
        .into_response()
}
