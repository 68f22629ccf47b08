use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Claims;
use crate::models::reading_progress::{self, Column, Entity as ReadingProgress};

// All three fields are required; Option here so an absent field maps to
// the API's "Incomplete data" response instead of a body-rejection.
#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    pub book_id: Option<i32>,
    pub last_read_page: Option<i32>,
    pub progress_percentage: Option<f64>,
}

pub async fn save_progress(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<SaveProgressRequest>,
) -> impl IntoResponse {
    let (Some(book_id), Some(last_read_page), Some(progress_percentage)) = (
        payload.book_id,
        payload.last_read_page,
        payload.progress_percentage,
    ) else {
        tracing::warn!("Incomplete progress payload from user {}", claims.uid);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Incomplete data" })),
        )
            .into_response();
    };

    let entry = reading_progress::ActiveModel {
        user_id: Set(claims.uid),
        book_id: Set(book_id),
        last_read_page: Set(Some(last_read_page)),
        progress_percentage: Set(Some(progress_percentage)),
        updated_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    // One atomic insert-or-update keyed on (user_id, book_id); a full
    // overwrite, no monotonicity check on the page number.
    let result = ReadingProgress::insert(entry)
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::BookId])
                .update_columns([
                    Column::LastReadPage,
                    Column::ProgressPercentage,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&db)
        .await;

    match result {
        Ok(_) => {
            tracing::info!(
                "Progress saved for user {} and book {}",
                claims.uid,
                book_id
            );
            (
                StatusCode::OK,
                Json(json!({ "message": "Progress saved successfully" })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(
                "Error saving progress for user {} and book {}: {}",
                claims.uid,
                book_id,
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error saving progress" })),
            )
                .into_response()
        }
    }
}

pub async fn get_progress(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(book_id): Path<i32>,
) -> impl IntoResponse {
    let row = ReadingProgress::find()
        .filter(Column::UserId.eq(claims.uid))
        .filter(Column::BookId.eq(book_id))
        .one(&db)
        .await;

    match row {
        Ok(Some(progress)) => (
            StatusCode::OK,
            Json(json!({
                "last_read_page": progress.last_read_page,
                "progress_percentage": progress.progress_percentage
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No progress found for this book" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                "Error fetching progress for user {} and book {}: {}",
                claims.uid,
                book_id,
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Error fetching progress" })),
            )
                .into_response()
        }
    }
}
