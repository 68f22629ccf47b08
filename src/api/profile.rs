use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Claims;
use crate::models::user::{self, Entity as User};

pub async fn get_profile(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match User::find_by_id(claims.uid).one(&db).await {
        Ok(Some(account)) => (StatusCode::OK, Json(account)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error fetching profile for user {}: {}", claims.uid, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error fetching profile" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Settings flow: update the caller's optional profile fields.
/// Only fields present in the request are touched.
pub async fn update_profile(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let account = match User::find_by_id(claims.uid).one(&db).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Error loading profile for user {}: {}", claims.uid, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error updating profile" })),
            )
                .into_response();
        }
    };

    let mut active: user::ActiveModel = account.into();
    if let Some(email) = req.email {
        active.email = Set(Some(email).filter(|s| !s.is_empty()));
    }
    if let Some(phone) = req.phone {
        active.phone = Set(Some(phone).filter(|s| !s.is_empty()));
    }
    if let Some(gender) = req.gender {
        active.gender = Set(Some(gender).filter(|s| !s.is_empty()));
    }
    if let Some(address) = req.address {
        active.address = Set(Some(address).filter(|s| !s.is_empty()));
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active.update(&db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(json!({
                "message": "Profile updated successfully",
                "user": updated
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error updating profile for user {}: {}", claims.uid, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error updating profile" })),
            )
                .into_response()
        }
    }
}
