use crate::auth::{Claims, create_jwt, hash_password, verify_password};
use crate::models::user;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    tracing::info!("Login attempt for user: {}", payload.username);

    let account = match user::Entity::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&db)
        .await
    {
        Ok(Some(u)) => u,
        _ => {
            tracing::warn!("User not found: {}", payload.username);
            // Same message as a bad password; never reveal which field was wrong
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response();
        }
    };

    match verify_password(&payload.password, &account.password_hash) {
        Ok(true) => {
            tracing::info!("Password verified for user: {}", account.username);
            match create_jwt(&account.username, account.id, &account.role) {
                Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
                Err(e) => {
                    tracing::error!("Failed to issue token for {}: {}", account.username, e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Login failed" })),
                    )
                        .into_response()
                }
            }
        }
        _ => {
            tracing::warn!("Password verification failed for user: {}", account.username);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct SignupRequest {
    username: String,
    password: String,
}

pub async fn signup(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SignupRequest>,
) -> impl IntoResponse {
    let username = payload.username.trim().to_owned();

    if username.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Username is required" })),
        )
            .into_response();
    }
    if payload.password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Password must be at least 6 characters" })),
        )
            .into_response();
    }

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&db)
        .await;

    match existing {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Username already exists" })),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Signup lookup failed for {}: {}", username, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error creating account" })),
            )
                .into_response();
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Password hashing failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error creating account" })),
            )
                .into_response();
        }
    };

    // Username doubles as the email address when it looks like one
    let email = if username.contains('@') {
        Some(username.clone())
    } else {
        None
    };

    let now = chrono::Utc::now().to_rfc3339();
    let account = user::ActiveModel {
        username: Set(username.clone()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set("user".to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match account.insert(&db).await {
        Ok(_) => {
            tracing::info!("Account created: {}", username);
            (
                StatusCode::CREATED,
                Json(json!({ "message": "Account created successfully" })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create account {}: {}", username, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error creating account" })),
            )
                .into_response()
        }
    }
}

pub async fn get_me(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match user::Entity::find_by_id(claims.uid).one(&db).await {
        Ok(Some(account)) => (StatusCode::OK, Json(account)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to load user {}: {}", claims.uid, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error fetching user" })),
            )
                .into_response()
        }
    }
}
