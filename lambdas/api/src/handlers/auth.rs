use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use domain::users::{
    self,
    inputs::{LoginInput, RegisterInput},
    Role,
};
use serde::Serialize;
use serde_json::json;
use ulid::Ulid;

use crate::{
    auth::{self, Claims},
    error::ApiError,
    state::AppState,
};

#[derive(Serialize)]
struct UserSummary {
    id: String,
    username: String,
    role: Role,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: UserSummary,
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || input.username.is_empty() || input.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }

    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    let command = users::Command::Register {
        email: email.clone(),
        username: input.username,
        password_hash: auth::hash_password(&input.password),
        role: input.role.unwrap_or_default(),
    };

    state
        .users_cqrs
        .execute_with_metadata(&email, command, metadata)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "User registered successfully" })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let email = input.email.trim().to_lowercase();

    let view = state
        .users_repo
        .load(&email)
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid credentials".to_string()))?;

    if !auth::verify_password(&input.password, &view.user.password_hash) {
        return Err(ApiError::Validation("Invalid credentials".to_string()));
    }

    let claims = Claims::issue(
        view.user.email.clone(),
        view.user.username.clone(),
        view.user.role,
        Utc::now().timestamp(),
    );
    let token = auth::sign_token(&claims, &state.token_key)?;

    Ok(Json(LoginResponse {
        token,
        user: UserSummary {
            id: view.user.email,
            username: view.user.username,
            role: view.user.role,
        },
    }))
}
