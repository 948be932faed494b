use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    ChangePasswordRequest, CreateUserRequest, MessageResponse, UpdateUserRequest, UserResponse,
    UserUpdate,
};
use crate::users::services::is_valid_email;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/change-password", post(change_password))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
}

fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        warn!(id = %raw, "invalid user id");
        ApiError::bad_request("Invalid user ID")
    })
}

/// The change-password body historically carried the id as a number or a
/// numeric string; accept both.
fn id_from_json(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    match state.users.get_by_id(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::not_found("User not found")),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let (name, email, password) = match (
        payload.name.as_deref().filter(|s| !s.is_empty()),
        payload.email.as_deref().filter(|s| !s.is_empty()),
        payload.password.as_deref().filter(|s| !s.is_empty()),
    ) {
        (Some(n), Some(e), Some(p)) => (n, e, p),
        _ => {
            warn!("create missing required fields");
            return Err(ApiError::bad_request(
                "Name, email, and password are required",
            ));
        }
    };

    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    if password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::bad_request("Password too short"));
    }

    let user = state.users.create(name, email, password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    let fields = UserUpdate {
        name: payload.name.filter(|s| !s.is_empty()),
        email: payload.email.filter(|s| !s.is_empty()),
    };
    if fields.name.is_none() && fields.email.is_none() {
        return Err(ApiError::bad_request(
            "At least one field (name or email) must be provided",
        ));
    }
    if let Some(email) = fields.email.as_deref() {
        if !is_valid_email(email) {
            warn!(%email, "invalid email");
            return Err(ApiError::bad_request("Invalid email"));
        }
    }

    if state.users.update(id, fields).await? {
        Ok(Json(MessageResponse {
            message: "User updated successfully".into(),
        }))
    } else {
        Err(ApiError::not_found("User not found"))
    }
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (id, password) = match (
        payload.id.as_ref(),
        payload.password.as_deref().filter(|s| !s.is_empty()),
    ) {
        (Some(id), Some(p)) => (id, p),
        _ => {
            warn!("change-password missing required fields");
            return Err(ApiError::bad_request("User ID and password are required"));
        }
    };
    let id = id_from_json(id).ok_or_else(|| {
        warn!("invalid user id in change-password body");
        ApiError::bad_request("Invalid user ID")
    })?;
    if password.len() < 8 {
        warn!(user_id = id, "password too short");
        return Err(ApiError::bad_request("Password too short"));
    }

    if state.users.change_password(id, password).await? {
        Ok(Json(MessageResponse {
            message: "Password changed successfully".into(),
        }))
    } else {
        Err(ApiError::not_found("User not found"))
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    if state.users.delete(id).await? {
        Ok(Json(MessageResponse {
            message: "User deleted successfully".into(),
        }))
    } else {
        Err(ApiError::not_found("User not found"))
    }
}
