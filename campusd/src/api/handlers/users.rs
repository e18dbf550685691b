//! Self-service profile operations for the authenticated identity.

use axum::{extract::State, Json};

use crate::{
    api::models::{
        users::{AuthUser, UserResponse, UserUpdateRequest},
        MessageResponse,
    },
    auth::password,
    db::{
        errors::DbError,
        handlers::{Repository as _, Users},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Get the authenticated identity
#[utoipa::path(
    get,
    path = "/users/getUser",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated identity", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Identity no longer exists"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_user(State(state): State<AppState>, user: AuthUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let found = user_repo.get_by_id(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
    })?;

    Ok(Json(found.into()))
}

/// Update the authenticated identity. Only supplied fields change; role never does.
#[utoipa::path(
    put,
    path = "/users/update",
    request_body = UserUpdateRequest,
    tag = "users",
    responses(
        (status = 200, description = "Updated identity", body = UserResponse),
        (status = 400, description = "Invalid input or duplicate username/email"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>, Error> {
    if let Some(username) = &request.username {
        if username.trim().is_empty() {
            return Err(Error::Validation {
                message: "Username cannot be empty".to_string(),
            });
        }
    }
    if let Some(email) = &request.email {
        if !email.contains('@') {
            return Err(Error::Validation {
                message: "Valid email is required".to_string(),
            });
        }
    }

    // Re-hash a supplied secret off the async runtime
    let password_hash = match request.password {
        Some(secret) => {
            let password_config = &state.config.auth.password;
            if secret.len() < password_config.min_length {
                return Err(Error::Validation {
                    message: format!("Password must be at least {} characters", password_config.min_length),
                });
            }
            let hash = tokio::task::spawn_blocking(move || password::hash_string(&secret))
                .await
                .map_err(|e| Error::Internal {
                    operation: format!("spawn password hashing task: {e}"),
                })??;
            Some(hash)
        }
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let updated = user_repo
        .update(
            user.id,
            &UserUpdateDBRequest {
                username: request.username,
                email: request.email,
                password_hash,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "User".to_string(),
            },
            other => Error::Database(other),
        })?;

    Ok(Json(updated.into()))
}

/// Delete the authenticated identity.
///
/// Owned courses and enrollment memberships are removed with it.
#[utoipa::path(
    delete,
    path = "/users/delete",
    tag = "users",
    responses(
        (status = 200, description = "Identity deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Identity no longer exists"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_user(State(state): State<AppState>, user: AuthUser) -> Result<Json<MessageResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let deleted = user_repo.delete(user.id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "User".to_string(),
        });
    }

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
