//! Credential issuance: registration and login.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        users::UserResponse,
    },
    auth::{password, session},
    db::{handlers::Users, models::users::UserCreateDBRequest},
    errors::Error,
    AppState,
};
use crate::db::handlers::Repository as _;

fn validate_secret(secret: &str, config: &crate::config::Config) -> Result<(), Error> {
    let password_config = &config.auth.password;
    if secret.len() < password_config.min_length {
        return Err(Error::Validation {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if secret.len() > password_config.max_length {
        return Err(Error::Validation {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }
    Ok(())
}

/// Register a new identity
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    tag = "users",
    responses(
        (status = 201, description = "Identity registered", body = AuthResponse),
        (status = 400, description = "Invalid input or user already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    if request.username.trim().is_empty() {
        return Err(Error::Validation {
            message: "Username is required".to_string(),
        });
    }
    if !request.email.contains('@') {
        return Err(Error::Validation {
            message: "Valid email is required".to_string(),
        });
    }
    validate_secret(&request.password, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Single existence check across both unique fields. The UNIQUE
    // constraints in the store remain the backstop under concurrent
    // registration.
    if user_repo
        .find_by_username_or_email(&request.username, &request.email)
        .await?
        .is_some()
    {
        return Err(Error::Conflict {
            message: "User already exists".to_string(),
        });
    }

    // Hash the secret on a blocking thread to avoid blocking the async runtime
    let secret = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&secret))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let created = user_repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            role: request.role,
        })
        .await?;

    let token = session::mint_session_token(created.id, created.role, &state.config)?;
    let user = UserResponse::from(created);

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Log in with username and secret
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    tag = "users",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>, Error> {
    if request.username.trim().is_empty() {
        return Err(Error::Validation {
            message: "Username is required".to_string(),
        });
    }
    if request.password.is_empty() {
        return Err(Error::Validation {
            message: "Password is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // An unknown username and a wrong secret produce the identical error:
    // the response must carry no enumeration signal.
    let user = user_repo
        .find_by_username(&request.username)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    // Verify the secret on a blocking thread to avoid blocking the async runtime
    let secret = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&secret, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = session::mint_session_token(user.id, user.role, &state.config)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::models::{auth::AuthResponse, users::Role};
    use crate::auth::session;
    use crate::test_utils::{create_test_app, create_test_config};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_register_success(pool: SqlitePool) {
        let server = create_test_app(pool);

        let response = server
            .post("/users/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@x.com",
                "password": "secret1",
                "role": "student"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: AuthResponse = response.json();
        assert_eq!(body.user.username, "alice");
        assert_eq!(body.user.email, "alice@x.com");
        assert_eq!(body.user.role, Role::Student);

        // The minted token carries the registered id and role
        let claims = session::verify_session_token(&body.token, &create_test_config()).unwrap();
        assert_eq!(claims.id, body.user.id);
        assert_eq!(claims.role, Role::Student);
    }

    #[sqlx::test]
    async fn test_register_duplicate_username_or_email_conflicts(pool: SqlitePool) {
        let server = create_test_app(pool);

        server
            .post("/users/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@x.com",
                "password": "secret1",
                "role": "student"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        // Same username, different email
        let response = server
            .post("/users/register")
            .json(&json!({
                "username": "alice",
                "email": "other@x.com",
                "password": "secret1",
                "role": "student"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>()["message"], "User already exists");

        // Different username, same email
        let response = server
            .post("/users/register")
            .json(&json!({
                "username": "alice2",
                "email": "alice@x.com",
                "password": "secret1",
                "role": "instructor"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>()["message"], "User already exists");
    }

    #[sqlx::test]
    async fn test_register_validation(pool: SqlitePool) {
        let server = create_test_app(pool);

        let cases = [
            json!({ "username": "", "email": "a@x.com", "password": "secret1", "role": "student" }),
            json!({ "username": "bob", "email": "not-an-email", "password": "secret1", "role": "student" }),
            json!({ "username": "bob", "email": "bob@x.com", "password": "short", "role": "student" }),
        ];

        for case in cases {
            let response = server.post("/users/register").json(&case).await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[sqlx::test]
    async fn test_login_error_carries_no_enumeration_signal(pool: SqlitePool) {
        let server = create_test_app(pool);

        server
            .post("/users/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@x.com",
                "password": "secret1",
                "role": "student"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        // Unknown user and wrong secret return the identical status and body
        let unknown_user = server
            .post("/users/login")
            .json(&json!({ "username": "nobody", "password": "secret1" }))
            .await;
        let wrong_secret = server
            .post("/users/login")
            .json(&json!({ "username": "alice", "password": "wrongpw" }))
            .await;

        assert_eq!(unknown_user.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unknown_user.status_code(), wrong_secret.status_code());
        assert_eq!(unknown_user.text(), wrong_secret.text());
        assert_eq!(wrong_secret.json::<serde_json::Value>()["message"], "Invalid credentials");
    }

    #[sqlx::test]
    async fn test_register_then_login_round_trip(pool: SqlitePool) {
        let server = create_test_app(pool);

        let registered: AuthResponse = server
            .post("/users/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@x.com",
                "password": "secret1",
                "role": "student"
            }))
            .await
            .json();

        let response = server
            .post("/users/login")
            .json(&json!({ "username": "alice", "password": "secret1" }))
            .await;
        response.assert_status_ok();

        let body: AuthResponse = response.json();
        assert_eq!(body.user.id, registered.user.id);

        // Decoded claims match the registered identity
        let claims = session::verify_session_token(&body.token, &create_test_config()).unwrap();
        assert_eq!(claims.id, registered.user.id);
        assert_eq!(claims.role, Role::Student);
    }
}
