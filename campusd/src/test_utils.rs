//! Test utilities shared by the in-module test suites.

use crate::api::models::auth::AuthResponse;
use crate::api::models::courses::CourseResponse;
use crate::api::models::users::{Role, UserResponse};
use crate::config::Config;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use sqlx::SqlitePool;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    }
}

pub fn create_test_app(pool: SqlitePool) -> TestServer {
    create_test_app_with_config(pool, create_test_config())
}

pub fn create_test_app_with_config(pool: SqlitePool, config: Config) -> TestServer {
    let state = crate::AppState::new(pool, config);
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Register an identity through the API and return its projection and token.
pub async fn register_user(server: &TestServer, username: &str, role: Role) -> (UserResponse, String) {
    let response = server
        .post("/users/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret1",
            "role": role,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: AuthResponse = response.json();
    (body.user, body.token)
}

/// Create a course through the API as the given instructor.
pub async fn create_course(server: &TestServer, token: &str, title: &str) -> CourseResponse {
    let response = server
        .post("/course/createCourse")
        .add_header("authorization", format!("Bearer {token}"))
        .json(&json!({
            "title": title,
            "description": "A course",
            "content": "Lesson one",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}
