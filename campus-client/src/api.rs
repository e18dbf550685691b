//! Typed HTTP client over the server's route table.
//!
//! Every method maps to exactly one endpoint. Non-success responses are
//! decoded into the server's `{"message": ...}` envelope and returned as
//! [`ClientError::Api`]; nothing is retried.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::models::{AuthResponse, Course, CourseDraft, CourseUpdate, Identity, Message, ProfileUpdate, Recommendation, Role};

#[derive(Debug, Deserialize)]
struct ServerMessage {
    message: String,
}

/// HTTP client for the course marketplace API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:4000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Prefer the server's message field; fall back to the status line
        let message = match response.json::<ServerMessage>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn register(&self, username: &str, email: &str, secret: &str, role: Role) -> Result<AuthResponse> {
        let response = self
            .http
            .post(self.url("/users/register"))
            .json(&json!({
                "username": username,
                "email": email,
                "password": secret,
                "role": role,
            }))
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn login(&self, username: &str, secret: &str) -> Result<AuthResponse> {
        let response = self
            .http
            .post(self.url("/users/login"))
            .json(&json!({ "username": username, "password": secret }))
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn get_user(&self, token: &str) -> Result<Identity> {
        let response = self.http.get(self.url("/users/getUser")).bearer_auth(token).send().await?;
        Self::handle(response).await
    }

    pub async fn update_user(&self, token: &str, update: &ProfileUpdate) -> Result<Identity> {
        let response = self
            .http
            .put(self.url("/users/update"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn delete_user(&self, token: &str) -> Result<Message> {
        let response = self.http.delete(self.url("/users/delete")).bearer_auth(token).send().await?;
        Self::handle(response).await
    }

    pub async fn create_course(&self, token: &str, draft: &CourseDraft) -> Result<Course> {
        let response = self
            .http
            .post(self.url("/course/createCourse"))
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn all_courses(&self, token: &str) -> Result<Vec<Course>> {
        let response = self.http.get(self.url("/course/getAllCourese")).bearer_auth(token).send().await?;
        Self::handle(response).await
    }

    pub async fn my_courses(&self, token: &str) -> Result<Vec<Course>> {
        let response = self.http.get(self.url("/course/getmycourses")).bearer_auth(token).send().await?;
        Self::handle(response).await
    }

    pub async fn enroll(&self, token: &str, course_id: Uuid) -> Result<Message> {
        let response = self
            .http
            .post(self.url(&format!("/course/{course_id}/enroll")))
            .bearer_auth(token)
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn enrolled_courses(&self, token: &str) -> Result<Vec<Course>> {
        let response = self.http.get(self.url("/course/enrolled")).bearer_auth(token).send().await?;
        Self::handle(response).await
    }

    pub async fn update_course(&self, token: &str, course_id: Uuid, update: &CourseUpdate) -> Result<Course> {
        let response = self
            .http
            .put(self.url(&format!("/course/{course_id}")))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn delete_course(&self, token: &str, course_id: Uuid) -> Result<Message> {
        let response = self
            .http
            .delete(self.url(&format!("/course/{course_id}")))
            .bearer_auth(token)
            .send()
            .await?;

        Self::handle(response).await
    }

    pub async fn recommend(&self, token: &str, prompt: &str) -> Result<Recommendation> {
        let response = self
            .http
            .post(self.url("/gpt/recommend"))
            .bearer_auth(token)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;

        Self::handle(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity_json(username: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "username": username,
            "email": format!("{username}@example.com"),
            "role": "student"
        })
    }

    #[tokio::test]
    async fn test_login_decodes_auth_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .and(body_json(json!({ "username": "alice", "password": "secret1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": identity_json("alice"),
                "token": "token-a",
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let auth = client.login("alice", "secret1").await.unwrap();

        assert_eq!(auth.user.username, "alice");
        assert_eq!(auth.token, "token-a");
    }

    #[tokio::test]
    async fn test_error_carries_server_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid credentials" })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let error = client.login("alice", "wrongpw").await.unwrap_err();

        match error {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_without_message_body_falls_back_to_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/course/getAllCourese"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let error = client.all_courses("token").await.unwrap_err();

        assert_eq!(error.status(), Some(500));
    }

    #[tokio::test]
    async fn test_course_calls_use_bearer_token() {
        let server = MockServer::start().await;
        let course_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path(format!("/course/{course_id}/enroll")))
            .and(header("authorization", "Bearer token-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Enrollment successful" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(format!("{}/", server.uri()));
        let message = client.enroll("token-a", course_id).await.unwrap();
        assert_eq!(message.message, "Enrollment successful");
    }
}
