//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/users/register`, `/users/login`): credential issuance
//! - **Users** (`/users/*`): self-service profile operations
//! - **Courses** (`/course/*`): course management and enrollment
//! - **Recommendations** (`/gpt/*`): course-recommendation passthrough
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`;
//! interactive documentation is served at `/api-docs`.

pub mod handlers;
pub mod models;
