//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! Authentication and role checks happen before any handler runs, in the
//! middleware pipeline assembled by [`crate::build_router`]. Handlers read
//! the verified identity through the [`AuthUser`] extractor.
//!
//! [`AuthUser`]: crate::api::models::users::AuthUser

pub mod auth;
pub mod courses;
pub mod recommend;
pub mod users;
