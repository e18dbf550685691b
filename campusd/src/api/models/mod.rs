//! API request/response models, one module per resource.

pub mod auth;
pub mod courses;
pub mod recommend;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain confirmation message returned by mutations that have no richer body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
