//! Wire models mirroring the server's API surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
}

/// Identity projection cached on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Registration or login result: identity plus a fresh session token
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: Identity,
    pub token: String,
}

/// Partial profile update. `None` fields are omitted from the request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New secret; sent as the `password` field
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.secret.is_none()
    }
}

/// A course as served by the marketplace
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    /// Identity id of the owning instructor
    pub instructor: Uuid,
    /// Identity ids of enrolled students
    pub students: Vec<Uuid>,
}

/// Draft for creating a course
#[derive(Debug, Clone, Serialize)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Partial course update
#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Plain confirmation message
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Generated course recommendation
#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
}
