//! OpenAPI documentation configuration.
//!
//! Aggregates every handler's annotations into one document, served
//! interactively at `/api-docs`.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Bearer-token security scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token issued by registration or login. Include it in the \
                             `Authorization` header:\n\n```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::courses::create_course,
        api::handlers::courses::all_courses,
        api::handlers::courses::my_courses,
        api::handlers::courses::enroll,
        api::handlers::courses::enrolled_courses,
        api::handlers::courses::update_course,
        api::handlers::courses::delete_course,
        api::handlers::recommend::recommend_courses,
    ),
    components(schemas(
        api::models::auth::RegisterRequest,
        api::models::auth::LoginRequest,
        api::models::auth::AuthResponse,
        api::models::users::Role,
        api::models::users::UserResponse,
        api::models::users::UserUpdateRequest,
        api::models::courses::CourseCreateRequest,
        api::models::courses::CourseUpdateRequest,
        api::models::courses::CourseResponse,
        api::models::recommend::RecommendRequest,
        api::models::recommend::RecommendResponse,
        api::models::MessageResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Identity registration, login and self-service"),
        (name = "courses", description = "Course management and enrollment"),
        (name = "recommendations", description = "Course-recommendation passthrough"),
    )
)]
pub struct ApiDoc;
