//! # campusd: Course Marketplace Control Plane
//!
//! `campusd` is the server side of a course marketplace connecting
//! instructors and students. It provides a RESTful API for identity
//! registration and login, role-gated course management, enrollment, and a
//! course-recommendation passthrough to an OpenAI-compatible upstream.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses SQLite (via sqlx) for persistence.
//!
//! ### Request Flow
//!
//! Registration and login are the only unauthenticated endpoints. They
//! validate input, store secrets irreversibly ([`auth::password`]) and mint a
//! signed, time-bounded session token ([`auth::session`]). Every other route
//! sits behind the access gate ([`auth::middleware`]): a verify stage that
//! derives `{id, role}` solely from the token claims, followed by a per-route
//! role stage. Handlers then enforce ownership against the claims-derived id
//! and interact with the store through repository interfaces ([`db`]).
//! Sessions are stateless - the server keeps no per-session state, so
//! horizontally scaled instances need nothing beyond the shared store.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes identity self-service under
//! `/users/*`, course management and enrollment under `/course/*`, and the
//! recommendation passthrough under `/gpt/*`. Interactive OpenAPI
//! documentation is served at `/api-docs`.
//!
//! The **database layer** ([`db`]) uses the repository pattern. The
//! enrollment-uniqueness invariant is enforced by the store itself: a
//! `UNIQUE (course_id, student_id)` constraint plus an atomic conditional
//! insert, never an application-level check-then-write.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use campusd::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = campusd::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     campusd::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::openapi::ApiDoc;
use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
pub use config::Config;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use types::{CourseId, UserId};

/// Application state shared across all request handlers.
///
/// - `db`: SQLite connection pool for the entity store
/// - `config`: application configuration, injected at startup (the token
///   signing secret lives here, never in ambient globals)
/// - `http`: outbound HTTP client for the recommendation passthrough
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// Get the campusd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.auth.cors;

    let layer = if cors.allowed_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &cors.allowed_origins {
            origins.push(origin.parse::<HeaderValue>()?);
        }
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    };

    Ok(layer)
}

/// Build the main application router with all endpoints and middleware.
///
/// Protected route groups are layered inside-out: the per-route role stage
/// first, then the verify stage, so that at request time verification always
/// runs before any role check.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Credential issuance (the only unauthenticated routes) and identity
    // self-service.
    let public_user_routes = Router::new()
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login));

    let protected_user_routes = Router::new()
        .route("/getUser", get(api::handlers::users::get_user))
        .route("/update", put(api::handlers::users::update_user))
        .route("/delete", delete(api::handlers::users::delete_user))
        .route_layer(from_fn_with_state(state.clone(), auth::middleware::authenticate));

    let user_routes = public_user_routes.merge(protected_user_routes).with_state(state.clone());

    // Course routes: instructor-only and student-only groups get their role
    // stage before the shared verify stage wraps the lot.
    let instructor_routes = Router::new()
        .route("/createCourse", post(api::handlers::courses::create_course))
        .route("/getmycourses", get(api::handlers::courses::my_courses))
        .route(
            "/{id}",
            put(api::handlers::courses::update_course).delete(api::handlers::courses::delete_course),
        )
        .route_layer(from_fn(auth::middleware::require_instructor));

    let student_routes = Router::new()
        .route("/{id}/enroll", post(api::handlers::courses::enroll))
        .route("/enrolled", get(api::handlers::courses::enrolled_courses))
        .route_layer(from_fn(auth::middleware::require_student));

    let course_routes = Router::new()
        .merge(instructor_routes)
        .merge(student_routes)
        .route("/getAllCourese", get(api::handlers::courses::all_courses))
        .route_layer(from_fn_with_state(state.clone(), auth::middleware::authenticate))
        .with_state(state.clone());

    let gpt_routes = Router::new()
        .route("/recommend", post(api::handlers::recommend::recommend_courses))
        .route_layer(from_fn(auth::middleware::require_student))
        .route_layer(from_fn_with_state(state.clone(), auth::middleware::authenticate))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/users", user_routes)
        .nest("/course", course_routes)
        .nest("/gpt", gpt_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/api-docs"));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the store, runs
///    migrations, and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database.url).await?;
        migrator().run(&pool).await?;

        let state = AppState::new(pool.clone(), config.clone());
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "campusd listening on http://{}, docs at http://localhost:{}/api-docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::{create_course, create_test_app, register_user};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_healthz(pool: SqlitePool) {
        let server = create_test_app(pool);

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[sqlx::test]
    async fn test_openapi_document_is_served(pool: SqlitePool) {
        let server = create_test_app(pool);

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/users/register"].is_object());
    }

    /// End-to-end walk through the credential and enrollment lifecycle.
    #[sqlx::test]
    async fn test_auth_and_enrollment_scenario(pool: SqlitePool) {
        let server = create_test_app(pool);

        // register("alice", ...) -> 201 with token A
        let registered = server
            .post("/users/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@x.com",
                "password": "secret1",
                "role": "student"
            }))
            .await;
        registered.assert_status(StatusCode::CREATED);

        // login("alice", "wrongpw") -> 400 "Invalid credentials"
        let bad_login = server
            .post("/users/login")
            .json(&json!({ "username": "alice", "password": "wrongpw" }))
            .await;
        bad_login.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(bad_login.json::<serde_json::Value>()["message"], "Invalid credentials");

        // login("alice", "secret1") -> 200 token B
        let login = server
            .post("/users/login")
            .json(&json!({ "username": "alice", "password": "secret1" }))
            .await;
        login.assert_status_ok();
        let token = login.json::<serde_json::Value>()["token"].as_str().unwrap().to_string();

        // An instructor puts up a course
        let (_instructor, instructor_token) = register_user(&server, "teach", crate::api::models::users::Role::Instructor).await;
        let course = create_course(&server, &instructor_token, "Rust 101").await;

        // enroll(courseX, as alice) -> 200 "Enrollment successful"
        let enrolled = server
            .post(&format!("/course/{}/enroll", course.id))
            .add_header("authorization", format!("Bearer {token}"))
            .await;
        enrolled.assert_status_ok();
        assert_eq!(enrolled.json::<serde_json::Value>()["message"], "Enrollment successful");

        // enroll(courseX, as alice) again -> 400 "Already enrolled"
        let again = server
            .post(&format!("/course/{}/enroll", course.id))
            .add_header("authorization", format!("Bearer {token}"))
            .await;
        again.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(again.json::<serde_json::Value>()["message"], "Already enrolled");
    }
}
