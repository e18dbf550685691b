//! Course-recommendation passthrough.
//!
//! Forwards a student's free-text request, together with the catalogue of
//! course titles, to a configured OpenAI-compatible chat-completions API and
//! returns the generated text verbatim. The upstream service is an external
//! collaborator; nothing is persisted.

use axum::{extract::State, Json};
use serde_json::json;

use crate::{
    api::models::recommend::{RecommendRequest, RecommendResponse},
    db::handlers::Courses,
    errors::Error,
    AppState,
};

/// Recommend courses for the calling student
#[utoipa::path(
    post,
    path = "/gpt/recommend",
    request_body = RecommendRequest,
    tag = "recommendations",
    responses(
        (status = 200, description = "Generated recommendation", body = RecommendResponse),
        (status = 400, description = "Missing prompt or recommendations not configured"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a student"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn recommend_courses(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, Error> {
    if request.prompt.trim().is_empty() {
        return Err(Error::Validation {
            message: "Prompt is required".to_string(),
        });
    }

    let config = &state.config.recommendations;
    let api_key = config.api_key.as_ref().ok_or_else(|| Error::Validation {
        message: "Course recommendations are not configured".to_string(),
    })?;

    let titles = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut course_repo = Courses::new(&mut conn);
        let courses = course_repo.list_all().await?;
        courses.into_iter().map(|c| c.title).collect::<Vec<_>>().join(", ")
    };

    let prompt = format!(
        "Based on: \"{}\", recommend relevant courses from: {}. Provide a short explanation for each.",
        request.prompt, titles
    );

    let url = format!("{}/chat/completions", config.api_base.as_str().trim_end_matches('/'));
    let response = state
        .http
        .post(&url)
        .bearer_auth(api_key)
        .json(&json!({
            "model": config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": config.max_tokens,
        }))
        .send()
        .await
        .map_err(|e| Error::Internal {
            operation: format!("reach recommendation upstream: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(Error::Internal {
            operation: format!("recommendation upstream returned {}", response.status()),
        });
    }

    let completion: serde_json::Value = response.json().await.map_err(|e| Error::Internal {
        operation: format!("decode recommendation upstream response: {e}"),
    })?;

    let recommendation = completion["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| Error::Internal {
            operation: "parse recommendation upstream response".to_string(),
        })?
        .to_string();

    Ok(Json(RecommendResponse { recommendation }))
}
