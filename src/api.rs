//! REST endpoints for submitting and inspecting jobs.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::error::{Error, JobError, SubmitError, ValidationError};
use crate::jobs::{CreateJobRequest, JobFilter};
use crate::service::JobService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: JobService,
}

/// Build the Axum router with job and health routes.
pub fn job_routes(service: JobService) -> Router {
    let state = AppState { service };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/{uid}", get(get_job))
        .layer(cors)
        .with_state(state)
}

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Job(JobError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Error::Submit(
                SubmitError::QueueFull { .. } | SubmitError::ShutDown | SubmitError::Cancelled,
            ) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(%status, error = %self.0, "Request failed");
        (
            status,
            Json(serde_json::json!({ "error": inner_message(&self.0) })),
        )
            .into_response()
    }
}

/// Message without the top-level category prefix.
fn inner_message(err: &Error) -> String {
    match err {
        Error::Config(e) => e.to_string(),
        Error::Submit(e) => e.to_string(),
        Error::Job(e) => e.to_string(),
        Error::Validation(e) => e.to_string(),
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.service.summary().await;
    Json(serde_json::json!({
        "status": "ok",
        "jobs": summary,
    }))
}

// ── Jobs ────────────────────────────────────────────────────────────────

/// POST /jobs
async fn create_job(
    State(state): State<AppState>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ValidationError::InvalidPayload {
        kind: "request".to_string(),
        reason: e.body_text(),
    })?;
    let created = state.service.create_from_request(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
}

/// GET /jobs?type=&status=
async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = JobFilter::parse(query.kind.as_deref(), query.status.as_deref())?;
    Ok(Json(state.service.list_jobs(&filter).await))
}

/// GET /jobs/{uid}
async fn get_job(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.find_job(&uid).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::config::PoolConfig;
    use crate::pool::WorkerPool;

    fn app() -> Router {
        let pool = WorkerPool::new(PoolConfig::new(0, 1).unwrap(), &CancellationToken::new())
            .unwrap();
        job_routes(JobService::new(Arc::new(pool), CancellationToken::new()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post_job(body: &str) -> Request<Body> {
        Request::post("/jobs")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_ok() {
        let (status, json) = send(app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["jobs"]["total"], 0);
    }

    #[tokio::test]
    async fn create_valid_job() {
        let (status, json) = send(
            app(),
            post_job(r#"{"type": "math", "payload": {"number": 4}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["type"], "math");
        assert_eq!(json["status"], "pending");
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        for body in [
            "not json",
            r#"{"type": "video", "payload": {}}"#,
            r#"{"type": "sleep", "payload": {"duration": ""}}"#,
        ] {
            let (status, json) = send(app(), post_job(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn queue_full_is_unavailable() {
        let app = app();
        let body = r#"{"type": "math", "payload": {"number": 1}}"#;
        let (status, _) = send(app.clone(), post_job(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = send(app, post_job(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["error"].as_str().unwrap().contains("job queue is full"));
    }

    #[tokio::test]
    async fn list_rejects_invalid_filter() {
        let (status, _) = send(
            app(),
            Request::get("/jobs?status=bogus").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(),
            Request::get("/jobs?type=video").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_job_errors() {
        let (status, _) = send(
            app(),
            Request::get("/jobs/not-a-uuid").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = format!("/jobs/{}", uuid::Uuid::new_v4());
        let (status, json) = send(app(), Request::get(missing).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("job not found"));
    }
}
