//! Task list and task creation endpoints.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;

use crate::form::{FieldEdit, FormError, TaskForm};
use crate::query::{parse_date, SearchQuery};
use crate::search::{SearchOutcome, SearchSession};
use crate::task::Priority;

use super::routes::AppState;
use super::types::{CreateTaskRequest, CreateTaskResponse, ErrorResponse, TaskListResponse};

/// Header naming the client session whose lookups supersede each other.
pub const SESSION_HEADER: &str = "x-session-id";

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_tasks).post(create_task))
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::message(message)))
}

/// Search, filter and paginate the task list.
///
/// Requests carrying the same `x-session-id` are ordered: when a newer one is
/// issued before an older one finishes, the older one answers 409.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Json<TaskListResponse>, ApiError> {
    let query = SearchQuery::from_query_str(raw.as_deref().unwrap_or_default());

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let session = match session_id {
        Some(id) => state.searches.session(id).await,
        None => Arc::new(SearchSession::new(
            Arc::clone(&state.provider),
            state.config.page_size,
            state.config.search_delay,
        )),
    };

    match session.search(query).await {
        SearchOutcome::Fresh(result) => Ok(Json(TaskListResponse::new(
            &result.query,
            result.page,
            result.stamp,
        ))),
        SearchOutcome::Superseded { stamp, latest } => Err(error(
            StatusCode::CONFLICT,
            format!("Search {} superseded by {}", stamp, latest),
        )),
    }
}

/// Empty or blank means unset; anything else must be an ISO date.
fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => parse_date(value).map(Some).ok_or_else(|| {
            error(
                StatusCode::BAD_REQUEST,
                format!("Invalid {}: {:?} (expected YYYY-MM-DD)", field, value),
            )
        }),
    }
}

fn parse_optional_priority(raw: Option<&str>) -> Result<Option<Priority>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| error(StatusCode::BAD_REQUEST, format!("{}", e))),
    }
}

fn form_failure(err: FormError, form: &TaskForm) -> ApiError {
    match err {
        FormError::Invalid(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "Validation failed".to_string(),
                errors: Some(errors),
            }),
        ),
        FormError::Create(e) if e.is_recoverable() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
                errors: Some(form.errors().clone()),
            }),
        ),
        FormError::Create(e) => error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        FormError::Busy => error(StatusCode::CONFLICT, FormError::Busy.to_string()),
        FormError::NotSubmitting => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            FormError::NotSubmitting.to_string(),
        ),
    }
}

/// Validate and create a task.
async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let start_date = parse_optional_date("start_date", req.start_date.as_deref())?;
    let end_date = parse_optional_date("end_date", req.end_date.as_deref())?;
    let priority = parse_optional_priority(req.priority.as_deref())?;

    let mut form = TaskForm::new();
    let edits = [
        FieldEdit::Name(req.name),
        FieldEdit::StartDate(start_date),
        FieldEdit::EndDate(end_date),
        FieldEdit::Priority(priority),
    ];
    for edit in edits {
        if let Err(e) = form.apply_edit(edit) {
            return Err(form_failure(e, &form));
        }
    }

    match form.submit_with(state.creator.as_ref()).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(CreateTaskResponse {
                task: created.task,
                notification: created.notification,
            }),
        )),
        Err(e) => Err(form_failure(e, &form)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::create::{CreateError, TaskCreator};
    use crate::task::{InMemoryTaskProvider, NewTask, Task, TaskProvider};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let provider: Arc<dyn TaskProvider> = Arc::new(InMemoryTaskProvider::seeded().unwrap());
        super::super::routes::router(Arc::new(AppState::new(Config::for_tests(), provider)))
    }

    struct RefusingCreator(CreateError);

    #[async_trait]
    impl TaskCreator for RefusingCreator {
        async fn create(&self, _task: NewTask) -> Result<Task, CreateError> {
            Err(self.0.clone())
        }
    }

    fn app_with_creator(creator: impl TaskCreator + 'static) -> Router {
        let provider: Arc<dyn TaskProvider> = Arc::new(InMemoryTaskProvider::seeded().unwrap());
        let mut state = AppState::new(Config::for_tests(), provider);
        state.creator = Arc::new(creator);
        super::super::routes::router(Arc::new(state))
    }

    fn slow_app() -> Router {
        let provider: Arc<dyn TaskProvider> = Arc::new(InMemoryTaskProvider::seeded().unwrap());
        let config = Config {
            search_delay: std::time::Duration::from_millis(1500),
            ..Config::for_tests()
        };
        super::super::routes::router(Arc::new(AppState::new(config, provider)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        get_json_as(app, uri, None).await
    }

    async fn get_json_as(app: Router, uri: &str, session: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::get(uri);
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/api/tasks")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_first_page_by_default() {
        let (status, body) = get_json(app(), "/api/tasks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["total_pages"], 3);
        assert_eq!(body["total_count"], 30);
        assert_eq!(body["range_text"], "1 - 10 of 30");
        assert_eq!(body["tasks"].as_array().unwrap().len(), 10);
        assert_eq!(body["next_query"], "page=2");
        assert!(body.get("previous_query").is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_criteria_in_page_links() {
        let (status, body) = get_json(app(), "/api/tasks?priority=high").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 8);
        assert_eq!(body["show_page_controls"], false);
        for row in body["tasks"].as_array().unwrap() {
            assert_eq!(row["priority"], "high");
            assert_eq!(row["badge"]["label"], "HIGH");
            assert_eq!(row["badge"]["color"], "red");
        }
        assert_eq!(body["query"], "priority=high");
    }

    #[tokio::test]
    async fn test_list_rows_show_dash_for_missing_dates() {
        let (_, body) = get_json(app(), "/api/tasks?name=unit+tests").await;
        let rows = body["tasks"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["start_date"], "2025-05-30");
        assert_eq!(rows[0]["end_date"], "—");
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_newer_request_in_same_session_wins() {
        let app = slow_app();

        let first = tokio::spawn({
            let app = app.clone();
            async move { get_json_as(app, "/api/tasks?priority=low", Some("tab-1")).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let second = tokio::spawn({
            let app = app.clone();
            async move { get_json_as(app, "/api/tasks?priority=high", Some("tab-1")).await }
        });

        let (status, body) = first.await.unwrap();
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("superseded"));

        let (status, body) = second.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "priority=high");
        assert_eq!(body["stamp"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_requests_in_different_or_no_session_never_conflict() {
        let app = slow_app();

        let mut handles = Vec::new();
        for session in [None, None, Some("tab-1"), Some("tab-2")] {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                get_json_as(app, "/api/tasks?priority=normal", session).await
            }));
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["stamp"], 1);
        }
    }

    #[tokio::test]
    async fn test_list_no_results_is_ok() {
        let (status, body) = get_json(app(), "/api/tasks?name=zzzz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["no_results"], true);
        assert_eq!(body["show_pagination"], false);
        assert_eq!(body["total_pages"], 1);
    }

    #[tokio::test]
    async fn test_list_page_past_the_end_links_back_to_last_page() {
        let (status, body) = get_json(app(), "/api/tasks?name=code&page=7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 7);
        assert_eq!(body["total_pages"], 1);
        assert_eq!(body["no_results"], true);
        assert_eq!(body["previous_query"], "name=code&page=1");
        assert!(body.get("next_query").is_none());

        let (_, body) = get_json(app(), "/api/tasks?page=2").await;
        assert_eq!(body["previous_query"], "page=1");
    }

    #[tokio::test]
    async fn test_list_ignores_malformed_params() {
        let (status, body) = get_json(
            app(),
            "/api/tasks?priority=urgent&page=abc&start_date=tomorrow",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 30);
        assert_eq!(body["page"], 1);
        assert_eq!(body["query"], "");
    }

    #[tokio::test]
    async fn test_create_returns_task_and_notification() {
        let (status, body) = post_json(
            app(),
            json!({
                "name": "  Ship it  ",
                "start_date": "2025-08-01",
                "end_date": "2025-08-01",
                "priority": "high"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["task"]["id"], 31);
        assert_eq!(body["task"]["name"], "Ship it");
        assert_eq!(body["notification"]["title"], "Task created");
        assert_eq!(
            body["notification"]["description"],
            "Task \"Ship it\" has been created successfully."
        );
    }

    #[tokio::test]
    async fn test_create_reports_every_invalid_field() {
        let (status, body) = post_json(
            app(),
            json!({
                "name": "   ",
                "start_date": "2025-08-10",
                "end_date": "2025-08-01",
                "priority": ""
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"], "Task name is required");
        assert_eq!(body["errors"]["dates"], "End date must be after start date");
        assert_eq!(body["errors"]["priority"], "Priority is required");
    }

    #[tokio::test]
    async fn test_create_rejects_unparseable_input() {
        let (status, _) = post_json(app(), json!({"name": "x", "start_date": "01/08/2025"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(app(), json!({"name": "x", "priority": "urgent"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_maps_creator_failures() {
        let rejected = app_with_creator(RefusingCreator(CreateError::Rejected("duplicate".into())));
        let (status, body) = post_json(rejected, json!({"name": "x", "priority": "low"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["submit"].as_str().unwrap().contains("duplicate"));

        let down = app_with_creator(RefusingCreator(CreateError::Unavailable("offline".into())));
        let (status, body) = post_json(down, json!({"name": "x", "priority": "low"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.get("errors").is_none());
    }
}
