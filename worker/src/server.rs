use crate::config::StewardConfig;
use crate::envelope::{self, ApiEnvelope};
use crate::errors::StewardError;
use crate::github::GithubClient;
use crate::linker::{BranchAndBodyLinker, ChangeSetLinker};
use crate::preview::{HttpProber, PreviewProber};
use crate::requests;
use crate::status;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub github: GithubClient,
    pub linker: Arc<dyn ChangeSetLinker>,
    pub prober: Arc<dyn PreviewProber>,
    pub config: Arc<StewardConfig>,
}

impl AppState {
    pub fn new(config: StewardConfig) -> Self {
        let github = GithubClient::new(&config);
        let prober: Arc<dyn PreviewProber> = Arc::new(HttpProber::new(&config.preview_domain));
        Self {
            github,
            linker: Arc::new(BranchAndBodyLinker),
            prober,
            config: Arc::new(config),
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn PreviewProber>) -> Self {
        self.prober = prober;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let cors_state = state.clone();
    Router::new()
        .route("/api/ai-mod/request", post(create_request))
        .route("/api/ai-mod/list", get(list_requests))
        .route("/api/ai-mod/status", get(request_status))
        .route("/api/ai-mod/approve", post(approve_request))
        .route("/api/ai-mod/reject", post(reject_request))
        .route("/api/ai-mod/revise", post(revise_request))
        .route("/api/ai-mod/revert", post(revert_request))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(cors_state, cors_layer))
        .with_state(state)
}

pub async fn serve(
    state: AppState,
    listener: tokio::net::TcpListener,
) -> Result<(), StewardError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StewardError::Io(e.to_string()))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("signal received, shutting down");
}

// The allow-origin header echoes the admin origin only on an exact match;
// any other origin gets an empty value, which browsers reject.
async fn cors_layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    let allowed = if origin == state.config.admin_origin {
        origin
    } else {
        String::new()
    };

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&allowed) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullBody {
    #[serde(default)]
    pr_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviseBody {
    #[serde(default)]
    issue_number: Option<u64>,
    #[serde(default)]
    pr_number: Option<u64>,
    #[serde(default)]
    original_description: Option<String>,
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevertBody {
    #[serde(default)]
    pr_number: Option<u64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    issue: Option<String>,
}

fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiEnvelope::ok(data))).into_response()
}

fn refusal(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(envelope::failure(message, None))).into_response()
}

fn upstream_failure(context: &str, details: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(envelope::failure(context, Some(details))),
    )
        .into_response()
}

fn operation_response<T: Serialize>(
    context: &str,
    ok_status: StatusCode,
    result: Result<T, StewardError>,
) -> Response {
    match result {
        Ok(data) => success(ok_status, data),
        Err(StewardError::Validation(message)) => refusal(&message),
        Err(error) => upstream_failure(context, error.to_string()),
    }
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err((
            StatusCode::BAD_REQUEST,
            Json(envelope::failure(
                "Invalid JSON body",
                Some(rejection.to_string()),
            )),
        )
            .into_response()),
    }
}

async fn create_request(
    State(state): State<AppState>,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let result = requests::create_request(
        &state.github,
        state.config.as_ref(),
        body.description.as_deref().unwrap_or_default(),
    )
    .await;
    operation_response(
        "Failed to create AI modification request",
        StatusCode::CREATED,
        result,
    )
}

async fn list_requests(State(state): State<AppState>) -> Response {
    let result = status::list_requests(
        &state.github,
        state.linker.as_ref(),
        state.prober.as_ref(),
        state.config.as_ref(),
    )
    .await;
    operation_response("Failed to list requests", StatusCode::OK, result)
}

async fn request_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Response {
    let Some(raw) = params.issue else {
        return refusal("Issue number is required");
    };
    let Ok(issue_number) = raw.parse::<u64>() else {
        return refusal("Issue number must be an integer");
    };
    let result = status::narrow_status(
        &state.github,
        state.linker.as_ref(),
        state.config.as_ref(),
        issue_number,
    )
    .await;
    operation_response("Failed to get status", StatusCode::OK, result)
}

async fn approve_request(
    State(state): State<AppState>,
    body: Result<Json<PullBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let result = requests::approve(&state.github, body.pr_number).await;
    operation_response("Failed to merge PR", StatusCode::OK, result)
}

async fn reject_request(
    State(state): State<AppState>,
    body: Result<Json<PullBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let result = requests::reject(&state.github, body.pr_number).await;
    operation_response("Failed to reject changes", StatusCode::OK, result)
}

async fn revise_request(
    State(state): State<AppState>,
    body: Result<Json<ReviseBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let result = requests::revise(
        &state.github,
        state.config.as_ref(),
        body.issue_number,
        body.pr_number,
        body.original_description.as_deref().unwrap_or_default(),
        body.feedback.as_deref().unwrap_or_default(),
    )
    .await;
    match result {
        Ok(data) => success(StatusCode::CREATED, data),
        Err(error) => match &error.source {
            StewardError::Validation(message) => refusal(message),
            source => upstream_failure(
                "Failed to create revision",
                format!("completed steps: [{}]; {source}", error.completed.join(", ")),
            ),
        },
    }
}

async fn revert_request(
    State(state): State<AppState>,
    body: Result<Json<RevertBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let result = requests::revert(
        &state.github,
        state.config.as_ref(),
        body.pr_number,
        body.description.as_deref().unwrap_or_default(),
    )
    .await;
    operation_response("Failed to create revert request", StatusCode::CREATED, result)
}

async fn health() -> Response {
    success(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(envelope::failure("Not found", None)),
    )
        .into_response()
}
