use axum::extract::{Path, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::{json, Value};

use crate::api::auth::Principal;
use crate::api::request::RequestError;
use crate::api::state::AppState;
use crate::error::RescoreError;
use crate::pedigree::build::build_pedigree;

pub const PIPELINE_ERROR: &str =
    "There was an error when executing the pipeline, please contact administrator";
pub const CONNECTION_ERROR: &str =
    "There was an error with the connection to the remote server, please contact administrator";
pub const GENERIC_ERROR: &str = "There was an unexpected error, please contact administrator";

/// Error response, the message is safe to show to the caller
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"rerunner\""));
        }
        response
    }
}

impl From<RescoreError> for ApiError {
    fn from(err: RescoreError) -> Self {
        match err {
            RescoreError::CaseNotFound(_) | RescoreError::IndividualIdNotFound(_) => Self::not_found(err.to_string()),
            RescoreError::NoSampleIds | RescoreError::Validation(_) => Self::bad_request(err.to_string()),
            RescoreError::PipelineExecution { .. } => {
                error!("PipelineExecutionError - {err}");
                Self::internal(PIPELINE_ERROR)
            }
            RescoreError::MissingCredentials
            | RescoreError::RemoteConnection(_)
            | RescoreError::RemoteTransfer(_) => {
                error!("{err}");
                Self::internal(CONNECTION_ERROR)
            }
            _ => {
                error!("{err}");
                Self::internal(GENERIC_ERROR)
            }
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("Request worker failed: {err}");
        Self::internal(GENERIC_ERROR)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(about))
        .route("/rerun/{case_id}", post(rerun))
        .route("/pedigree/{case_id}", post(pedigree))
        .with_state(state)
}

async fn about() -> String {
    format!("PEDmaker version: {}", env!("CARGO_PKG_VERSION"))
}

/// Start a reanalysis, 204 once the remote pipeline has been launched
async fn rerun(
    State(state): State<AppState>,
    principal: Principal,
    Path(case_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let request = state.schema.read(body)?;
    info!("{} requested a reanalysis of case {case_id}", principal.sub);

    tokio::task::spawn_blocking(move || {
        state.reanalysis().conduct(&case_id, &request.sample_ids, &request.edits)
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}

/// The pedigree a reanalysis would upload, nothing is sent to the workflow host
async fn pedigree(
    State(state): State<AppState>,
    principal: Principal,
    Path(case_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request = state.schema.read(body)?;
    info!("{} requested the pedigree of case {case_id}", principal.sub);

    let family = tokio::task::spawn_blocking(move || {
        build_pedigree(state.cases.as_ref(), &case_id, &request.sample_ids, &request.edits)
    })
    .await??;

    Ok(Json(family.to_json()))
}
