//! Error types for the installer backend service.
//!
//! Job errors map to the status codes the frontend relies on: a running job
//! is a conflict, a missing job is not found, anything that prevents starting
//! or stopping the install process is an internal error.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

/// Errors that can occur in the installer backend service.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ib_config::error::Error),

    #[error(transparent)]
    Job(#[from] ib_job::error::Error),

    #[error(transparent)]
    Hardware(#[from] ib_hardware::error::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    #[error("Failed to parse form: {0}")]
    InvalidForm(String),

    #[error("Unsupported content type `{0}`")]
    UnsupportedContentType(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!("Creating API error response for error: {:?}", self);
        let (status, message) = match self {
            Error::Job(err) => match err {
                ib_job::error::Error::AlreadyRunning => (StatusCode::CONFLICT, "already running"),
                ib_job::error::Error::NoJob => (StatusCode::NOT_FOUND, "no running process"),
                ib_job::error::Error::Spawn(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to start the process",
                ),
                ib_job::error::Error::CancelFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to stop the process",
                ),
            },
            Error::Config(err) => match err {
                ib_config::error::Error::InvalidParameterName(_)
                | ib_config::error::Error::ParameterNotAllowed(_)
                | ib_config::error::Error::ParameterReserved(_)
                | ib_config::error::Error::InvalidParameterValue(_) => {
                    (StatusCode::BAD_REQUEST, "invalid parameter")
                }
                ib_config::error::Error::IO(_)
                | ib_config::error::Error::Deserialization(_)
                | ib_config::error::Error::InstallProgramMissing => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            Error::InvalidForm(_) | Error::UnsupportedContentType(_) => {
                (StatusCode::BAD_REQUEST, "failed to parse form")
            }
            Error::Hardware(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to execute lsblk",
            ),
            Error::IO(_) | Error::Join(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "status": status.as_u16()
            }
        }));
        (status, body).into_response()
    }
}
