use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clipboard::ClipboardError;
use crate::history::StoreError;
use crate::settings::SettingsError;

pub const NOT_FOUND: &str = "NOT_FOUND";
pub const AMBIGUOUS_ID: &str = "AMBIGUOUS_ID";
pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
pub const CLIPBOARD_UNAVAILABLE: &str = "CLIPBOARD_UNAVAILABLE";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DAEMON_UNREACHABLE: &str = "DAEMON_UNREACHABLE";
pub const DAEMON_NOT_RUNNING: &str = "DAEMON_NOT_RUNNING";

/// Error body shared by the HTTP API and the MCP tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>, retryable: bool, suggestion: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            retryable,
            suggestion: suggestion.map(str::to_string),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("could not reach the clipkeep daemon: {0}")]
    Transport(String),

    #[error("the clipkeep daemon is not running")]
    NotRunning,

    #[error("{}", .0.message)]
    Remote(ErrorDetail),
}

impl ControlError {
    pub fn storage(error: anyhow::Error) -> Self {
        Self::Storage(format!("{error:#}"))
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Store(StoreError::NotFound(_)) => NOT_FOUND,
            Self::Store(StoreError::Ambiguous { .. }) => AMBIGUOUS_ID,
            Self::Store(StoreError::InvalidSettings(_)) | Self::Settings(_) => INVALID_CONFIG,
            Self::Clipboard(_) => CLIPBOARD_UNAVAILABLE,
            Self::Storage(_) => STORAGE_ERROR,
            Self::Transport(_) => DAEMON_UNREACHABLE,
            Self::NotRunning => DAEMON_NOT_RUNNING,
            Self::Remote(detail) => detail.code.as_str(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == NOT_FOUND
    }

    pub fn detail(&self) -> ErrorDetail {
        match self {
            Self::Remote(detail) => detail.clone(),
            Self::Store(StoreError::NotFound(_)) => ErrorDetail::new(
                NOT_FOUND,
                self.to_string(),
                false,
                Some("Use list_entries or `clipkeep list` to get valid ids"),
            ),
            Self::Store(StoreError::Ambiguous { .. }) => ErrorDetail::new(
                AMBIGUOUS_ID,
                self.to_string(),
                true,
                Some("Use more characters of the id"),
            ),
            Self::Store(StoreError::InvalidSettings(_)) | Self::Settings(_) => ErrorDetail::new(
                INVALID_CONFIG,
                self.to_string(),
                true,
                Some("Values must be positive integers"),
            ),
            Self::Clipboard(_) => ErrorDetail::new(CLIPBOARD_UNAVAILABLE, self.to_string(), true, None),
            Self::Storage(_) => ErrorDetail::new(STORAGE_ERROR, self.to_string(), false, None),
            Self::Transport(_) => ErrorDetail::new(DAEMON_UNREACHABLE, self.to_string(), true, None),
            Self::NotRunning => ErrorDetail::new(
                DAEMON_NOT_RUNNING,
                self.to_string(),
                false,
                Some("Start it with `clipkeep run`"),
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            NOT_FOUND => StatusCode::NOT_FOUND,
            AMBIGUOUS_ID => StatusCode::CONFLICT,
            INVALID_CONFIG => StatusCode::UNPROCESSABLE_ENTITY,
            CLIPBOARD_UNAVAILABLE | DAEMON_NOT_RUNNING => StatusCode::SERVICE_UNAVAILABLE,
            DAEMON_UNREACHABLE => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorDetail> for ControlError {
    fn from(detail: ErrorDetail) -> Self {
        Self::Remote(detail)
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.detail())).into_response()
    }
}
