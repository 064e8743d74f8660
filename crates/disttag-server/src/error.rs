//! Error types for the HTTP layer.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use disttag_audit::LoggerError;
use disttag_core::ValidationErrors;
use disttag_registry::{ErrorKind, RegistryError, StoreError};
use serde_json::json;
use tracing::error;

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure raised by the registry service.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The request carried no resolvable token.
    #[error("Login first")]
    Unauthorized,

    /// No route matches the request.
    #[error("{path} not found")]
    NoRoute {
        /// Request path, as received.
        path: String,
    },

    /// The request body was not a JSON string.
    #[error("version(\"{raw}\") format invalid")]
    InvalidBody {
        /// Body as received, lossily decoded.
        raw: String,
    },
}

impl ApiError {
    /// Returns the status code and kind label for this error.
    #[must_use]
    pub fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Registry(err) => {
                let kind = err.kind();
                (
                    StatusCode::from_u16(kind.status_code())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    kind.as_str(),
                )
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NoRoute { .. } => (StatusCode::NOT_FOUND, ErrorKind::NotFound.as_str()),
            Self::InvalidBody { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Unprocessable.as_str(),
            ),
        }
    }
}

impl From<disttag_core::Error> for ApiError {
    fn from(err: disttag_core::Error) -> Self {
        Self::Registry(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = json!({ "error": format!("[{label}] {self}") });
        (status, Json(body)).into_response()
    }
}

/// Errors raised while configuring or starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for this schema.
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration values violate a constraint.
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationErrors),

    /// Store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Audit log could not be opened.
    #[error("audit log error: {0}")]
    Audit(#[from] LoggerError),

    /// Listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Server I/O error.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
