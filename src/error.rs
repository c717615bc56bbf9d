//! Service error taxonomy.
//!
//! Every error that can cross the HTTP boundary carries a stable `error_name`
//! and a status code, and renders as `{"message": ..., "error_name": ...}`
//! JSON. The storage layer has its own error type ([`StorageError`]) because
//! two of its variants, [`StorageError::Omitted`] and
//! [`StorageError::Unsupported`], are control signals consumed inside the
//! retrieval path, not user-facing conditions; [`Error::from_storage`] is the
//! single place they are translated once no fallback remains.

use crate::storage::{AssetKind, StorageError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No backend claims the identifier.
    #[error("No handlers found for that identifier: {0}")]
    UnknownIdentifierFormat(String),

    #[error("Scale can not be used in conjunction with width or height")]
    MutuallyExclusiveParameters,

    /// Crop coordinates must be supplied all together, and must describe a
    /// non-empty box inside the raster.
    #[error("{0}")]
    InvalidCrop(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The backend refuses this operation outright, including via derivation.
    #[error("That context isn't supported for this endpoint!")]
    UnsupportedContext,

    /// The backend omitted the requested kind and every fallback source.
    #[error("No available representation of {kind} for {identifier}")]
    ContextUnavailable { kind: String, identifier: String },

    /// A backend family is registered but its root was never configured.
    #[error("{0} is not configured")]
    MissingConfiguration(&'static str),

    /// The backend claimed the asset exists but it could not be read,
    /// decoded, or re-encoded.
    #[error("Something went wrong trying to access that context: {0}")]
    Retrieval(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable name, mirrored in the JSON error body.
    pub fn error_name(&self) -> &'static str {
        match self {
            Self::UnknownIdentifierFormat(_) => "UnknownIdentifierFormatError",
            Self::MutuallyExclusiveParameters => "MutuallyExclusiveParametersError",
            Self::InvalidCrop(_) => "InvalidCropParametersError",
            Self::MissingParameter(_) => "MissingParameterError",
            Self::UnsupportedContext => "UnsupportedContextError",
            Self::ContextUnavailable { .. } => "ContextError",
            Self::MissingConfiguration(_) => "ConfigurationError",
            Self::Retrieval(_) => "RetrievalError",
            Self::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownIdentifierFormat(_) => StatusCode::NOT_FOUND,
            Self::MutuallyExclusiveParameters => StatusCode::BAD_REQUEST,
            Self::InvalidCrop(_) => StatusCode::BAD_REQUEST,
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedContext => StatusCode::FORBIDDEN,
            Self::ContextUnavailable { .. } => StatusCode::NOT_FOUND,
            Self::MissingConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Retrieval(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translate a storage-layer error once the retrieval path is done with
    /// it. `kind` and `identifier` give the Omitted case its terminal
    /// "no available representation" shape.
    pub fn from_storage(err: StorageError, kind: AssetKind, identifier: &str) -> Self {
        match err {
            StorageError::Omitted => Self::ContextUnavailable {
                kind: kind.to_string(),
                identifier: identifier.to_string(),
            },
            StorageError::Unsupported => Self::UnsupportedContext,
            StorageError::MissingConfiguration(key) => Self::MissingConfiguration(key),
            StorageError::Io(e) => Self::Retrieval(e.to_string()),
            StorageError::Image(e) => Self::Retrieval(e.to_string()),
        }
    }
}

/// JSON body rendered for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error_name: &'static str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            message: self.to_string(),
            error_name: self.error_name(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for the retrieval path and the HTTP handlers.
pub type Result<T> = std::result::Result<T, Error>;
