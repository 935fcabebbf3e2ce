use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures while loading the recipe/review tables at startup.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is missing required column {column}")]
    Schema { path: PathBuf, column: String },

    #[error("malformed table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
}

/// Rejected registrations.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("password longer than {max} bytes")]
    PasswordTooLong { max: usize },

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Bad settings from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors surfaced by request handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("session token error: {e}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{self}");
        let status = match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, "Something went wrong").into_response()
    }
}

/// Failures of the offline normalization tool.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),
}
