use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::export::ExportError;
use crate::store::StoreError;
use crate::types::ErrorBody;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Error exporting {name}: {source}")]
    Export {
        name: &'static str,
        #[source]
        source: ExportError,
    },

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn query(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Query { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Export {
                source: ExportError::UnsupportedFormat(_),
                ..
            } => StatusCode::BAD_REQUEST,
            AppError::Query { .. } | AppError::Export { .. } | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, detail) = match &self {
            AppError::InvalidInput(msg) => {
                warn!("Invalid input: {}", msg);
                (msg.clone(), None)
            }
            AppError::Query { context, source } => {
                error!("{}: {}", context, source);
                (context.to_string(), Some(source.to_string()))
            }
            AppError::Export {
                source: source @ ExportError::UnsupportedFormat(_),
                ..
            } => {
                warn!("Rejected export request: {}", source);
                (source.to_string(), None)
            }
            AppError::Export { name, source } => {
                error!("Error exporting {}: {}", name, source);
                (format!("Error exporting {}", name), Some(source.to_string()))
            }
            AppError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                ("Server Error".to_string(), Some(msg.clone()))
            }
        };

        let body = Json(ErrorBody {
            message,
            error: detail,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
