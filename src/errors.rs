use crate::chart::ChartError;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The chart's data could not be used. Carries the error panel that
    /// replaces the chart.
    #[error("{message}")]
    DataFormat { message: String, svg: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ChartError> for AppError {
    fn from(err: ChartError) -> Self {
        match err {
            ChartError::UnknownSeries(_) | ChartError::UnknownVariant(_) => Self::BadRequest(err.to_string()),
            ChartError::DataFormat { .. } => Self::DataFormat {
                message: err.to_string(),
                svg: String::new(),
            },
            ChartError::NotLoaded => Self::internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => {
                warn!("{message}");
                (StatusCode::NOT_FOUND, message).into_response()
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            AppError::DataFormat { message, svg } => {
                error!("chart data error: {message}");
                if svg.is_empty() {
                    (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
                } else {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        [(header::CONTENT_TYPE, "image/svg+xml")],
                        svg,
                    )
                        .into_response()
                }
            }
            err @ (AppError::Io(_) | AppError::Internal(_)) => {
                error!("{err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}
