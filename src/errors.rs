use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please enter a ticker symbol")]
    EmptyInput,
    #[error("Invalid ticker symbol: {0}")]
    InvalidTicker(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
    #[error("No data found for {0}")]
    NoData(String),
    #[error("Invalid data structure for {ticker}: {detail}")]
    MalformedData { ticker: String, detail: String },
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Session not found")]
    SessionNotFound,
}

impl AppError {
    /// Stable machine-readable kind for response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::EmptyInput => "empty_input",
            AppError::InvalidTicker(_) => "invalid_ticker",
            AppError::InvalidPeriod(_) => "invalid_period",
            AppError::UnknownTheme(_) => "unknown_theme",
            AppError::NoData(_) => "no_data",
            AppError::MalformedData { .. } => "malformed_data",
            AppError::Export(_) => "export_failed",
            AppError::SessionNotFound => "session_not_found",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyInput
            | AppError::InvalidTicker(_)
            | AppError::InvalidPeriod(_)
            | AppError::UnknownTheme(_) => StatusCode::BAD_REQUEST,
            AppError::NoData(_) | AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::MalformedData { .. } => StatusCode::BAD_GATEWAY,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        AppError::Export(value.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Export(value.to_string())
    }
}
