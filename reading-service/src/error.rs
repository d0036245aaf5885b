use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{images::ImageError, store::StoreError, validation::ValidationError, vision::VisionError};

/// Every way a request can fail once it reaches a handler.
#[derive(thiserror::Error, Debug)]
pub enum ReadingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("monthly reading already reported")]
    DoubleReport,
    #[error("reading already confirmed")]
    ConfirmationDuplicate,
    #[error("reading not found")]
    MeasureNotFound,
    #[error("no readings found")]
    MeasuresNotFound,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("vision error: {0}")]
    Vision(#[from] VisionError),
    #[error("image error: {0}")]
    Image(#[from] ImageError),
}

/// Uniform failure body.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error_code: &'static str,
    pub error_description: String,
}

impl ReadingError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DoubleReport | Self::ConfirmationDuplicate => StatusCode::CONFLICT,
            Self::MeasureNotFound | Self::MeasuresNotFound => StatusCode::NOT_FOUND,
            // Infrastructure failures keep the 400 the API has always returned.
            Self::Store(_) | Self::Vision(_) | Self::Image(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(v) => v.code.as_str(),
            Self::DoubleReport => "DOUBLE_REPORT",
            Self::ConfirmationDuplicate => "CONFIRMATION_DUPLICATE",
            Self::MeasureNotFound => "MEASURE_NOT_FOUND",
            Self::MeasuresNotFound => "MEASURES_NOT_FOUND",
            Self::Store(_) | Self::Vision(_) | Self::Image(_) => "ERROR",
        }
    }

    fn is_unknown(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Vision(_) | Self::Image(_))
    }
}

impl IntoResponse for ReadingError {
    fn into_response(self) -> Response {
        if self.is_unknown() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorEnvelope {
            error_code: self.error_code(),
            error_description: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}

pub type ReadingResult<T> = Result<T, ReadingError>;
