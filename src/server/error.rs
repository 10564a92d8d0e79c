use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::error::ProcessError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload form expired or invalid")]
    InvalidFormToken,

    #[error("Processing error")]
    Process {
        #[from]
        source: ProcessError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidFormToken => StatusCode::FORBIDDEN,
            AppError::Process {
                source: ProcessError::NoFiles,
            } => StatusCode::BAD_REQUEST,
            AppError::Process { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InvalidFormToken => {
                "The upload form expired, please reload the page and try again".to_string()
            }
            AppError::Process { source } => source.to_string(),
            AppError::Internal(_) => "Something went wrong while processing the upload".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.public_message();

        let error_response = match self {
            AppError::BadRequest(msg) => ErrorResponse::new("Bad Request").with_details(msg),
            AppError::InvalidFormToken => ErrorResponse::new("Forbidden").with_details(message),
            AppError::Process { source } => {
                let response = ErrorResponse::new("Processing Error").with_details(message);
                match source {
                    ProcessError::NothingProcessed { skipped } => response.with_skipped(skipped),
                    ProcessError::NoFiles => response,
                }
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                ErrorResponse::new("Internal Server Error")
            }
        };

        (status, Json(error_response)).into_response()
    }
}
