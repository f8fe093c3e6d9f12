use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde::Serialize;
use services::PageLoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    PageLoad(#[from] PageLoadError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("administrator access required")]
    Forbidden,
    #[error("page data missing for this request")]
    MissingPageData,
    #[error("failed to encode metrics")]
    Metrics(#[from] std::fmt::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Domain(DomainError::NotFound(..)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorPayload {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
