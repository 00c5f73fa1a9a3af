use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::project::ProjectError;
use services::services::analysis::AnalyzerError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Project(ProjectError::ProjectNotFound) => StatusCode::NOT_FOUND,
            ApiError::Project(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Analyzer(AnalyzerError::Project(ProjectError::ProjectNotFound)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Analyzer(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let message = self.to_string();
        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
