use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::GeoError;
use crate::models::ErrorResponse;
use crate::services::{AuthError, DirectoryError, GeocodeError, RepositoryError};

/// Every failure a handler can return, mapped to an HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Not authenticated")]
    MissingToken,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl ApiError {
    /// Machine-readable error label
    fn label(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::MissingToken => "unauthorized",
            ApiError::Auth(AuthError::InvalidToken) => "unauthorized",
            ApiError::Auth(AuthError::InvalidCredentials) => "invalid_credentials",
            ApiError::Auth(AuthError::Inactive) => "inactive_user",
            ApiError::Auth(AuthError::TokenError(_)) => "token_error",
            ApiError::Directory(err) => match err {
                DirectoryError::Geo(GeoError::Validation(_)) => "invalid_coordinate",
                DirectoryError::Geo(GeoError::Convergence { .. }) => "distance_not_converged",
                DirectoryError::RadiusTooLarge { .. } => "invalid_radius",
                DirectoryError::Geocode(GeocodeError::NotFound(_)) => "address_not_resolved",
                DirectoryError::Geocode(_) => "geocoding_unavailable",
                DirectoryError::Repository(RepositoryError::NotFound(_)) => "not_found",
                DirectoryError::Repository(_) => "storage_error",
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::Auth(err) => match err {
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials | AuthError::Inactive => StatusCode::BAD_REQUEST,
                AuthError::TokenError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Directory(err) => match err {
                DirectoryError::Geo(GeoError::Validation(_)) | DirectoryError::RadiusTooLarge { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DirectoryError::Geo(GeoError::Convergence { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
                DirectoryError::Geocode(GeocodeError::NotFound(_)) => StatusCode::UNPROCESSABLE_ENTITY,
                DirectoryError::Geocode(_) => StatusCode::BAD_GATEWAY,
                DirectoryError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
                DirectoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let mut response = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }

        response.json(ErrorResponse {
            error: self.label().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
