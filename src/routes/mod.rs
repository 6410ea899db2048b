// Route exports
pub mod addresses;
pub mod error;
pub mod users;

use actix_web::{http::header, web, HttpRequest};
use std::sync::Arc;

use crate::models::User;
use crate::services::{AddressDirectory, AuthService};

pub use error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<AddressDirectory>,
    pub auth: Arc<AuthService>,
}

/// Resolve the bearer token of a request to an active user
pub fn current_user(req: &HttpRequest, state: &AppState) -> Result<User, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingToken)?;

    Ok(state.auth.authenticate(token)?)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(users::configure)
            .configure(addresses::configure),
    );
}
