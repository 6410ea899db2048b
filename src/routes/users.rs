use actix_web::{web, HttpRequest, HttpResponse};

use crate::models::{LoginForm, TokenResponse};
use crate::routes::{current_user, ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/token", web::post().to(login))
        .route("/users/me", web::get().to(read_users_me));
}

/// Exchange a username and password for a bearer token
///
/// POST /api/v1/token (form: username, password)
async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> Result<HttpResponse, ApiError> {
    let token = state.auth.login(&form.username, &form.password)?;

    tracing::info!("Issued token for {}", form.username);

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// Profile of the authenticated user
///
/// GET /api/v1/users/me
async fn read_users_me(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = current_user(&req, &state)?;
    Ok(HttpResponse::Ok().json(user))
}
