use actix_web::{web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AddressRequest, ApiResponse, DeletedResponse, HealthResponse, NearbyAddress, NearestQuery, NearestResponse,
};
use crate::routes::{current_user, ApiError, AppState};

/// Configure all address-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/addresses", web::post().to(create_address))
        .route("/addresses", web::get().to(read_all_addresses))
        .route("/addresses/nearest", web::get().to(read_nearest_addresses))
        .route("/addresses/{id}", web::get().to(read_address))
        .route("/addresses/{id}", web::put().to(update_address))
        .route("/addresses/{id}", web::delete().to(delete_address));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.directory.health_check().await { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Create an address
///
/// POST /api/v1/addresses
///
/// Request body:
/// ```json
/// {
///   "name": "string",
///   "addressLine": "string",
///   "city": "string",
///   "state": "string",
///   "postalCode": "string"
/// }
/// ```
async fn create_address(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<AddressRequest>,
) -> Result<HttpResponse, ApiError> {
    current_user(&req, &state)?;

    let request = body.into_inner().trimmed();
    request.validate()?;

    let address = state.directory.create(request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(address)))
}

/// All addresses
///
/// GET /api/v1/addresses
async fn read_all_addresses(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    current_user(&req, &state)?;

    let addresses = state.directory.list_all().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(addresses)))
}

/// One address by id
///
/// GET /api/v1/addresses/{id}
async fn read_address(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    current_user(&req, &state)?;

    let address = state.directory.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(address)))
}

/// Addresses near a textual query address
///
/// GET /api/v1/addresses/nearest?name=..&addressLine=..&city=..&state=..&radiusKm=..
///
/// `radiusKm` defaults to the configured radius.
async fn read_nearest_addresses(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NearestQuery>,
) -> Result<HttpResponse, ApiError> {
    current_user(&req, &state)?;

    let query = query.into_inner().trimmed();
    query.validate()?;

    let nearest = state
        .directory
        .nearest(&query.geocode_query(), query.radius_km)
        .await?;

    let response = NearestResponse {
        origin: nearest.origin.coordinate,
        radius_km: nearest.radius_km,
        total_candidates: nearest.result.total_candidates,
        skipped: nearest.result.skipped,
        addresses: nearest
            .result
            .matches
            .into_iter()
            .map(|m| NearbyAddress {
                address: m.candidate,
                distance_km: m.distance_km,
            })
            .collect(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}

/// Replace an address
///
/// PUT /api/v1/addresses/{id}
async fn update_address(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<AddressRequest>,
) -> Result<HttpResponse, ApiError> {
    current_user(&req, &state)?;

    let request = body.into_inner().trimmed();
    request.validate()?;

    let address = state.directory.update(path.into_inner(), request).await?;

    Ok(HttpResponse::Accepted().json(ApiResponse::ok(address)))
}

/// Delete an address
///
/// DELETE /api/v1/addresses/{id}
async fn delete_address(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    current_user(&req, &state)?;

    let id = path.into_inner();
    state.directory.delete(id).await?;

    Ok(HttpResponse::Accepted().json(ApiResponse::ok(DeletedResponse { id })))
}
