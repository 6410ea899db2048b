use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use address_directory::config::{LoggingSettings, Settings, DEV_TOKEN_SECRET};
use address_directory::core::ProximityFilter;
use address_directory::models::ErrorResponse;
use address_directory::routes::{self, AppState};
use address_directory::services::{
    hash_password, AddressDirectory, AddressRepository, AuthService, CachedGeocoder, InMemoryAddressRepository,
    InMemoryCredentialStore, MapQuestGeocoder, PostgresAddressRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn bad_request(error: &str, message: String) -> actix_web::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::build(StatusCode::BAD_REQUEST).json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: 400,
        }),
    )
    .into()
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    bad_request("invalid_json", format!("Invalid JSON: {}", err))
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    bad_request("invalid_query", format!("Invalid query: {}", err))
}

/// Handle form payload errors
fn handle_form_payload_error(err: error::UrlencodedError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    bad_request("invalid_form", format!("Invalid form: {}", err))
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn build_repository(settings: &Settings) -> std::io::Result<Arc<dyn AddressRepository>> {
    match &settings.database.url {
        Some(url) => {
            let repository = PostgresAddressRepository::from_settings(url, &settings.database)
                .await
                .map_err(|e| {
                    error!("Failed to connect to PostgreSQL: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
            info!("PostgreSQL repository initialized");
            Ok(Arc::new(repository))
        }
        None => {
            warn!("No database URL configured, addresses are kept in memory only");
            Ok(Arc::new(InMemoryAddressRepository::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // `address-directory hash-password <password>` prints a digest for config
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        match args.get(2) {
            Some(password) => {
                println!("{}", hash_password(password));
                return Ok(());
            }
            None => {
                eprintln!("usage: address-directory hash-password <password>");
                std::process::exit(2);
            }
        }
    }

    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
        }
    };

    init_tracing(&settings.logging);

    info!("Starting address directory service...");

    let repository = build_repository(&settings).await?;

    if settings.geocoding.api_key.is_empty() {
        warn!("No geocoding API key configured, address resolution will fail");
    }

    let mapquest = MapQuestGeocoder::new(
        settings.geocoding.endpoint.clone(),
        settings.geocoding.api_key.clone(),
        Duration::from_secs(settings.geocoding.timeout_secs),
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let geocoder = Arc::new(CachedGeocoder::new(
        mapquest,
        settings.geocoding.cache_size,
        settings.geocoding.cache_ttl_secs,
    ));

    info!(
        "Geocoder initialized (cache: {} entries, TTL: {}s)",
        settings.geocoding.cache_size, settings.geocoding.cache_ttl_secs
    );

    let filter = ProximityFilter::new(
        settings.proximity.convergence_policy,
        settings.proximity.parallel_threshold,
    );

    let directory = Arc::new(AddressDirectory::new(
        geocoder,
        repository,
        filter,
        settings.proximity.default_radius_km,
        settings.proximity.max_radius_km,
    ));

    info!(
        "Proximity search: default radius {} km, policy {:?}",
        settings.proximity.default_radius_km,
        filter.policy()
    );

    let credentials = InMemoryCredentialStore::from_settings(&settings.auth.users);
    if credentials.is_empty() {
        warn!("No users configured, every authenticated endpoint will reject requests");
    }
    if settings.auth.token_secret == DEV_TOKEN_SECRET {
        warn!("Using the development token secret; set ADDRDIR_AUTH_SECRET in production");
    }

    info!("Credential store loaded ({} users)", credentials.len());

    let auth = Arc::new(AuthService::new(
        Arc::new(credentials),
        &settings.auth.token_secret,
        settings.auth.token_ttl_secs,
    ));

    let app_state = AppState { directory, auth };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::FormConfig::default().error_handler(handle_form_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
