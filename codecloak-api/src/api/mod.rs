use crate::errors::ApiError;
use crate::state::AppState;
use actix_web::{error::JsonPayloadError, web, App, HttpServer};
use codecloak_core::AppConfig;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub mod languages;
pub mod monitoring;
pub mod obfuscate;
pub mod openapi;

pub fn create_app(
    state: web::Data<AppState>,
    body_limit: usize,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let json_config = web::JsonConfig::default()
        .limit(body_limit)
        .error_handler(move |err, _req| {
            let api_error = match err {
                JsonPayloadError::Overflow { .. }
                | JsonPayloadError::OverflowKnownLength { .. } => {
                    ApiError::PayloadTooLarge(body_limit)
                }
                other => ApiError::BadRequest(other.to_string()),
            };
            api_error.into()
        });

    App::new()
        .wrap(TracingLogger::default())
        .app_data(state)
        .app_data(json_config)
        .service(
            web::scope("/api")
                .service(obfuscate::obfuscate_endpoint)
                .service(languages::languages_endpoint),
        )
        .service(
            web::scope("/monitoring")
                .route("/metrics", web::get().to(monitoring::metrics))
                .route("/health", web::get().to(monitoring::health)),
        )
        .route("/api-docs/openapi.json", web::get().to(openapi::openapi_json))
}

pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let state = web::Data::new(AppState::from_config(&config)?);
    let body_limit = config.server.body_limit_bytes;

    info!(
        bind_address = %config.server.bind_address,
        body_limit,
        "Starting CodeCloak API server"
    );

    HttpServer::new(move || create_app(state.clone(), body_limit))
        .bind(config.server.bind_address.as_str())?
        .run()
        .await?;
    Ok(())
}
