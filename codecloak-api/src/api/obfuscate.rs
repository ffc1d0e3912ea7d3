use crate::errors::ApiError;
use crate::metrics::Outcome;
use crate::models::{ErrorResponse, ObfuscateRequest, ObfuscateResponse};
use crate::state::AppState;
use actix_web::{post, web, HttpResponse};
use codecloak_core::Language;
use std::time::Instant;
use tracing::{error, info};

#[utoipa::path(
    post,
    path = "/api/obfuscate",
    request_body = ObfuscateRequest,
    responses(
        (status = 200, description = "Source obfuscated", body = ObfuscateResponse),
        (status = 400, description = "Missing field or unsupported language", body = ErrorResponse),
        (status = 500, description = "Obfuscation failed", body = ErrorResponse)
    ),
    tag = "obfuscate"
)]
#[post("/obfuscate")]
pub async fn obfuscate_endpoint(
    state: web::Data<AppState>,
    request: web::Json<ObfuscateRequest>,
) -> Result<HttpResponse, ApiError> {
    let ObfuscateRequest { code, language } = request.into_inner();
    let bytes = code.as_ref().map_or(0, String::len);

    let Some(code) = code.filter(|code| !code.is_empty()) else {
        state
            .metrics
            .record_obfuscation("none", Outcome::Rejected, 0.0, bytes);
        return Err(ApiError::BadRequest("No code provided".to_string()));
    };
    let Some(language_id) = language.filter(|language| !language.trim().is_empty()) else {
        state
            .metrics
            .record_obfuscation("none", Outcome::Rejected, 0.0, bytes);
        return Err(ApiError::BadRequest("No language specified".to_string()));
    };

    // Unknown ids are labelled as a group to keep metric cardinality bounded
    let label = language_id
        .parse::<Language>()
        .map(|language| language.id())
        .unwrap_or("unsupported");
    info!(language = %language_id, bytes, "Obfuscation requested");

    let started = Instant::now();
    let obfuscator = state.obfuscator.clone();
    let result = web::block(move || obfuscator.obfuscate(&code, &language_id))
        .await
        .map_err(|err| ApiError::InternalError(err.to_string()))?;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(obfuscated_code) => {
            state
                .metrics
                .record_obfuscation(label, Outcome::Success, elapsed, bytes);
            Ok(HttpResponse::Ok().json(ObfuscateResponse {
                success: true,
                obfuscated_code,
            }))
        }
        Err(err) => {
            // Errors raised before dispatch carry no language
            let outcome = err
                .language()
                .map_or(Outcome::Unsupported, |_| Outcome::Failed);
            state
                .metrics
                .record_obfuscation(label, outcome, elapsed, bytes);
            error!(language = label, "Obfuscation request failed: {}", err);
            Err(err.into())
        }
    }
}
