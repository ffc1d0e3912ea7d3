use crate::models::*;
use actix_web::HttpResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::obfuscate::obfuscate_endpoint,
        crate::api::languages::languages_endpoint
    ),
    components(
        schemas(
            ObfuscateRequest,
            ObfuscateResponse,
            LanguageInfo,
            LanguagesResponse,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "obfuscate", description = "Source obfuscation"),
        (name = "languages", description = "Supported languages")
    ),
    info(
        title = "CodeCloak API",
        version = "0.1.0",
        description = "HTTP interface to the CodeCloak source obfuscator",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
