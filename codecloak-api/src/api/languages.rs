use crate::models::{LanguageInfo, LanguagesResponse};
use actix_web::{get, HttpResponse};
use codecloak_core::Language;

#[utoipa::path(
    get,
    path = "/api/languages",
    responses(
        (status = 200, description = "Languages accepted by /api/obfuscate", body = LanguagesResponse)
    ),
    tag = "languages"
)]
#[get("/languages")]
pub async fn languages_endpoint() -> HttpResponse {
    let languages = Language::all()
        .iter()
        .map(|language| LanguageInfo {
            id: language.id().to_string(),
            name: language.display_name().to_string(),
        })
        .collect();

    HttpResponse::Ok().json(LanguagesResponse { languages })
}
