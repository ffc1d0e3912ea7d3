use actix_web::{http::StatusCode, test, web};
use codecloak_api::{create_app, AppState};
use codecloak_core::{
    config::DEFAULT_BODY_LIMIT, DelegateError, EngineConfig, Language, Obfuscator,
    ScriptObfuscator,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn state() -> web::Data<AppState> {
    let obfuscator = Obfuscator::new(EngineConfig {
        name_length: 8,
        seed: Some(11),
    });
    web::Data::new(AppState::new(obfuscator).unwrap())
}

struct Reverse;

impl ScriptObfuscator for Reverse {
    fn obfuscate(&self, source: &str, _: Language) -> Result<String, DelegateError> {
        Ok(source.chars().rev().collect())
    }
}

#[actix_web::test]
async fn test_obfuscate_c() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({
            "code": "int main() {\n    int total = 2;\n    if (total > 1) {\n        total = 0;\n    }\n    return total;\n}",
            "language": "c"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let code = body["obfuscatedCode"].as_str().unwrap();
    assert!(code.contains("int main() {"));
    assert!(!code.contains("total"));
}

#[actix_web::test]
async fn test_obfuscate_python_alias() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "greeting = \"hi\"\nprint(greeting)\n", "language": "py" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let code = body["obfuscatedCode"].as_str().unwrap();
    assert!(code.starts_with("def "));
    assert!(!code.contains("greeting"));
}

#[actix_web::test]
async fn test_missing_code_is_rejected() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "language": "c" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request: No code provided");
}

#[actix_web::test]
async fn test_missing_language_is_rejected() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "int x = 1;", "language": "" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request: No language specified");
}

#[actix_web::test]
async fn test_unsupported_language() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "package main", "language": "go" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Unsupported language: go");
}

#[actix_web::test]
async fn test_script_language_without_delegate() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "const a = 1;", "language": "javascript" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Obfuscation failed");
    assert!(body["details"].as_str().unwrap().contains("JavaScript"));
}

#[actix_web::test]
async fn test_script_language_with_delegate() {
    let obfuscator = Obfuscator::default().with_delegate(Arc::new(Reverse));
    let state = web::Data::new(AppState::new(obfuscator).unwrap());
    let app = test::init_service(create_app(state, DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "abc", "language": "ts" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["obfuscatedCode"], "cba");
}

#[actix_web::test]
async fn test_malformed_json_is_rejected() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_body_limit() {
    let app = test::init_service(create_app(state(), 64)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "x".repeat(256), "language": "c" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_languages() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::get().uri("/api/languages").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "languages": [
                { "id": "javascript", "name": "JavaScript" },
                { "id": "typescript", "name": "TypeScript" },
                { "id": "c", "name": "C" },
                { "id": "cpp", "name": "C++" },
                { "id": "python", "name": "Python" }
            ]
        })
    );
}

#[actix_web::test]
async fn test_metrics_count_requests() {
    let state = state();
    let app = test::init_service(create_app(state.clone(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::post()
        .uri("/api/obfuscate")
        .set_json(json!({ "code": "int x = 1;", "language": "c" }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get().uri("/monitoring/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("codecloak_obfuscations_total"));
    assert!(text.contains("language=\"c\""));
    assert!(text.contains("outcome=\"success\""));
}

#[actix_web::test]
async fn test_metrics_separate_failure_outcomes() {
    let state = state();
    let app = test::init_service(create_app(state.clone(), DEFAULT_BODY_LIMIT)).await;

    for (code, language) in [("package main", "go"), ("const a = 1;", "javascript")] {
        let req = test::TestRequest::post()
            .uri("/api/obfuscate")
            .set_json(json!({ "code": code, "language": language }))
            .to_request();
        assert!(!test::call_service(&app, req).await.status().is_success());
    }

    let unsupported = state
        .metrics
        .obfuscations_total
        .with_label_values(&["unsupported", "unsupported"])
        .get();
    let failed = state
        .metrics
        .obfuscations_total
        .with_label_values(&["javascript", "failed"])
        .get();
    assert_eq!(unsupported, 1);
    assert_eq!(failed, 1);
}

#[actix_web::test]
async fn test_health() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::get().uri("/monitoring/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_openapi_document() {
    let app = test::init_service(create_app(state(), DEFAULT_BODY_LIMIT)).await;

    let req = test::TestRequest::get()
        .uri("/api-docs/openapi.json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["paths"]["/api/obfuscate"]["post"].is_object());
    assert!(body["paths"]["/api/languages"]["get"].is_object());
}
