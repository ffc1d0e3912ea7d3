use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Obfuscate endpoint models
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObfuscateRequest {
    /// Source text to obfuscate
    #[serde(default)]
    pub code: Option<String>,
    /// Language id: c, cpp, python, javascript, typescript
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObfuscateResponse {
    pub success: bool,
    pub obfuscated_code: String,
}

// Languages endpoint models
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct LanguageInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
