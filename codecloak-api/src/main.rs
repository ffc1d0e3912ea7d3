use anyhow::Context;
use codecloak_api::start_server;
use codecloak_core::{load_config, logger::init_logging};
use std::path::PathBuf;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let log_json = std::env::var("CODECLOAK_LOG_JSON").is_ok_and(|value| value == "1");
    init_logging("info", log_json);

    let config_path = std::env::var_os("CODECLOAK_CONFIG").map(PathBuf::from);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;

    start_server(config).await
}
