mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use codecloak_core::{load_config, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries obfuscated code; logs go to stderr
    logger::init_logging("warn", cli.log_json);

    let config = load_config(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Obfuscate {
            language,
            file,
            output,
            seed,
        } => cli::obfuscate_command(&config, &language, file, output, seed),
        Commands::Languages { json } => cli::languages_command(&config, json),
    }
}
