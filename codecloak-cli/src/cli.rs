use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codecloak_core::{pipelines, AppConfig, CommandDelegate, Language, Obfuscator};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "codecloak", version)]
#[command(about = "Lexical source-code obfuscator for C, C++ and Python")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to stderr as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Obfuscate a source file (or stdin)
    Obfuscate {
        /// Language id: c, cpp, python, javascript, typescript
        #[arg(short, long)]
        language: String,
        /// Input file; stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seed for reproducible output (overrides engine.seed)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List supported languages
    Languages {
        #[arg(long)]
        json: bool,
    },
}

pub fn obfuscate_command(
    config: &AppConfig,
    language: &str,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let source = match &file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        }
    };
    info!(
        language,
        input = %file.as_ref().map_or("<stdin>".into(), |p| p.display().to_string()),
        "Obfuscating"
    );

    let mut config = config.clone();
    if seed.is_some() {
        config.engine.seed = seed;
    }
    let obfuscated = Obfuscator::from_config(&config).obfuscate(&source, language)?;

    match output {
        Some(path) => {
            fs::write(&path, &obfuscated)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Obfuscated code written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(obfuscated.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct LanguageEntry {
    id: &'static str,
    name: &'static str,
    native: bool,
    available: bool,
    stages: Vec<&'static str>,
}

pub fn languages_command(config: &AppConfig, json: bool) -> Result<()> {
    let delegate = CommandDelegate::from_config(&config.delegates);
    let entries: Vec<LanguageEntry> = Language::all()
        .into_iter()
        .map(|language| LanguageEntry {
            id: language.id(),
            name: language.display_name(),
            native: language.is_native(),
            available: language.is_native() || delegate.handles(language),
            stages: pipelines::for_language(language)
                .map(|pipeline| pipeline.stage_names())
                .unwrap_or_default(),
        })
        .collect();

    if json {
        let body = serde_json::json!({ "languages": entries });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for entry in &entries {
        let route = if entry.native {
            entry.stages.join(" -> ")
        } else if entry.available {
            "external obfuscator".to_string()
        } else {
            "external obfuscator (not configured)".to_string()
        };
        println!("{:<12} {:<12} {}", entry.id, entry.name, route);
    }
    Ok(())
}
