use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "air-traffic-card.toml";
pub const DEFAULT_STATES_FILE: &str = "states.json";
pub const DEFAULT_LOG_FILE: &str = "air-traffic-card.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    pub fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("Unknown output format: {other}")),
        }
    }
}

/// Settings of the reference host harness. `card` is handed to the card
/// untouched and validated there.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub states_path: PathBuf,
    pub output: String,
    pub format: OutputFormat,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
    pub card: Value,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            states_path: PathBuf::from(DEFAULT_STATES_FILE),
            output: String::new(),
            format: OutputFormat::Html,
            log_enabled: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            card: Value::Null,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    states: Option<String>,
    output: Option<String>,
    format: Option<String>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
    card: Option<toml::Table>,
}

pub fn parse_args() -> Result<Config> {
    parse_from(env::args().skip(1).collect())
}

/// Defaults, then the TOML file, then `ATC_*` variables, then flags.
pub fn parse_from(args: Vec<String>) -> Result<Config> {
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let env_config = env::var("ATC_CONFIG").ok().map(PathBuf::from);
    let config_path = explicit_config
        .clone()
        .or(env_config)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config {
        config_path: config_path.clone(),
        ..Config::default()
    };

    if config_path.exists() {
        let file_config = load_file_config(&config_path)?;
        apply_file_config(&mut config, file_config)?;
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }

    apply_env(&mut config)?;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                iter.next();
            }
            "--states" => {
                config.states_path = PathBuf::from(
                    iter.next()
                        .ok_or_else(|| anyhow!("--states needs a value"))?,
                );
            }
            "--output" | "-o" => {
                config.output = iter
                    .next()
                    .ok_or_else(|| anyhow!("--output needs a value"))?
                    .to_string();
            }
            "--format" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--format needs a value"))?;
                config.format = OutputFormat::from_str(value)?;
            }
            "--entity" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--entity needs a value"))?;
                set_card_field(&mut config.card, "entity", value);
            }
            "--status-entity" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--status-entity needs a value"))?;
                set_card_field(&mut config.card, "status_entity", value);
            }
            "--log" => {
                config.log_enabled = true;
            }
            "--no-log" => {
                config.log_enabled = false;
            }
            "--log-level" => {
                config.log_level = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-level needs a value"))?
                    .to_string();
            }
            "--log-file" => {
                config.log_file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file needs a value"))?
                    .to_string();
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}"));
            }
        }
    }

    Ok(config)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(cfg)
}

fn apply_file_config(target: &mut Config, file: FileConfig) -> Result<()> {
    if let Some(states) = file.states {
        target.states_path = PathBuf::from(states);
    }
    if let Some(output) = file.output {
        target.output = output;
    }
    if let Some(format) = file.format {
        target.format = OutputFormat::from_str(&format)?;
    }
    if let Some(log_enabled) = file.log_enabled {
        target.log_enabled = log_enabled;
    }
    if let Some(log_level) = file.log_level {
        target.log_level = log_level;
    }
    if let Some(log_file) = file.log_file {
        target.log_file = log_file;
    }
    if let Some(card) = file.card {
        target.card = serde_json::to_value(card).context("Failed to convert [card] table")?;
    }
    Ok(())
}

fn apply_env(config: &mut Config) -> Result<()> {
    if let Ok(value) = env::var("ATC_STATES") {
        config.states_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("ATC_OUTPUT") {
        config.output = value;
    }
    if let Ok(value) = env::var("ATC_FORMAT") {
        config.format = OutputFormat::from_str(&value)?;
    }
    if let Ok(value) = env::var("ATC_ENTITY") {
        set_card_field(&mut config.card, "entity", &value);
    }
    if let Ok(value) = env::var("ATC_LOG_ENABLED") {
        config.log_enabled = matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if let Ok(value) = env::var("ATC_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Ok(value) = env::var("ATC_LOG_FILE") {
        config.log_file = value;
    }
    Ok(())
}

/// Sets one key of the card object, creating the object when the file had
/// no `[card]` table.
fn set_card_field(card: &mut Value, key: &str, value: &str) {
    if !card.is_object() {
        *card = Value::Object(Map::new());
    }
    if let Value::Object(map) = card {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn print_help() {
    println!("air-traffic-card");
    println!("Usage: air-traffic-card [--config PATH] [--states PATH] [--output PATH]");
    println!("       [--format html|json] [--entity ID] [--status-entity ID]");
    println!("       [--log] [--no-log] [--log-level LEVEL] [--log-file PATH]");
    println!("Environment: ATC_CONFIG overrides config path");
    println!("Environment: ATC_STATES/ATC_OUTPUT/ATC_FORMAT set input, output and format");
    println!("Environment: ATC_ENTITY sets the merged flight entity");
    println!("Environment: ATC_LOG_ENABLED/LEVEL/FILE configure logging");
}
