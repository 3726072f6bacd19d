use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use popcorn_config::{Config, CredentialStore, PathManager, API_KEY_ENV};
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, config, paths, output),
        ConfigCommands::SetKey { key } => set_key(key, paths, output),
    }
}

fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let credentials_file = paths.credentials_file();
    let mut store = CredentialStore::new(credentials_file.clone());
    store.load().map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e)
    })?;
    Ok(store)
}

fn show_config(full: bool, config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let credentials = load_credentials(paths)?;
    let key = config.api_key_with_source(&credentials);
    let key_display = match &key {
        Some((_, value)) if full => value.clone(),
        Some((_, value)) => mask_string(value),
        None => "<not set>".to_string(),
    };
    let key_origin = key.as_ref().map(|(source, _)| source.label()).unwrap_or("-");

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Config File"), Cell::new(paths.config_file().display())]);
            table.add_row(vec![Cell::new("Data Directory"), Cell::new(paths.data_dir().display())]);
            table.add_row(vec![Cell::new("Provider URL"), Cell::new(&config.provider.base_url)]);
            table.add_row(vec![Cell::new("Access Key"), Cell::new(format!("{} ({})", key_display, key_origin))]);
            table.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{}s", config.provider.timeout_seconds))]);
            table.add_row(vec![Cell::new("Min Query Length"), Cell::new(config.search.min_query_len)]);
            table.add_row(vec![
                Cell::new("Highly Rated Above"),
                Cell::new(config.detail.highly_rated_threshold),
            ]);
            table.add_row(vec![Cell::new("Log Level"), Cell::new(&config.logging.level)]);
            table.add_row(vec![
                Cell::new("Log File"),
                Cell::new(if config.logging.file {
                    paths.log_file().display().to_string()
                } else {
                    "off".to_string()
                }),
            ]);
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", table);

            if key.is_none() {
                println!();
                println!("{}", "Run `popcorn config set-key` to store an OMDb access key.".yellow());
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": paths.config_file(),
                "data_dir": paths.data_dir(),
                "provider": {
                    "base_url": config.provider.base_url,
                    "api_key": key_display,
                    "api_key_source": key_origin,
                    "timeout_seconds": config.provider.timeout_seconds,
                },
                "search": { "min_query_len": config.search.min_query_len },
                "detail": { "highly_rated_threshold": config.detail.highly_rated_threshold },
                "logging": {
                    "level": config.logging.level,
                    "file": config.logging.file,
                },
            }));
        }
    }

    Ok(())
}

fn set_key(key_arg: Option<String>, paths: &PathManager, output: &Output) -> Result<()> {
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let key = match key_arg {
        Some(key) => key,
        None => rpassword::prompt_password("OMDb access key: ")
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read access key: {}", e))?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(color_eyre::eyre::eyre!("Access key is required"));
    }

    let mut credentials = load_credentials(paths)?;
    credentials.set_omdb_api_key(key.clone());
    credentials.save().map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to save credentials to {}: {}",
            paths.credentials_file().display(),
            e
        )
    })?;

    output.success(format!("Access key saved ({})", mask_string(&key)));
    if std::env::var(API_KEY_ENV).is_ok() {
        output.warn(format!("{} is set and takes precedence over the stored key", API_KEY_ENV));
    }
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_API_KEY" {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
