use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use library_sync_config::Config;
use serde_json::json;
use std::path::Path;

pub fn run_config(
    cmd: crate::ConfigCommands,
    loaded: anyhow::Result<Config>,
    config_file: &Path,
    output: &Output,
) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => {
            let config = loaded.map_err(|e| eyre!("{}", e))?;
            show_config(&config, full, config_file, output)
        }
        crate::ConfigCommands::Init { force } => init_config(config_file, force, output),
    }
}

fn show_config(config: &Config, full: bool, config_file: &Path, output: &Output) -> Result<()> {
    let shown = if full { config.clone() } else { config.masked() };

    match output.format() {
        OutputFormat::Human => {
            if config_file.exists() {
                output.info(format!("Config file: {}", config_file.display()));
            } else {
                output.warn(format!(
                    "Configuration file not found at: {} (showing defaults and environment overrides)",
                    config_file.display()
                ));
            }
            let rendered = toml::to_string_pretty(&shown)
                .map_err(|e| eyre!("Failed to render configuration: {}", e))?;
            output.block(rendered);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "exists": config_file.exists(),
                "config": shown,
            }));
        }
    }

    Ok(())
}

fn init_config(config_file: &Path, force: bool, output: &Output) -> Result<()> {
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration file already exists at: {}",
            config_file.display()
        ));
        output.info("Use --force to overwrite it.");
        return Err(eyre!("Refusing to overwrite {}", config_file.display()));
    }

    Config::default()
        .save_to_file(config_file)
        .map_err(|e| eyre!("Failed to write config to {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
