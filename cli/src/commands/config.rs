// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use confluence_guard_core::domain::policy::{PolicyConfig, PolicySource};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the active allow-list policy
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate a policy file
    Validate {
        /// Path to policy file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a sample policy file
    Generate {
        /// Output path; a .yaml or .yml extension writes YAML
        #[arg(short, long, default_value = "./config.json")]
        output: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(&output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        for (index, source) in PolicyConfig::candidate_sources(config_override.clone())
            .iter()
            .enumerate()
        {
            let present = source.path().map(Path::exists).unwrap_or(false);
            let marker = if present { "found".green() } else { "missing".dimmed() };
            println!("  {}. {} ({})", index + 1, source.describe(), marker);
        }
        if config_override.is_none() {
            println!("  {}: {}", PolicyConfig::ENV_VAR, "(not set)".dimmed());
        }
        println!();
    }

    let loaded = PolicyConfig::load_layered(config_override);

    println!("{}", "Current policy:".bold());
    println!("  Source: {}", loaded.source.describe());
    println!();

    println!("{}", "Allowed spaces:".bold());
    if loaded.config.allowed_spaces.is_empty() {
        println!("  {}", "(none, every request is denied)".yellow());
    }
    for space in &loaded.config.allowed_spaces {
        let parents = loaded
            .config
            .parents_for(space)
            .map(|ids| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!("  {} → parents: {}", space.as_str().bold(), parents);
    }
    println!();

    print_warnings(&loaded.config);
    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = match config_path {
        Some(path) => PolicyConfig::from_file(&path)
            .with_context(|| format!("Failed to load policy from {}", path.display()))?,
        None => {
            let loaded = PolicyConfig::load_layered(None);
            if loaded.source == PolicySource::Empty {
                bail!("No policy file found; pass a path or set {}", PolicyConfig::ENV_VAR);
            }
            loaded.config
        }
    };

    print_warnings(&config);
    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path) -> Result<()> {
    let sample = PolicyConfig::sample();
    let rendered = if PolicyConfig::is_yaml_path(output) {
        serde_yaml::to_string(&sample).context("Failed to render sample policy")?
    } else {
        serde_json::to_string_pretty(&sample).context("Failed to render sample policy")?
    };

    std::fs::write(output, rendered)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn print_warnings(config: &PolicyConfig) {
    for warning in config.warnings() {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generated_files_validate() {
        let dir = tempfile::tempdir().unwrap();

        for name in ["config.json", "config.yaml"] {
            let path = dir.path().join(name);
            handle_command(ConfigCommand::Generate { output: path.clone() }, None)
                .await
                .unwrap();

            let parsed = PolicyConfig::from_file(&path).unwrap();
            assert_eq!(parsed, PolicyConfig::sample());
            assert!(parsed.warnings().is_empty());

            handle_command(ConfigCommand::Validate { file: Some(path) }, None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_uppercase_yaml_extension_writes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CONFIG.YML");

        handle_command(ConfigCommand::Generate { output: path.clone() }, None)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&written).is_err());
        assert_eq!(PolicyConfig::from_file(&path).unwrap(), PolicyConfig::sample());
    }

    #[tokio::test]
    async fn test_validate_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = handle_command(ConfigCommand::Validate { file: None }, Some(path.clone()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
