//! `ocrchat init` — create `~/.ocrchat/config.json` and the history directory.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use ocrchat_core::config::{get_config_path, save_config, Config};

/// Run the init command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "Ocrchat — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let created = init_at(&config_path)?;

    let verb = if created { "created" } else { "config already exists at" };
    println!("  {} {} {}", "✓".green(), verb, config_path.display());

    println!();
    println!(
        "{}",
        "Add an apiKey under providers, or export ANTHROPIC_API_KEY / GEMINI_API_KEY / OPENAI_API_KEY."
            .dimmed()
    );
    println!();
    Ok(())
}

/// Write a default config at `config_path` unless one exists, and make sure
/// the sibling `history/` directory is there. Returns whether a file was written.
fn init_at(config_path: &Path) -> Result<bool> {
    let created = if config_path.exists() {
        false
    } else {
        save_config(&Config::default(), Some(config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        true
    };

    if let Some(data_dir) = config_path.parent() {
        let history_dir = data_dir.join("history");
        std::fs::create_dir_all(&history_dir)
            .with_context(|| format!("failed to create {}", history_dir.display()))?;
    }

    Ok(created)
}
