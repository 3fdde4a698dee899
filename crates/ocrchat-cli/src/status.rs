//! `ocrchat status` — show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use ocrchat_core::config::{get_config_path, load_config, Config};
use ocrchat_providers::registry::{route, PROVIDERS};
use ocrchat_providers::CredentialProvider;

/// One row of the providers table.
#[derive(Debug)]
struct ProviderRow {
    display_name: &'static str,
    env_key: &'static str,
    api_base: String,
    has_key: bool,
}

fn provider_rows(config: &Config) -> Vec<ProviderRow> {
    PROVIDERS
        .iter()
        .map(|spec| {
            let api_base = config
                .providers
                .get_by_name(spec.name)
                .and_then(|p| p.api_base.clone())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| spec.default_api_base.to_string());
            ProviderRow {
                display_name: spec.display_name,
                env_key: spec.env_key,
                api_base,
                has_key: !config.providers.resolve(spec.name).trim().is_empty(),
            }
        })
        .collect()
}

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Ocrchat Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, run `ocrchat init`)".red().to_string()
        }
    );

    let default_route = route(&config.defaults.model);
    println!(
        "  {:<18} {} → {}{}",
        "Model:".bold(),
        config.defaults.model,
        default_route.spec.display_name,
        if default_route.fallback {
            " (fallback)".yellow().to_string()
        } else {
            String::new()
        }
    );

    println!(
        "  {:<18} {}",
        "Parameters:".bold(),
        format!(
            "max_tokens: {} | timeout: {}",
            config.defaults.max_tokens,
            config
                .defaults
                .timeout_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "provider default".into())
        )
        .dimmed()
    );

    println!();
    println!("  {}", "Providers:".bold());
    for row in provider_rows(&config) {
        let status = if row.has_key {
            format!("{} (key set)", "✓".green())
        } else {
            format!("{}", format!("· not configured (set {})", row.env_key).dimmed())
        };
        println!("    {:<20} {}", row.display_name, status);
        println!("    {:<20} {}", "", row.api_base.dimmed());
    }
    println!();

    Ok(())
}
