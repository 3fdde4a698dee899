//! Ocrchat CLI — entry point.
//!
//! # Commands
//!
//! - `ocrchat ask [-m MODEL] [-s SYSTEM] [--image PATH] [--attach] [PROMPT]` — one-shot
//! - `ocrchat chat [-m MODEL] [-s SYSTEM]` — interactive REPL with history
//! - `ocrchat status` — show configuration and provider status
//! - `ocrchat init` — write the default config

mod helpers;
mod init;
mod repl;
mod status;

use std::io::{IsTerminal, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ocrchat_core::config::{load_config, Config};
use ocrchat_core::{Conversation, InlineImage};
use ocrchat_providers::{Dispatcher, TesseractRecognizer, TextRecognizer};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Ocrchat — read text from images and ask an LLM about it
#[derive(Parser)]
#[command(name = "ocrchat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the reply
    Ask {
        /// Prompt text. Falls back to OCR of --image, then stdin.
        prompt: Option<String>,

        /// Model id (e.g. "claude-3-5-haiku-latest", "gemini-1.5-flash", "gpt-4o")
        #[arg(short, long)]
        model: Option<String>,

        /// System instruction for this call
        #[arg(short, long)]
        system: Option<String>,

        /// Image to OCR (and optionally attach)
        #[arg(short, long)]
        image: Option<String>,

        /// Also send the image itself to providers that accept images
        #[arg(long, default_value_t = false)]
        attach: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Interactive chat that keeps conversation history
    Chat {
        #[arg(short, long)]
        model: Option<String>,

        #[arg(short, long)]
        system: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Write the default config file
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            prompt,
            model,
            system,
            image,
            attach,
            logs,
        } => {
            init_logging(logs);
            run_ask(prompt, model, system, image, attach).await
        }
        Commands::Chat {
            model,
            system,
            logs,
        } => {
            init_logging(logs);
            let config = load_config(None);
            let model = resolve_model(model, &config);
            repl::run(Dispatcher::from_config(&config), model, system).await
        }
        Commands::Status => status::run(),
        Commands::Init => init::run(),
    }
}

// ─────────────────────────────────────────────
// Ask command
// ─────────────────────────────────────────────

async fn run_ask(
    prompt: Option<String>,
    model: Option<String>,
    system: Option<String>,
    image_path: Option<String>,
    attach: bool,
) -> Result<()> {
    let config = load_config(None);
    let model = resolve_model(model, &config);

    let image_bytes = match image_path.as_deref() {
        Some(path) => Some(read_image(&helpers::expand_tilde(path)).await?),
        None => None,
    };

    let prompt = match helpers::non_blank(prompt) {
        Some(p) => p,
        None => match &image_bytes {
            Some(bytes) => TesseractRecognizer::new()
                .recognize_text(bytes)
                .await
                .context("OCR failed")?,
            None => read_stdin()?,
        },
    };

    let image = match (attach, image_bytes) {
        (true, Some(bytes)) => Some(InlineImage::from_bytes(bytes)),
        _ => None,
    };

    if prompt.trim().is_empty() && image.is_none() {
        bail!("nothing to send: give a prompt, an --image with readable text, or pipe text on stdin");
    }

    info!(model = %model, chars = prompt.chars().count(), "sending prompt");

    let dispatcher = Dispatcher::from_config(&config);
    if dispatcher.route(&model).fallback {
        helpers::print_fallback_notice(&model);
    }
    let dispatched = dispatcher
        .dispatch(
            &model,
            &prompt,
            system.as_deref(),
            &Conversation::new(),
            image.as_ref(),
        )
        .await
        .with_context(|| format!("{model} request failed"))?;

    helpers::print_response(&dispatched.text, dispatched.provider);
    Ok(())
}

/// CLI flag, else the configured default.
fn resolve_model(flag: Option<String>, config: &Config) -> String {
    helpers::non_blank(flag).unwrap_or_else(|| config.defaults.model.clone())
}

async fn read_image(path: &Path) -> Result<Vec<u8>> {
    if !ocrchat_providers::is_image_file(&path.to_string_lossy()) {
        tracing::warn!(path = %path.display(), "file extension does not look like an image");
    }
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image: {}", path.display()))
}

/// Read the prompt from piped stdin. Returns empty when stdin is a terminal.
fn read_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("failed to read prompt from stdin")?;
    Ok(buf)
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("ocrchat=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_ask_with_image() {
        let cli = Cli::parse_from([
            "ocrchat", "ask", "-m", "gemini-1.5-flash", "--image", "scan.png", "--attach",
        ]);
        match cli.command {
            Commands::Ask {
                prompt,
                model,
                image,
                attach,
                ..
            } => {
                assert!(prompt.is_none());
                assert_eq!(model.as_deref(), Some("gemini-1.5-flash"));
                assert_eq!(image.as_deref(), Some("scan.png"));
                assert!(attach);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn model_flag_overrides_config() {
        let config = Config::default();
        assert_eq!(resolve_model(Some("claude-3".into()), &config), "claude-3");
        assert_eq!(resolve_model(None, &config), config.defaults.model);
        assert_eq!(resolve_model(Some("  ".into()), &config), config.defaults.model);
    }

    #[tokio::test]
    async fn read_image_missing_file() {
        let err = read_image(Path::new("/nonexistent/scan.png")).await.unwrap_err();
        assert!(err.to_string().contains("failed to read image"));
    }
}
