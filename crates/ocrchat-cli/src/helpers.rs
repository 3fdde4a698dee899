//! Shared CLI helpers — path expansion, response printing, banners.

use std::path::PathBuf;

use colored::Colorize;

use ocrchat_providers::registry::{spec_for, ProviderKind};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// `Some(s)` unless the string is absent or whitespace.
pub fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Print a model reply, labelled with the provider that produced it.
pub fn print_response(response: &str, provider: ProviderKind) {
    println!();
    println!("{}", spec_for(provider).display_name.cyan().bold());
    println!("{response}");
    println!();
}

pub fn print_fallback_notice(model: &str) {
    eprintln!(
        "{}",
        format!("note: unknown model '{model}', sent to the OpenAI-compatible endpoint").yellow()
    );
}

pub fn print_error(message: &str) {
    eprintln!("\n{} {message}\n", "error:".red().bold());
}

/// Print the banner shown at REPL start.
pub fn print_banner(model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Ocrchat".cyan().bold(), version.dimmed());
    println!("{} {}", "model:".dimmed(), model);
    println!(
        "{}",
        "Type a message. /reset clears history, /model NAME switches, \"exit\" quits.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "… thinking".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}
