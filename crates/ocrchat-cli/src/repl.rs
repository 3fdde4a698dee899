//! Interactive REPL — multi-turn chat over one `Conversation`.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Turns are recorded only after a successful reply, so a failed call leaves
//! the conversation exactly as it was.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use ocrchat_core::Conversation;
use ocrchat_providers::Dispatcher;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Reset,
    Model(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_exit_command(trimmed) {
        return Some(Input::Exit);
    }
    if trimmed.eq_ignore_ascii_case("/reset") {
        return Some(Input::Reset);
    }
    if let Some(rest) = trimmed.strip_prefix("/model") {
        let name = rest.trim();
        if !name.is_empty() && rest.starts_with(char::is_whitespace) {
            return Some(Input::Model(name));
        }
    }
    Some(Input::Message(trimmed))
}

/// Run the interactive REPL loop.
pub async fn run(dispatcher: Dispatcher, mut model: String, system: Option<String>) -> Result<()> {
    helpers::print_banner(&model);

    let mut editor = create_editor()?;
    let mut conversation = Conversation::new();

    loop {
        let line = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let Some(input) = parse_input(&line) else {
            continue;
        };
        let _ = editor.add_history_entry(&line);

        match input {
            Input::Exit => {
                println!("\nGoodbye!");
                break;
            }
            Input::Reset => {
                conversation.clear();
                println!("(history cleared)\n");
            }
            Input::Model(name) => {
                model = name.to_string();
                let route = dispatcher.route(&model);
                println!("(model: {model} → {})\n", route.spec.display_name);
            }
            Input::Message(prompt) => {
                debug!(turns = conversation.len(), model = %model, "sending turn");
                helpers::print_thinking();

                let result = dispatcher
                    .dispatch(&model, prompt, system.as_deref(), &conversation, None)
                    .await;
                helpers::clear_thinking();

                match result {
                    Ok(reply) => {
                        if reply.fallback_used {
                            helpers::print_fallback_notice(&model);
                        }
                        helpers::print_response(&reply.text, reply.provider);
                        conversation.push_user(prompt);
                        conversation.push_assistant(reply.text);
                    }
                    Err(e) => {
                        if dispatcher.route(&model).fallback {
                            helpers::print_fallback_notice(&model);
                        }
                        helpers::print_error(&e.message());
                    }
                }
            }
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn history_path() -> std::path::PathBuf {
    ocrchat_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}
