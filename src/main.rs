//! Headless entry point: boots the core against the configured database.
//!
//! Usage:
//!   chartnote                 summary of notes and templates
//!   chartnote notes           list notes, newest first
//!   chartnote templates       list templates
//!   chartnote prompt <id>     print the generation prompt for a note
//!   chartnote default-template <id>
//!                             make <id> the fallback template for generation

use chartnote_lib::state::{load_config, update_config, AppState};
use chartnote_lib::types::Config;

#[tokio::main]
async fn main() {
    chartnote_lib::init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            Config::default()
        }
    };

    let state = match AppState::initialize(config).await {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => {
            println!(
                "{} notes, {} templates",
                state.notes.len(),
                state.templates.len()
            );
            0
        }
        ["notes"] => {
            for note in state.notes.list() {
                let title: &str = if note.title.is_empty() {
                    "(untitled)"
                } else {
                    &note.title
                };
                println!("{}  {}", note.id, title);
            }
            0
        }
        ["templates"] => {
            for template in state.templates.list() {
                let kind = if template.is_system { "system" } else { "user" };
                println!(
                    "{}  [{}]  {} ({} sections)",
                    template.id,
                    kind,
                    template.title,
                    template.sections.len()
                );
            }
            0
        }
        ["prompt", note_id] => match state.prompt_for_note(note_id) {
            Ok(prompt) => {
                println!("{}", prompt);
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        },
        ["default-template", template_id] => {
            if state.templates.get(template_id).is_none() {
                eprintln!("No template with id {}", template_id);
                1
            } else {
                match update_config(|config| {
                    config.default_template_id = Some(template_id.to_string())
                }) {
                    Ok(_) => {
                        log::info!("Default template set to {}", template_id);
                        0
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        1
                    }
                }
            }
        }
        _ => {
            eprintln!(
                "usage: chartnote [notes | templates | prompt <note-id> | default-template <id>]"
            );
            2
        }
    };

    state.shutdown().await;
    std::process::exit(code);
}
