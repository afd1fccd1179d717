use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use project_assistant::config::{Settings, SETTINGS_FILE};
use project_assistant::database::InMemoryProjectStore;
use project_assistant::logging::ActivityLogger;
use project_assistant::models::menu::MenuResponse;
use project_assistant::services::menu::{spawn_sweeper, InMemorySessionStore, SessionStore};
use project_assistant::services::{LlmService, MenuManager};

const USAGE: &str = "Commands:\n  \
    <session> <option> [text]   run menu option 1-4 for a session\n  \
    menu <session>              show the main menu\n  \
    bind <session> <user_id>    bind an admin user to a session\n  \
    quit                        stop the assistant";

/// One parsed line of console input
enum Command<'a> {
    Option {
        session: &'a str,
        option: i64,
        text: Option<&'a str>,
    },
    Menu(&'a str),
    Bind(&'a str, i64),
    Quit,
}

fn parse_command(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match head {
        "" => None,
        "quit" | "exit" => Some(Command::Quit),
        "menu" if !rest.is_empty() => Some(Command::Menu(rest)),
        "bind" => {
            let (session, user) = rest.split_once(char::is_whitespace)?;
            Some(Command::Bind(session, user.trim().parse().ok()?))
        }
        session => {
            let (option, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let text = text.trim();
            Some(Command::Option {
                session,
                option: option.parse().ok()?,
                text: (!text.is_empty()).then_some(text),
            })
        }
    }
}

fn render_menu(menu: &MenuResponse) -> String {
    let mut out = format!("{} [{}]\n", menu.title, menu.status);
    for option in &menu.options {
        out.push_str(&format!("  {}. {}\n", option.id, option.label));
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,project_assistant=debug".to_string()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Starting project assistant");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded from {}", SETTINGS_FILE);

    let logger = ActivityLogger::new((&settings.logging).into());
    let generator = Arc::new(LlmService::new(settings.llm.clone())?);
    let projects = Arc::new(InMemoryProjectStore::new());
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let sweeper = spawn_sweeper(
        sessions.clone(),
        settings.session.sweep_interval(),
        settings.session.eviction_delay(),
        logger.clone(),
    );

    let manager = MenuManager::new(
        sessions,
        generator,
        projects,
        logger,
        settings.prompts.project_idea_prompt.clone(),
        settings.llm.max_tokens,
    );

    info!("Project assistant ready, model={}", settings.llm.model);

    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{}\n", USAGE).as_bytes()).await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let output = match parse_command(&line) {
            None if line.trim().is_empty() => continue,
            None => {
                warn!("Unrecognized input: {}", line.trim());
                format!("{}\n", USAGE)
            }
            Some(Command::Quit) => break,
            Some(Command::Menu(session)) => render_menu(&manager.menu_options(session).await),
            Some(Command::Bind(session, user_id)) => {
                manager.bind_admin_user(session, user_id).await;
                format!("Session {} bound to user {}\n", session, user_id)
            }
            Some(Command::Option {
                session,
                option,
                text,
            }) => {
                let reply = manager.process_option(option, session, text).await;
                let mut out = format!("{}\n", reply.text);
                if reply.show_menu {
                    out.push('\n');
                    out.push_str(&render_menu(&manager.menu_options(session).await));
                }
                out
            }
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    sweeper.abort();
    info!("Project assistant stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option_with_text() {
        match parse_command("  s1 1 a recipe sharing app  ") {
            Some(Command::Option {
                session,
                option,
                text,
            }) => {
                assert_eq!(session, "s1");
                assert_eq!(option, 1);
                assert_eq!(text, Some("a recipe sharing app"));
            }
            _ => panic!("expected an option command"),
        }
    }

    #[test]
    fn test_parse_control_commands() {
        assert!(matches!(parse_command("quit"), Some(Command::Quit)));
        assert!(matches!(parse_command("menu s1"), Some(Command::Menu("s1"))));
        assert!(matches!(parse_command("bind s1 42"), Some(Command::Bind("s1", 42))));
        assert!(matches!(
            parse_command("s2 3"),
            Some(Command::Option { option: 3, text: None, .. })
        ));
        assert!(parse_command("bind s1 abc").is_none());
        assert!(parse_command("s1 one").is_none());
        assert!(parse_command("   ").is_none());
    }
}
