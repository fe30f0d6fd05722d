//! Chat command - Interactive conversation.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use proxychat_core::ChatView;

use super::{build_controller, Cli};
use crate::render::{print_prompts, TerminalRenderer};

#[derive(Args)]
pub struct ChatArgs {
    /// Do not show suggested prompts
    #[arg(long)]
    no_suggestions: bool,
}

/// One line of user input, interpreted.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Empty,
    Quit,
    Help,
    Prompt(String),
    Message(String),
    Unknown(String),
}

fn parse_input(line: &str, prompts: &[String]) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    match command {
        "quit" | "exit" | "q" => Input::Quit,
        "help" | "?" => Input::Help,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 && n <= prompts.len() => Input::Prompt(prompts[n - 1].clone()),
            _ => Input::Unknown(trimmed.to_string()),
        },
    }
}

pub async fn execute(cli: &Cli, args: &ChatArgs) -> Result<()> {
    let config = cli.load_config()?;
    let controller = Arc::new(build_controller(&config));

    let identifiers = controller.identifiers();
    info!(
        session_id = %identifiers.session_id,
        "Starting chat with {}",
        config.proxy_url()
    );

    println!("💬 proxychat → {}", config.proxy_url());
    println!("Type a message and press Enter. /help for commands, /quit to leave.");
    println!();
    if !args.no_suggestions {
        print_prompts(&config.suggested_prompts, &mut io::stdout())?;
    }
    show_prompt()?;

    let renderer = tokio::spawn(render_loop(controller.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line, &config.suggested_prompts) {
            Input::Quit => break,
            Input::Empty => show_prompt()?,
            Input::Help => {
                println!("  /N     send suggestion N");
                println!("  /help  show this help");
                println!("  /quit  leave the chat");
                print_prompts(&config.suggested_prompts, &mut io::stdout())?;
                show_prompt()?;
            }
            Input::Unknown(command) => {
                println!("Unknown command: {} (try /help)", command);
                show_prompt()?;
            }
            Input::Prompt(text) => {
                println!("{}", text);
                controller.submit_prompt(&text).await;
            }
            Input::Message(text) => {
                controller.set_input(text);
                controller.submit_input().await;
            }
        }
    }

    renderer.abort();
    println!("👋 Bye");
    Ok(())
}

async fn render_loop(mut updates: watch::Receiver<ChatView>) {
    let mut renderer = TerminalRenderer::new();

    while updates.changed().await.is_ok() {
        let view = updates.borrow_and_update().clone();
        let rendered = renderer
            .render(&view, &mut io::stdout())
            .and_then(|settled| if settled { show_prompt() } else { Ok(()) });
        if let Err(e) = rendered {
            warn!("Failed to render chat: {}", e);
            break;
        }
    }
}

fn show_prompt() -> io::Result<()> {
    write_prompt(&mut io::stdout())
}

fn write_prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts() -> Vec<String> {
        vec!["First prompt".to_string(), "Second prompt".to_string()]
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("/quit", &prompts()), Input::Quit);
        assert_eq!(parse_input("  /exit ", &prompts()), Input::Quit);
        assert_eq!(parse_input("/help", &prompts()), Input::Help);
        assert_eq!(parse_input("   ", &prompts()), Input::Empty);
    }

    #[test]
    fn test_parse_prompt_selection() {
        assert_eq!(
            parse_input("/2", &prompts()),
            Input::Prompt("Second prompt".to_string())
        );
        assert_eq!(parse_input("/3", &prompts()), Input::Unknown("/3".to_string()));
        assert_eq!(parse_input("/0", &prompts()), Input::Unknown("/0".to_string()));
    }

    #[test]
    fn test_parse_message_keeps_text() {
        assert_eq!(
            parse_input("what is 2/3?", &prompts()),
            Input::Message("what is 2/3?".to_string())
        );
    }

    struct ClosedOutput;

    impl Write for ClosedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_prompt() {
        let mut out: Vec<u8> = Vec::new();
        write_prompt(&mut out).unwrap();
        assert_eq!(out, b"> ");
    }

    #[test]
    fn test_write_prompt_reports_flush_failure() {
        let err = write_prompt(&mut ClosedOutput).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
