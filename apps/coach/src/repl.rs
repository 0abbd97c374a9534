//! Line-oriented terminal front end over a [`SessionController`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coach_core::{render::render_page, ReplyOutcome, SessionController, SubmitOutcome};
use shared::domain::{Message, Sender};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const TITLE: &str = "ALF - The Active Learning Framework Coach";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Restart,
    Document,
    Help,
    Quit,
    Blank,
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed {
        "" => Command::Blank,
        "/restart" | "/new" => Command::Restart,
        "/document" | "/plan" => Command::Document,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Say(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

pub async fn run(controller: SessionController, export: Option<PathBuf>) -> Result<()> {
    println!("{TITLE}");
    println!("{}", "=".repeat(TITLE.len()));
    println!("Type your answers and press Enter. /help lists commands.\n");

    for message in controller.snapshot().await.messages {
        print_message(&message);
    }
    if controller.snapshot().await.pending {
        print_typing();
        if let Some(outcome) = controller.resume().await {
            report(&controller, outcome, export.as_deref()).await?;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        match parse_command(&line) {
            Command::Blank => {}
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Document => match controller.snapshot().await.final_document {
                Some(document) => print_document(&document),
                None => println!("(the curriculum plan is not ready yet)"),
            },
            Command::Restart => {
                info!("restart requested");
                println!("\n--- new plan ---\n");
                match controller.restart().await {
                    Some(outcome) => report(&controller, outcome, export.as_deref()).await?,
                    None => {
                        for message in controller.snapshot().await.messages {
                            print_message(&message);
                        }
                    }
                }
            }
            Command::Say(text) => {
                if controller.snapshot().await.finished {
                    println!("The plan is complete. Use /restart to start a new one.");
                    continue;
                }
                print_typing();
                match controller.submit(&text).await {
                    SubmitOutcome::Dispatched(outcome) => {
                        report(&controller, outcome, export.as_deref()).await?
                    }
                    SubmitOutcome::Ignored => println!("(still waiting for the coach)"),
                }
            }
        }
    }

    Ok(())
}

async fn report(
    controller: &SessionController,
    outcome: ReplyOutcome,
    export: Option<&Path>,
) -> Result<()> {
    match outcome {
        ReplyOutcome::Continued { message } | ReplyOutcome::Failed { message, .. } => {
            print_message(&message)
        }
        ReplyOutcome::Finished { document } => {
            print_document(&document);
            if let Some(path) = export {
                let conversation = controller.snapshot().await.messages;
                export_document(path, &document, &conversation).await?;
                println!("Saved the plan to {}", path.display());
            }
            println!("Use /restart to start a new plan or /quit to exit.");
        }
        ReplyOutcome::Stale | ReplyOutcome::Ignored => {}
    }
    Ok(())
}

async fn export_document(path: &Path, document: &str, conversation: &[Message]) -> Result<()> {
    tokio::fs::write(path, render_page("Curriculum Plan", document, conversation))
        .await
        .with_context(|| format!("failed to write curriculum plan to '{}'", path.display()))
}

fn print_message(message: &Message) {
    match message.sender {
        Sender::Assistant => println!("\nCoach:\n{}\n", message.text),
        Sender::User => println!("You: {}", message.text),
    }
}

fn print_typing() {
    println!("(coach is typing...)");
}

fn print_document(document: &str) {
    println!("\n===== Curriculum Plan =====\n");
    println!("{document}");
    println!("\n===========================\n");
}

fn print_help() {
    println!("/document  show the finished curriculum plan");
    println!("/restart   start a new plan");
    println!("/quit      exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("/restart"), Command::Restart);
        assert_eq!(parse_command("  /quit \n"), Command::Quit);
        assert_eq!(parse_command("/plan"), Command::Document);
        assert_eq!(parse_command("   "), Command::Blank);
    }

    #[test]
    fn free_text_keeps_leading_whitespace() {
        assert_eq!(
            parse_command("  Reducing plastic waste\r\n"),
            Command::Say("  Reducing plastic waste".to_string())
        );
    }

    #[test]
    fn unknown_slash_words_are_sent_as_text() {
        assert_eq!(
            parse_command("/maybe later"),
            Command::Say("/maybe later".to_string())
        );
    }

    #[tokio::test]
    async fn export_writes_rendered_page() {
        let path = std::env::temp_dir().join(format!(
            "coach_export_test_{}.html",
            std::process::id()
        ));
        let conversation = [
            Message::assistant("What is your **Big Idea**?"),
            Message::user("Reducing plastic waste"),
        ];
        export_document(&path, "# Plan\n* Catalyst", &conversation)
            .await
            .expect("export");

        let html = std::fs::read_to_string(&path).expect("read export");
        assert!(html.contains("<title>Curriculum Plan</title>"));
        assert!(html.contains("Plan</h1>"));
        assert!(html.contains("Catalyst</li>"));
        assert!(html.contains("Big Idea</strong>"));
        assert!(html.contains(r#"<div class="message user">Reducing plastic waste</div>"#));
        std::fs::remove_file(path).expect("cleanup");
    }
}
