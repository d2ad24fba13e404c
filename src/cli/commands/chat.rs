//! Interactive chat command.

use super::ask::{pacing_for, render_answer};
use crate::agent::Agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{ChatHistory, ChatMessage, Role};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, fast: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let settings = settings.with_model(model);
    let agent = Agent::from_settings(&settings)?;
    let pacing = pacing_for(&settings, fast);
    let mut history = ChatHistory::new();

    println!("\n{}", style("🤖 Qu'est-ce qu'un Agent?").bold().cyan());
    println!(
        "{}\n",
        style("Pose-moi une question! 🎤 (par exemple: Combien font 5 plus 3?)").dim()
    );
    println!(
        "{}\n",
        style("Type 'exit' to quit, 'history' to see the conversation, 'clear' to start over.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Toi:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Au revoir!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            history.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        if input.eq_ignore_ascii_case("history") {
            print_history(&history);
            continue;
        }

        history.push(ChatMessage::user(input));
        println!();
        let answer = render_answer(&agent, input, pacing.clone()).await?;
        history.push(ChatMessage::assistant(answer));

        debug!("Chat history now has {} messages", history.len());
    }

    Ok(())
}

fn print_history(history: &ChatHistory) {
    if history.is_empty() {
        Output::info("No messages yet.");
        return;
    }

    Output::header(&format!("Conversation ({} messages)", history.len()));
    for message in history.messages() {
        let who = match message.role {
            Role::User => style("Toi:").green().bold(),
            Role::Assistant => style("Agent:").cyan().bold(),
        };
        println!("{} {}", who, message.content);
    }
    println!();
}
