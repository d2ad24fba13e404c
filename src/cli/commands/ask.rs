//! Ask command implementation.

use crate::agent::Agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::narration::{narrate, DisplayEvent, Pacing};
use anyhow::Result;
use console::style;
use futures::{pin_mut, StreamExt};

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    fast: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let settings = settings.with_model(model);
    let agent = Agent::from_settings(&settings)?;
    let pacing = pacing_for(&settings, fast);

    println!("\n{} {}\n", style("Toi:").green().bold(), question);
    render_answer(&agent, question, pacing).await?;

    Ok(())
}

/// Narrate one question in the terminal and return the final answer.
pub(crate) async fn render_answer(agent: &Agent, question: &str, pacing: Pacing) -> Result<String> {
    let events = narrate(agent.stream(question), pacing);
    pin_mut!(events);

    let mut answer = String::new();
    let mut answer_started = false;

    while let Some(event) = events.next().await {
        if matches!(event, DisplayEvent::AnswerDelta { .. }) && !answer_started {
            answer_started = true;
            println!("{}", style("💡 Voici la réponse:").bold());
        }
        Output::display_event(&event)?;
        if let DisplayEvent::Answer { text } = event {
            answer = text;
        }
    }

    Ok(answer)
}

pub(crate) fn pacing_for(settings: &Settings, fast: bool) -> Pacing {
    let pacing = Pacing::from_settings(&settings.pacing);
    if fast {
        pacing.instant()
    } else {
        pacing
    }
}
