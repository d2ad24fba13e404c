//! Kid-friendly narration of the agent's reasoning.
//!
//! Turns the raw [`AgentStep`] stream into short display lines, pausing
//! between steps so a child can follow what the agent is doing, then
//! reveals the answer word by word.

use crate::agent::{display_name, AgentStep, CALCULATE, SEARCH_INTERNET};
use crate::config::PacingSettings;
use crate::error::Result;
use async_stream::stream;
use futures::{pin_mut, Stream, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Answer shown when the agent finished without saying anything.
pub const NO_RESPONSE: &str = "No response received";

/// Something the UI should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// New lines for the reasoning panel.
    Reasoning { lines: Vec<String> },
    /// The agent used a tool; show it big.
    ToolBanner { tool: String },
    /// Next word of the answer, followed by a space.
    AnswerDelta { text: String },
    /// The complete answer, as stored in the chat history.
    Answer { text: String },
}

impl DisplayEvent {
    /// Event name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayEvent::Reasoning { .. } => "reasoning",
            DisplayEvent::ToolBanner { .. } => "tool_banner",
            DisplayEvent::AnswerDelta { .. } => "answer_delta",
            DisplayEvent::Answer { .. } => "answer",
        }
    }
}

/// Delays and truncation limits for narration.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub step_delay: Duration,
    pub word_delay: Duration,
    pub thought_max_chars: usize,
    pub result_max_chars: usize,
}

impl Pacing {
    pub fn from_settings(settings: &PacingSettings) -> Self {
        Self {
            step_delay: settings.step_delay(),
            word_delay: settings.word_delay(),
            thought_max_chars: settings.thought_max_chars,
            result_max_chars: settings.result_max_chars,
        }
    }

    /// Same limits, no waiting.
    pub fn instant(mut self) -> Self {
        self.step_delay = Duration::ZERO;
        self.word_delay = Duration::ZERO;
        self
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_settings(&PacingSettings::default())
    }
}

/// Tracks what has been narrated so far for one question.
#[derive(Debug, Default)]
pub struct Narrator {
    thought_max_chars: usize,
    result_max_chars: usize,
    final_response: String,
    last_tool: Option<String>,
}

impl Narrator {
    pub fn new(pacing: &Pacing) -> Self {
        Self {
            thought_max_chars: pacing.thought_max_chars,
            result_max_chars: pacing.result_max_chars,
            ..Default::default()
        }
    }

    /// Display lines for one agent step.
    pub fn narrate(&mut self, step: &AgentStep) -> Vec<String> {
        match step {
            AgentStep::Thought { content } => {
                self.final_response = content.clone();
                vec![format!(
                    "💭 **Cerveau de l'Agent:** \"{}\"",
                    truncate(content, self.thought_max_chars)
                )]
            }
            AgentStep::ToolRequested { name, arguments } => {
                let shown = display_name(name).to_string();
                self.last_tool = Some(shown.clone());

                match name.as_str() {
                    CALCULATE => vec![
                        "✋ **L'agent dit:** J'ai besoin de ma calculatrice! 🧮".to_string(),
                        format!("   (Je dois calculer: {})", argument_text(arguments, "expression")),
                    ],
                    SEARCH_INTERNET => vec![
                        "✋ **L'agent dit:** J'ai besoin de chercher sur Internet! 🌐".to_string(),
                        format!("   (Je cherche: {})", argument_text(arguments, "query")),
                    ],
                    _ => vec![format!("✋ **L'agent dit:** J'utilise {}!", shown)],
                }
            }
            AgentStep::ToolResult { content, .. } => {
                vec![format!(
                    "⚙️ **Résultat:** {}",
                    truncate(content, self.result_max_chars)
                )]
            }
        }
    }

    /// Display name of the last tool the agent asked for.
    pub fn last_tool(&self) -> Option<&str> {
        self.last_tool.as_deref()
    }

    /// The answer to show: an error, the last thought, or the fallback.
    pub fn answer(&self, failure: Option<&str>) -> String {
        match failure {
            Some(e) => format!("Error: {}", e),
            None if self.final_response.is_empty() => NO_RESPONSE.to_string(),
            None => self.final_response.clone(),
        }
    }
}

/// Narrate an agent step stream with pacing.
///
/// Agent failures never surface as errors: they become the answer text.
pub fn narrate<S>(steps: S, pacing: Pacing) -> impl Stream<Item = DisplayEvent> + Send
where
    S: Stream<Item = Result<AgentStep>> + Send,
{
    stream! {
        pin_mut!(steps);
        let mut narrator = Narrator::new(&pacing);
        let mut failure: Option<String> = None;

        while let Some(step) = steps.next().await {
            match step {
                Ok(step) => {
                    let lines = narrator.narrate(&step);
                    yield DisplayEvent::Reasoning { lines };
                    pause(pacing.step_delay).await;
                }
                Err(e) => {
                    warn!("Agent failed: {}", e);
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        let answer = narrator.answer(failure.as_deref());

        if let Some(tool) = narrator.last_tool() {
            yield DisplayEvent::ToolBanner { tool: tool.to_string() };
        }

        let mut full_response = String::new();
        for word in answer.split_whitespace() {
            let text = format!("{} ", word);
            full_response.push_str(&text);
            yield DisplayEvent::AnswerDelta { text };
            pause(pacing.word_delay).await;
        }

        yield DisplayEvent::Answer { text: full_response.trim_end().to_string() };
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Cut text to `max_chars` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// The named argument as plain text, or the whole arguments value.
fn argument_text(arguments: &serde_json::Value, key: &str) -> String {
    match arguments.get(key).and_then(|v| v.as_str()) {
        Some(text) => text.to_string(),
        None => match arguments {
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        },
    }
}
