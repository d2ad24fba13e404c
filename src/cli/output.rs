//! CLI output formatting utilities.

use crate::narration::DisplayEvent;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a search hit.
    pub fn search_result(title: &str, url: &str, snippet: &str) {
        println!("\n{} {}", style(">>").green(), style(title).bold());
        if !snippet.is_empty() {
            println!("   {}", content_preview(snippet, 200));
        }
        println!("   {}", style(url).dim());
    }

    /// Print one narration event as it arrives.
    pub fn display_event(event: &DisplayEvent) -> io::Result<()> {
        let mut stdout = io::stdout();
        match event {
            DisplayEvent::Reasoning { lines } => {
                for line in lines {
                    let plain = line.replace("**", "");
                    if plain.starts_with("   ") {
                        println!("{}", style(plain).dim());
                    } else {
                        println!("{}", plain);
                    }
                }
                println!();
            }
            DisplayEvent::ToolBanner { tool } => {
                let title = "🎉 L'AGENT A CHOISI UN OUTIL! 🎉";
                let rule = "═".repeat(40);
                println!("{}", style(&rule).yellow());
                println!("  {}", style(title).red().bold());
                println!("  {}", style(format!("🔧 {}", tool)).cyan().bold());
                println!("{}", style(&rule).yellow());
                println!();
            }
            DisplayEvent::AnswerDelta { text } => {
                print!("{}", text);
                stdout.flush()?;
            }
            DisplayEvent::Answer { .. } => {
                println!("\n");
            }
        }
        Ok(())
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        format!("{}...", content.chars().take(max_chars).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("éééé", 2), "éé...");
    }
}
