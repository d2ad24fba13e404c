//! Curio - watch an AI agent think
//!
//! A kid-friendly chat where a language model agent answers questions with
//! the help of two tools, and every step it takes is narrated slowly enough
//! for a child to follow.
//!
//! # Overview
//!
//! Curio lets you:
//! - Ask a question in a web page or in the terminal
//! - Watch the agent's thoughts and tool choices appear one by one
//! - See which tool (internet search or calculator) answered the question
//! - Use the tools on their own from the command line
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `calculator` - Math expression evaluation
//! - `search` - Web search providers
//! - `agent` - Tool-calling agent loop
//! - `narration` - Paced, kid-friendly display events
//! - `session` - In-memory chat history
//! - `cli` - Command line and web server
//!
//! # Example
//!
//! ```rust,no_run
//! use curio::agent::Agent;
//! use curio::config::Settings;
//! use curio::narration::{narrate, DisplayEvent, Pacing};
//! use futures::{pin_mut, StreamExt};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let agent = Agent::from_settings(&settings)?;
//!
//!     let events = narrate(agent.stream("Combien font 5 plus 3?"), Pacing::default());
//!     pin_mut!(events);
//!     while let Some(event) = events.next().await {
//!         if let DisplayEvent::Answer { text } = event {
//!             println!("{}", text);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod calculator;
pub mod cli;
pub mod config;
pub mod error;
pub mod narration;
pub mod openai;
pub mod search;
pub mod session;

pub use error::{CurioError, Result};
