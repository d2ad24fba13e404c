//! CLI module for Curio.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Curio - watch an AI agent think
///
/// A kid-friendly chat that shows which tool (web search or calculator) the
/// agent picks to answer a question.
#[derive(Parser, Debug)]
#[command(name = "curio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat web page
    Serve {
        /// Host to bind to (defaults to server.host from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask one question and watch the agent think in the terminal
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Skip the pauses between steps
        #[arg(long)]
        fast: bool,
    },

    /// Start an interactive chat session in the terminal
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Skip the pauses between steps
        #[arg(long)]
        fast: bool,
    },

    /// Evaluate a math expression with the calculator tool
    Calc {
        /// Expression, e.g. "5 + 3" or "sqrt(16)"
        expression: String,
    },

    /// Run the internet search tool directly
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to search.max_results from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
