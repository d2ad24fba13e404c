//! Agent system for answering questions with tool calling.
//!
//! Provides an LLM agent that can search the internet and evaluate math
//! expressions, and reports each reasoning step as it goes so the steps can
//! be shown to the child.

mod model;
mod runner;
mod tools;

pub use model::{ChatModel, ModelTurn, OpenAIChatModel};
pub use runner::{Agent, AgentStep};
pub use tools::{
    display_name, parse_tool_call, tool_definitions, ToolCall, ToolContext, CALCULATE,
    SEARCH_INTERNET,
};

#[cfg(test)]
pub(crate) use runner::tests as test_support;
