//! Tool definitions and implementations for the agent system.

use crate::calculator;
use crate::error::{CurioError, Result};
use crate::search::SearchProvider;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SEARCH_INTERNET: &str = "search_internet";
pub const CALCULATE: &str = "calculate";

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Search the internet.
    SearchInternet { query: String },

    /// Evaluate a math expression.
    Calculate { expression: String },
}

impl ToolCall {
    /// Name the model uses for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::SearchInternet { .. } => SEARCH_INTERNET,
            ToolCall::Calculate { .. } => CALCULATE,
        }
    }

    /// The single argument the tool was called with.
    pub fn input(&self) -> &str {
        match self {
            ToolCall::SearchInternet { query } => query,
            ToolCall::Calculate { expression } => expression,
        }
    }
}

/// Kid-facing name of a tool. Unknown tools keep their own name.
pub fn display_name(tool_name: &str) -> &str {
    match tool_name {
        SEARCH_INTERNET => "Recherche Internet",
        CALCULATE => "Calculatrice",
        other => other,
    }
}

/// Tool execution context with access to the search backend.
pub struct ToolContext {
    pub search: Arc<dyn SearchProvider>,
    pub max_results: usize,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(search: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            search,
            max_results,
        }
    }

    /// Execute a tool call and return the result as a string.
    ///
    /// Failures are returned as text so the model can read them.
    pub async fn execute(&self, tool: &ToolCall) -> String {
        debug!("Running {} on {:?}", tool.name(), tool.input());
        match tool {
            ToolCall::SearchInternet { query } => match self.execute_search(query).await {
                Ok(output) => output,
                Err(e) => {
                    warn!("Search failed: {}", e);
                    format!("Error searching: {}", e)
                }
            },
            ToolCall::Calculate { expression } => match calculator::evaluate(expression) {
                Ok(output) => output,
                Err(e) => format!("Error calculating: {}", e),
            },
        }
    }

    async fn execute_search(&self, query: &str) -> Result<String> {
        let hits = self.search.search(query, self.max_results).await?;
        Ok(serde_json::to_string(&hits)?)
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: SEARCH_INTERNET.to_string(),
                description: Some(
                    "Useful for when you need to do a search on the internet to find information \
                    that another tool can't find. Be specific with your input or ask about \
                    something that is new and latest."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: CALCULATE.to_string(),
                description: Some(
                    "Useful for when you need to answer questions about math. \
                    Use this for mathematical calculations."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "expression": {
                            "type": "string",
                            "description": "The math expression to evaluate, e.g. 5 + 3 or sqrt(16)"
                        }
                    },
                    "required": ["expression"]
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| CurioError::Agent(format!("Invalid tool arguments: {}", e)))?;

    let string_arg = |key: &str| -> Result<String> {
        args[key]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CurioError::Agent(format!("Missing '{}' argument", key)))
    };

    match name {
        SEARCH_INTERNET => Ok(ToolCall::SearchInternet {
            query: string_arg("query")?,
        }),
        CALCULATE => Ok(ToolCall::Calculate {
            expression: string_arg("expression")?,
        }),
        _ => Err(CurioError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchHit;
    use async_trait::async_trait;

    struct FixedSearch(std::result::Result<Vec<SearchHit>, String>);

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
            match &self.0 {
                Ok(hits) => Ok(hits.iter().take(max_results).cloned().collect()),
                Err(message) => Err(CurioError::Search(message.clone())),
            }
        }
    }

    fn context(search: FixedSearch) -> ToolContext {
        ToolContext::new(Arc::new(search), 5)
    }

    #[test]
    fn test_parse_search_tool() {
        let tool = parse_tool_call("search_internet", r#"{"query": "capitale de la France"}"#)
            .unwrap();
        assert_eq!(
            tool,
            ToolCall::SearchInternet {
                query: "capitale de la France".to_string()
            }
        );
        assert_eq!(tool.name(), "search_internet");
    }

    #[test]
    fn test_parse_calculate_tool() {
        let tool = parse_tool_call("calculate", r#"{"expression": "5 + 3"}"#).unwrap();
        assert_eq!(tool.input(), "5 + 3");
    }

    #[test]
    fn test_parse_rejects_bad_calls() {
        assert!(parse_tool_call("calculate", "{}").is_err());
        assert!(parse_tool_call("calculate", "not json").is_err());
        assert!(parse_tool_call("draw_picture", r#"{"prompt": "cat"}"#).is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("search_internet"), "Recherche Internet");
        assert_eq!(display_name("calculate"), "Calculatrice");
        assert_eq!(display_name("mystery"), "mystery");
    }

    #[test]
    fn test_definitions_cover_both_tools() {
        let names: Vec<_> = tool_definitions()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(names, vec!["search_internet", "calculate"]);
    }

    #[tokio::test]
    async fn test_calculate_success_and_failure() {
        let ctx = context(FixedSearch(Ok(vec![])));
        let ok = ctx
            .execute(&ToolCall::Calculate {
                expression: "5 + 3".to_string(),
            })
            .await;
        assert_eq!(ok, "8");

        let err = ctx
            .execute(&ToolCall::Calculate {
                expression: "5 / 0".to_string(),
            })
            .await;
        assert_eq!(err, "Error calculating: division by zero");
    }

    #[tokio::test]
    async fn test_search_returns_json_hits() {
        let hits = vec![SearchHit {
            title: "Paris".to_string(),
            href: "https://example.org/paris".to_string(),
            body: "Paris est la capitale de la France.".to_string(),
        }];
        let ctx = context(FixedSearch(Ok(hits.clone())));

        let output = ctx
            .execute(&ToolCall::SearchInternet {
                query: "capitale".to_string(),
            })
            .await;
        let parsed: Vec<SearchHit> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, hits);
    }

    #[tokio::test]
    async fn test_search_failure_becomes_text() {
        let ctx = context(FixedSearch(Err("offline".to_string())));
        let output = ctx
            .execute(&ToolCall::SearchInternet {
                query: "anything".to_string(),
            })
            .await;
        assert_eq!(output, "Error searching: Search failed: offline");
    }
}
