//! Agent runner with tool calling loop.

use super::model::{ChatModel, OpenAIChatModel};
use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::config::Settings;
use crate::error::{CurioError, Result};
use crate::search::DuckDuckGoSearch;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use async_stream::try_stream;
use futures::Stream;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Default system prompt for the agent.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a friendly assistant talking with a child.

You have two tools:
- 'calculate' evaluates a math expression such as "5 + 3" or "sqrt(16)"
- 'search_internet' looks things up on the internet

Use 'calculate' for any arithmetic instead of computing in your head.
Use 'search_internet' for facts you are not sure about or that may have changed.

Answer in the same language as the question, with short and simple sentences a child can understand."#;

/// One observable step of the agent's reasoning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStep {
    /// Text produced by the model. The last one is the answer.
    Thought { content: String },

    /// The model asked for a tool.
    ToolRequested {
        name: String,
        arguments: serde_json::Value,
    },

    /// A tool finished and its output went back to the model.
    ToolResult { name: String, content: String },
}

/// Agent that answers questions using the search and calculator tools.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    max_iterations: usize,
    system_prompt: String,
}

impl Agent {
    /// Create a new agent with the given model and tool context.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolContext) -> Self {
        Self {
            model,
            tools,
            max_iterations: 10,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Build the OpenAI-backed agent described by the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let model = Arc::new(OpenAIChatModel::from_settings(settings)?);
        let search = Arc::new(DuckDuckGoSearch::new(&settings.search)?);
        let tools = ToolContext::new(search, settings.search.max_results);

        let mut agent = Self::new(model, tools).with_max_iterations(settings.agent.max_iterations);
        if let Some(prompt) = settings.agent.system_prompt.as_deref() {
            agent = agent.with_system_prompt(prompt);
        }
        Ok(agent)
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run the agent on a question, yielding each step as it happens.
    ///
    /// The stream ends after the model answers without requesting tools.
    pub fn stream<'a>(&'a self, question: &'a str) -> impl Stream<Item = Result<AgentStep>> + Send + 'a {
        try_stream! {
            info!("Agent question: {}", question);

            let system = ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| CurioError::Agent(e.to_string()))?;
            let user = ChatCompletionRequestUserMessageArgs::default()
                .content(question)
                .build()
                .map_err(|e| CurioError::Agent(e.to_string()))?;

            let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
            messages.push(system.into());
            messages.push(user.into());
            let definitions = tool_definitions();

            for iteration in 1..=self.max_iterations {
                debug!("Agent iteration {}", iteration);

                let turn = self.model.complete(&messages, &definitions).await?;
                let content = turn.content.filter(|c| !c.trim().is_empty());

                if let Some(text) = &content {
                    yield AgentStep::Thought { content: text.clone() };
                }

                if turn.tool_calls.is_empty() {
                    return;
                }

                for tool_call in &turn.tool_calls {
                    yield AgentStep::ToolRequested {
                        name: tool_call.function.name.clone(),
                        arguments: parse_arguments(&tool_call.function.arguments),
                    };
                }

                // Add assistant message with tool calls to history
                let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
                assistant.tool_calls(turn.tool_calls.clone());
                if let Some(text) = content {
                    assistant.content(text);
                }
                messages.push(
                    assistant
                        .build()
                        .map_err(|e| CurioError::Agent(e.to_string()))?
                        .into(),
                );

                for tool_call in &turn.tool_calls {
                    let result = self.execute_tool_call(tool_call).await;

                    messages.push(
                        ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(&tool_call.id)
                            .content(result.clone())
                            .build()
                            .map_err(|e| CurioError::Agent(e.to_string()))?
                            .into(),
                    );

                    yield AgentStep::ToolResult {
                        name: tool_call.function.name.clone(),
                        content: result,
                    };
                }
            }

            Err::<(), _>(CurioError::Agent(format!(
                "Agent exceeded maximum iterations ({})",
                self.max_iterations
            )))?;
        }
    }

    /// Execute a single tool call and return its textual result.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> String {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        match parse_tool_call(name, arguments) {
            Ok(tool) => self.tools.execute(&tool).await,
            Err(e) => format!("Failed to parse tool call: {}", e),
        }
    }
}

/// Tool arguments as JSON, falling back to the raw text when malformed.
fn parse_arguments(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::model::ModelTurn;
    use crate::search::{SearchHit, SearchProvider};
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionCall};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Model that replays a fixed script of turns.
    pub(crate) struct ScriptedModel {
        turns: Mutex<VecDeque<ModelTurn>>,
        pub(crate) seen: Mutex<Vec<usize>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ChatCompletionRequestMessage],
            _tools: &[ChatCompletionTool],
        ) -> Result<ModelTurn> {
            self.seen.lock().unwrap().push(messages.len());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CurioError::OpenAI("script exhausted".to_string()))
        }
    }

    pub(crate) struct NoSearch;

    #[async_trait]
    impl SearchProvider for NoSearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                title: format!("About {}", query),
                href: "https://example.org".to_string(),
                body: "Some facts.".to_string(),
            }])
        }
    }

    pub(crate) fn tool_turn(content: Option<&str>, name: &str, arguments: &str) -> ModelTurn {
        ModelTurn {
            content: content.map(str::to_string),
            tool_calls: vec![ChatCompletionMessageToolCall {
                id: format!("call_{}", name),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
        }
    }

    pub(crate) fn text_turn(content: &str) -> ModelTurn {
        ModelTurn {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
        }
    }

    pub(crate) fn agent_with(turns: Vec<ModelTurn>) -> (Agent, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::new(turns));
        let tools = ToolContext::new(Arc::new(NoSearch), 5);
        (Agent::new(model.clone(), tools), model)
    }

    async fn collect(agent: &Agent, question: &str) -> Vec<Result<AgentStep>> {
        agent.stream(question).collect().await
    }

    #[tokio::test]
    async fn test_calculator_round_trip() {
        let (agent, model) = agent_with(vec![
            tool_turn(None, "calculate", r#"{"expression": "5 + 3"}"#),
            text_turn("5 plus 3 font 8 !"),
        ]);

        let steps: Vec<AgentStep> = collect(&agent, "Combien font 5 plus 3?")
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            steps,
            vec![
                AgentStep::ToolRequested {
                    name: "calculate".to_string(),
                    arguments: serde_json::json!({"expression": "5 + 3"}),
                },
                AgentStep::ToolResult {
                    name: "calculate".to_string(),
                    content: "8".to_string(),
                },
                AgentStep::Thought {
                    content: "5 plus 3 font 8 !".to_string(),
                },
            ]
        );

        // system + user, then + assistant + tool
        assert_eq!(*model.seen.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_thought_alongside_tool_call() {
        let (agent, _) = agent_with(vec![
            tool_turn(Some("Je vais chercher."), "search_internet", r#"{"query": "soleil"}"#),
            text_turn("Le soleil est une étoile."),
        ]);

        let steps = collect(&agent, "C'est quoi le soleil?").await;
        assert_eq!(steps.len(), 4);
        assert!(matches!(
            steps[0].as_ref().unwrap(),
            AgentStep::Thought { content } if content == "Je vais chercher."
        ));
        match steps[2].as_ref().unwrap() {
            AgentStep::ToolResult { name, content } => {
                assert_eq!(name, "search_internet");
                assert!(content.contains("About soleil"));
            }
            other => panic!("Expected tool result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_content_is_not_a_thought() {
        let (agent, _) = agent_with(vec![text_turn("   ")]);
        let steps = collect(&agent, "hello").await;
        assert!(steps.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_result_is_reported_to_model() {
        let (agent, _) = agent_with(vec![
            tool_turn(None, "draw", r#"{"what": "cat"}"#),
            text_turn("Je ne peux pas dessiner."),
        ]);
        let steps = collect(&agent, "Dessine un chat").await;
        match steps[1].as_ref().unwrap() {
            AgentStep::ToolResult { content, .. } => {
                assert_eq!(content, "Failed to parse tool call: Agent error: Unknown tool: draw");
            }
            other => panic!("Expected tool result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let turns = (0..3)
            .map(|_| tool_turn(None, "calculate", r#"{"expression": "1+1"}"#))
            .collect();
        let (agent, _) = agent_with(turns);
        let agent = agent.with_max_iterations(2);

        let steps = collect(&agent, "loop").await;
        let last = steps.last().unwrap();
        assert!(last.is_err());
        assert!(last
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("maximum iterations (2)"));
    }

    #[tokio::test]
    async fn test_model_error_ends_stream() {
        let (agent, _) = agent_with(vec![]);
        let steps = collect(&agent, "anything").await;
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].as_ref().unwrap_err().to_string(),
            "OpenAI API error: script exhausted"
        );
    }

    #[test]
    fn test_parse_arguments_keeps_malformed_text() {
        assert_eq!(
            parse_arguments("5 + 3"),
            serde_json::Value::String("5 + 3".to_string())
        );
        assert_eq!(parse_arguments(r#"{"a": 1}"#), serde_json::json!({"a": 1}));
    }
}
