//! Web server for the chat page.
//!
//! Serves the single-page UI and a small JSON API. Answers are streamed to
//! the page as Server-Sent Events, one event per [`DisplayEvent`].

use crate::agent::{Agent, AgentStep};
use crate::cli::Output;
use crate::config::{Settings, MISSING_API_KEY};
use crate::error::{CurioError, Result};
use crate::narration::{narrate, DisplayEvent, Pacing};
use crate::session::{ChatMessage, SessionStore};
use async_stream::stream;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{pin_mut, stream::BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    sessions: SessionStore,
    agent: Option<Agent>,
    agent_error: Option<String>,
    model: String,
    pacing: Pacing,
}

impl AppState {
    /// State with a ready agent.
    pub fn new(agent: Agent, model: &str, pacing: Pacing) -> Self {
        Self {
            sessions: SessionStore::new(),
            agent: Some(agent),
            agent_error: None,
            model: model.to_string(),
            pacing,
        }
    }

    /// State whose asks all fail with `error`, e.g. when no API key is set.
    pub fn without_agent(error: &str, model: &str, pacing: Pacing) -> Self {
        Self {
            sessions: SessionStore::new(),
            agent: None,
            agent_error: Some(error.to_string()),
            model: model.to_string(),
            pacing,
        }
    }

    /// Build the state described by the settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let pacing = Pacing::from_settings(&settings.pacing);
        let model = settings.agent.model.as_str();

        let mut state = if settings.resolve_api_key().is_none() {
            Self::without_agent(MISSING_API_KEY, model, pacing)
        } else {
            match Agent::from_settings(settings) {
                Ok(agent) => Self::new(agent, model, pacing),
                Err(e) => Self::without_agent(&e.to_string(), model, pacing),
            }
        };
        state.sessions = SessionStore::from_settings(&settings.server);
        state
    }
}

/// How often idle chat sessions are swept out.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

async fn sweep_idle_sessions(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let evicted = state.sessions.evict_idle().await;
        if evicted > 0 {
            info!(
                "Dropped {} idle chat sessions, {} still open",
                evicted,
                state.sessions.len().await
            );
        }
    }
}

/// Build the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}/messages",
            get(list_messages).delete(clear_messages),
        )
        .route("/api/sessions/{id}/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let state = Arc::new(AppState::from_settings(&settings));
    if let Some(error) = &state.agent_error {
        Output::warning(&format!("⚠️ {}", error));
    }

    tokio::spawn(sweep_idle_sessions(state.clone()));

    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Curio");
    println!();
    Output::success(&format!("Open http://{} in your browser", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat page", "GET    /");
    Output::kv("Health", "GET    /health");
    Output::kv("Status", "GET    /api/status");
    Output::kv("New session", "POST   /api/sessions");
    Output::kv("History", "GET    /api/sessions/:id/messages");
    Output::kv("Clear", "DELETE /api/sessions/:id/messages");
    Output::kv("Ask (SSE)", "POST   /api/sessions/:id/ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct StatusResponse {
    api_key_configured: bool,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
}

#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn session_error(e: CurioError) -> Response {
    match e {
        CurioError::SessionNotFound(_) => error_response(StatusCode::NOT_FOUND, e),
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(include_str!("../../../static/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        api_key_configured: state.agent.is_some(),
        model: state.model.clone(),
        error: state.agent_error.clone(),
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.sessions.create().await;
    info!("New chat session {}", session_id);
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.sessions.history(&id).await {
        Ok(messages) => Json(MessagesResponse { messages }).into_response(),
        Err(e) => session_error(e),
    }
}

async fn clear_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.sessions.clear(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => session_error(e),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Response {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Question must not be empty");
    }

    if let Err(e) = state
        .sessions
        .append(&id, ChatMessage::user(question.clone()))
        .await
    {
        return session_error(e);
    }

    Sse::new(answer_events(state, id, question))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Narrate the agent's answer as SSE events and record it in the session.
fn answer_events(
    state: Arc<AppState>,
    id: Uuid,
    question: String,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> + Send {
    stream! {
        let steps: BoxStream<'_, Result<AgentStep>> = match (&state.agent, &state.agent_error) {
            (Some(agent), _) => agent.stream(&question).boxed(),
            (None, error) => {
                let message = error.clone().unwrap_or_else(|| MISSING_API_KEY.to_string());
                futures::stream::once(async move { Err(CurioError::Config(message)) }).boxed()
            }
        };

        let events = narrate(steps, state.pacing.clone());
        pin_mut!(events);

        while let Some(event) = events.next().await {
            if let DisplayEvent::Answer { text } = &event {
                if let Err(e) = state.sessions.append(&id, ChatMessage::assistant(text.clone())).await {
                    warn!("Could not record answer: {}", e);
                }
            }
            yield Ok(to_sse(&event));
        }
    }
}

fn to_sse(event: &DisplayEvent) -> Event {
    Event::default()
        .event(event.kind())
        .json_data(event)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::{agent_with, text_turn, tool_turn};
    use crate::session::Role;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app_with(turns: Vec<crate::agent::ModelTurn>) -> (Router, Arc<AppState>) {
        let (agent, _) = agent_with(turns);
        let state = Arc::new(AppState::new(
            agent,
            "test-model",
            Pacing::default().instant(),
        ));
        (router(state.clone()), state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn new_session(app: &Router) -> Uuid {
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        json["session_id"].as_str().unwrap().parse().unwrap()
    }

    fn ask_request(id: &Uuid, question: &str) -> Request<Body> {
        Request::post(format!("/api/sessions/{}/ask", id))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "question": question }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let (app, _) = app_with(vec![]);

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<html"));
    }

    #[tokio::test]
    async fn test_ask_streams_events_and_records_history() {
        let (app, state) = app_with(vec![
            tool_turn(None, "calculate", r#"{"expression": "5 + 3"}"#),
            text_turn("The answer is 8"),
        ]);
        let id = new_session(&app).await;

        let response = app
            .clone()
            .oneshot(ask_request(&id, "  Combien font 5 plus 3?  "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("event: reasoning"));
        assert!(body.contains("event: tool_banner"));
        assert!(body.contains("event: answer_delta"));
        assert!(body.contains("event: answer\n"));
        assert!(body.contains(r#""text":"The answer is 8""#));

        let history = state.sessions.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "Combien font 5 plus 3?");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "The answer is 8");

        let response = app
            .oneshot(
                Request::get(format!("/api/sessions/{}/messages", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let (app, state) = app_with(vec![]);
        let id = new_session(&app).await;

        let response = app.oneshot(ask_request(&id, "   ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.sessions.history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (app, _) = app_with(vec![]);
        let id = Uuid::new_v4();

        let response = app
            .clone()
            .oneshot(ask_request(&id, "hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::get(format!("/api/sessions/{}/messages", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_idle_session_is_not_found() {
        let (app, state) = app_with(vec![text_turn("Bonjour")]);
        let id = new_session(&app).await;
        state.sessions.backdate(&id, chrono::Duration::days(1)).await;

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/sessions/{}/messages", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(ask_request(&id, "Salut")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_clear_messages() {
        let (app, state) = app_with(vec![text_turn("Bonjour")]);
        let id = new_session(&app).await;

        let response = app.clone().oneshot(ask_request(&id, "Salut")).await.unwrap();
        body_text(response).await;
        assert_eq!(state.sessions.history(&id).await.unwrap().len(), 2);

        let response = app
            .oneshot(
                Request::delete(format!("/api/sessions/{}/messages", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.sessions.history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_and_answered() {
        let state = Arc::new(AppState::without_agent(
            MISSING_API_KEY,
            "gpt-3.5-turbo",
            Pacing::default().instant(),
        ));
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["api_key_configured"], false);
        assert_eq!(json["error"], MISSING_API_KEY);

        let id = new_session(&app).await;
        let response = app.oneshot(ask_request(&id, "Bonjour")).await.unwrap();
        body_text(response).await;

        let history = state.sessions.history(&id).await.unwrap();
        assert!(history[1].content.starts_with("Error: Configuration error: OPENAI_API_KEY"));
    }
}
