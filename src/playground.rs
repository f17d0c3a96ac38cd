//! HTTP playground for the registered agents.
//!
//! Exposes agent listing, runs and conversation history as JSON endpoints.

use crate::agent::ToolCallRecord;
use crate::error::SamtaleError;
use crate::registry::{AgentRegistry, AgentSummary};
use crate::storage::{ConversationSummary, ConversationTurn};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    registry: Arc<AgentRegistry>,
    request_timeout: Duration,
}

/// Build the playground router.
pub fn router(registry: Arc<AgentRegistry>, request_timeout: Duration) -> Router {
    let state = Arc::new(AppState {
        registry,
        request_timeout,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/playground/status", get(status))
        .route("/v1/playground/agents", get(list_agents))
        .route("/v1/playground/agents/{agent_id}/runs", post(run_agent))
        .route("/v1/playground/agents/{agent_id}/sessions", get(list_sessions))
        .route(
            "/v1/playground/agents/{agent_id}/sessions/{conversation_id}",
            get(get_session).delete(delete_session),
        )
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct RunRequest {
    message: String,
    /// Continue this conversation; a new one is started when absent.
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Serialize)]
struct RunResponse {
    agent_id: String,
    conversation_id: String,
    content: String,
    tool_calls: Vec<ToolCallRecord>,
    iterations: usize,
    incomplete: bool,
}

#[derive(Serialize)]
struct AgentListResponse {
    agents: Vec<AgentSummary>,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<ConversationSummary>,
}

#[derive(Serialize)]
struct SessionResponse {
    conversation_id: String,
    turns: Vec<ConversationTurn>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

impl IntoResponse for SamtaleError {
    fn into_response(self) -> Response {
        let status = match &self {
            SamtaleError::UnknownAgentId(_) => StatusCode::NOT_FOUND,
            SamtaleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            e if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        error_response(status, self.to_string())
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "playground": "available",
        "agents": state.registry.len(),
    }))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(AgentListResponse {
        agents: state.registry.list(),
    })
}

async fn run_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: std::result::Result<Json<RunRequest>, JsonRejection>,
) -> Response {
    // Unknown agents win over malformed bodies
    let agent = match state.registry.get(&agent_id) {
        Ok(agent) => agent,
        Err(e) => return e.into_response(),
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return SamtaleError::InvalidInput(rejection.body_text()).into_response();
        }
    };

    let conversation_id = req
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!("Run on {} in conversation {}", agent_id, conversation_id);

    let run = agent.respond(&conversation_id, &req.message);
    match tokio::time::timeout(state.request_timeout, run).await {
        Ok(Ok(response)) => Json(RunResponse {
            agent_id,
            conversation_id,
            content: response.content,
            tool_calls: response.tool_calls,
            iterations: response.iterations,
            incomplete: response.incomplete,
        })
        .into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(_) => {
            warn!(
                "Run on {} timed out after {}s",
                agent_id,
                state.request_timeout.as_secs()
            );
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("Agent run timed out after {} seconds", state.request_timeout.as_secs()),
            )
        }
    }
}

async fn list_sessions(State(state): State<Arc<AppState>>, Path(agent_id): Path<String>) -> Response {
    let agent = match state.registry.get(&agent_id) {
        Ok(agent) => agent,
        Err(e) => return e.into_response(),
    };

    match agent.sessions().await {
        Ok(sessions) => Json(SessionListResponse { sessions }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path((agent_id, conversation_id)): Path<(String, String)>,
) -> Response {
    let agent = match state.registry.get(&agent_id) {
        Ok(agent) => agent,
        Err(e) => return e.into_response(),
    };

    match agent.history(&conversation_id).await {
        Ok(turns) if turns.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            format!("Conversation not found: {}", conversation_id),
        ),
        Ok(turns) => Json(SessionResponse {
            conversation_id,
            turns,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path((agent_id, conversation_id)): Path<(String, String)>,
) -> Response {
    let agent = match state.registry.get(&agent_id) {
        Ok(agent) => agent,
        Err(e) => return e.into_response(),
    };

    match agent.delete_session(&conversation_id).await {
        Ok(deleted) => Json(serde_json::json!({ "deleted": deleted })).into_response(),
        Err(e) => e.into_response(),
    }
}
