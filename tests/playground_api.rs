//! End-to-end tests for the HTTP playground.

use async_trait::async_trait;
use samtale::agent::{Agent, AgentDefinition};
use samtale::model::{ChatMessage, ModelBackend, ModelReply, ScriptedModel};
use samtale::playground;
use samtale::registry::AgentRegistry;
use samtale::storage::{ConversationStore, ConversationSummary, ConversationTurn, MemoryConversationStore};
use samtale::tools::{ToolDefinition, ToolRegistry};
use samtale::{Result, SamtaleError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Model that never answers in time.
struct SlowModel;

#[async_trait]
impl ModelBackend for SlowModel {
    fn id(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _messages: &[ChatMessage], _tools: &[ToolDefinition]) -> Result<ModelReply> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ModelReply::Answer("too late".to_string()))
    }
}

fn agent(id: &str, model: Arc<dyn ModelBackend>, store: Arc<dyn ConversationStore>) -> Agent {
    Agent::new(
        AgentDefinition::new(id, "Echo Agent").role("Repeats things").with_history(4),
        model,
        ToolRegistry::new(),
        store,
    )
    .unwrap()
}

/// Serve a playground on an ephemeral port and return its base URL.
async fn spawn_playground(store: Arc<dyn ConversationStore>) -> String {
    let echo = ScriptedModel::new("echo-model", |messages, _| {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(ModelReply::Answer(format!("echo: {}", last)))
    });
    let down = ScriptedModel::new("down-model", |_, _| {
        Err(SamtaleError::ModelUnavailable("connection refused".to_string()))
    });

    let mut registry = AgentRegistry::new();
    registry.register(agent("echo-agent", Arc::new(echo), store.clone())).unwrap();
    registry.register(agent("down-agent", Arc::new(down), store.clone())).unwrap();
    registry.register(agent("slow-agent", Arc::new(SlowModel), store)).unwrap();

    let app = playground::router(Arc::new(registry), Duration::from_millis(200));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn run_raw(client: &reqwest::Client, base: &str, agent_id: &str, body: &str) -> reqwest::Response {
    client
        .post(format!("{}/v1/playground/agents/{}/runs", base, agent_id))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

async fn run(client: &reqwest::Client, base: &str, agent_id: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/v1/playground/agents/{}/runs", base, agent_id))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_and_listing() {
    let base = spawn_playground(Arc::new(MemoryConversationStore::new())).await;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{}/health", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "ok");

    let status: Value = client
        .get(format!("{}/v1/playground/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["agents"], 3);

    let agents: Value = client
        .get(format!("{}/v1/playground/agents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<_> = agents["agents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["agent_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["echo-agent", "down-agent", "slow-agent"]);
    assert_eq!(agents["agents"][0]["model"], "echo-model");
    assert_eq!(agents["agents"][0]["role"], "Repeats things");
}

#[tokio::test]
async fn test_conversation_lifecycle() {
    let store: Arc<dyn ConversationStore> = Arc::new(MemoryConversationStore::new());
    let base = spawn_playground(store.clone()).await;
    let client = reqwest::Client::new();

    let response = run(&client, &base, "echo-agent", json!({"message": "hello"})).await;
    assert_eq!(response.status(), 200);
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["content"], "echo: hello");
    assert_eq!(first["incomplete"], false);

    let conversation_id = first["conversation_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&conversation_id).is_ok());

    let second: Value = run(
        &client,
        &base,
        "echo-agent",
        json!({"message": "again", "conversation_id": conversation_id}),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(second["conversation_id"], conversation_id.as_str());

    let sessions: Value = client
        .get(format!("{}/v1/playground/agents/echo-agent/sessions", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sessions["sessions"][0]["conversation_id"], conversation_id.as_str());
    assert_eq!(sessions["sessions"][0]["turn_count"], 4);
    assert_eq!(sessions["sessions"][0]["title"], "hello");

    let session_url = format!("{}/v1/playground/agents/echo-agent/sessions/{}", base, conversation_id);
    let session: Value = client.get(&session_url).send().await.unwrap().json().await.unwrap();
    let turns = session["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[1]["role"], "agent");
    assert_eq!(turns[3]["sequence"], 4);

    let deleted: Value = client.delete(&session_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(deleted["deleted"], 4);

    let missing = client.get(&session_url).send().await.unwrap();
    assert_eq!(missing.status(), 404);
    assert!(store.history("echo_agent", &conversation_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_statuses() {
    let store: Arc<dyn ConversationStore> = Arc::new(MemoryConversationStore::new());
    let base = spawn_playground(store.clone()).await;
    let client = reqwest::Client::new();

    let unknown = run(&client, &base, "nonexistent-agent", json!({"message": "hi", "conversation_id": "c1"})).await;
    assert_eq!(unknown.status(), 404);
    let body: Value = unknown.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("nonexistent-agent"));

    let empty = run(&client, &base, "echo-agent", json!({"message": "   "})).await;
    assert_eq!(empty.status(), 400);

    let down = run(&client, &base, "down-agent", json!({"message": "hi", "conversation_id": "c1"})).await;
    assert_eq!(down.status(), 503);
    assert!(store.history("down_agent", "c1").await.unwrap().is_empty());

    let slow = run(&client, &base, "slow-agent", json!({"message": "hi", "conversation_id": "c1"})).await;
    assert_eq!(slow.status(), 504);
    assert!(store.history("slow_agent", "c1").await.unwrap().is_empty());

    // Malformed bodies are invalid input, reported as JSON
    for body in [r#"{"conversation_id":"c1"}"#, "{not json", r#"{"message": 42}"#] {
        let rejected = run_raw(&client, &base, "echo-agent", body).await;
        assert_eq!(rejected.status(), 400, "body: {}", body);
        let error: Value = rejected.json().await.unwrap();
        assert!(error["error"].as_str().unwrap().starts_with("Invalid input"));
    }
    assert!(store.history("echo_agent", "c1").await.unwrap().is_empty());

    // The agent ID is checked before the body
    let unknown_empty = run_raw(&client, &base, "nonexistent-agent", "{}").await;
    assert_eq!(unknown_empty.status(), 404);
    let error: Value = unknown_empty.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("nonexistent-agent"));

    let sessions = client
        .get(format!("{}/v1/playground/agents/nonexistent-agent/sessions", base))
        .send()
        .await
        .unwrap();
    assert_eq!(sessions.status(), 404);
}

#[tokio::test]
async fn test_concurrent_runs_in_one_conversation() {
    let store: Arc<dyn ConversationStore> = Arc::new(MemoryConversationStore::new());
    let base = spawn_playground(store.clone()).await;
    let client = reqwest::Client::new();

    let runs = (0..8).map(|i| {
        let client = client.clone();
        let base = base.clone();
        async move {
            run(
                &client,
                &base,
                "echo-agent",
                json!({"message": format!("m{}", i), "conversation_id": "shared"}),
            )
            .await
            .status()
        }
    });
    for status in futures::future::join_all(runs).await {
        assert_eq!(status, 200);
    }

    let turns = store.history("echo_agent", "shared").await.unwrap();
    assert_eq!(turns.len(), 16);
    let sequences: Vec<u64> = turns.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, (1..=16).collect::<Vec<u64>>());
}

/// Store that refuses every write.
struct ReadOnlyStore(MemoryConversationStore);

#[async_trait]
impl ConversationStore for ReadOnlyStore {
    async fn append(
        &self,
        _table: &str,
        _conversation_id: &str,
        _turns: &[ConversationTurn],
    ) -> Result<Vec<ConversationTurn>> {
        Err(SamtaleError::StorageUnavailable("database is locked".to_string()))
    }

    async fn recent(&self, table: &str, conversation_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        self.0.recent(table, conversation_id, limit).await
    }

    async fn history(&self, table: &str, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        self.0.history(table, conversation_id).await
    }

    async fn list_conversations(&self, table: &str) -> Result<Vec<ConversationSummary>> {
        self.0.list_conversations(table).await
    }

    async fn delete_conversation(&self, table: &str, conversation_id: &str) -> Result<usize> {
        self.0.delete_conversation(table, conversation_id).await
    }
}

#[tokio::test]
async fn test_unavailable_store_is_service_unavailable() {
    let store: Arc<dyn ConversationStore> = Arc::new(ReadOnlyStore(MemoryConversationStore::new()));
    let base = spawn_playground(store.clone()).await;
    let client = reqwest::Client::new();

    let response = run(&client, &base, "echo-agent", json!({"message": "hi", "conversation_id": "c1"})).await;
    assert_eq!(response.status(), 503);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("database is locked"));
    assert!(store.history("echo_agent", "c1").await.unwrap().is_empty());
}
