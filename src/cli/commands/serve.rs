//! Serve command: run the HTTP playground.

use super::open_registry;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::playground;
use std::sync::Arc;
use std::time::Duration;

/// Run the playground server until interrupted.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let registry = Arc::new(open_registry(&settings)?);

    // The playground starts without a model; runs fail with 503 until it is up
    if let Err(e) = preflight::probe_model_endpoint(&settings.model).await {
        Output::warning(&format!("{}", e));
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let timeout = Duration::from_secs(settings.server.request_timeout_seconds);

    let app = playground::router(Arc::clone(&registry), timeout);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Samtale Playground");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Agents:");
    for agent in registry.list() {
        Output::agent_info(&agent);
    }
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Status", "GET    /v1/playground/status");
    Output::kv("Agents", "GET    /v1/playground/agents");
    Output::kv("Run", "POST   /v1/playground/agents/{agent_id}/runs");
    Output::kv("Sessions", "GET    /v1/playground/agents/{agent_id}/sessions");
    Output::kv("Session", "GET    /v1/playground/agents/{agent_id}/sessions/{conversation_id}");
    Output::kv("Delete", "DELETE /v1/playground/agents/{agent_id}/sessions/{conversation_id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Output::info("Server stopped.");
    Ok(())
}
