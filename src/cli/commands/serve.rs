//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for question answering and raw search. The server
//! keeps no conversation state: callers send the history with each request.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::pipeline::Pipeline;
use crate::search::{consignee_filter, AnalyticsSummary, SearchHit, SearchIndex, SearchQuery};
use crate::state::{Turn, TurnState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
    index: Arc<dyn SearchIndex>,
    consignee_field: String,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'shipqna doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(&orchestrator)?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("shipqna API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Search", "POST /search");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router over the orchestrator's components.
fn router(orchestrator: &Orchestrator) -> crate::error::Result<Router> {
    let state = Arc::new(AppState {
        pipeline: orchestrator.pipeline()?,
        index: orchestrator.index(),
        consignee_field: orchestrator.settings().search.consignee_field.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .layer(cors)
        .with_state(state))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    consignee_codes: Vec<String>,
    #[serde(default)]
    intent: String,
    /// Generated when absent.
    #[serde(default)]
    conversation_id: Option<String>,
    /// Prior turns, oldest first.
    #[serde(default)]
    messages: Vec<Turn>,
}

#[derive(Serialize)]
struct AskResponse {
    conversation_id: String,
    answer: String,
    messages: Vec<Turn>,
    hits: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analytics: Option<AnalyticsSummary>,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    consignee_codes: Vec<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn bad_request(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Requests without a non-blank consignee code are refused, never searched unscoped.
const MISSING_SCOPE: &str = "consignee_codes must contain at least one consignee code";

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    if req.question.trim().is_empty() {
        return bad_request("question must not be empty");
    }
    if consignee_filter(&state.consignee_field, &req.consignee_codes).is_none() {
        return bad_request(MISSING_SCOPE);
    }

    let turn = match req.conversation_id {
        Some(id) => TurnState::new(id),
        None => TurnState::with_random_id(),
    }
    .with_consignees(req.consignee_codes)
    .with_intent(req.intent)
    .with_history(req.messages);

    let result = state.pipeline.ask(turn, &req.question).await;

    Json(AskResponse {
        answer: result.answer().to_string(),
        conversation_id: result.conversation_id,
        messages: result.messages,
        hits: result.hits,
        analytics: result.idx_analytics,
        errors: result.errors,
    })
    .into_response()
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let Some(filter) = consignee_filter(&state.consignee_field, &req.consignee_codes) else {
        return bad_request(MISSING_SCOPE);
    };
    let query = SearchQuery::new(req.query, req.limit).with_filter(filter);

    match state.index.search(&query).await {
        Ok(results) => Json(SearchResponse {
            results: results.hits,
        })
        .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::search::{IndexDocument, MemorySearchIndex};
    use crate::testing::{FailingIndex, StubChat};
    use serde_json::{json, Value};

    async fn seeded_index() -> Arc<dyn SearchIndex> {
        let index = Arc::new(MemorySearchIndex::new());
        let docs: Vec<IndexDocument> = [
            json!({"doc_id": "1", "carrier": "ACME", "consignee_codes": ["C1"]}),
            json!({"doc_id": "2", "carrier": "ACME", "consignee_codes": ["C2"]}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        index.upload(&docs).await.unwrap();
        index
    }

    async fn spawn_server(index: Arc<dyn SearchIndex>, chat: Arc<StubChat>) -> String {
        let orchestrator =
            Orchestrator::with_components(Settings::default(), Prompts::default(), index, chat);
        let app = router(&orchestrator).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post(base: &str, path: &str, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}{}", base, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_server(seeded_index().await, Arc::new(StubChat::replying("ok"))).await;
        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ask_continues_conversation() {
        let chat = Arc::new(StubChat::replying("Carried by ACME."));
        let base = spawn_server(seeded_index().await, chat.clone()).await;

        let body: Value = post(
            &base,
            "/ask",
            json!({
                "question": "acme",
                "consignee_codes": ["C1"],
                "conversation_id": "conv-9",
                "messages": [
                    {"kind": "human", "content": "hello"},
                    {"kind": "assistant", "content": "hi"}
                ]
            }),
        )
        .await
        .json()
        .await
        .unwrap();

        assert_eq!(body["conversation_id"], "conv-9");
        assert_eq!(body["answer"], "Carried by ACME.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["hits"].as_array().unwrap().len(), 1);
        assert_eq!(body["hits"][0]["doc_id"], "1");
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_question() {
        let base = spawn_server(seeded_index().await, Arc::new(StubChat::replying("ok"))).await;
        let response = post(&base, "/ask", json!({"question": "  ", "consignee_codes": ["C1"]})).await;
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_requires_consignee_scope() {
        let chat = Arc::new(StubChat::replying("ok"));
        let base = spawn_server(seeded_index().await, chat.clone()).await;

        for body in [
            json!({"question": "acme"}),
            json!({"question": "acme", "consignee_codes": []}),
            json!({"question": "acme", "consignee_codes": ["", "  "]}),
        ] {
            let response = post(&base, "/ask", body).await;
            assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
            let error: Value = response.json().await.unwrap();
            assert!(error["error"].as_str().unwrap().contains("consignee_codes"));
        }
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_is_scoped() {
        let base = spawn_server(seeded_index().await, Arc::new(StubChat::replying("ok"))).await;
        let body: Value = post(&base, "/search", json!({"query": "acme", "consignee_codes": ["C2"]}))
            .await
            .json()
            .await
            .unwrap();

        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["doc_id"], "2");
    }

    #[tokio::test]
    async fn test_search_requires_consignee_scope() {
        let base = spawn_server(seeded_index().await, Arc::new(StubChat::replying("ok"))).await;

        for body in [
            json!({"query": "acme"}),
            json!({"query": "*", "consignee_codes": [" "]}),
        ] {
            let response = post(&base, "/search", body).await;
            assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_search_failure_is_bad_gateway() {
        let base = spawn_server(Arc::new(FailingIndex), Arc::new(StubChat::replying("ok"))).await;

        let response = post(&base, "/search", json!({"query": "acme", "consignee_codes": ["C1"]})).await;
        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("503"));
    }
}
