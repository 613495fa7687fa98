use crate::config::GeneratorConfig;
use crate::generate::Orchestrator;
use crate::llm::LlmClient;
use crate::prelude::{eprintln, *};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use curricula_core::request::{CurriculumInput, ExamInput};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

type Reply = (StatusCode, Json<Value>);

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let config = GeneratorConfig::from(&global.provider);
    log::info!("Starting server with {config:?}");

    let orchestrator = Arc::new(Orchestrator::from_config(config)?);
    let addr = format!("{}:{}", options.host, options.port);

    if global.verbose {
        eprintln!("Listening on http://{}", addr);
        eprintln!("Curriculum endpoint: http://{}/api/generate-curriculum", addr);
        eprintln!("Exam endpoint: http://{}/api/generate-exam", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, router(orchestrator))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router<C: LlmClient + 'static>(orchestrator: Arc<Orchestrator<C>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::<C>))
        .route("/api/generate-curriculum", post(generate_curriculum::<C>))
        .route("/api/generate-exam", post(generate_exam::<C>))
        .layer(cors)
        .with_state(orchestrator)
}

async fn health<C: LlmClient + 'static>(
    State(orchestrator): State<Arc<Orchestrator<C>>>,
) -> Json<Value> {
    let config = orchestrator.config();
    Json(json!({
        "status": "ok",
        "mock": config.use_mock_data,
        "model": config.model,
    }))
}

async fn generate_curriculum<C: LlmClient + 'static>(
    State(orchestrator): State<Arc<Orchestrator<C>>>,
    Json(body): Json<Value>,
) -> Reply {
    let input: CurriculumInput = match serde_json::from_value(body) {
        Ok(input) => input,
        Err(e) => return bad_request(format!("Invalid request body: {e}")),
    };
    let request = match input.validate() {
        Ok(request) => request,
        Err(err) => return bad_request(err.to_string()),
    };

    log::info!(
        "Generating {}-week {} curriculum for {} ({})",
        request.duration_weeks,
        request.subject,
        request.grade,
        request.output_format
    );
    let budget = orchestrator.config().budget(input.timeout_ms);
    let response = orchestrator.generate_curriculum(&request, budget).await;

    ok(&response)
}

async fn generate_exam<C: LlmClient + 'static>(
    State(orchestrator): State<Arc<Orchestrator<C>>>,
    Json(body): Json<Value>,
) -> Reply {
    let input: ExamInput = match serde_json::from_value(body) {
        Ok(input) => input,
        Err(e) => return bad_request(format!("Invalid request body: {e}")),
    };
    let request = match input.validate() {
        Ok(request) => request,
        Err(err) => return bad_request(err.to_string()),
    };

    log::info!(
        "Generating {} exam for week {} ({})",
        request.subject,
        request.week_number,
        request.output_format
    );
    let budget = orchestrator.config().budget(input.timeout_ms);
    let response = orchestrator.generate_exam(&request, budget).await;

    ok(&response)
}

fn bad_request(message: String) -> Reply {
    log::info!("Rejected request: {message}");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn ok<T: Serialize>(body: &T) -> Reply {
    match serde_json::to_value(body) {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Failed to serialize response: {e}") })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::{orchestrator, Script, ScriptedClient};

    fn state(client: &ScriptedClient, use_mock_data: bool) -> State<Arc<Orchestrator<ScriptedClient>>> {
        State(Arc::new(orchestrator(client, use_mock_data)))
    }

    #[tokio::test]
    async fn test_missing_grade_is_rejected_without_a_call() {
        let client = ScriptedClient::reply("[]");
        let (status, Json(body)) = generate_curriculum(
            state(&client, false),
            Json(json!({"subject": "Science", "weeks": 3})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: grade");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrongly_typed_body_is_rejected() {
        let client = ScriptedClient::reply("[]");
        let (status, Json(body)) = generate_exam(
            state(&client, false),
            Json(json!({"subject": 42, "grade": "3rd Grade"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_curriculum_response() {
        let client = ScriptedClient::reply("unused");
        let (status, Json(body)) = generate_curriculum(
            state(&client, true),
            Json(json!({"subject": "Science", "grade": "5th Grade", "weeks": "3"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["curriculum"].as_array().unwrap().len(), 3);
        assert_eq!(body["curriculum"][0]["title"], "Science Fundamentals - Week 1");
        assert_eq!(body["source"], "mock");
        assert_eq!(body["degraded"], false);
        assert!(body.get("text").is_none());
    }

    #[tokio::test]
    async fn test_degraded_exam_response() {
        let client = ScriptedClient::new(Script::Fail(crate::error::Error::ExternalCall(
            "connection refused".to_string(),
        )));
        let (status, Json(body)) = generate_exam(
            state(&client, false),
            Json(json!({
                "subject": "Science",
                "grade": "5th Grade",
                "weekNumber": 2,
                "learningObjectives": "- Describe photosynthesis",
                "format": "text"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "mock_fallback");
        assert_eq!(body["degraded"], true);
        assert_eq!(body["exam"].as_array().unwrap().len(), 10);
        assert!(body["text"]
            .as_str()
            .unwrap()
            .starts_with("# Exam for 5th Grade - Science: Week 2"));
    }

    #[tokio::test]
    async fn test_raw_reply_is_passed_through() {
        let client = ScriptedClient::reply("Sorry, no curriculum today.");
        let (status, Json(body)) = generate_curriculum(
            state(&client, false),
            Json(json!({"subject": "Art", "grade": "1st Grade", "weeks": 1, "timeoutMs": 2000})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["curriculum"], "Sorry, no curriculum today.");
        assert_eq!(body["error"], "Failed to parse JSON response");
        assert_eq!(body["source"], "llm");
    }

    #[tokio::test]
    async fn test_health() {
        let client = ScriptedClient::reply("unused");
        let Json(body) = health(state(&client, true)).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["mock"], true);
        assert_eq!(body["model"], "anthropic/claude-3-opus:beta");
    }

    #[test]
    fn test_router_builds() {
        let client = ScriptedClient::reply("unused");
        let _router = router(Arc::new(orchestrator(&client, true)));
    }
}
