//! End-to-end API tests over the router with a mock AI boundary

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use rapid_pipeline::ai::TextGenerator;
use rapid_pipeline::config::PipelineConfig;
use rapid_pipeline::error::Result;
use rapid_pipeline::server::routes::api_routes;
use rapid_pipeline::server::state::AppState;

struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("echo: {}", prompt))
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        _data: &[u8],
        _mime: &str,
    ) -> Result<String> {
        Ok(format!("echo-image: {}", prompt))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

fn test_router() -> Router {
    let config = PipelineConfig::default();
    let state = AppState::with_generator(config.clone(), Arc::new(EchoGenerator))
        .expect("state should build");
    Router::new()
        .nest("/api", api_routes(config.server.max_upload_size))
        .with_state(state)
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn file_json(name: &str, content: &[u8]) -> Value {
    json!({ "name": name, "content": BASE64.encode(content) })
}

#[tokio::test]
async fn extract_endpoint_returns_text() {
    let router = test_router();
    let (status, body) = post_json(
        &router,
        "/api/extract",
        json!({ "file": file_json("a.txt", b"Hello world") }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hello world");
    assert_eq!(body["ocr"], false);
}

#[tokio::test]
async fn extract_rejects_unsupported_types() {
    let router = test_router();
    let (status, body) = post_json(
        &router,
        "/api/extract",
        json!({ "file": file_json("binary.exe", b"\x00\x01") }),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["type"], "unsupported_type");
}

#[tokio::test]
async fn batch_endpoint_embeds_per_item_failures() {
    let router = test_router();
    let (status, body) = post_json(
        &router,
        "/api/process/batch",
        json!({
            "prompt": "Summarize",
            "files": [
                file_json("good.txt", b"fine"),
                file_json("bad.pdf", b"not a pdf"),
                file_json("also-good.txt", b"still fine"),
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    // Input order preserved, failure embedded inline
    assert_eq!(results[0]["file"], "good.txt");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["file"], "bad.pdf");
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[2]["success"], true);
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 1);
}

#[tokio::test]
async fn folder_endpoint_combined_mode() {
    let router = test_router();
    let (status, body) = post_json(
        &router,
        "/api/process/folder",
        json!({
            "prompt": "Summarize",
            "folder_structure": { "/": [file_json("a.txt", b"Hello world")] }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_files"], 1);
    assert_eq!(body["result"]["combined"], true);
    let response = body["result"]["response"].as_str().unwrap();
    assert!(response.contains("Summarize"));
    assert!(response.contains("Process this combined content from multiple files:"));
    assert!(response.contains("Hello world"));
}

#[tokio::test]
async fn job_lifecycle_reaches_completion() {
    let router = test_router();
    let (status, body) = post_json(
        &router,
        "/api/jobs/folder",
        json!({
            "prompt": "Summarize",
            "folder_structure": { "/": [file_json("a.txt", b"Hello world")] }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let job_id = body["job_id"].as_str().unwrap().to_string();

    // Poll until the background worker settles the job
    let mut last = Value::Null;
    for _ in 0..100 {
        let (status, body) = get_json(&router, &format!("/api/jobs/{}", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
        if last["status"] == "completed" || last["status"] == "failed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(last["status"], "completed");
    assert_eq!(last["progress"], 100);
    assert!(last["result"]["response"].is_string());
}

#[tokio::test]
async fn unknown_job_id_is_not_found_status() {
    let router = test_router();
    let (status, body) = get_json(
        &router,
        "/api/jobs/00000000-0000-0000-0000-000000000000",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "not-found" }));
}

#[tokio::test]
async fn format_endpoint_round_trips_json() {
    let router = test_router();
    let content = json!({"name": "alice", "scores": [1, 2, 3]});
    let (status, body) = post_json(
        &router,
        "/api/format",
        json!({ "content": content, "format": "json" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, content);
}
