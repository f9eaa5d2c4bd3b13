use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chatrelay_rs::config::{AppConfig, FeaturesConfig, Provider, ServerConfig, VendorConfig};
use chatrelay_rs::routing::dispatch::dispatch_request;
use chatrelay_rs::state::AppState;
use chatrelay_rs::transport::HttpTransport;
use serde_json::json;

fn groq_vendor(base_url: String, api_key_env: &str) -> VendorConfig {
    VendorConfig {
        name: "mock-groq".to_string(),
        provider: Provider::Groq,
        base_url: Some(base_url),
        api_key_env: api_key_env.to_string(),
        region: None,
        dataset: None,
        model: Some("llama-3.1-8b-instant".to_string()),
        is_default: true,
    }
}

fn build_state(vendors: Vec<VendorConfig>) -> Arc<AppState> {
    let config = AppConfig {
        server: ServerConfig::default(),
        vendors,
        features: FeaturesConfig::default(),
    };
    let transport = HttpTransport::new(&config.server);
    Arc::new(AppState::new(config, transport))
}

async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn post_json(
    state: &Arc<AppState>,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("build request");
    let response = dispatch_request(Arc::clone(state), request)
        .await
        .expect("dispatch");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn groq_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl_mock",
        "object": "chat.completion",
        "model": "llama-3.1-8b-instant",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
    })
}

#[tokio::test]
async fn test_groq_reply_extracted_verbatim() {
    std::env::set_var("CHATRELAY_IT_GROQ_OK", "upstream-secret");
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(groq_completion("pong")) }),
    );
    let base = spawn_upstream(app).await;
    let state = build_state(vec![groq_vendor(format!("{base}/v1"), "CHATRELAY_IT_GROQ_OK")]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "ping"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "pong"}));
}

#[tokio::test]
async fn test_query_alias_behaves_like_chat() {
    std::env::set_var("CHATRELAY_IT_GROQ_ALIAS", "upstream-secret");
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(groq_completion("aliased")) }),
    );
    let base = spawn_upstream(app).await;
    let state = build_state(vec![groq_vendor(
        format!("{base}/v1"),
        "CHATRELAY_IT_GROQ_ALIAS",
    )]);

    let (status, body) = post_json(&state, "/query", json!({"message": "ping"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "aliased"}));
}

#[tokio::test]
async fn test_gemini_reply_extracted_verbatim() {
    std::env::set_var("CHATRELAY_IT_GEMINI_OK", "gm-secret");
    let app = Router::new().route(
        "/v1beta/models/gemini-2.0-flash:generateContent",
        post(|| async {
            Json(json!({
                "candidates": [
                    {
                        "content": {"role": "model", "parts": [{"text": "General Kenobi."}]},
                        "finishReason": "STOP"
                    }
                ]
            }))
        }),
    );
    let base = spawn_upstream(app).await;
    let state = build_state(vec![VendorConfig {
        name: "mock-gemini".to_string(),
        provider: Provider::Gemini,
        base_url: Some(format!("{base}/v1beta")),
        api_key_env: "CHATRELAY_IT_GEMINI_OK".to_string(),
        region: None,
        dataset: None,
        model: Some("gemini-2.0-flash".to_string()),
        is_default: true,
    }]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "hello there"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "General Kenobi."}));
}

#[tokio::test]
async fn test_relevance_embedding_reply() {
    std::env::set_var("CHATRELAY_IT_RELEVANCE_OK", "rel-secret");
    let app = Router::new().route(
        "/latest/embeddings",
        post(|| async {
            Json(json!({
                "records": [{"embedding": [0.25, -1.5, 3.0]}]
            }))
        }),
    );
    let base = spawn_upstream(app).await;
    let state = build_state(vec![VendorConfig {
        name: "mock-relevance".to_string(),
        provider: Provider::Relevance,
        base_url: Some(format!("{base}/latest")),
        api_key_env: "CHATRELAY_IT_RELEVANCE_OK".to_string(),
        region: None,
        dataset: Some("fruits_dataset".to_string()),
        model: None,
        is_default: true,
    }]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "what is a kiwi"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "[0.25,-1.5,3.0]"}));
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    std::env::set_var("CHATRELAY_IT_EMPTY_MSG", "k");
    // The message check runs before any vendor work; the upstream is never needed.
    let state = build_state(vec![groq_vendor(
        "http://127.0.0.1:1/v1".to_string(),
        "CHATRELAY_IT_EMPTY_MSG",
    )]);

    for body in [json!({}), json!({"message": ""}), json!({"message": "   "})] {
        let (status, response) = post_json(&state, "/chat", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = response["error"].as_str().expect("error string");
        assert!(error.contains("No message provided"), "got: {error}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    std::env::set_var("CHATRELAY_IT_BAD_JSON", "k");
    let state = build_state(vec![groq_vendor(
        "http://127.0.0.1:1/v1".to_string(),
        "CHATRELAY_IT_BAD_JSON",
    )]);

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("build request");
    let response = dispatch_request(Arc::clone(&state), request)
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_api_key_fails_without_outbound_call() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream_hits = Arc::clone(&hits);
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move || {
            let hits = Arc::clone(&upstream_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(groq_completion("should never happen"))
            }
        }),
    );
    let base = spawn_upstream(app).await;
    // Deliberately never set in the environment.
    let state = build_state(vec![groq_vendor(
        format!("{base}/v1"),
        "CHATRELAY_IT_KEY_NEVER_SET",
    )]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "ping"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().expect("error string");
    assert!(error.contains("CHATRELAY_IT_KEY_NEVER_SET"), "got: {error}");
    assert_eq!(hits.load(Ordering::SeqCst), 0, "no outbound call expected");
}

#[tokio::test]
async fn test_upstream_error_surfaces_as_json_error() {
    std::env::set_var("CHATRELAY_IT_UPSTREAM_500", "k");
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"message": "model melted down"}})),
            )
        }),
    );
    let base = spawn_upstream(app).await;
    let state = build_state(vec![groq_vendor(
        format!("{base}/v1"),
        "CHATRELAY_IT_UPSTREAM_500",
    )]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "ping"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error = body["error"].as_str().expect("error string");
    assert!(error.contains("status=500"), "got: {error}");
    assert!(error.contains("model melted down"), "got: {error}");
}

#[tokio::test]
async fn test_transport_failure_surfaces_as_json_error() {
    std::env::set_var("CHATRELAY_IT_CONN_REFUSED", "k");
    let state = build_state(vec![groq_vendor(
        "http://127.0.0.1:1/v1".to_string(),
        "CHATRELAY_IT_CONN_REFUSED",
    )]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "ping"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error = body["error"].as_str().expect("error string");
    assert!(error.starts_with("Transport error:"), "got: {error}");
}

#[tokio::test]
async fn test_vendor_selected_by_name() {
    std::env::set_var("CHATRELAY_IT_MULTI", "k");
    let app_a = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(groq_completion("from-a")) }),
    );
    let app_b = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(groq_completion("from-b")) }),
    );
    let base_a = spawn_upstream(app_a).await;
    let base_b = spawn_upstream(app_b).await;

    let mut vendor_a = groq_vendor(format!("{base_a}/v1"), "CHATRELAY_IT_MULTI");
    vendor_a.name = "a".to_string();
    let mut vendor_b = groq_vendor(format!("{base_b}/v1"), "CHATRELAY_IT_MULTI");
    vendor_b.name = "b".to_string();
    vendor_b.is_default = false;
    let state = build_state(vec![vendor_a, vendor_b]);

    let (status, body) = post_json(&state, "/chat", json!({"message": "ping"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "from-a"}));

    let (status, body) =
        post_json(&state, "/chat", json!({"message": "ping", "vendor": "b"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "from-b"}));
}

#[tokio::test]
async fn test_unknown_vendor_is_rejected() {
    std::env::set_var("CHATRELAY_IT_UNKNOWN_VENDOR", "k");
    let state = build_state(vec![groq_vendor(
        "http://127.0.0.1:1/v1".to_string(),
        "CHATRELAY_IT_UNKNOWN_VENDOR",
    )]);

    let (status, body) = post_json(
        &state,
        "/chat",
        json!({"message": "ping", "vendor": "nope"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().expect("error string");
    assert!(error.contains("unknown vendor 'nope'"), "got: {error}");
}
