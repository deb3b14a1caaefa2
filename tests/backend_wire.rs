use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wolfcall::generation::{
    GatewaySettings, Generated, GenerationGateway, GenerationRequest, RequestKind, VoteReport,
};
use wolfcall::llm::{GeminiProvider, OpenAiProvider, Provider};
use wolfcall::protocol::{Role, Talk};

fn settings(model: &str) -> GatewaySettings {
    GatewaySettings {
        talk_model: model.into(),
        analysis_model: model.into(),
        temperature: 0.7,
        call_timeout: Duration::from_secs(5),
        attempts: 3,
    }
}

fn talk_request() -> GenerationRequest {
    GenerationRequest {
        kind: RequestKind::Talk,
        behavior: Role::Villager,
        me: 2,
        alive: vec![1, 2, 3, 4, 5],
        dead: vec![],
        history: vec![Talk {
            agent: 1,
            day: 1,
            text: "Who do you all suspect?".into(),
            turn: 0,
        }],
        directed: None,
        candidates: vec![],
    }
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

#[tokio::test]
async fn openai_request_carries_model_and_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o", "max_tokens": 200})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("Hello there.")))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let provider = OpenAiProvider::new(Some("test-key"), Some(&base), 200);
    let text = provider
        .chat_with_system(Some("system"), "user", "gpt-4o", 0.7)
        .await
        .unwrap();
    assert_eq!(text, "Hello there.");
    server.verify().await;
}

#[tokio::test]
async fn gateway_normalizes_openai_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("Agent[02]: I think (honestly) Agent[04] is lying.")),
        )
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(Some("k"), Some(&base), 200));
    let gateway = GenerationGateway::new(provider, settings("gpt-4o")).unwrap();
    assert_eq!(
        gateway.generate(&talk_request()).await,
        Generated::Text("I think honestly Agent[04] is lying.".into())
    );
}

#[tokio::test]
async fn server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(3)
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(Some("k"), Some(&base), 200));
    let gateway = GenerationGateway::new(provider, settings("gpt-4o")).unwrap();
    assert_eq!(gateway.generate(&talk_request()).await, Generated::Timeout);
    server.verify().await;
}

#[tokio::test]
async fn slow_backend_hits_the_call_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("too late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(Some("k"), Some(&base), 200));
    let gateway = GenerationGateway::new(
        provider,
        GatewaySettings {
            call_timeout: Duration::from_millis(50),
            ..settings("gpt-4o")
        },
    )
    .unwrap();
    assert_eq!(gateway.generate(&talk_request()).await, Generated::Timeout);
}

#[tokio::test]
async fn gemini_vote_extraction_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(query_param("key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Agent[01] -> Agent[03]\nAgent[04] -> Agent[00]"}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/v1beta", server.uri());
    let provider: Arc<dyn Provider> =
        Arc::new(GeminiProvider::new(Some("g-key"), Some(&base), 200));
    let gateway = GenerationGateway::new(provider, settings("gemini-2.0-flash")).unwrap();
    let round = talk_request().history;
    let votes = gateway.extract_vote_intentions(2, &round).await.unwrap();
    assert_eq!(
        votes,
        vec![
            VoteReport { actor: 1, target: 3 },
            VoteReport { actor: 4, target: 0 },
        ]
    );
    server.verify().await;
}
