//! Integration tests for `AdviceGenerator` against a mocked chat API.

use std::collections::HashMap;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tikpulse_advice::{
    AccountContext, AdviceError, AdviceGenerator, ChatClient, VideoContext,
};
use tikpulse_core::build_app_config;
use tikpulse_extract::{
    derive_account_metrics, derive_rates, AccountMetrics, Counts, ExtractionResult, Niche,
    PerformanceLevel, ProfileSnapshot, DEFAULT_SAMPLE_SIZE,
};

fn generator(server: &MockServer) -> AdviceGenerator {
    let chat = ChatClient::new("sk-test", format!("{}/v1", server.uri()), "gpt-4o-mini", 5)
        .expect("failed to build test ChatClient");
    AdviceGenerator::new(chat)
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

fn sample_video() -> ExtractionResult {
    ExtractionResult {
        description: "Tarte aux pommes #recette".to_string(),
        counts: Counts {
            views: 1000,
            likes: 50,
            comments: 20,
            shares: 10,
            saves: 20,
        },
        ..ExtractionResult::default()
    }
}

#[tokio::test]
async fn video_advice_posts_json_mode_request_and_parses_report() {
    let server = MockServer::start().await;
    let reply = r#"```json
{"analysis":{"hook":"efficace"},"advice":[{"title":"Série","details":"Décline en 3 épisodes"}],"predictions":{"targetER":"7.8%"}}
```"#;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let result = sample_video();
    let rates = derive_rates(&result.counts, result.duration_seconds);
    let report = generator(&server)
        .video_advice(&VideoContext {
            username: "chef",
            result: &result,
            rates: &rates,
            niche: Niche::Cuisine,
            performance: rates.performance_level(),
        })
        .await
        .expect("advice should parse");

    assert_eq!(report.analysis["hook"], "efficace");
    assert_eq!(report.advice.len(), 1);
    assert_eq!(report.advice[0].title, "Série");
    assert_eq!(report.predictions["targetER"], "7.8%");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    let user_prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_prompt.contains("Compte: @chef"));
}

#[tokio::test]
async fn account_advice_uses_profile_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"analysis":{"positioning":"recettes rapides"},"advice":[],"predictions":{}}"#,
        )))
        .mount(&server)
        .await;

    let snapshot = ProfileSnapshot::default();
    let metrics = derive_account_metrics(&snapshot, DEFAULT_SAMPLE_SIZE);
    let report = generator(&server)
        .account_advice(&AccountContext {
            username: "chef",
            snapshot: &snapshot,
            metrics: &metrics,
            niche: Niche::Cuisine,
        })
        .await
        .unwrap();
    assert_eq!(report.analysis["positioning"], "recettes rapides");
    assert!(report.advice.is_empty());
}

#[tokio::test]
async fn api_errors_surface_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let snapshot = ProfileSnapshot::default();
    let metrics = AccountMetrics::default();
    let err = generator(&server)
        .account_advice(&AccountContext {
            username: "chef",
            snapshot: &snapshot,
            metrics: &metrics,
            niche: Niche::Lifestyle,
        })
        .await
        .unwrap_err();
    match err {
        AdviceError::Api { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_and_prose_replies_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Je ne peux pas répondre.")),
        )
        .mount(&server)
        .await;

    let result = sample_video();
    let rates = derive_rates(&result.counts, 0);
    let ctx = VideoContext {
        username: "chef",
        result: &result,
        rates: &rates,
        niche: Niche::Cuisine,
        performance: PerformanceLevel::Viral,
    };
    let gen = generator(&server);

    assert!(matches!(
        gen.video_advice(&ctx).await,
        Err(AdviceError::EmptyResponse)
    ));
    assert!(matches!(
        gen.video_advice(&ctx).await,
        Err(AdviceError::Parse(_))
    ));
}

#[test]
fn from_config_requires_key_and_toggle() {
    let env = |pairs: &[(&str, &str)]| {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        build_app_config(move |key| map.get(key).cloned().ok_or(std::env::VarError::NotPresent))
            .expect("valid config")
    };

    assert!(AdviceGenerator::from_config(&env(&[])).unwrap().is_none());
    assert!(AdviceGenerator::from_config(&env(&[
        ("OPENAI_API_KEY", "sk-x"),
        ("TIKPULSE_AI_ENABLED", "false"),
    ]))
    .unwrap()
    .is_none());
    assert!(AdviceGenerator::from_config(&env(&[("OPENAI_API_KEY", "sk-x")]))
        .unwrap()
        .is_some());
}
