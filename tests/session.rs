use rigscope::chat::client::SYSTEM_PROMPT;
use rigscope::chat::{CompletionClient, Role};
use rigscope::data::model::{Dataset, DeviceRecord};
use rigscope::error::CompletionError;
use rigscope::geo::GeoService;
use rigscope::pricing::PriceModelService;
use rigscope::pricing::forest::ForestParams;
use rigscope::{AppConfig, Session};

fn config(url: String) -> AppConfig {
    AppConfig {
        completion_url: url,
        model_namespace: Some("folder-1".into()),
        api_key: Some("secret".into()),
        ..AppConfig::default()
    }
}

fn reply(text: &str) -> String {
    serde_json::json!({
        "result": {
            "alternatives": [{ "message": { "role": "assistant", "text": text }, "status": "ALTERNATIVE_STATUS_FINAL" }],
            "modelVersion": "test"
        }
    })
    .to_string()
}

fn session(dir: &std::path::Path) -> Session {
    Session::new(
        PriceModelService::with_params(
            dir.join("model.json"),
            ForestParams {
                n_trees: 4,
                ..Default::default()
            },
        ),
        GeoService::new(None),
    )
}

#[test]
fn ask_records_both_turns_and_bumps_input_key() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Api-Key secret")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "modelUri": "gpt://folder-1/yandexgpt-4-lite/latest",
            "completionOptions": { "stream": false, "maxTokens": "2000" }
        })))
        .with_status(200)
        .with_body(reply("Get 32 GB."))
        .create();

    let client = CompletionClient::from_config(&config(server.url())).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());

    let answer = session.ask(&client, "How much RAM for video editing?").unwrap();
    assert_eq!(answer.content, "Get 32 GB.");
    assert_eq!(answer.source.as_deref(), Some("YandexGPT (yandexgpt-4-lite)"));

    let messages = session.transcript.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(session.input_key, 1);
    mock.assert();
}

#[test]
fn only_two_previous_turns_are_sent() {
    let mut server = mockito::Server::new();
    let warmup = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(reply("ok"))
        .expect(2)
        .create();

    let client = CompletionClient::from_config(&config(server.url())).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    session.ask(&client, "first?").unwrap();
    session.ask(&client, "second?").unwrap();
    warmup.assert();
    warmup.remove();

    let third = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "modelUri": "gpt://folder-1/yandexgpt-4-lite/latest",
            "completionOptions": { "stream": false, "temperature": 0.6, "maxTokens": "2000" },
            "messages": [
                { "role": "system", "text": SYSTEM_PROMPT },
                { "role": "user", "text": "second?" },
                { "role": "assistant", "text": "ok" },
                { "role": "user", "text": "third?" }
            ]
        })))
        .with_status(200)
        .with_body(reply("ok"))
        .create();

    session.ask(&client, "third?").unwrap();
    assert_eq!(session.transcript.len(), 6);
    third.assert();
}

#[test]
fn api_error_keeps_the_question() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/")
        .with_status(401)
        .with_body("unauthorized")
        .create();

    let client = CompletionClient::from_config(&config(server.url())).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());

    match session.ask(&client, "Is this GPU good?") {
        Err(CompletionError::Status { status: 401, body }) => assert_eq!(body, "unauthorized"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(session.transcript.len(), 1);
    assert_eq!(session.transcript.messages()[0].content, "Is this GPU good?");
}

#[test]
fn malformed_reply_is_an_error() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"result":{}}"#)
        .create();

    let client = CompletionClient::from_config(&config(server.url())).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());
    assert!(matches!(
        session.ask(&client, "hi"),
        Err(CompletionError::Malformed(_))
    ));
}

#[test]
fn missing_secrets_disable_chat_only() {
    let err = CompletionClient::from_config(&AppConfig::default()).unwrap_err();
    assert!(matches!(err, CompletionError::NotConfigured(_)));
    assert!(err.to_string().contains("RIGSCOPE_MODEL_NAMESPACE"));
}

#[test]
fn clearing_chat_keeps_model_and_location_caches() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path());

    let device = |brand: &str, price: f64| DeviceRecord {
        brand: Some(brand.into()),
        device_type: Some("Desktop".into()),
        cpu_brand: Some("AMD".into()),
        cpu_cores: Some(12.0),
        ram_gb: Some(32.0),
        storage_gb: Some(1024.0),
        gpu_brand: Some("NVIDIA".into()),
        display_size_in: Some(27.0),
        price: Some(price),
        release_year: Some(2024),
        ..Default::default()
    };
    let ds = Dataset::from_records(
        vec![device("Dell", 1500.0), device("HP", 1300.0), device("Acer", 1100.0)],
        vec![],
    );
    session.price_model.load(&ds).unwrap();
    session.geo.resolve_brands(&ds);
    session.transcript.push(rigscope::chat::ChatMessage::user("hello"));

    session.clear_chat();

    assert!(session.transcript.is_empty());
    assert_eq!(session.input_key, 1);
    assert!(session.price_model.cached().is_some());
    assert_eq!(session.geo.cache().len(), 3);
}
