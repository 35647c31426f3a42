mod support;

use reqwest::StatusCode;
use serde_json::{json, Value};

use support::TestServer;

fn texts(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .map(|m| m["text"].as_str().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn register_post_and_read_back() {
    let server = TestServer::start().await;

    assert_eq!(server.register("Alice").await, StatusCode::CREATED);
    assert_eq!(server.register("Alice").await, StatusCode::CONFLICT);

    let response = server
        .post_as("/messages", "Alice")
        .json(&json!({"to": "Todos", "text": "hi", "type": "message"}))
        .send()
        .await
        .expect("post message");
    assert_eq!(response.status(), StatusCode::CREATED);

    let messages = server.messages_for("Alice", 10).await;
    assert_eq!(texts(&messages), vec!["hi", "entra na sala..."]);
    assert_eq!(
        messages[1],
        json!({
            "from": "Alice",
            "to": "Todos",
            "text": "entra na sala...",
            "type": "status",
            "time": messages[1]["time"].clone(),
        })
    );
    let time = messages[0]["time"].as_str().expect("time");
    assert_eq!(time.len(), 8);
    assert_eq!(time.matches(':').count(), 2);

    let participants: Vec<Value> = server
        .client
        .get(server.url("/participants"))
        .send()
        .await
        .expect("list participants")
        .json()
        .await
        .expect("participants json");
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["name"], "Alice");
    assert!(participants[0]["lastStatus"].is_i64());

    server.stop().await;
}

#[tokio::test]
async fn registration_rejects_bad_payloads() {
    let server = TestServer::start().await;

    for body in [json!({"name": ""}), json!({}), json!({"name": 42}), json!({"name": null})] {
        let response = server
            .client
            .post(server.url("/participants"))
            .json(&body)
            .send()
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }

    let response = server
        .client
        .post(server.url("/participants"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], "INVALID_ARGUMENT");

    // 名称按原样保存，带空白的是另一个参与者
    assert_eq!(server.register("Bob").await, StatusCode::CREATED);
    assert_eq!(server.register(" Bob").await, StatusCode::CREATED);
    assert_eq!(server.register(" Bob").await, StatusCode::CONFLICT);

    server.stop().await;
}

#[tokio::test]
async fn message_validation_comes_before_sender_check() {
    let server = TestServer::start().await;
    server.register("Alice").await;

    let invalid_bodies = [
        json!({"to": "", "text": "oi", "type": "message"}),
        json!({"to": "Todos", "text": "", "type": "message"}),
        json!({"to": "Todos", "text": 7, "type": "message"}),
        json!({"to": "Todos", "text": "oi", "type": "status"}),
        json!({"to": "Todos", "text": "oi", "type": "shout"}),
        json!({"text": "oi", "type": "message"}),
    ];
    for body in invalid_bodies {
        let status = server
            .post_as("/messages", "Alice")
            .json(&body)
            .send()
            .await
            .expect("post")
            .status();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }

    // 格式错误且发送者未知时仍是 422
    let status = server
        .post_as("/messages", "Ghost")
        .json(&json!({"to": "Todos", "text": "", "type": "message"}))
        .send()
        .await
        .expect("post")
        .status();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let status = server
        .post_as("/messages", "Ghost")
        .json(&json!({"to": "Todos", "text": "oi", "type": "message"}))
        .send()
        .await
        .expect("post")
        .status();
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = server
        .client
        .post(server.url("/messages"))
        .json(&json!({"to": "Todos", "text": "oi", "type": "message"}))
        .send()
        .await
        .expect("post")
        .status();
    assert_eq!(status, StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn private_messages_are_visible_only_to_their_parties() {
    let server = TestServer::start().await;
    for name in ["Alice", "Bob", "Carol"] {
        server.register(name).await;
    }

    let status = server
        .post_as("/messages", "Alice")
        .json(&json!({"to": "Bob", "text": "segredo", "type": "private_message"}))
        .send()
        .await
        .expect("post")
        .status();
    assert_eq!(status, StatusCode::CREATED);
    server
        .post_as("/messages", "Carol")
        .json(&json!({"to": "Bob", "text": "aberto", "type": "message"}))
        .send()
        .await
        .expect("post");

    let for_bob = server.messages_for("Bob", 50).await;
    assert!(texts(&for_bob).contains(&"segredo"));
    let for_alice = server.messages_for("Alice", 50).await;
    assert!(texts(&for_alice).contains(&"segredo"));
    let for_carol = server.messages_for("Carol", 50).await;
    assert!(!texts(&for_carol).contains(&"segredo"));
    // 普通消息对所有人可见，即使不是发给 Todos
    assert!(texts(&for_carol).contains(&"aberto"));

    let anonymous: Vec<Value> = server
        .client
        .get(server.url("/messages?limit=50"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    assert_eq!(
        texts(&anonymous),
        vec!["aberto", "entra na sala...", "entra na sala...", "entra na sala..."]
    );

    server.stop().await;
}

#[tokio::test]
async fn limit_is_validated_and_respected() {
    let server = TestServer::start().await;
    server.register("Alice").await;
    for i in 0..5 {
        server
            .post_as("/messages", "Alice")
            .json(&json!({"to": "Todos", "text": format!("msg {i}"), "type": "message"}))
            .send()
            .await
            .expect("post");
    }

    let latest = server.messages_for("Alice", 3).await;
    assert_eq!(texts(&latest), vec!["msg 4", "msg 3", "msg 2"]);

    let leading: Vec<Value> = server
        .get_as("/messages?limit=3x", "Alice")
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    assert_eq!(texts(&leading), vec!["msg 4", "msg 3", "msg 2"]);

    let fractional = server.get_as("/messages?limit=2.5", "Alice").send().await.expect("list");
    assert_eq!(fractional.status(), StatusCode::OK);
    let fractional: Vec<Value> = fractional.json().await.expect("json");
    assert_eq!(fractional.len(), 2);

    let response = server.get_as("/messages?limit=10abc", "Alice").send().await.expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let all: Vec<Value> = response.json().await.expect("json");
    // 五条消息加一条加入通知
    assert_eq!(all.len(), 6);

    for query in ["", "?limit=0", "?limit=-2", "?limit=abc", "?limit=0.5"] {
        let status = server
            .get_as(&format!("/messages{query}"), "Alice")
            .send()
            .await
            .expect("list")
            .status();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{query}");
    }

    server.stop().await;
}

#[tokio::test]
async fn accented_names_work_through_the_header() {
    let server = TestServer::start().await;
    assert_eq!(server.register("João").await, StatusCode::CREATED);

    let status = server
        .client
        .post(server.url("/messages"))
        .header(
            "User",
            reqwest::header::HeaderValue::from_bytes("João".as_bytes()).expect("header"),
        )
        .json(&json!({"to": "Todos", "text": "olá", "type": "message"}))
        .send()
        .await
        .expect("post")
        .status();
    assert_eq!(status, StatusCode::CREATED);

    server.stop().await;
}

#[tokio::test]
async fn whitespace_text_is_accepted_verbatim() {
    let server = TestServer::start().await;
    server.register("Alice").await;

    let status = server
        .post_as("/messages", "Alice")
        .json(&json!({"to": "Todos", "text": "   ", "type": "message"}))
        .send()
        .await
        .expect("post")
        .status();
    assert_eq!(status, StatusCode::CREATED);

    let messages = server.messages_for("Alice", 1).await;
    assert_eq!(messages[0]["text"], "   ");

    server.stop().await;
}

#[tokio::test]
async fn health_check() {
    let server = TestServer::start().await;
    let status = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health")
        .status();
    assert_eq!(status, StatusCode::OK);
    server.stop().await;
}
