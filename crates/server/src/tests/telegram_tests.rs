use super::*;

use std::sync::{Arc, Mutex};

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use shared::{
    error::ErrorCode,
    protocol::{Button, Interaction},
};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct FakeApi {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    photos: Arc<Mutex<Vec<Bytes>>>,
}

impl FakeApi {
    fn record(&self, method: &str, body: Value) {
        self.calls
            .lock()
            .expect("lock")
            .push((method.to_string(), body));
    }
}

async fn send_message(State(api): State<FakeApi>, Json(body): Json<Value>) -> Json<Value> {
    let rejected = body["chat_id"] == json!(-1);
    api.record("sendMessage", body);
    if rejected {
        return Json(json!({ "ok": false, "description": "Bad Request: chat not found" }));
    }
    Json(json!({ "ok": true, "result": { "message_id": 1 } }))
}

async fn send_photo(State(api): State<FakeApi>, body: Bytes) -> Json<Value> {
    api.photos.lock().expect("lock").push(body);
    Json(json!({ "ok": true, "result": { "message_id": 2 } }))
}

async fn answer_callback(State(api): State<FakeApi>, Json(body): Json<Value>) -> Json<Value> {
    api.record("answerCallbackQuery", body);
    Json(json!({ "ok": true, "result": true }))
}

async fn get_updates(State(api): State<FakeApi>, Json(body): Json<Value>) -> Json<Value> {
    api.record("getUpdates", body);
    Json(json!({
        "ok": true,
        "result": [{
            "update_id": 500,
            "callback_query": {
                "id": "cb",
                "from": { "id": 3, "is_bot": false, "first_name": "B" },
                "data": "btn:about"
            }
        }]
    }))
}

async fn spawn_fake_api() -> (TelegramClient, FakeApi) {
    let api = FakeApi::default();
    let app = Router::new()
        .route("/bottest-token/sendMessage", post(send_message))
        .route("/bottest-token/sendPhoto", post(send_photo))
        .route("/bottest-token/answerCallbackQuery", post(answer_callback))
        .route("/bottest-token/getUpdates", post(get_updates))
        .with_state(api.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let client = TelegramClient::new(
        &format!("http://{addr}/"),
        "test-token",
        Duration::from_secs(5),
    )
    .expect("client");
    (client, api)
}

#[tokio::test]
async fn menu_is_sent_as_inline_keyboard() {
    let (client, api) = spawn_fake_api().await;
    let menu = OutboundMessage::single_column_menu(
        "Choose a font:",
        vec![Button::new("Sans", &Interaction::SetFont("Sans.ttf".into()))],
    );
    client.deliver(ChatId(42), menu).await.expect("deliver");

    let calls = api.calls.lock().expect("lock").clone();
    assert_eq!(calls.len(), 1);
    let (method, body) = &calls[0];
    assert_eq!(method, "sendMessage");
    assert_eq!(body["chat_id"], json!(42));
    assert_eq!(body["text"], json!("Choose a font:"));
    assert_eq!(
        body["reply_markup"]["inline_keyboard"][0][0],
        json!({ "text": "Sans", "callback_data": "font:Sans.ttf" })
    );
}

#[tokio::test]
async fn plain_text_has_no_keyboard() {
    let (client, api) = spawn_fake_api().await;
    client
        .deliver(ChatId(42), OutboundMessage::text("hello"))
        .await
        .expect("deliver");
    let calls = api.calls.lock().expect("lock").clone();
    assert!(calls[0].1.get("reply_markup").is_none());
}

#[tokio::test]
async fn image_is_uploaded_as_multipart_png() {
    let (client, api) = spawn_fake_api().await;
    client
        .deliver(
            ChatId(42),
            OutboundMessage::Image {
                png: b"\x89PNG-bytes".to_vec(),
                caption: None,
            },
        )
        .await
        .expect("deliver");

    let photos = api.photos.lock().expect("lock").clone();
    assert_eq!(photos.len(), 1);
    let body = String::from_utf8_lossy(&photos[0]);
    assert!(body.contains("filename=\"render.png\""));
    assert!(body.contains("image/png"));
    assert!(body.contains("PNG-bytes"));
}

#[tokio::test]
async fn api_rejection_is_a_transport_error() {
    let (client, _api) = spawn_fake_api().await;
    let err = client
        .deliver(ChatId(-1), OutboundMessage::text("hello"))
        .await
        .expect_err("rejected");
    assert_eq!(err.code, ErrorCode::Transport);
    assert!(err.message.contains("chat not found"));
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error_without_token() {
    let client = TelegramClient::new("http://127.0.0.1:9", "secret-token", Duration::from_secs(2))
        .expect("client");
    let err = client
        .deliver(ChatId(1), OutboundMessage::text("hello"))
        .await
        .expect_err("unreachable");
    assert_eq!(err.code, ErrorCode::Transport);
    assert!(!err.message.contains("secret-token"));
}

#[tokio::test]
async fn acknowledges_callbacks_and_polls_updates() {
    let (client, api) = spawn_fake_api().await;
    client.acknowledge("cb-1").await.expect("ack");

    let updates = client
        .get_updates(Some(499), Duration::from_secs(0))
        .await
        .expect("updates");
    assert_eq!(updates.len(), 1);
    let query = updates[0].callback_query.as_ref().expect("callback");
    assert_eq!(query.data.as_deref(), Some("btn:about"));
    assert!(query.message.is_none());

    let calls = api.calls.lock().expect("lock").clone();
    assert_eq!(calls[0].1["callback_query_id"], json!("cb-1"));
    assert_eq!(calls[1].1["offset"], json!(499));
    assert_eq!(calls[1].1["allowed_updates"], json!(["message", "callback_query"]));
}
