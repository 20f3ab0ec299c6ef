//! Minimal Telegram Bot API client: just the calls the bot needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::{
    domain::ChatId,
    error::BotError,
    protocol::{Button, OutboundMessage},
};
use tracing::debug;

use crate::dispatch::Transport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

impl<'a> InlineKeyboardMarkup<'a> {
    fn from_rows(rows: &'a [Vec<Button>]) -> Self {
        Self {
            inline_keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: &button.label,
                            callback_data: &button.payload,
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 2],
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
    allowed_updates: [&'static str; 2],
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
}

const ALLOWED_UPDATES: [&str; 2] = ["message", "callback_query"];

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    endpoint: String,
}

impl TelegramClient {
    /// `request_timeout` bounds every call; long polls add their own wait on
    /// top of it.
    pub fn new(api_base_url: &str, token: &str, request_timeout: Duration) -> Result<Self, BotError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BotError::configuration(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{token}", api_base_url.trim_end_matches('/')),
        })
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, BotError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        let response = self
            .http
            .post(self.url("getUpdates"))
            .timeout(poll_timeout + Duration::from_secs(10))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        read_result(response).await
    }

    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), BotError> {
        let _: bool = self
            .call(
                "setWebhook",
                &SetWebhookRequest {
                    url,
                    secret_token,
                    allowed_updates: ALLOWED_UPDATES,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), BotError> {
        let _: bool = self.call("deleteWebhook", &serde_json::json!({})).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        rows: Option<&[Vec<Button>]>,
    ) -> Result<(), BotError> {
        let request = SendMessageRequest {
            chat_id: chat_id.0,
            text,
            reply_markup: rows.map(InlineKeyboardMarkup::from_rows),
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        png: Vec<u8>,
        caption: Option<String>,
    ) -> Result<(), BotError> {
        let photo = Part::bytes(png)
            .file_name("render.png")
            .mime_str("image/png")
            .map_err(transport_error)?;
        let mut form = Form::new()
            .text("chat_id", chat_id.0.to_string())
            .part("photo", photo);
        if let Some(caption) = caption {
            form = form.text("caption", caption);
        }
        let response = self
            .http
            .post(self.url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let _: serde_json::Value = read_result(response).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &impl Serialize,
    ) -> Result<T, BotError> {
        debug!(method, "telegram call");
        let response = self
            .http
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        read_result(response).await
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.endpoint)
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn deliver(&self, chat_id: ChatId, message: OutboundMessage) -> Result<(), BotError> {
        match message {
            OutboundMessage::Text(text) => self.send_message(chat_id, &text, None).await,
            OutboundMessage::Menu { text, rows } => {
                self.send_message(chat_id, &text, Some(rows.as_slice())).await
            }
            OutboundMessage::Image { png, caption } => self.send_photo(chat_id, png, caption).await,
        }
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), BotError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryRequest {
                    callback_query_id: callback_id,
                },
            )
            .await?;
        Ok(())
    }
}

async fn read_result<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BotError> {
    let status = response.status();
    let body: ApiResponse<T> = response.json().await.map_err(|e| {
        BotError::transport(format!("unreadable telegram response ({status}): {e}"))
    })?;
    if !body.ok {
        return Err(BotError::transport(format!(
            "telegram rejected request ({status}): {}",
            body.description.unwrap_or_default()
        )));
    }
    body.result
        .ok_or_else(|| BotError::transport("telegram response is missing a result"))
}

fn transport_error(err: reqwest::Error) -> BotError {
    // reqwest includes the request URL, which carries the bot token.
    BotError::transport(err.without_url().to_string())
}

#[cfg(test)]
#[path = "tests/telegram_tests.rs"]
mod tests;
