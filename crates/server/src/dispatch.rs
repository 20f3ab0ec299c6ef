use async_trait::async_trait;
use bot_api::{handle_interaction, handle_reset, handle_start, handle_text, BotContext};
use shared::{
    domain::{ChatId, UserId},
    error::BotError,
    protocol::{Interaction, OutboundMessage},
};
use tracing::{debug, info, warn};

use crate::telegram::Update;

/// Outbound side of the chat transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, chat_id: ChatId, message: OutboundMessage) -> Result<(), BotError>;
    async fn acknowledge(&self, callback_id: &str) -> Result<(), BotError>;
}

/// An update reduced to what the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start {
        user_id: UserId,
        chat_id: ChatId,
    },
    Reset {
        user_id: UserId,
        chat_id: ChatId,
    },
    UnknownCommand {
        chat_id: ChatId,
    },
    Text {
        user_id: UserId,
        chat_id: ChatId,
        text: String,
    },
    Callback {
        user_id: UserId,
        chat_id: ChatId,
        callback_id: String,
        payload: String,
    },
}

pub fn classify(update: &Update) -> Option<Inbound> {
    if let Some(query) = &update.callback_query {
        let user_id = UserId(query.from.id);
        let chat_id = query
            .message
            .as_ref()
            .map(|message| ChatId(message.chat.id))
            .unwrap_or(ChatId(query.from.id));
        return Some(Inbound::Callback {
            user_id,
            chat_id,
            callback_id: query.id.clone(),
            payload: query.data.clone().unwrap_or_default(),
        });
    }

    let message = update.message.as_ref()?;
    let user_id = UserId(message.from.as_ref()?.id);
    let chat_id = ChatId(message.chat.id);
    let text = message.text.as_deref()?.trim();

    if let Some(command) = text.strip_prefix('/') {
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();
        return Some(match name {
            "start" => Inbound::Start { user_id, chat_id },
            "reset" => Inbound::Reset { user_id, chat_id },
            _ => Inbound::UnknownCommand { chat_id },
        });
    }

    Some(Inbound::Text {
        user_id,
        chat_id,
        text: text.to_string(),
    })
}

/// Handles one update end to end. Failures are logged and answered in the
/// originating chat; nothing escapes to the caller.
pub async fn dispatch_update(bot: &BotContext, transport: &dyn Transport, update: Update) {
    let Some(inbound) = classify(&update) else {
        debug!(update_id = update.update_id, "ignoring update");
        return;
    };

    let (chat_id, reply) = match inbound {
        Inbound::Start { user_id, chat_id } => {
            info!(user_id = user_id.0, "start");
            (chat_id, handle_start(bot, user_id).await)
        }
        Inbound::Reset { user_id, chat_id } => (chat_id, handle_reset(bot, user_id).await),
        Inbound::UnknownCommand { chat_id } => (
            chat_id,
            OutboundMessage::text("Unknown command. Send /start to open the menu."),
        ),
        Inbound::Text {
            user_id,
            chat_id,
            text,
        } => (chat_id, handle_text(bot, user_id, &text).await),
        Inbound::Callback {
            user_id,
            chat_id,
            callback_id,
            payload,
        } => {
            if let Err(error) = transport.acknowledge(&callback_id).await {
                warn!(user_id = user_id.0, %error, "failed to acknowledge callback");
            }
            let reply = match Interaction::parse(&payload) {
                Ok(interaction) => handle_interaction(bot, user_id, interaction).await,
                Err(error) => {
                    warn!(user_id = user_id.0, %error, "undecodable payload");
                    OutboundMessage::text(format!("❌ {}", error.message))
                }
            };
            (chat_id, reply)
        }
    };

    if let Err(error) = transport.deliver(chat_id, reply).await {
        warn!(chat_id = chat_id.0, %error, "delivery failed");
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
