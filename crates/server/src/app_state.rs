use std::sync::Arc;

use bot_api::BotContext;

use crate::dispatch::Transport;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) bot: BotContext,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) webhook_secret: Option<String>,
}
