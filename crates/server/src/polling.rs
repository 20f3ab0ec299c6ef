use std::{sync::Arc, time::Duration};

use bot_api::BotContext;
use tracing::{info, warn};

use crate::{dispatch::dispatch_update, telegram::TelegramClient};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Long-polls `getUpdates` until the task is cancelled. Each update runs on
/// its own task so users are served independently.
pub(crate) async fn run_polling(bot: BotContext, client: TelegramClient, poll_timeout: Duration) {
    let transport = Arc::new(client.clone());
    let mut offset: Option<i64> = None;
    let mut backoff = Duration::from_secs(1);
    info!(timeout_secs = poll_timeout.as_secs(), "polling for updates");

    loop {
        match client.get_updates(offset, poll_timeout).await {
            Ok(updates) => {
                backoff = Duration::from_secs(1);
                for update in updates {
                    offset = Some(update.update_id + 1);
                    let bot = bot.clone();
                    let transport = Arc::clone(&transport);
                    tokio::spawn(async move {
                        dispatch_update(&bot, transport.as_ref(), update).await;
                    });
                }
            }
            Err(error) => {
                warn!(%error, retry_in_secs = backoff.as_secs(), "getUpdates failed");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}
