use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use bot_api::{BotContext, ColorPalette, SessionStore};
use clap::Parser;
use render::FontRegistry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod dispatch;
mod polling;
mod telegram;
mod webhook;

use app_state::AppState;
use config::{load_settings, DeliveryMode};
use telegram::TelegramClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Parser, Debug)]
#[command(about = "Telegram bot that renders text images with selectable fonts and colors")]
struct Args {
    /// Optional TOML file; environment variables override it.
    #[arg(long, default_value = "bot.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config);
    let mode = settings.validate().map_err(|error| {
        error!(%error, "invalid configuration");
        error
    })?;
    let fonts = FontRegistry::initialize(&settings.fonts_dir, &settings.font_extension)
        .map_err(|error| {
            error!(
                fonts_dir = %settings.fonts_dir.display(),
                %error,
                "failed to load fonts; the directory must contain at least one font file"
            );
            error
        })?;

    let bot = BotContext::new(fonts, ColorPalette::default(), settings.render_settings())
        .with_render_timeout(settings.render_timeout());
    let client = TelegramClient::new(&settings.api_base_url, settings.token()?, REQUEST_TIMEOUT)?;

    if let Some(ttl) = settings.session_idle_ttl() {
        spawn_session_sweeper(bot.sessions.clone(), ttl);
    }

    match mode {
        DeliveryMode::Webhook(url) => {
            client
                .set_webhook(url.as_str(), settings.webhook_secret.as_deref())
                .await
                .context("failed to register webhook")?;
            let state = AppState {
                bot,
                transport: Arc::new(client),
                webhook_secret: settings.webhook_secret.clone(),
            };
            let app = webhook::build_router(Arc::new(state));

            let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
            info!(%addr, webhook = %url, "bot ready, receiving updates by webhook");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        DeliveryMode::Polling => {
            client
                .delete_webhook()
                .await
                .context("failed to clear webhook before polling")?;
            info!("bot ready, receiving updates by polling");
            let poll_timeout = Duration::from_secs(settings.poll_timeout_seconds);
            tokio::select! {
                _ = polling::run_polling(bot, client, poll_timeout) => {}
                _ = shutdown_signal() => {}
            }
        }
    }

    info!("shutting down");
    Ok(())
}

fn spawn_session_sweeper(sessions: SessionStore, ttl: Duration) {
    let max_idle = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    let period = (ttl / 2).max(Duration::from_secs(30));
    info!(ttl_secs = ttl.as_secs(), "session eviction enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            sessions.evict_idle(max_idle).await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
