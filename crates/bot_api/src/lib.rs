use std::{sync::Arc, time::Duration};

use render::{render_png, FontRegistry, RenderRequest, RenderSettings};
use shared::{
    domain::{ColorTarget, UserId},
    error::BotError,
    protocol::{Button, Interaction, OutboundMessage},
};
use tracing::{info, warn};

mod palette;
mod sessions;

pub use palette::{ColorEntry, ColorPalette};
pub use sessions::{SessionStore, UserSession, DEFAULT_TEXT, MAX_TEXT_CHARS};

pub const FONT_MENU_PAGE_SIZE: usize = 10;
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

const WELCOME_TEXT: &str =
    "👋 Welcome! Use the buttons below to customize your text image.\nSend any message to change the text.";

#[derive(Clone)]
pub struct BotContext {
    pub fonts: Arc<FontRegistry>,
    pub palette: Arc<ColorPalette>,
    pub sessions: SessionStore,
    pub render: RenderSettings,
    pub render_timeout: Duration,
}

impl BotContext {
    pub fn new(fonts: FontRegistry, palette: ColorPalette, render: RenderSettings) -> Self {
        let fonts = Arc::new(fonts);
        let palette = Arc::new(palette);
        Self {
            sessions: SessionStore::new(Arc::clone(&fonts), Arc::clone(&palette)),
            fonts,
            palette,
            render,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_render_timeout(mut self, render_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self
    }
}

pub async fn handle_start(ctx: &BotContext, user_id: UserId) -> OutboundMessage {
    ctx.sessions.get_or_create(user_id).await;
    main_menu()
}

pub async fn handle_reset(ctx: &BotContext, user_id: UserId) -> OutboundMessage {
    ctx.sessions.reset(user_id).await;
    info!(user_id = user_id.0, "session reset to defaults");
    main_menu()
}

/// Acts on a decoded button press. The action depends only on the payload,
/// never on which menu the user was last shown.
pub async fn handle_interaction(
    ctx: &BotContext,
    user_id: UserId,
    interaction: Interaction,
) -> OutboundMessage {
    ctx.sessions.get_or_create(user_id).await;

    match interaction {
        Interaction::ShowFontMenu => font_menu(&ctx.fonts, Some(FONT_MENU_PAGE_SIZE)),
        Interaction::ShowAllFonts => font_menu(&ctx.fonts, None),
        Interaction::ShowColorMenu(target) => color_menu(&ctx.palette, target),
        Interaction::SetFont(font_id) => match ctx.sessions.set_font(user_id, &font_id).await {
            Ok(session) => {
                info!(user_id = user_id.0, font = %session.font_id, "font selected");
                OutboundMessage::text(format!("✅ Font set to: {}", session.font_id))
            }
            Err(error) => rejected(user_id, error),
        },
        Interaction::SetColor { target, name } => {
            match ctx.sessions.set_color(user_id, target, &name).await {
                Ok(_) => {
                    info!(user_id = user_id.0, ?target, color = %name, "color selected");
                    OutboundMessage::text(format!("✅ {} set to: {name}", target.label()))
                }
                Err(error) => rejected(user_id, error),
            }
        }
        Interaction::Render => match render_session(ctx, user_id).await {
            Ok(png) => OutboundMessage::Image { png, caption: None },
            Err(error) => {
                warn!(user_id = user_id.0, %error, "render failed");
                OutboundMessage::text(format!("❌ Failed to render image: {}", error.message))
            }
        },
        Interaction::About => about(),
    }
}

/// A plain chat message replaces the text to render.
pub async fn handle_text(ctx: &BotContext, user_id: UserId, text: &str) -> OutboundMessage {
    match ctx.sessions.set_text(user_id, text).await {
        Ok(session) => OutboundMessage::text(format!("✅ Text set to: {}", session.text)),
        Err(error) => rejected(user_id, error),
    }
}

/// Renders the user's current session off the async workers, bounded by the
/// configured timeout.
pub async fn render_session(ctx: &BotContext, user_id: UserId) -> Result<Vec<u8>, BotError> {
    let session = ctx.sessions.snapshot(user_id).await;
    let font = ctx
        .fonts
        .get(&session.font_id)
        .map_err(|e| BotError::font_load(e.message))?;
    let request = RenderRequest::new(
        session.text,
        font,
        session.text_color,
        session.background_color,
        &ctx.render,
    );

    let job = tokio::task::spawn_blocking(move || render_png(&request));
    let png = tokio::time::timeout(ctx.render_timeout, job)
        .await
        .map_err(|_| {
            BotError::render(format!(
                "rendering did not finish within {}s",
                ctx.render_timeout.as_secs_f32()
            ))
        })?
        .map_err(|e| BotError::render(format!("render worker failed: {e}")))??;
    info!(user_id = user_id.0, bytes = png.len(), "image rendered");
    Ok(png)
}

pub fn main_menu() -> OutboundMessage {
    OutboundMessage::single_column_menu(
        WELCOME_TEXT,
        vec![
            Button::new("Set Font", &Interaction::ShowFontMenu),
            Button::new("Set Text Color", &Interaction::ShowColorMenu(ColorTarget::Text)),
            Button::new(
                "Set Background Color",
                &Interaction::ShowColorMenu(ColorTarget::Background),
            ),
            Button::new("Render Image", &Interaction::Render),
            Button::new("About", &Interaction::About),
        ],
    )
}

/// Font picker. A `limit` cuts the list to its first entries and appends an
/// expand button that re-sends the whole list.
pub fn font_menu(fonts: &FontRegistry, limit: Option<usize>) -> OutboundMessage {
    let shown = match limit {
        Some(limit) => fonts.page(limit),
        None => fonts.list(),
    };
    let mut buttons: Vec<Button> = shown
        .iter()
        .map(|entry| Button::new(entry.id.clone(), &Interaction::SetFont(entry.id.clone())))
        .collect();
    if limit.is_some() {
        buttons.push(Button::new("More fonts...", &Interaction::ShowAllFonts));
    }
    OutboundMessage::single_column_menu("Choose a font:", buttons)
}

pub fn color_menu(palette: &ColorPalette, target: ColorTarget) -> OutboundMessage {
    let buttons = palette
        .list()
        .iter()
        .map(|entry| {
            Button::new(
                entry.name,
                &Interaction::SetColor {
                    target,
                    name: entry.name.to_string(),
                },
            )
        })
        .collect();
    let prompt = match target {
        ColorTarget::Text => "Choose a text color:",
        ColorTarget::Background => "Choose a background color:",
    };
    OutboundMessage::single_column_menu(prompt, buttons)
}

pub fn about() -> OutboundMessage {
    OutboundMessage::text(format!(
        "🖌 Font Bot v{}\nGenerates text images with custom fonts and colors.\nEverything is button-driven: pick a font and colors, then render.",
        env!("CARGO_PKG_VERSION")
    ))
}

fn rejected(user_id: UserId, error: BotError) -> OutboundMessage {
    warn!(user_id = user_id.0, %error, "selection rejected");
    OutboundMessage::text(format!("❌ {}", error.message))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
