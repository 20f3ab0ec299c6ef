use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use render::RenderSettings;
use serde::Deserialize;
use shared::error::BotError;
use tracing::warn;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub telegram_token: Option<String>,
    pub port: u16,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base_url: String,
    pub fonts_dir: PathBuf,
    pub font_extension: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub font_size: f32,
    pub render_timeout_seconds: u64,
    pub poll_timeout_seconds: u64,
    pub session_idle_ttl_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let render = RenderSettings::default();
        Self {
            telegram_token: None,
            port: 5000,
            webhook_url: None,
            webhook_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            fonts_dir: PathBuf::from("fonts"),
            font_extension: "ttf".into(),
            canvas_width: render.width,
            canvas_height: render.height,
            font_size: render.font_size,
            render_timeout_seconds: 10,
            poll_timeout_seconds: 30,
            session_idle_ttl_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    Polling,
    Webhook(Url),
}

/// Keys accepted in the optional TOML file. Anything left out keeps its
/// default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    telegram_token: Option<String>,
    port: Option<u16>,
    webhook_url: Option<String>,
    webhook_secret: Option<String>,
    api_base_url: Option<String>,
    fonts_dir: Option<PathBuf>,
    font_extension: Option<String>,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
    font_size: Option<f32>,
    render_timeout_seconds: Option<u64>,
    poll_timeout_seconds: Option<u64>,
    session_idle_ttl_seconds: Option<u64>,
}

/// Defaults, then `config_path` if it exists, then the environment.
pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(
                path = %config_path.display(),
                %error,
                "ignoring unparsable config file"
            ),
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.telegram_token {
        settings.telegram_token = Some(v);
    }
    if let Some(v) = file_cfg.port {
        settings.port = v;
    }
    if let Some(v) = file_cfg.webhook_url {
        settings.webhook_url = Some(v);
    }
    if let Some(v) = file_cfg.webhook_secret {
        settings.webhook_secret = Some(v);
    }
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.fonts_dir {
        settings.fonts_dir = v;
    }
    if let Some(v) = file_cfg.font_extension {
        settings.font_extension = v;
    }
    if let Some(v) = file_cfg.canvas_width {
        settings.canvas_width = v;
    }
    if let Some(v) = file_cfg.canvas_height {
        settings.canvas_height = v;
    }
    if let Some(v) = file_cfg.font_size {
        settings.font_size = v;
    }
    if let Some(v) = file_cfg.render_timeout_seconds {
        settings.render_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.poll_timeout_seconds {
        settings.poll_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.session_idle_ttl_seconds {
        settings.session_idle_ttl_seconds = Some(v);
    }
}

/// Each setting reads its plain name first and its `APP__` alias second, so
/// the alias wins when both are present.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |plain: &str, alias: &str| {
        lookup(alias)
            .or_else(|| lookup(plain))
            .filter(|v| !v.trim().is_empty())
    };

    if let Some(v) = var("TELEGRAM_TOKEN", "APP__TELEGRAM_TOKEN") {
        settings.telegram_token = Some(v);
    }
    if let Some(v) = var("PORT", "APP__PORT") {
        match v.parse::<u16>() {
            Ok(port) => settings.port = port,
            Err(_) => warn!(value = %v, "ignoring invalid PORT"),
        }
    }
    if let Some(v) = var("WEBHOOK_URL", "APP__WEBHOOK_URL") {
        settings.webhook_url = Some(v);
    }
    if let Some(v) = var("WEBHOOK_SECRET", "APP__WEBHOOK_SECRET") {
        settings.webhook_secret = Some(v);
    }
    if let Some(v) = var("TELEGRAM_API_URL", "APP__TELEGRAM_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("FONTS_DIR", "APP__FONTS_DIR") {
        settings.fonts_dir = PathBuf::from(v);
    }
    if let Some(v) = var("RENDER_TIMEOUT_SECONDS", "APP__RENDER_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.render_timeout_seconds = parsed;
        }
    }
    if let Some(v) = var("SESSION_IDLE_TTL_SECONDS", "APP__SESSION_IDLE_TTL_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.session_idle_ttl_seconds = Some(parsed);
        }
    }
}

impl Settings {
    pub fn token(&self) -> Result<&str, BotError> {
        self.telegram_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BotError::configuration("TELEGRAM_TOKEN is not set"))
    }

    /// Push delivery when a callback URL is configured, pull otherwise.
    pub fn delivery_mode(&self) -> Result<DeliveryMode, BotError> {
        let Some(raw) = self.webhook_url.as_deref().map(str::trim) else {
            return Ok(DeliveryMode::Polling);
        };
        let url = Url::parse(raw)
            .map_err(|e| BotError::configuration(format!("invalid WEBHOOK_URL '{raw}': {e}")))?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(BotError::configuration(format!(
                "WEBHOOK_URL must be http(s), got '{}'",
                url.scheme()
            )));
        }
        Ok(DeliveryMode::Webhook(url))
    }

    /// Checks everything startup depends on and returns the delivery mode.
    pub fn validate(&self) -> Result<DeliveryMode, BotError> {
        self.token()?;
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(BotError::configuration("canvas dimensions must be non-zero"));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(BotError::configuration("font_size must be positive"));
        }
        self.delivery_mode()
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            width: self.canvas_width,
            height: self.canvas_height,
            font_size: self.font_size,
        }
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_seconds.max(1))
    }

    pub fn session_idle_ttl(&self) -> Option<Duration> {
        self.session_idle_ttl_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
