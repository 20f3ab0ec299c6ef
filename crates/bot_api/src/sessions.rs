use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use render::FontRegistry;
use shared::{
    domain::{ColorTarget, Rgb, UserId},
    error::BotError,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::palette::ColorPalette;

pub const DEFAULT_TEXT: &str = "Hello World!";
pub const MAX_TEXT_CHARS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub text: String,
    pub font_id: String,
    pub text_color: Rgb,
    pub background_color: Rgb,
}

impl UserSession {
    pub fn with_defaults(fonts: &FontRegistry) -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            font_id: fonts.default_entry().id.clone(),
            text_color: Rgb::BLACK,
            background_color: Rgb::WHITE,
        }
    }
}

struct SessionSlot {
    session: UserSession,
    last_seen: DateTime<Utc>,
}

/// Per-user session state, memory resident for the life of the process.
///
/// The outer map lock is held only long enough to find or insert a slot, so
/// creation of a user's slot is atomic. Every read-modify-write on a session
/// runs under that slot's own lock; users never wait on each other.
#[derive(Clone)]
pub struct SessionStore {
    fonts: Arc<FontRegistry>,
    palette: Arc<ColorPalette>,
    slots: Arc<RwLock<HashMap<UserId, Arc<Mutex<SessionSlot>>>>>,
}

impl SessionStore {
    pub fn new(fonts: Arc<FontRegistry>, palette: Arc<ColorPalette>) -> Self {
        Self {
            fonts,
            palette,
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get_or_create(&self, user_id: UserId) -> UserSession {
        self.update(user_id, |_| {}).await
    }

    pub async fn snapshot(&self, user_id: UserId) -> UserSession {
        let slot = self.slot(user_id).await;
        let guard = slot.lock().await;
        guard.session.clone()
    }

    pub async fn set_font(&self, user_id: UserId, font_id: &str) -> Result<UserSession, BotError> {
        let entry = self
            .fonts
            .get(font_id)
            .map_err(|e| BotError::invalid_selection(e.message))?;
        let font_id = entry.id.clone();
        Ok(self.update(user_id, |session| session.font_id = font_id).await)
    }

    pub async fn set_text_color(
        &self,
        user_id: UserId,
        color_name: &str,
    ) -> Result<UserSession, BotError> {
        self.set_color(user_id, ColorTarget::Text, color_name).await
    }

    pub async fn set_background_color(
        &self,
        user_id: UserId,
        color_name: &str,
    ) -> Result<UserSession, BotError> {
        self.set_color(user_id, ColorTarget::Background, color_name)
            .await
    }

    pub async fn set_color(
        &self,
        user_id: UserId,
        target: ColorTarget,
        color_name: &str,
    ) -> Result<UserSession, BotError> {
        let rgb = self
            .palette
            .get(color_name)
            .map_err(|e| BotError::invalid_selection(e.message))?;
        Ok(self
            .update(user_id, |session| match target {
                ColorTarget::Text => session.text_color = rgb,
                ColorTarget::Background => session.background_color = rgb,
            })
            .await)
    }

    pub async fn set_text(&self, user_id: UserId, text: &str) -> Result<UserSession, BotError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BotError::invalid_selection("text cannot be empty"));
        }
        if text.chars().count() > MAX_TEXT_CHARS {
            return Err(BotError::invalid_selection(format!(
                "text is limited to {MAX_TEXT_CHARS} characters"
            )));
        }
        let text = text.to_string();
        Ok(self.update(user_id, |session| session.text = text).await)
    }

    /// Replaces the user's session with defaults.
    pub async fn reset(&self, user_id: UserId) -> UserSession {
        let defaults = UserSession::with_defaults(&self.fonts);
        self.update(user_id, |session| *session = defaults).await
    }

    /// Drops sessions idle for longer than `max_idle`. A slot that some task
    /// is still holding is skipped so an in-flight update is never orphaned.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut slots = self.slots.write().await;
        let mut stale = Vec::new();
        for (user_id, slot) in slots.iter() {
            if Arc::strong_count(slot) > 1 {
                continue;
            }
            if slot.lock().await.last_seen < cutoff {
                stale.push(*user_id);
            }
        }
        for user_id in &stale {
            slots.remove(user_id);
        }
        if !stale.is_empty() {
            info!(evicted = stale.len(), remaining = slots.len(), "evicted idle sessions");
        }
        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    async fn update<F>(&self, user_id: UserId, apply: F) -> UserSession
    where
        F: FnOnce(&mut UserSession),
    {
        let slot = self.slot(user_id).await;
        let mut guard = slot.lock().await;
        apply(&mut guard.session);
        guard.last_seen = Utc::now();
        guard.session.clone()
    }

    async fn slot(&self, user_id: UserId) -> Arc<Mutex<SessionSlot>> {
        if let Some(slot) = self.slots.read().await.get(&user_id) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().await;
        let slot = slots.entry(user_id).or_insert_with(|| {
            debug!(user_id = user_id.0, "creating session with defaults");
            Arc::new(Mutex::new(SessionSlot {
                session: UserSession::with_defaults(&self.fonts),
                last_seen: Utc::now(),
            }))
        });
        Arc::clone(slot)
    }
}

#[cfg(test)]
#[path = "tests/sessions_tests.rs"]
mod tests;
