use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Configuration,
    NotFound,
    InvalidSelection,
    FontLoad,
    Render,
    Transport,
}

impl ErrorCode {
    /// Only configuration failures are allowed to take the process down.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorCode::Configuration)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct BotError {
    pub code: ErrorCode,
    pub message: String,
}

impl BotError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSelection, message)
    }

    pub fn font_load(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FontLoad, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Render, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }
}
