//! Interaction payloads carried by menu buttons and the messages sent back
//! to a chat.
//!
//! Payloads are colon-delimited strings of the form
//! `category[:subcategory][:value]`. They are decoded exactly once, at the
//! transport boundary, into [`Interaction`]; nothing past that point looks
//! at raw strings.

use serde::{Deserialize, Serialize};

use crate::{domain::ColorTarget, error::BotError};

pub const EXPAND_FONTS_VALUE: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Interaction {
    ShowFontMenu,
    ShowAllFonts,
    ShowColorMenu(ColorTarget),
    SetFont(String),
    SetColor { target: ColorTarget, name: String },
    Render,
    About,
}

impl Interaction {
    pub fn parse(raw: &str) -> Result<Self, BotError> {
        let (category, rest) = raw
            .split_once(':')
            .ok_or_else(|| malformed(raw))?;

        match category {
            "btn" => match rest {
                "font" => Ok(Interaction::ShowFontMenu),
                "text_color" => Ok(Interaction::ShowColorMenu(ColorTarget::Text)),
                "bg_color" => Ok(Interaction::ShowColorMenu(ColorTarget::Background)),
                "render" => Ok(Interaction::Render),
                "about" => Ok(Interaction::About),
                _ => Err(malformed(raw)),
            },
            "font" => match rest {
                "" => Err(malformed(raw)),
                EXPAND_FONTS_VALUE => Ok(Interaction::ShowAllFonts),
                font_id => Ok(Interaction::SetFont(font_id.to_string())),
            },
            "color" => {
                let (target, name) = rest.split_once(':').ok_or_else(|| malformed(raw))?;
                let target = match target {
                    "text" => ColorTarget::Text,
                    "bg" => ColorTarget::Background,
                    _ => return Err(malformed(raw)),
                };
                if name.is_empty() {
                    return Err(malformed(raw));
                }
                Ok(Interaction::SetColor {
                    target,
                    name: name.to_string(),
                })
            }
            _ => Err(malformed(raw)),
        }
    }

    pub fn payload(&self) -> String {
        match self {
            Interaction::ShowFontMenu => "btn:font".into(),
            Interaction::ShowAllFonts => format!("font:{EXPAND_FONTS_VALUE}"),
            Interaction::ShowColorMenu(ColorTarget::Text) => "btn:text_color".into(),
            Interaction::ShowColorMenu(ColorTarget::Background) => "btn:bg_color".into(),
            Interaction::SetFont(font_id) => format!("font:{font_id}"),
            Interaction::SetColor { target, name } => {
                format!("color:{}:{name}", target.payload_tag())
            }
            Interaction::Render => "btn:render".into(),
            Interaction::About => "btn:about".into(),
        }
    }
}

fn malformed(raw: &str) -> BotError {
    BotError::invalid_selection(format!("unrecognized interaction payload '{raw}'"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, interaction: &Interaction) -> Self {
        Self {
            label: label.into(),
            payload: interaction.payload(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Menu {
        text: String,
        rows: Vec<Vec<Button>>,
    },
    Image {
        png: Vec<u8>,
        caption: Option<String>,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text(text.into())
    }

    /// One button per row, the layout every menu in the bot uses.
    pub fn single_column_menu(text: impl Into<String>, buttons: Vec<Button>) -> Self {
        OutboundMessage::Menu {
            text: text.into(),
            rows: buttons.into_iter().map(|button| vec![button]).collect(),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
