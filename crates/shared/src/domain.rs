use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(ChatId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// Which half of a session's color pair a selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTarget {
    Text,
    Background,
}

impl ColorTarget {
    pub fn payload_tag(self) -> &'static str {
        match self {
            ColorTarget::Text => "text",
            ColorTarget::Background => "bg",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorTarget::Text => "Text color",
            ColorTarget::Background => "Background color",
        }
    }
}
