use shared::{domain::Rgb, error::BotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorEntry {
    pub name: &'static str,
    pub rgb: Rgb,
}

const STANDARD_COLORS: [ColorEntry; 8] = [
    ColorEntry { name: "Black", rgb: Rgb(0, 0, 0) },
    ColorEntry { name: "White", rgb: Rgb(255, 255, 255) },
    ColorEntry { name: "Red", rgb: Rgb(255, 0, 0) },
    ColorEntry { name: "Green", rgb: Rgb(0, 255, 0) },
    ColorEntry { name: "Blue", rgb: Rgb(0, 0, 255) },
    ColorEntry { name: "Yellow", rgb: Rgb(255, 255, 0) },
    ColorEntry { name: "Pink", rgb: Rgb(255, 105, 180) },
    ColorEntry { name: "Purple", rgb: Rgb(128, 0, 128) },
];

/// Fixed color table. Definition order is menu order.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    entries: &'static [ColorEntry],
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            entries: &STANDARD_COLORS,
        }
    }
}

impl ColorPalette {
    pub fn list(&self) -> &[ColorEntry] {
        self.entries
    }

    pub fn get(&self, name: &str) -> Result<Rgb, BotError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.rgb)
            .ok_or_else(|| BotError::not_found(format!("color '{name}' is not in the palette")))
    }

    pub fn name_of(&self, rgb: Rgb) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|entry| entry.rgb == rgb)
            .map(|entry| entry.name)
    }
}
