use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{codecs::png::PngEncoder, ExtendedColorType, ImageBuffer, ImageEncoder, Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use shared::{domain::Rgb as Color, error::BotError};
use tracing::debug;

use crate::fonts::FontEntry;

pub const DEFAULT_CANVAS_WIDTH: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 200;
pub const DEFAULT_FONT_SIZE: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub font_size: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub text: String,
    pub font_path: PathBuf,
    pub font_size: f32,
    pub text_color: Color,
    pub background_color: Color,
    pub width: u32,
    pub height: u32,
}

impl RenderRequest {
    pub fn new(
        text: impl Into<String>,
        font: &FontEntry,
        text_color: Color,
        background_color: Color,
        settings: &RenderSettings,
    ) -> Self {
        Self {
            text: text.into(),
            font_path: font.path.clone(),
            font_size: settings.font_size,
            text_color,
            background_color,
            width: settings.width,
            height: settings.height,
        }
    }
}

/// Tight rectangle around the pixels a string actually inks, relative to the
/// nominal text origin (top of the line box at x = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Rasterized coverage of a whole string, in nominal text coordinates.
struct Coverage {
    pixels: Vec<(i32, i32, u8)>,
}

impl Coverage {
    fn rasterize(font: &Font<'_>, font_size: f32, text: &str) -> Self {
        let scale = Scale::uniform(font_size);
        let ascent = font.v_metrics(scale).ascent;
        let mut pixels = Vec::new();

        for glyph in font.layout(text, scale, point(0.0, ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let alpha = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                if alpha > 0 {
                    pixels.push((bb.min.x + gx as i32, bb.min.y + gy as i32, alpha));
                }
            });
        }
        Self { pixels }
    }

    fn ink_box(&self) -> Option<InkBox> {
        let (first, rest) = self.pixels.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y, _) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(InkBox {
            left: min_x,
            top: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

pub fn load_font(path: &Path) -> Result<Font<'static>, BotError> {
    let bytes = fs::read(path).map_err(|e| {
        BotError::font_load(format!("failed to read font '{}': {e}", path.display()))
    })?;
    Font::try_from_vec(bytes)
        .ok_or_else(|| BotError::font_load(format!("'{}' is not a usable font", path.display())))
}

/// Measures the ink box of `text`; `None` when nothing would be drawn.
pub fn measure_ink_box(font: &Font<'_>, font_size: f32, text: &str) -> Option<InkBox> {
    Coverage::rasterize(font, font_size, text).ink_box()
}

/// Offset to add to nominal text coordinates so the ink box, rather than the
/// text origin, sits in the middle of the canvas. Negative when the ink is
/// larger than the canvas.
pub fn draw_origin(canvas_width: u32, canvas_height: u32, ink: &InkBox) -> (i32, i32) {
    let x = (canvas_width as i32 - ink.width).div_euclid(2) - ink.left;
    let y = (canvas_height as i32 - ink.height).div_euclid(2) - ink.top;
    (x, y)
}

pub fn render_canvas(request: &RenderRequest) -> Result<RgbImage, BotError> {
    if request.width == 0 || request.height == 0 {
        return Err(BotError::render(format!(
            "canvas must not be empty, got {}x{}",
            request.width, request.height
        )));
    }
    let font = load_font(&request.font_path)?;
    let mut canvas: RgbImage = ImageBuffer::from_pixel(
        request.width,
        request.height,
        Rgb(request.background_color.channels()),
    );

    let coverage = Coverage::rasterize(&font, request.font_size, &request.text);
    let Some(ink) = coverage.ink_box() else {
        debug!(font = %request.font_path.display(), "nothing to draw, background only");
        return Ok(canvas);
    };
    let (origin_x, origin_y) = draw_origin(request.width, request.height, &ink);
    debug!(?ink, origin_x, origin_y, "placing text");

    let color = request.text_color.channels();
    for &(x, y, alpha) in &coverage.pixels {
        let (px, py) = (x + origin_x, y + origin_y);
        if px < 0 || py < 0 || px >= request.width as i32 || py >= request.height as i32 {
            continue;
        }
        let dst = canvas.get_pixel_mut(px as u32, py as u32);
        for (channel, src) in dst.0.iter_mut().zip(color) {
            *channel = blend(src, *channel, alpha);
        }
    }
    Ok(canvas)
}

/// Renders the request and encodes it as an RGB PNG.
pub fn render_png(request: &RenderRequest) -> Result<Vec<u8>, BotError> {
    let canvas = render_canvas(request)?;
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BotError::render(format!("png encoding failed: {e}")))?;
    Ok(encoded)
}

fn blend(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
