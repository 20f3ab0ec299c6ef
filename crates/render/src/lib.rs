//! Font discovery and text rasterization.
//!
//! [`FontRegistry`] is built once at startup and never mutated afterwards.
//! [`render_png`] is a pure, blocking function of its [`RenderRequest`] so
//! callers can move it onto a blocking worker without sharing any state.

mod engine;
mod fonts;

pub use engine::{
    draw_origin, load_font, measure_ink_box, render_canvas, render_png, InkBox, RenderRequest,
    RenderSettings,
};
pub use fonts::{FontEntry, FontRegistry};
