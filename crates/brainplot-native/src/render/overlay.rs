//! 2D overlays drawn on top of the rendered scene
//!
//! The colorbar and subject labels are drawn with `plotters` directly into
//! the frame's RGB buffer after supersampling has been resolved, so text
//! stays crisp at the output resolution.

use std::sync::atomic::{AtomicBool, Ordering};

use brainplot_core::{ColorbarSpec, LookupTable};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::raster::RgbFrame;
use crate::error::RenderError;

const FONT_FAMILY: &str = "sans-serif";

static TEXT_WARNED: AtomicBool = AtomicBool::new(false);

/// Text anchored at a pixel position
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenLabel {
    /// Left edge
    pub x: i32,
    /// Vertical center
    pub y: i32,
    /// Label text
    pub text: String,
}

/// Pixel rectangle of the colorbar gradient
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorbarLayout {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
    /// Font size in pixels
    pub font_px: i32,
}

impl ColorbarLayout {
    /// Vertical bar along the right side of a `width` x `height` frame
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn for_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        let bar_width = (w / 40).max(6);
        Self {
            x: (w - w / 7).min(w - bar_width - 1).max(0),
            y: h / 5,
            width: bar_width,
            height: (h * 3 / 5).max(2),
            font_px: (h / 45).max(10),
        }
    }

    /// Row of the bar showing normalized value `t` (1 at the top)
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn row_for(&self, t: f64) -> i32 {
        self.y + ((1.0 - t.clamp(0.0, 1.0)) * f64::from(self.height - 1)).round() as i32
    }
}

fn to_rgb(color: [u8; 3]) -> RGBColor {
    RGBColor(color[0], color[1], color[2])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(c: [f32; 3]) -> [u8; 3] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn draw_text<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    text: &str,
    pos: (i32, i32),
    font_px: i32,
    color: [u8; 3],
) {
    let style = (FONT_FAMILY, f64::from(font_px))
        .into_font()
        .color(&to_rgb(color));
    if let Err(e) = root.draw(&Text::new(text.to_string(), pos, style)) {
        if TEXT_WARNED.swap(true, Ordering::Relaxed) {
            tracing::debug!("Text '{text}' not drawn: {e}");
        } else {
            tracing::warn!("Overlay text unavailable ({e}); continuing without labels");
        }
    }
}

fn draw_colorbar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ColorbarSpec,
    layout: ColorbarLayout,
    foreground: [u8; 3],
) -> Result<(), RenderError> {
    let lut = LookupTable::new(spec.colormap, spec.range);
    for row in 0..layout.height {
        let t = 1.0 - f64::from(row) / f64::from((layout.height - 1).max(1));
        let color = to_rgb(to_u8(lut.map_normalized(t)));
        let y = layout.y + row;
        root.draw(&Rectangle::new(
            [(layout.x, y), (layout.x + layout.width, y + 1)],
            color.filled(),
        ))
        .map_err(|e| RenderError::Overlay(e.to_string()))?;
    }
    root.draw(&Rectangle::new(
        [
            (layout.x - 1, layout.y - 1),
            (layout.x + layout.width, layout.y + layout.height),
        ],
        to_rgb(foreground).stroke_width(1),
    ))
    .map_err(|e| RenderError::Overlay(e.to_string()))?;

    for (value, text) in spec.labels() {
        let y = layout.row_for(spec.range.normalize(value));
        draw_text(
            root,
            &text,
            (layout.x + layout.width + layout.font_px / 2, y - layout.font_px / 2),
            layout.font_px,
            foreground,
        );
    }
    draw_text(
        root,
        &spec.title,
        (layout.x - layout.font_px, layout.y - layout.font_px * 2),
        layout.font_px,
        foreground,
    );
    Ok(())
}

/// Draw the colorbar and labels into `frame`.
///
/// Missing fonts only drop the text; the gradient is always drawn.
///
/// # Errors
///
/// Returns [`RenderError::Overlay`] if the bitmap backend rejects a shape.
pub fn draw_overlays(
    frame: &mut RgbFrame,
    colorbar: Option<&ColorbarSpec>,
    labels: &[ScreenLabel],
    foreground: [u8; 3],
) -> Result<(), RenderError> {
    let (width, height) = (frame.width, frame.height);
    let layout = ColorbarLayout::for_frame(width, height);
    let root = BitMapBackend::with_buffer(&mut frame.data, (width, height)).into_drawing_area();

    if let Some(spec) = colorbar {
        draw_colorbar(&root, spec, layout, foreground)?;
    }
    for label in labels {
        draw_text(
            &root,
            &label.text,
            (label.x, label.y - layout.font_px / 2),
            layout.font_px,
            foreground,
        );
    }

    root.present()
        .map_err(|e| RenderError::Overlay(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainplot_core::{Colormap, ColormapSpec, ScalarRange};

    fn spec() -> ColorbarSpec {
        ColorbarSpec {
            title: "t-scores".to_string(),
            colormap: ColormapSpec::new(Colormap::Cool),
            range: ScalarRange::symmetric(3.0),
            label_count: 7,
            precision: 1,
        }
    }

    #[test]
    fn test_layout_inside_frame() {
        let layout = ColorbarLayout::for_frame(1080, 1080);
        assert!(layout.x + layout.width < 1080);
        assert!(layout.y + layout.height < 1080);
        assert_eq!(layout.row_for(1.0), layout.y);
        assert_eq!(layout.row_for(0.0), layout.y + layout.height - 1);
    }

    #[test]
    fn test_gradient_runs_bottom_to_top() {
        let mut frame = RgbFrame::filled(200, 200, [255, 255, 255]);
        draw_overlays(&mut frame, Some(&spec()), &[], [0, 0, 0]).unwrap();
        let layout = ColorbarLayout::for_frame(200, 200);
        let cx = u32::try_from(layout.x + layout.width / 2).unwrap();
        let top = frame.pixel(cx, u32::try_from(layout.y + 1).unwrap());
        let bottom = frame.pixel(cx, u32::try_from(layout.y + layout.height - 2).unwrap());
        // `cool` runs cyan (low) to magenta (high)
        assert!(top[0] > 200 && top[1] < 60, "top {top:?}");
        assert!(bottom[0] < 60 && bottom[1] > 200, "bottom {bottom:?}");
    }

    #[test]
    fn test_no_colorbar_leaves_frame() {
        let mut frame = RgbFrame::filled(50, 50, [255, 255, 255]);
        draw_overlays(&mut frame, None, &[], [0, 0, 0]).unwrap();
        assert_eq!(frame, RgbFrame::filled(50, 50, [255, 255, 255]));
    }
}
