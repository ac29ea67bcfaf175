//! Software rasterizer
//!
//! A color buffer plus an inverse-depth buffer (larger is closer, 0 is the
//! far plane). Opaque primitives test and write depth; translucent ones only
//! test against it and blend over whatever is already there, so callers draw
//! translucent primitives back to front after all opaque ones.

use brainplot_core::Rgb;

use crate::error::RenderError;

/// Largest supported supersampling factor
pub const MAX_SUPERSAMPLE: u32 = 4;

const AMBIENT: f32 = 0.25;
const DIFFUSE: f32 = 0.75;
const SPECULAR: f32 = 0.2;
const SHININESS: i32 = 24;

/// 8-bit RGB image, row-major, top row first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// Frame filled with one color
    #[must_use]
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Pixel at `(x, y)`
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Projected triangle corner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedVertex {
    /// Pixel column
    pub x: f32,
    /// Pixel row
    pub y: f32,
    /// View depth (positive)
    pub depth: f32,
    /// Lit color
    pub color: Rgb,
}

/// Screen-space sphere impostor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereSprite {
    /// Center column
    pub cx: f32,
    /// Center row
    pub cy: f32,
    /// Projected radius in pixels
    pub radius_px: f32,
    /// View depth of the center
    pub depth: f32,
    /// Radius in world units
    pub world_radius: f32,
    /// Base (unlit) color
    pub color: Rgb,
}

/// Shade a surface color for a normal in view space (+Z toward the viewer)
#[must_use]
pub fn shade(color: Rgb, normal: [f32; 3]) -> Rgb {
    // Key light slightly above and left of the viewer.
    const LIGHT: [f32; 3] = [-0.229_66, 0.321_52, 0.918_63];
    const HALF: [f32; 3] = [-0.117_24, 0.164_13, 0.979_45];
    let diffuse = (normal[0] * LIGHT[0] + normal[1] * LIGHT[1] + normal[2] * LIGHT[2]).max(0.0);
    let spec_base = (normal[0] * HALF[0] + normal[1] * HALF[1] + normal[2] * HALF[2]).max(0.0);
    let specular = SPECULAR * spec_base.powi(SHININESS);
    let k = AMBIENT + DIFFUSE * diffuse;
    [
        (color[0] * k + specular).min(1.0),
        (color[1] * k + specular).min(1.0),
        (color[2] * k + specular).min(1.0),
    ]
}

/// Floating-point color and depth buffers
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<Rgb>,
    inv_depth: Vec<f32>,
}

impl Framebuffer {
    /// Buffer cleared to `background`
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] for a zero dimension.
    pub fn new(width: u32, height: u32, background: Rgb) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width: width as usize,
            height: height as usize,
            color: vec![background; len],
            inv_depth: vec![0.0; len],
        })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`
    #[must_use]
    pub fn color_at(&self, x: usize, y: usize) -> Rgb {
        self.color[y * self.width + x]
    }

    #[inline]
    fn write(&mut self, index: usize, inv_depth: f32, color: Rgb, alpha: f32, write_depth: bool) {
        if inv_depth <= self.inv_depth[index] {
            return;
        }
        if write_depth {
            self.inv_depth[index] = inv_depth;
        }
        let dst = &mut self.color[index];
        if alpha >= 1.0 {
            *dst = color;
        } else {
            for c in 0..3 {
                dst[c] = color[c] * alpha + dst[c] * (1.0 - alpha);
            }
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn pixel_span(&self, lo: f32, hi: f32, limit: usize) -> Option<(usize, usize)> {
        let lo = lo.floor().max(0.0);
        let hi = hi.ceil().min(limit as f32 - 1.0);
        if hi < lo || !lo.is_finite() || !hi.is_finite() {
            return None;
        }
        Some((lo as usize, hi as usize))
    }

    /// Rasterize a Gouraud-shaded triangle with perspective-correct color.
    #[allow(clippy::cast_precision_loss, clippy::many_single_char_names)]
    pub fn fill_triangle(&mut self, v: [ShadedVertex; 3], alpha: f32, write_depth: bool) {
        let [a, b, c] = v;
        let area = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if area.abs() < 1e-8 {
            return;
        }
        let Some((x0, x1)) = self.pixel_span(a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x), self.width)
        else {
            return;
        };
        let Some((y0, y1)) = self.pixel_span(a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y), self.height)
        else {
            return;
        };
        let inv = [1.0 / a.depth, 1.0 / b.depth, 1.0 / c.depth];

        for py in y0..=y1 {
            let sy = py as f32 + 0.5;
            for px in x0..=x1 {
                let sx = px as f32 + 0.5;
                let w0 = ((b.x - sx) * (c.y - sy) - (b.y - sy) * (c.x - sx)) / area;
                let w1 = ((c.x - sx) * (a.y - sy) - (c.y - sy) * (a.x - sx)) / area;
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let p0 = w0 * inv[0];
                let p1 = w1 * inv[1];
                let p2 = w2 * inv[2];
                let inv_depth = p0 + p1 + p2;
                let color = [
                    (a.color[0] * p0 + b.color[0] * p1 + c.color[0] * p2) / inv_depth,
                    (a.color[1] * p0 + b.color[1] * p1 + c.color[1] * p2) / inv_depth,
                    (a.color[2] * p0 + b.color[2] * p1 + c.color[2] * p2) / inv_depth,
                ];
                self.write(py * self.width + px, inv_depth, color, alpha, write_depth);
            }
        }
    }

    /// Rasterize a lit sphere impostor with per-pixel depth.
    #[allow(clippy::cast_precision_loss)]
    pub fn fill_sphere(&mut self, sphere: &SphereSprite, alpha: f32, write_depth: bool) {
        let r = sphere.radius_px;
        if r <= 0.0 {
            return;
        }
        let Some((x0, x1)) = self.pixel_span(sphere.cx - r, sphere.cx + r, self.width) else {
            return;
        };
        let Some((y0, y1)) = self.pixel_span(sphere.cy - r, sphere.cy + r, self.height) else {
            return;
        };

        for py in y0..=y1 {
            let dy = (py as f32 + 0.5 - sphere.cy) / r;
            for px in x0..=x1 {
                let dx = (px as f32 + 0.5 - sphere.cx) / r;
                let d2 = dx * dx + dy * dy;
                if d2 > 1.0 {
                    continue;
                }
                let nz = (1.0 - d2).sqrt();
                let depth = (sphere.depth - sphere.world_radius * nz).max(1e-3);
                let color = shade(sphere.color, [dx, -dy, nz]);
                self.write(py * self.width + px, 1.0 / depth, color, alpha, write_depth);
            }
        }
    }

    /// Box-filter down by `factor` into an 8-bit frame.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSupersample`] if `factor` is 0, larger
    /// than [`MAX_SUPERSAMPLE`], or does not divide the buffer size.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn resolve(&self, factor: u32) -> Result<RgbFrame, RenderError> {
        let f = factor as usize;
        if factor == 0
            || factor > MAX_SUPERSAMPLE
            || self.width % f != 0
            || self.height % f != 0
        {
            return Err(RenderError::InvalidSupersample(factor));
        }
        let out_w = self.width / f;
        let out_h = self.height / f;
        let norm = 1.0 / (f * f) as f32;
        let mut data = Vec::with_capacity(out_w * out_h * 3);
        for oy in 0..out_h {
            for ox in 0..out_w {
                let mut sum = [0.0f32; 3];
                for sy in 0..f {
                    let row = (oy * f + sy) * self.width;
                    for sx in 0..f {
                        let c = self.color[row + ox * f + sx];
                        sum[0] += c[0];
                        sum[1] += c[1];
                        sum[2] += c[2];
                    }
                }
                for s in sum {
                    data.push(((s * norm).clamp(0.0, 1.0) * 255.0).round() as u8);
                }
            }
        }
        Ok(RgbFrame {
            width: out_w as u32,
            height: out_h as u32,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = [1.0, 1.0, 1.0];
    const RED: Rgb = [1.0, 0.0, 0.0];
    const BLUE: Rgb = [0.0, 0.0, 1.0];

    fn vertex(x: f32, y: f32, depth: f32, color: Rgb) -> ShadedVertex {
        ShadedVertex { x, y, depth, color }
    }

    fn big_triangle(depth: f32, color: Rgb) -> [ShadedVertex; 3] {
        [
            vertex(-1.0, -1.0, depth, color),
            vertex(12.0, -1.0, depth, color),
            vertex(-1.0, 12.0, depth, color),
        ]
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Framebuffer::new(0, 10, WHITE).is_err());
    }

    #[test]
    fn test_triangle_covers_pixels() {
        let mut fb = Framebuffer::new(8, 8, WHITE).unwrap();
        fb.fill_triangle(big_triangle(10.0, RED), 1.0, true);
        assert_eq!(fb.color_at(0, 0), RED);
        assert_eq!(fb.color_at(7, 7), WHITE);
    }

    #[test]
    fn test_winding_independent() {
        let mut fb = Framebuffer::new(8, 8, WHITE).unwrap();
        let [a, b, c] = big_triangle(10.0, RED);
        fb.fill_triangle([a, c, b], 1.0, true);
        assert_eq!(fb.color_at(1, 1), RED);
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut fb = Framebuffer::new(4, 4, WHITE).unwrap();
        fb.fill_triangle(big_triangle(5.0, RED), 1.0, true);
        fb.fill_triangle(big_triangle(50.0, BLUE), 1.0, true);
        assert_eq!(fb.color_at(0, 0), RED);
    }

    #[test]
    fn test_translucent_blend_over_background() {
        let mut fb = Framebuffer::new(4, 4, WHITE).unwrap();
        fb.fill_triangle(big_triangle(5.0, [0.0, 0.0, 0.0]), 0.1, false);
        let c = fb.color_at(0, 0);
        assert!((c[0] - 0.9).abs() < 1e-5);
        // no depth written: an opaque primitive behind still shows through
        fb.fill_triangle(big_triangle(50.0, RED), 1.0, true);
        assert_eq!(fb.color_at(0, 0), RED);
    }

    #[test]
    fn test_sphere_center_is_lit() {
        let mut fb = Framebuffer::new(21, 21, WHITE).unwrap();
        let sprite = SphereSprite {
            cx: 10.5,
            cy: 10.5,
            radius_px: 6.0,
            depth: 100.0,
            world_radius: 2.0,
            color: RED,
        };
        fb.fill_sphere(&sprite, 1.0, true);
        let center = fb.color_at(10, 10);
        assert!(center[0] > 0.8);
        assert!(center[1] < 0.3);
        assert_eq!(fb.color_at(0, 0), WHITE);
    }

    #[test]
    fn test_resolve_averages() {
        let mut fb = Framebuffer::new(2, 2, WHITE).unwrap();
        fb.fill_triangle(
            [
                vertex(0.0, 0.0, 1.0, [0.0; 3]),
                vertex(1.0, 0.0, 1.0, [0.0; 3]),
                vertex(0.0, 1.0, 1.0, [0.0; 3]),
            ],
            1.0,
            true,
        );
        let frame = fb.resolve(2).unwrap();
        assert_eq!((frame.width, frame.height), (1, 1));
        // one of four samples black
        assert_eq!(frame.pixel(0, 0), [191, 191, 191]);
    }

    #[test]
    fn test_resolve_rejects_bad_factor() {
        let fb = Framebuffer::new(3, 3, WHITE).unwrap();
        assert!(fb.resolve(2).is_err());
        assert!(fb.resolve(0).is_err());
        assert!(fb.resolve(1).is_ok());
    }

    #[test]
    fn test_filled_frame() {
        let frame = RgbFrame::filled(3, 2, [1, 2, 3]);
        assert_eq!(frame.data.len(), 18);
        assert_eq!(frame.pixel(2, 1), [1, 2, 3]);
    }
}
