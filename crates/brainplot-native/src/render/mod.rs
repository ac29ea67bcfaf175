//! Rendering pipeline: camera, rasterizer and 2D overlays

pub mod camera;
pub mod overlay;
pub mod raster;

pub use camera::{Camera3D, ScreenPoint, ViewAngles};
pub use overlay::{draw_overlays, ColorbarLayout, ScreenLabel};
pub use raster::{shade, Framebuffer, RgbFrame, ShadedVertex, SphereSprite};
