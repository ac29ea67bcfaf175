//! Brainplot Native - mesh loading, rendering and export
//!
//! This crate draws the marker layers built by `brainplot-core` on top of
//! translucent cortical surfaces:
//! - Legacy VTK polydata loading
//! - A CPU rasterizer with sphere impostors and depth-sorted transparency
//! - Colorbar and label overlays
//! - Rotating flythrough export through `ffmpeg` or PNG sequences
//! - An interactive viewer
//!
//! # Modules
//!
//! - [`mesh`]: Surface meshes and the VTK reader
//! - [`render`]: Camera, rasterizer and overlays
//! - [`scene`]: Scene composition and frame rendering
//! - [`video`]: Rotation plans and frame sinks
//! - [`viewer`]: Interactive window (requires `viewer` feature)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
mod math;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod video;

/// Interactive viewer (requires `viewer` feature)
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::{MeshError, RenderError, VideoError};
pub use math::Vec3;
pub use mesh::{MeshStyle, SurfaceMesh};
pub use render::{RgbFrame, ViewAngles};
pub use scene::{BrainScene, SceneStyle};
pub use video::{
    render_rotation, save_png, EncoderSettings, FfmpegEncoder, FrameSink, PngSequence, RotationPlan,
};
