//! Interactive brain plot viewer
//!
//! Shows the software-rendered scene in an `eframe` window. Enabled with the
//! `viewer` feature (on by default):
//!
//! ```toml
//! brainplot-native = { version = "0.1", features = ["viewer"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use brainplot_native::viewer::{run_viewer, ViewerConfig};
//!
//! run_viewer(scene, ViewerConfig::default())?;
//! ```

mod app;

pub use app::{apply_controls, run_viewer, BrainViewerApp, Controls, ViewerConfig};
