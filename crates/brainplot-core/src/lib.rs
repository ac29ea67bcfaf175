//! Brainplot Core - data model and styling for electrode plots
//!
//! This crate turns an electrode data file into render-ready marker layers.
//! It has no rendering dependencies; `brainplot-native` consumes its output.
//!
//! # Modules
//!
//! - [`dataset`]: Electrode coordinates, t-values, regions and plot settings
//! - [`transform`]: Two-sided logarithm used for log-scaled displays
//! - [`colormap`]: Named colormaps, lookup tables and scalar ranges
//! - [`style`]: Resolution of plot options against dataset settings
//! - [`layers`]: Opaque, sub-threshold and stimulation marker layers
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```rust
//! use brainplot_core::{build_electrode_plot, ElectrodeDataset, PlotOptions};
//!
//! let json = r#"{
//!     "coords": [[10.0, 0.0, 0.0], [-10.0, 5.0, 2.0]],
//!     "t_values": [3.5, -1.0],
//!     "regions": ["insula", "amygdala"],
//!     "settings": [{ "single_subject": true }]
//! }"#;
//! let dataset = ElectrodeDataset::from_json_str(json).unwrap();
//! let plot = build_electrode_plot(&dataset, &PlotOptions::default()).unwrap();
//! assert_eq!(plot.layers[0].len(), 2);
//! assert_eq!(plot.colorbar.range.max, 3.5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod colormap;
pub mod dataset;
pub mod error;
pub mod layers;
pub mod style;
pub mod transform;

// Re-export commonly used types at crate root
pub use colormap::{Colormap, ColormapSpec, LookupTable, Rgb, ScalarRange};
pub use dataset::{ElectrodeDataset, PlotSettings};
pub use error::{DatasetError, StyleError};
pub use layers::{build_electrode_plot, ColorbarSpec, ElectrodePlot, LayerKind, MarkerLayer, TextLabel};
pub use style::{PlotOptions, ResolvedStyle, ScaleMode};
pub use transform::LogScale;
