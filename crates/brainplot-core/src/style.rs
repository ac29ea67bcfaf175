//! Plot option resolution
//!
//! Call-site [`PlotOptions`] win over the [`PlotSettings`] stored in the data
//! file, which in turn win over the per-mode defaults:
//!
//! | Mode           | Colormap       | Electrode size | Marker scaling |
//! |----------------|----------------|----------------|----------------|
//! | single subject | `YlOrBr`       | 4.0            | uniform        |
//! | group          | `PuOr`         | 2.5            | by magnitude   |
//! | region plot    | `gist_rainbow` | mode default   | uniform        |
//!
//! `settings.colormap`, when present, overrides the colormap in every mode.

use std::collections::BTreeSet;

use crate::colormap::{Colormap, ColormapSpec, ScalarRange};
use crate::dataset::{ElectrodeDataset, PlotSettings};
use crate::error::StyleError;
use crate::transform::LogScale;

/// Default marker diameter for single-subject plots
pub const SINGLE_SUBJECT_ELECTRODE_SIZE: f64 = 4.0;

/// Default marker diameter for group plots
pub const GROUP_ELECTRODE_SIZE: f64 = 2.5;

/// Default opacity of sub-threshold electrodes
pub const DEFAULT_SUBTHRESHOLD_OPACITY: f64 = 0.2;

/// How marker size follows the scalar value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Every marker has the configured diameter
    #[default]
    Uniform,
    /// Diameter grows with `|value|` relative to the color range
    Magnitude,
}

/// Per-call plot options
///
/// `None` fields defer to the data file's settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotOptions {
    /// Display values through a two-sided log10
    pub log10: Option<bool>,
    /// Treat data as a single subject
    pub single_subject: Option<bool>,
    /// Color by region instead of t-value
    pub region_plot: Option<bool>,
    /// Electrodes with `|t|` below this are drawn with [`Self::opacity`]
    pub opacity_threshold: f64,
    /// Opacity of sub-threshold electrodes
    pub opacity: f64,
    /// Color range override `(vmin, vmax)`
    pub clip: (Option<f64>, Option<f64>),
    /// Draw each electrode's subject id next to it
    pub label_subjects: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            log10: None,
            single_subject: None,
            region_plot: None,
            opacity_threshold: 0.0,
            opacity: DEFAULT_SUBTHRESHOLD_OPACITY,
            clip: (None, None),
            label_subjects: false,
        }
    }
}

/// Fully resolved marker styling
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    /// Log transform applied to displayed values
    pub log: Option<LogScale>,
    /// Single-subject mode
    pub single_subject: bool,
    /// Region coloring mode
    pub region_plot: bool,
    /// Colormap for electrode markers
    pub colormap: ColormapSpec,
    /// Colormap for stimulation markers
    pub stim_colormap: ColormapSpec,
    /// Marker diameter in mesh units
    pub electrode_size: f64,
    /// Marker scaling
    pub scale_mode: ScaleMode,
}

impl ResolvedStyle {
    /// Merge options, settings and mode defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError`] for unknown colormap names, a non-positive
    /// electrode size or an opacity outside `[0, 1]`.
    pub fn resolve(settings: &PlotSettings, options: &PlotOptions) -> Result<Self, StyleError> {
        if !(0.0..=1.0).contains(&options.opacity) {
            return Err(StyleError::InvalidOpacity(options.opacity));
        }

        let log10 = options
            .log10
            .unwrap_or_else(|| settings.log10_data.unwrap_or(false));
        let single_subject = options
            .single_subject
            .unwrap_or_else(|| settings.single_subject.unwrap_or(false));
        let region_plot = options
            .region_plot
            .unwrap_or_else(|| settings.do_region_plot.unwrap_or(false));

        let (default_colormap, default_size, mut scale_mode) = if single_subject {
            (Colormap::YlOrBr, SINGLE_SUBJECT_ELECTRODE_SIZE, ScaleMode::Uniform)
        } else {
            (Colormap::PuOr, GROUP_ELECTRODE_SIZE, ScaleMode::Magnitude)
        };
        let default_colormap = if region_plot {
            // Region codes carry no magnitude.
            scale_mode = ScaleMode::Uniform;
            Colormap::GistRainbow
        } else {
            default_colormap
        };

        let colormap = match settings.colormap.as_deref() {
            Some(name) => name.parse()?,
            None => ColormapSpec::new(default_colormap),
        };
        let stim_colormap = match settings.stim_colormap.as_deref() {
            Some(name) => name.parse()?,
            None => ColormapSpec::new(Colormap::Cool),
        };

        let electrode_size = settings.electrode_size.unwrap_or(default_size);
        if !(electrode_size.is_finite() && electrode_size > 0.0) {
            return Err(StyleError::InvalidSize(electrode_size));
        }

        Ok(Self {
            log: log10.then(LogScale::base10),
            single_subject,
            region_plot,
            colormap,
            stim_colormap,
            electrode_size,
            scale_mode,
        })
    }

    /// Scalars that drive electrode color.
    ///
    /// The log transform applies first; a region plot then replaces the
    /// values with region codes.
    #[must_use]
    pub fn display_scalars(&self, dataset: &ElectrodeDataset) -> Vec<f64> {
        if self.region_plot {
            return region_scalars(&dataset.regions);
        }
        match self.log {
            Some(scale) => scale.apply_all(&dataset.t_values),
            None => dataset.t_values.clone(),
        }
    }
}

/// Map region labels to evenly spaced codes in `[-1, 1]`.
///
/// Distinct labels are ordered lexicographically so the same data always
/// gets the same colors. A single region maps to -1.
#[must_use]
pub fn region_scalars(regions: &[String]) -> Vec<f64> {
    let unique: Vec<&str> = regions
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let step = if unique.len() > 1 {
        2.0 / (unique.len() - 1) as f64
    } else {
        0.0
    };
    regions
        .iter()
        .map(|region| {
            let index = unique.binary_search(&region.as_str()).unwrap_or(0);
            -1.0 + index as f64 * step
        })
        .collect()
}

/// Resolve the color range for the displayed scalars.
///
/// `clip` bounds win over `settings.vmin`/`vmax`. With neither bound set the
/// range is symmetric around zero at the largest displayed magnitude; with
/// one bound set the other comes from the data extreme on that side.
///
/// # Errors
///
/// Returns [`StyleError::EmptyRange`] if a bound must be derived from data
/// and there is none, or [`StyleError::InvalidRange`] if the bounds are
/// reversed.
pub fn resolve_range(
    settings: &PlotSettings,
    options: &PlotOptions,
    displayed: &[f64],
) -> Result<ScalarRange, StyleError> {
    let vmin = options.clip.0.or(settings.vmin);
    let vmax = options.clip.1.or(settings.vmax);

    let data_min = || displayed.iter().copied().reduce(f64::min);
    let data_max = || displayed.iter().copied().reduce(f64::max);

    match (vmin, vmax) {
        (Some(min), Some(max)) => ScalarRange::new(min, max),
        (None, None) => {
            let bound = displayed
                .iter()
                .map(|v| v.abs())
                .reduce(f64::max)
                .ok_or(StyleError::EmptyRange)?;
            Ok(ScalarRange::symmetric(bound))
        }
        (Some(min), None) => {
            let max = data_max().ok_or(StyleError::EmptyRange)?.max(min);
            ScalarRange::new(min, max)
        }
        (None, Some(max)) => {
            let min = data_min().ok_or(StyleError::EmptyRange)?.min(max);
            ScalarRange::new(min, max)
        }
    }
}
