//! Marker layers for the electrode plot
//!
//! Electrodes are split by `|t| < opacity_threshold` (on the raw t-values,
//! before any log transform) into an opaque layer and a faded sub-threshold
//! layer. Stimulation sites get their own layer. All layers share the same
//! color range, and the colorbar follows the opaque layer.

use crate::colormap::{ColormapSpec, LookupTable, Rgb, ScalarRange};
use crate::dataset::ElectrodeDataset;
use crate::error::StyleError;
use crate::style::{resolve_range, PlotOptions, ResolvedStyle, ScaleMode};

/// Smallest marker diameter, as a fraction of the electrode size, when
/// scaling by magnitude
pub const MIN_MAGNITUDE_SCALE: f64 = 0.25;

/// Number of colorbar labels
pub const COLORBAR_LABELS: usize = 7;

/// Colorbar title
pub const COLORBAR_TITLE: &str = "t-scores";

/// What a layer represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Electrodes at or above the opacity threshold
    Electrodes,
    /// Electrodes below the opacity threshold
    Subthreshold,
    /// Stimulation sites
    Stimulation,
}

/// A group of spherical markers sharing one colormap and opacity
#[derive(Clone, Debug)]
pub struct MarkerLayer {
    /// Layer role
    pub kind: LayerKind,
    /// Marker centers
    pub positions: Vec<[f64; 3]>,
    /// Scalar per marker
    pub scalars: Vec<f64>,
    /// Colormap for scalars
    pub colormap: ColormapSpec,
    /// Shared color range
    pub range: ScalarRange,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Nominal marker diameter
    pub size: f64,
    /// Diameter scaling
    pub scale_mode: ScaleMode,
    lut: LookupTable,
}

impl MarkerLayer {
    /// Create a layer
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: LayerKind,
        positions: Vec<[f64; 3]>,
        scalars: Vec<f64>,
        colormap: ColormapSpec,
        range: ScalarRange,
        opacity: f64,
        size: f64,
        scale_mode: ScaleMode,
    ) -> Self {
        debug_assert_eq!(positions.len(), scalars.len());
        Self {
            kind,
            positions,
            scalars,
            colormap,
            range,
            opacity,
            size,
            scale_mode,
            lut: LookupTable::new(colormap, range),
        }
    }

    /// Number of markers
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when the layer has no markers
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when the layer draws nothing
    pub fn is_invisible(&self) -> bool {
        self.is_empty() || self.opacity <= 0.0
    }

    /// Color of marker `i`
    #[must_use]
    pub fn color_at(&self, i: usize) -> Rgb {
        self.lut.map(self.scalars[i])
    }

    /// Diameter of marker `i`
    #[must_use]
    pub fn diameter_at(&self, i: usize) -> f64 {
        match self.scale_mode {
            ScaleMode::Uniform => self.size,
            ScaleMode::Magnitude => {
                let bound = self.range.max_abs();
                let fraction = if bound > 0.0 {
                    self.scalars[i].abs() / bound
                } else {
                    1.0
                };
                self.size * fraction.clamp(MIN_MAGNITUDE_SCALE, 1.0)
            }
        }
    }
}

/// Scalar bar description
#[derive(Clone, Debug, PartialEq)]
pub struct ColorbarSpec {
    /// Title drawn above the bar
    pub title: String,
    /// Colormap shown
    pub colormap: ColormapSpec,
    /// Range shown
    pub range: ScalarRange,
    /// Number of tick labels
    pub label_count: usize,
    /// Decimal places in labels
    pub precision: usize,
}

impl ColorbarSpec {
    /// Formatted tick labels from `min` to `max`
    #[must_use]
    pub fn labels(&self) -> Vec<(f64, String)> {
        self.range
            .ticks(self.label_count)
            .into_iter()
            .map(|v| (v, format!("{:.*}", self.precision, v)))
            .collect()
    }
}

/// Text anchored at a 3D position
#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    /// Anchor in mesh coordinates
    pub position: [f64; 3],
    /// Label text
    pub text: String,
}

/// Everything the renderer needs to draw the electrodes
#[derive(Clone, Debug)]
pub struct ElectrodePlot {
    /// Marker layers, opaque electrodes first
    pub layers: Vec<MarkerLayer>,
    /// Scalar bar
    pub colorbar: ColorbarSpec,
    /// Subject labels
    pub labels: Vec<TextLabel>,
    /// Resolved styling the layers were built from
    pub style: ResolvedStyle,
}

impl ElectrodePlot {
    /// Layer of the given kind, if present
    pub fn layer(&self, kind: LayerKind) -> Option<&MarkerLayer> {
        self.layers.iter().find(|layer| layer.kind == kind)
    }
}

/// Build the marker layers, colorbar and labels for a dataset.
///
/// # Errors
///
/// Returns [`StyleError`] when styling cannot be resolved (see
/// [`ResolvedStyle::resolve`] and [`resolve_range`]).
pub fn build_electrode_plot(
    dataset: &ElectrodeDataset,
    options: &PlotOptions,
) -> Result<ElectrodePlot, StyleError> {
    let style = ResolvedStyle::resolve(&dataset.settings, options)?;
    let displayed = style.display_scalars(dataset);
    let range = resolve_range(&dataset.settings, options, &displayed)?;

    let labels = if options.label_subjects {
        dataset
            .subjects
            .iter()
            .zip(&dataset.coords)
            .map(|(subject, &position)| TextLabel {
                position,
                text: subject.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut opaque_positions = Vec::new();
    let mut opaque_scalars = Vec::new();
    let mut faded_positions = Vec::new();
    let mut faded_scalars = Vec::new();
    for ((&position, &t), &scalar) in dataset.coords.iter().zip(&dataset.t_values).zip(&displayed) {
        if t.abs() < options.opacity_threshold {
            faded_positions.push(position);
            faded_scalars.push(scalar);
        } else {
            opaque_positions.push(position);
            opaque_scalars.push(scalar);
        }
    }
    tracing::debug!(
        "Opacity threshold {}: {} opaque, {} faded electrodes",
        options.opacity_threshold,
        opaque_positions.len(),
        faded_positions.len()
    );

    let mut layers = vec![MarkerLayer::new(
        LayerKind::Electrodes,
        opaque_positions,
        opaque_scalars,
        style.colormap,
        range,
        1.0,
        style.electrode_size,
        style.scale_mode,
    )];

    if options.opacity_threshold != 0.0 {
        layers.push(MarkerLayer::new(
            LayerKind::Subthreshold,
            faded_positions,
            faded_scalars,
            style.colormap,
            range,
            options.opacity,
            style.electrode_size,
            style.scale_mode,
        ));
    }

    if !dataset.stim_coords.is_empty() {
        layers.push(MarkerLayer::new(
            LayerKind::Stimulation,
            dataset.stim_coords.clone(),
            vec![1.0; dataset.stim_coords.len()],
            style.stim_colormap,
            range,
            1.0,
            style.electrode_size,
            ScaleMode::Uniform,
        ));
    }

    let colorbar = ColorbarSpec {
        title: COLORBAR_TITLE.to_string(),
        colormap: style.colormap,
        range,
        label_count: COLORBAR_LABELS,
        precision: 1,
    };

    Ok(ElectrodePlot {
        layers,
        colorbar,
        labels,
        style,
    })
}
