//! Colormaps for electrode scalars
//!
//! Colormaps follow the matplotlib names researchers already use in their
//! settings files (`PuOr`, `YlOrBr`, `gist_rainbow`, ...). Appending `_r`
//! reverses a map. Scalars are mapped through a 256-entry [`LookupTable`]
//! over a [`ScalarRange`], the same quantization a VTK scalar bar shows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StyleError;

/// Linear RGB color with channels in `[0, 1]`
pub type Rgb = [f32; 3];

/// Number of entries in a [`LookupTable`]
pub const LUT_SIZE: usize = 256;

/// Named colormap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colormap {
    /// Diverging orange-white-purple (group t-scores)
    PuOr,
    /// Sequential yellow-orange-brown (single subject)
    YlOrBr,
    /// Rainbow without wrap-around (region plots)
    GistRainbow,
    /// Cyan to magenta (stimulation sites)
    Cool,
    /// Diverging red-white-blue
    RdBu,
    /// Classic blue-cyan-yellow-red
    Jet,
    /// Perceptually uniform, good for scientific data
    Viridis,
    /// Purple to yellow, perceptually uniform
    Plasma,
    /// Black to yellow through red
    Inferno,
    /// Diverging blue-white-red for +/- values
    CoolWarm,
    /// Black to white
    Gray,
}

// Evenly spaced control colors (ColorBrewer / matplotlib listed maps).
const PUOR: [[u8; 3]; 11] = [
    [127, 59, 8],
    [179, 88, 6],
    [224, 130, 20],
    [253, 184, 99],
    [254, 224, 182],
    [247, 247, 247],
    [216, 218, 235],
    [178, 171, 210],
    [128, 115, 172],
    [84, 39, 136],
    [45, 0, 75],
];

const YLORBR: [[u8; 3]; 9] = [
    [255, 255, 229],
    [255, 247, 188],
    [254, 227, 145],
    [254, 196, 79],
    [254, 153, 41],
    [236, 112, 20],
    [204, 76, 2],
    [153, 52, 4],
    [102, 37, 6],
];

const RDBU: [[u8; 3]; 11] = [
    [103, 0, 31],
    [178, 24, 43],
    [214, 96, 77],
    [244, 165, 130],
    [253, 219, 199],
    [247, 247, 247],
    [209, 229, 240],
    [146, 197, 222],
    [67, 147, 195],
    [33, 102, 172],
    [5, 48, 97],
];

const VIRIDIS: [[u8; 3]; 11] = [
    [68, 1, 84],
    [72, 36, 117],
    [65, 68, 135],
    [53, 95, 141],
    [42, 120, 142],
    [33, 145, 140],
    [34, 168, 132],
    [68, 191, 112],
    [122, 209, 81],
    [189, 223, 38],
    [253, 231, 37],
];

const PLASMA: [[u8; 3]; 11] = [
    [13, 8, 135],
    [65, 4, 157],
    [106, 0, 168],
    [143, 13, 164],
    [177, 42, 144],
    [204, 71, 120],
    [225, 100, 98],
    [242, 132, 75],
    [252, 166, 54],
    [252, 206, 37],
    [240, 249, 33],
];

const INFERNO: [[u8; 3]; 11] = [
    [0, 0, 4],
    [22, 11, 57],
    [66, 10, 104],
    [106, 23, 110],
    [147, 38, 103],
    [188, 55, 84],
    [221, 81, 58],
    [243, 120, 25],
    [252, 165, 10],
    [246, 215, 70],
    [252, 255, 164],
];

const COOLWARM: [[u8; 3]; 5] = [
    [59, 76, 192],
    [141, 176, 254],
    [221, 221, 221],
    [244, 154, 123],
    [180, 4, 38],
];

// Positioned stops for maps defined by uneven segment data.
const GIST_RAINBOW: [(f32, Rgb); 8] = [
    (0.000, [1.00, 0.00, 0.16]),
    (0.030, [1.00, 0.00, 0.00]),
    (0.215, [1.00, 1.00, 0.00]),
    (0.400, [0.00, 1.00, 0.00]),
    (0.586, [0.00, 1.00, 1.00]),
    (0.770, [0.00, 0.00, 1.00]),
    (0.954, [1.00, 0.00, 1.00]),
    (1.000, [1.00, 0.00, 0.75]),
];

const JET_R: [(f32, f32); 5] = [(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
const JET_G: [(f32, f32); 6] = [
    (0.0, 0.0),
    (0.125, 0.0),
    (0.375, 1.0),
    (0.64, 1.0),
    (0.91, 0.0),
    (1.0, 0.0),
];
const JET_B: [(f32, f32); 5] = [(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

impl Colormap {
    /// Every known colormap
    pub const ALL: [Colormap; 11] = [
        Colormap::PuOr,
        Colormap::YlOrBr,
        Colormap::GistRainbow,
        Colormap::Cool,
        Colormap::RdBu,
        Colormap::Jet,
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Inferno,
        Colormap::CoolWarm,
        Colormap::Gray,
    ];

    /// Matplotlib-style name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Colormap::PuOr => "PuOr",
            Colormap::YlOrBr => "YlOrBr",
            Colormap::GistRainbow => "gist_rainbow",
            Colormap::Cool => "cool",
            Colormap::RdBu => "RdBu",
            Colormap::Jet => "jet",
            Colormap::Viridis => "viridis",
            Colormap::Plasma => "plasma",
            Colormap::Inferno => "inferno",
            Colormap::CoolWarm => "coolwarm",
            Colormap::Gray => "gray",
        }
    }

    /// Look up a colormap by name (case-insensitive, no `_r` suffix)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Sample the colormap at parameter t (0.0 to 1.0)
    #[must_use]
    pub fn sample(&self, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Colormap::PuOr => sample_even(&PUOR, t),
            Colormap::YlOrBr => sample_even(&YLORBR, t),
            Colormap::RdBu => sample_even(&RDBU, t),
            Colormap::Viridis => sample_even(&VIRIDIS, t),
            Colormap::Plasma => sample_even(&PLASMA, t),
            Colormap::Inferno => sample_even(&INFERNO, t),
            Colormap::CoolWarm => sample_even(&COOLWARM, t),
            Colormap::GistRainbow => sample_stops(&GIST_RAINBOW, t),
            Colormap::Cool => [t, 1.0 - t, 1.0],
            Colormap::Jet => [
                sample_segments(&JET_R, t),
                sample_segments(&JET_G, t),
                sample_segments(&JET_B, t),
            ],
            Colormap::Gray => [t, t, t],
        }
    }
}

fn lerp(a: f32, b: f32, s: f32) -> f32 {
    a + (b - a) * s
}

fn sample_even(table: &[[u8; 3]], t: f32) -> Rgb {
    let scaled = t * (table.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(table.len() - 2);
    let s = scaled - i as f32;
    let a = table[i];
    let b = table[i + 1];
    [
        lerp(f32::from(a[0]), f32::from(b[0]), s) / 255.0,
        lerp(f32::from(a[1]), f32::from(b[1]), s) / 255.0,
        lerp(f32::from(a[2]), f32::from(b[2]), s) / 255.0,
    ]
}

fn sample_stops(stops: &[(f32, Rgb)], t: f32) -> Rgb {
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let s = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return [lerp(c0[0], c1[0], s), lerp(c0[1], c1[1], s), lerp(c0[2], c1[2], s)];
        }
    }
    stops[stops.len() - 1].1
}

fn sample_segments(points: &[(f32, f32)], t: f32) -> f32 {
    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t <= t1 {
            let s = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return lerp(v0, v1, s);
        }
    }
    points[points.len() - 1].1
}

/// A colormap plus orientation, parsed from names like `"PuOr_r"`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColormapSpec {
    /// Base colormap
    pub colormap: Colormap,
    /// Sample from 1 down to 0
    pub reversed: bool,
}

impl ColormapSpec {
    /// Forward orientation of `colormap`
    #[must_use]
    pub const fn new(colormap: Colormap) -> Self {
        Self {
            colormap,
            reversed: false,
        }
    }

    /// Sample with orientation applied
    #[must_use]
    pub fn sample(&self, t: f32) -> Rgb {
        if self.reversed {
            self.colormap.sample(1.0 - t)
        } else {
            self.colormap.sample(t)
        }
    }
}

impl From<Colormap> for ColormapSpec {
    fn from(colormap: Colormap) -> Self {
        Self::new(colormap)
    }
}

impl FromStr for ColormapSpec {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, reversed) = match trimmed.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        Colormap::from_name(base)
            .map(|colormap| Self { colormap, reversed })
            .ok_or_else(|| StyleError::UnknownColormap {
                name: s.to_string(),
                available: Colormap::ALL
                    .iter()
                    .map(Colormap::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl TryFrom<String> for ColormapSpec {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColormapSpec> for String {
    fn from(spec: ColormapSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ColormapSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.colormap.name())?;
        if self.reversed {
            f.write_str("_r")?;
        }
        Ok(())
    }
}

/// Closed scalar interval mapped onto a colormap
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalarRange {
    /// Value mapped to the bottom of the colormap
    pub min: f64,
    /// Value mapped to the top of the colormap
    pub max: f64,
}

impl ScalarRange {
    /// Create a range, rejecting reversed or non-finite bounds.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidRange`] when `min > max` or either bound
    /// is not finite.
    pub fn new(min: f64, max: f64) -> Result<Self, StyleError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(StyleError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// `[-bound, bound]`
    #[must_use]
    pub fn symmetric(bound: f64) -> Self {
        let bound = bound.abs();
        Self {
            min: -bound,
            max: bound,
        }
    }

    /// Width of the interval
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Largest absolute bound
    pub fn max_abs(&self) -> f64 {
        self.min.abs().max(self.max.abs())
    }

    /// Position of `value` within the range, clamped to `[0, 1]`.
    ///
    /// A zero-width range maps everything to the middle of the colormap.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span <= f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// `count` evenly spaced values from `min` to `max` inclusive
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                let step = self.span() / (count - 1) as f64;
                (0..count).map(|i| self.min + step * i as f64).collect()
            }
        }
    }
}

/// Quantized colormap over a scalar range
#[derive(Clone, Debug)]
pub struct LookupTable {
    table: Vec<Rgb>,
    range: ScalarRange,
}

impl LookupTable {
    /// Build a [`LUT_SIZE`]-entry table
    #[must_use]
    pub fn new(spec: ColormapSpec, range: ScalarRange) -> Self {
        let table = (0..LUT_SIZE)
            .map(|i| spec.sample(i as f32 / (LUT_SIZE - 1) as f32))
            .collect();
        Self { table, range }
    }

    /// The scalar range this table covers
    pub fn range(&self) -> ScalarRange {
        self.range
    }

    /// Color for a scalar value; out-of-range values clamp to the ends
    #[must_use]
    pub fn map(&self, value: f64) -> Rgb {
        self.map_normalized(self.range.normalize(value))
    }

    /// Color for an already normalized position in `[0, 1]`
    #[must_use]
    pub fn map_normalized(&self, t: f64) -> Rgb {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (t.clamp(0.0, 1.0) * LUT_SIZE as f64) as usize;
        self.table[index.min(LUT_SIZE - 1)]
    }
}
