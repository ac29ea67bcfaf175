//! Electrode data files
//!
//! An electrode data file is a JSON document with one entry per electrode in
//! each of `coords`, `t_values` and `regions` (and optionally `subjects`),
//! plus stimulation coordinates and a settings mapping:
//!
//! ```json
//! {
//!   "subjects": ["S01", "S02"],
//!   "coords": [[-32.1, 10.4, 5.0], [40.2, -12.0, 18.3]],
//!   "t_values": [2.7, -4.1],
//!   "regions": ["insula", "hippocampus"],
//!   "stim_coords": [[20.0, 0.0, -4.0]],
//!   "settings": [{ "colormap": "PuOr", "log10_data": false }]
//! }
//! ```
//!
//! `settings` may be given either as a mapping or as a one-element list
//! holding the mapping.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Region label used when a file carries no `regions` array.
pub const UNKNOWN_REGION: &str = "unknown";

/// Plot settings stored alongside the electrode data.
///
/// Every field is optional; unset fields fall back to defaults that depend
/// on the plot mode (see [`crate::style`]).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    /// Colormap override for electrode markers
    pub colormap: Option<String>,
    /// Colormap for stimulation site markers
    pub stim_colormap: Option<String>,
    /// Lower bound of the color range
    pub vmin: Option<f64>,
    /// Upper bound of the color range
    pub vmax: Option<f64>,
    /// Display t-values through a two-sided log10
    pub log10_data: Option<bool>,
    /// Data comes from a single subject
    pub single_subject: Option<bool>,
    /// Marker diameter in mesh units
    pub electrode_size: Option<f64>,
    /// Color electrodes by region instead of t-value
    pub do_region_plot: Option<bool>,
    /// Keys this program does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SettingsField {
    Single(PlotSettings),
    List(Vec<PlotSettings>),
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    subjects: Vec<String>,
    coords: Vec<[f64; 3]>,
    t_values: Vec<f64>,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    stim_coords: Vec<[f64; 3]>,
    #[serde(default)]
    settings: Option<SettingsField>,
}

/// Validated electrode data.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectrodeDataset {
    /// Subject identifier per electrode (may be empty)
    pub subjects: Vec<String>,
    /// Electrode positions in mesh coordinates
    pub coords: Vec<[f64; 3]>,
    /// Statistic per electrode
    pub t_values: Vec<f64>,
    /// Region label per electrode
    pub regions: Vec<String>,
    /// Stimulation site positions
    pub stim_coords: Vec<[f64; 3]>,
    /// Plot settings shipped with the data
    pub settings: PlotSettings,
}

impl ElectrodeDataset {
    /// Read and validate an electrode data file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read, is not valid
    /// electrode JSON, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json_str(&text)?;

        tracing::info!("Number of electrodes: {}", dataset.len());
        tracing::debug!("Settings: {:?}", dataset.settings);
        if !dataset.settings.extra.is_empty() {
            tracing::debug!(
                "Ignoring unrecognised settings: {:?}",
                dataset.settings.extra.keys().collect::<Vec<_>>()
            );
        }
        Ok(dataset)
    }

    /// Parse and validate electrode JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] on malformed JSON, mismatched array lengths
    /// or non-finite values.
    pub fn from_json_str(text: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDataset) -> Result<Self, DatasetError> {
        let n = raw.coords.len();

        check_len("t_values", raw.t_values.len(), n)?;
        if !raw.subjects.is_empty() {
            check_len("subjects", raw.subjects.len(), n)?;
        }
        let regions = if raw.regions.is_empty() {
            vec![UNKNOWN_REGION.to_string(); n]
        } else {
            check_len("regions", raw.regions.len(), n)?;
            raw.regions
        };

        check_finite_points("coords", &raw.coords)?;
        check_finite_points("stim_coords", &raw.stim_coords)?;
        if let Some(index) = raw.t_values.iter().position(|v| !v.is_finite()) {
            return Err(DatasetError::NonFinite {
                field: "t_values",
                index,
            });
        }

        let settings = match raw.settings {
            None => PlotSettings::default(),
            Some(SettingsField::Single(settings)) => settings,
            Some(SettingsField::List(mut list)) => {
                if list.len() != 1 {
                    return Err(DatasetError::SettingsCount(list.len()));
                }
                list.remove(0)
            }
        };

        Ok(Self {
            subjects: raw.subjects,
            coords: raw.coords,
            t_values: raw.t_values,
            regions,
            stim_coords: raw.stim_coords,
            settings,
        })
    }

    /// Number of electrodes
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// True when the file holds no electrodes
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

fn check_len(field: &'static str, got: usize, expected: usize) -> Result<(), DatasetError> {
    if got == expected {
        Ok(())
    } else {
        Err(DatasetError::LengthMismatch {
            field,
            got,
            expected,
        })
    }
}

fn check_finite_points(field: &'static str, points: &[[f64; 3]]) -> Result<(), DatasetError> {
    match points
        .iter()
        .position(|p| p.iter().any(|c| !c.is_finite()))
    {
        Some(index) => Err(DatasetError::NonFinite { field, index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "subjects": ["S01", "S02", "S02"],
        "coords": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [-1.0, -2.0, -3.0]],
        "t_values": [2.5, -3.0, 0.5],
        "regions": ["insula", "amygdala", "insula"],
        "stim_coords": [[0.0, 0.0, 0.0]],
        "settings": [{"colormap": "RdBu", "vmax": 4.0, "study": "pilot"}]
    }"#;

    #[test]
    fn test_parse_sample() {
        let data = ElectrodeDataset::from_json_str(SAMPLE).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.subjects[1], "S02");
        assert_eq!(data.stim_coords.len(), 1);
        assert_eq!(data.settings.colormap.as_deref(), Some("RdBu"));
        assert_eq!(data.settings.vmax, Some(4.0));
        assert_eq!(data.settings.vmin, None);
        assert!(data.settings.extra.contains_key("study"));
    }

    #[test]
    fn test_settings_as_mapping() {
        let json = r#"{"coords": [[0,0,0]], "t_values": [1.0], "settings": {"single_subject": true}}"#;
        let data = ElectrodeDataset::from_json_str(json).unwrap();
        assert_eq!(data.settings.single_subject, Some(true));
        assert_eq!(data.regions, vec![UNKNOWN_REGION.to_string()]);
        assert!(data.subjects.is_empty());
    }

    #[test]
    fn test_missing_settings_default() {
        let json = r#"{"coords": [], "t_values": []}"#;
        let data = ElectrodeDataset::from_json_str(json).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.settings, PlotSettings::default());
    }

    #[test]
    fn test_length_mismatch() {
        let json = r#"{"coords": [[0,0,0], [1,1,1]], "t_values": [1.0]}"#;
        let err = ElectrodeDataset::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::LengthMismatch {
                field: "t_values",
                got: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn test_region_length_mismatch() {
        let json = r#"{"coords": [[0,0,0]], "t_values": [1.0], "regions": ["a", "b"]}"#;
        assert!(matches!(
            ElectrodeDataset::from_json_str(json),
            Err(DatasetError::LengthMismatch { field: "regions", .. })
        ));
    }

    #[test]
    fn test_settings_list_must_hold_one() {
        let json = r#"{"coords": [], "t_values": [], "settings": [{}, {}]}"#;
        assert!(matches!(
            ElectrodeDataset::from_json_str(json),
            Err(DatasetError::SettingsCount(2))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ElectrodeDataset::load("/nonexistent/brainplot/data.json").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
