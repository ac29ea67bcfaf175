//! TOML configuration for the `brainplot` binary
//!
//! Every field has a default, so a config file only needs the values that
//! differ. A missing file is created with the defaults written out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use brainplot_core::{PlotOptions, Rgb};
use brainplot_native::mesh::MeshStyle;
use brainplot_native::scene::{SceneStyle, DEFAULT_SUPERSAMPLE};
use brainplot_native::video::{EncoderSettings, VIDEO_ELEVATION_DEG};
use brainplot_native::{RotationPlan, ViewAngles};
use serde::{Deserialize, Serialize};

/// Default config file name
pub const DEFAULT_CONFIG_PATH: &str = "brainplot.toml";

/// Input files, frame size and colors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneConfig {
    /// Surface meshes (legacy VTK)
    #[serde(default = "SceneConfig::default_meshes")]
    pub meshes: Vec<PathBuf>,
    /// Electrode data file (JSON)
    #[serde(default = "SceneConfig::default_data")]
    pub data: PathBuf,
    /// Frame width in pixels
    #[serde(default = "SceneConfig::default_size")]
    pub width: u32,
    /// Frame height in pixels
    #[serde(default = "SceneConfig::default_size")]
    pub height: u32,
    /// Background color
    #[serde(default = "SceneConfig::default_background")]
    pub background: Rgb,
    /// Text and colorbar frame color
    #[serde(default)]
    pub foreground: Rgb,
    /// Supersampling factor per axis (1 to 4)
    #[serde(default = "SceneConfig::default_supersample")]
    pub supersample: u32,
}

impl SceneConfig {
    fn default_meshes() -> Vec<PathBuf> {
        vec![PathBuf::from("lh.vtk"), PathBuf::from("rh.vtk")]
    }
    fn default_data() -> PathBuf {
        PathBuf::from("brain_plot_data.json")
    }
    fn default_size() -> u32 {
        1080
    }
    fn default_background() -> Rgb {
        [1.0, 1.0, 1.0]
    }
    fn default_supersample() -> u32 {
        DEFAULT_SUPERSAMPLE
    }

    /// Renderer colors and quality
    pub fn scene_style(&self) -> SceneStyle {
        SceneStyle {
            background: self.background,
            foreground: self.foreground,
            supersample: self.supersample,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            meshes: Self::default_meshes(),
            data: Self::default_data(),
            width: Self::default_size(),
            height: Self::default_size(),
            background: Self::default_background(),
            foreground: [0.0; 3],
            supersample: Self::default_supersample(),
        }
    }
}

/// Surface material shared by all meshes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeshConfig {
    /// Surface color
    #[serde(default)]
    pub color: Rgb,
    /// Surface opacity
    #[serde(default = "MeshConfig::default_opacity")]
    pub opacity: f32,
}

impl MeshConfig {
    fn default_opacity() -> f32 {
        MeshStyle::default().opacity
    }

    /// Material for every mesh
    pub fn mesh_style(&self) -> MeshStyle {
        MeshStyle {
            color: self.color,
            opacity: self.opacity,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            color: [0.0; 3],
            opacity: Self::default_opacity(),
        }
    }
}

/// Electrode styling; unset flags defer to the data file's settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElectrodeConfig {
    /// Two-sided log10 of the t-values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log10: Option<bool>,
    /// Single-subject styling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_subject: Option<bool>,
    /// Color by region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_plot: Option<bool>,
    /// `|t|` below this is drawn faded
    #[serde(default)]
    pub opacity_threshold: f64,
    /// Opacity of faded electrodes
    #[serde(default = "ElectrodeConfig::default_opacity")]
    pub opacity: f64,
    /// Lower end of the color range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_min: Option<f64>,
    /// Upper end of the color range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_max: Option<f64>,
    /// Label electrodes with their subject id
    #[serde(default)]
    pub label_subjects: bool,
}

impl ElectrodeConfig {
    fn default_opacity() -> f64 {
        PlotOptions::default().opacity
    }

    /// Options for building the electrode plot
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            log10: self.log10,
            single_subject: self.single_subject,
            region_plot: self.region_plot,
            opacity_threshold: self.opacity_threshold,
            opacity: self.opacity,
            clip: (self.clip_min, self.clip_max),
            label_subjects: self.label_subjects,
        }
    }
}

impl Default for ElectrodeConfig {
    fn default() -> Self {
        Self {
            log10: None,
            single_subject: None,
            region_plot: None,
            opacity_threshold: 0.0,
            opacity: Self::default_opacity(),
            clip_min: None,
            clip_max: None,
            label_subjects: false,
        }
    }
}

/// Interactive view, as offsets from the default framing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewConfig {
    /// Degrees about +Z
    #[serde(default)]
    pub rotation: f32,
    /// Degrees above the horizon
    #[serde(default)]
    pub elevation: f32,
    /// Extra camera distance
    #[serde(default)]
    pub distance: f32,
}

impl ViewConfig {
    /// Camera placement
    pub fn view_angles(&self) -> ViewAngles {
        ViewAngles::interactive(self.rotation, self.elevation, self.distance)
    }
}

/// How flythrough frames are written
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VideoFormat {
    /// Encode through `ffmpeg`
    #[default]
    Mp4,
    /// Numbered PNG files
    PngSequence,
}

/// Rotating flythrough settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoConfig {
    /// Length in seconds
    #[serde(default = "VideoConfig::default_duration_s")]
    pub duration_s: u32,
    /// Total rotation in degrees
    #[serde(default = "VideoConfig::default_degrees")]
    pub degrees: f32,
    /// Frames per second
    #[serde(default = "VideoConfig::default_fps")]
    pub fps: u32,
    /// Output file (mp4) or directory (png-sequence)
    #[serde(default = "VideoConfig::default_output")]
    pub output: PathBuf,
    /// Output container
    #[serde(default)]
    pub format: VideoFormat,
    /// Video codec
    #[serde(default = "VideoConfig::default_codec")]
    pub codec: String,
    /// Output pixel format
    #[serde(default = "VideoConfig::default_pix_fmt")]
    pub pix_fmt: String,
    /// Camera elevation, degrees from +Z
    #[serde(default = "VideoConfig::default_elevation")]
    pub elevation: f32,
    /// Camera distance
    #[serde(default = "VideoConfig::default_distance")]
    pub distance: f32,
}

impl VideoConfig {
    fn default_duration_s() -> u32 {
        8
    }
    fn default_degrees() -> f32 {
        360.0
    }
    fn default_fps() -> u32 {
        25
    }
    fn default_output() -> PathBuf {
        PathBuf::from("spinningBrainPlot.mp4")
    }
    fn default_codec() -> String {
        "libx264".to_string()
    }
    fn default_pix_fmt() -> String {
        "yuv444p".to_string()
    }
    fn default_elevation() -> f32 {
        VIDEO_ELEVATION_DEG
    }
    fn default_distance() -> f32 {
        RotationPlan::default().distance
    }

    /// Camera path
    pub fn rotation_plan(&self) -> RotationPlan {
        RotationPlan {
            fps: self.fps,
            duration_s: self.duration_s,
            degrees: self.degrees,
            elevation_deg: self.elevation,
            distance: self.distance,
        }
    }

    /// Output path, with `.mp4` added when encoding a video without an
    /// extension
    pub fn output_path(&self) -> PathBuf {
        if self.format == VideoFormat::Mp4 && self.output.extension().is_none() {
            self.output.with_extension("mp4")
        } else {
            self.output.clone()
        }
    }

    /// `ffmpeg` settings for a `width` x `height` video
    pub fn encoder_settings(&self, width: u32, height: u32) -> EncoderSettings {
        EncoderSettings {
            codec: self.codec.clone(),
            pix_fmt: self.pix_fmt.clone(),
            ..EncoderSettings::new(self.output_path(), width, height, self.fps)
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            duration_s: Self::default_duration_s(),
            degrees: Self::default_degrees(),
            fps: Self::default_fps(),
            output: Self::default_output(),
            format: VideoFormat::default(),
            codec: Self::default_codec(),
            pix_fmt: Self::default_pix_fmt(),
            elevation: Self::default_elevation(),
            distance: Self::default_distance(),
        }
    }
}

/// Whole config file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `[scene]`
    #[serde(default)]
    pub scene: SceneConfig,
    /// `[mesh]`
    #[serde(default)]
    pub mesh: MeshConfig,
    /// `[electrodes]`
    #[serde(default)]
    pub electrodes: ElectrodeConfig,
    /// `[view]`
    #[serde(default)]
    pub view: ViewConfig,
    /// `[video]`
    #[serde(default)]
    pub video: VideoConfig,
}

impl AppConfig {
    /// Read `path`, or write the defaults there if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be read or parsed, or if the
    /// defaults cannot be written.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            return Ok(config);
        }

        let config = Self::default();
        let text = toml::to_string_pretty(&config).context("Failed to serialize default config")?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write default config {}", path.display()))?;
        tracing::info!("Wrote default config to {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("brainplot-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_load_or_default_writes_defaults() {
        let path = unique_path("defaults.toml");
        let _ = fs::remove_file(&path);

        let config = AppConfig::load_or_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scene.width, 1080);
        assert_eq!(config.video.fps, 25);

        // The written file reads back to the same config.
        let reread = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(reread, config);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [electrodes]
            opacity_threshold = 2.0
            opacity = 0.0
            clip_min = -3.0
            clip_max = 3.0
            label_subjects = true

            [video]
            format = "png-sequence"
            output = "frames"
            "#,
        )
        .unwrap();
        assert_eq!(config.scene, SceneConfig::default());
        let options = config.electrodes.plot_options();
        assert_eq!(options.clip, (Some(-3.0), Some(3.0)));
        assert_eq!(options.opacity_threshold, 2.0);
        assert_eq!(options.opacity, 0.0);
        assert!(options.label_subjects);
        assert_eq!(options.log10, None);
        assert_eq!(config.video.format, VideoFormat::PngSequence);
        assert_eq!(config.video.output_path(), PathBuf::from("frames"));
    }

    #[test]
    fn test_mp4_extension_added() {
        let video = VideoConfig {
            output: PathBuf::from("spin"),
            ..VideoConfig::default()
        };
        assert_eq!(video.output_path(), PathBuf::from("spin.mp4"));
        let settings = video.encoder_settings(640, 480);
        assert_eq!(settings.output, PathBuf::from("spin.mp4"));
        assert_eq!((settings.width, settings.height, settings.fps), (640, 480, 25));
        assert_eq!(settings.codec, "libx264");
    }

    #[test]
    fn test_rotation_plan_and_view() {
        let config = AppConfig::default();
        let plan = config.video.rotation_plan();
        assert_eq!(plan, RotationPlan::default());

        let view = ViewConfig {
            rotation: 45.0,
            elevation: 10.0,
            distance: -50.0,
        }
        .view_angles();
        assert_eq!(view.azimuth_deg, 135.0);
        assert_eq!(view.elevation_deg, 80.0);
        assert_eq!(view.distance, 400.0);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let path = unique_path("broken.toml");
        fs::write(&path, "[scene\nwidth = ").unwrap();
        assert!(AppConfig::load_or_default(&path).is_err());
        fs::remove_file(&path).unwrap();
    }
}
