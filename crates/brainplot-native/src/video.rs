//! Rotating flythrough export
//!
//! The camera circles the focal point at a fixed elevation while frames are
//! rendered in parallel batches and handed, in order, to a [`FrameSink`]:
//! either an `ffmpeg` child process fed raw `rgb24` frames on stdin, or a
//! numbered PNG sequence.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use rayon::prelude::*;

use crate::error::{RenderError, VideoError};
use crate::render::camera::{ViewAngles, BASE_AZIMUTH_DEG, BASE_DISTANCE};
use crate::render::raster::RgbFrame;
use crate::scene::BrainScene;

/// Environment variable overriding the `ffmpeg` executable
pub const FFMPEG_ENV: &str = "BRAINPLOT_FFMPEG";

/// Default camera elevation for flythroughs, degrees from +Z
pub const VIDEO_ELEVATION_DEG: f32 = 83.0;

/// Upper bound on frames rendered concurrently
const MAX_BATCH: usize = 8;

/// Supersampled pixels allowed in flight across a batch (about 256 MB of
/// color plus depth)
const BATCH_PIXEL_BUDGET: usize = 16 << 20;

/// Frames to render concurrently for `threads` workers, bounded so the
/// supersampled framebuffers of one batch fit [`BATCH_PIXEL_BUDGET`]
fn batch_size(threads: usize, width: u32, height: u32, supersample: u32) -> usize {
    let ss = supersample.max(1) as usize;
    let pixels = (width as usize * ss).saturating_mul(height as usize * ss).max(1);
    threads.min(MAX_BATCH).min(BATCH_PIXEL_BUDGET / pixels).max(1)
}

/// Camera path for a full rotation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationPlan {
    /// Frames per second
    pub fps: u32,
    /// Video length in seconds
    pub duration_s: u32,
    /// Total rotation in degrees
    pub degrees: f32,
    /// Camera elevation (degrees from +Z)
    pub elevation_deg: f32,
    /// Camera distance
    pub distance: f32,
}

impl Default for RotationPlan {
    fn default() -> Self {
        Self {
            fps: 25,
            duration_s: 8,
            degrees: 360.0,
            elevation_deg: VIDEO_ELEVATION_DEG,
            distance: BASE_DISTANCE,
        }
    }
}

impl RotationPlan {
    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.fps as usize * self.duration_s as usize
    }

    /// Rotation step between frames
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn deg_per_frame(&self) -> f32 {
        match self.frame_count() {
            0 => 0.0,
            n => self.degrees / n as f32,
        }
    }

    /// Rotation of frame `index` relative to the starting view
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rotation_at(&self, index: usize) -> f32 {
        index as f32 * self.deg_per_frame()
    }

    /// Camera for frame `index`
    #[must_use]
    pub fn view_for(&self, index: usize) -> ViewAngles {
        ViewAngles {
            azimuth_deg: BASE_AZIMUTH_DEG + self.rotation_at(index),
            elevation_deg: self.elevation_deg,
            distance: self.distance,
            focal_point: [0.0; 3],
        }
    }
}

/// Destination for rendered frames
pub trait FrameSink {
    /// Consume frame `index`; frames arrive in order
    ///
    /// # Errors
    ///
    /// Returns [`VideoError`] if the frame cannot be written.
    fn write_frame(&mut self, index: usize, frame: &RgbFrame) -> Result<(), VideoError>;

    /// Flush after the last frame
    ///
    /// # Errors
    ///
    /// Returns [`VideoError`] if finalizing the output fails.
    fn finish(&mut self) -> Result<(), VideoError> {
        Ok(())
    }
}

/// `ffmpeg` output options
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderSettings {
    /// Executable to run
    pub program: PathBuf,
    /// Output video file
    pub output: PathBuf,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frames per second
    pub fps: u32,
    /// Video codec (`-vcodec`)
    pub codec: String,
    /// Output pixel format (`-pix_fmt`)
    pub pix_fmt: String,
}

impl EncoderSettings {
    /// H.264 in yuv444p, the default flythrough encoding
    pub fn new(output: impl Into<PathBuf>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            program: ffmpeg_program(),
            output: output.into(),
            width,
            height,
            fps,
            codec: "libx264".to_string(),
            pix_fmt: "yuv444p".to_string(),
        }
    }

    /// Command-line arguments passed to the encoder
    pub fn args(&self) -> Vec<OsString> {
        let size = format!("{}x{}", self.width, self.height);
        let fps = self.fps.to_string();
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-loglevel",
            "warning",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            size.as_str(),
            "-r",
            fps.as_str(),
            "-i",
            "pipe:",
            "-pix_fmt",
            self.pix_fmt.as_str(),
            "-vcodec",
            self.codec.as_str(),
            "-r",
            fps.as_str(),
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(self.output.clone().into_os_string());
        args
    }
}

/// `ffmpeg` executable from [`FFMPEG_ENV`], or `ffmpeg` on the `PATH`
pub fn ffmpeg_program() -> PathBuf {
    std::env::var_os(FFMPEG_ENV).map_or_else(|| PathBuf::from("ffmpeg"), PathBuf::from)
}

/// Streams raw frames into an `ffmpeg` child process
pub struct FfmpegEncoder {
    settings: EncoderSettings,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    /// Launch the encoder.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::Spawn`] if the program cannot be started.
    pub fn spawn(settings: EncoderSettings) -> Result<Self, VideoError> {
        tracing::debug!(
            "Launching {} {:?}",
            settings.program.display(),
            settings.args()
        );
        let mut child = Command::new(&settings.program)
            .args(settings.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| VideoError::Spawn {
                program: settings.program.display().to_string(),
                source,
            })?;
        let stdin = child.stdin.take();
        Ok(Self {
            settings,
            child,
            stdin,
        })
    }

    /// Encoder settings
    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, index: usize, frame: &RgbFrame) -> Result<(), VideoError> {
        if (frame.width, frame.height) != (self.settings.width, self.settings.height) {
            return Err(VideoError::FrameSize {
                width: self.settings.width,
                height: self.settings.height,
                got_width: frame.width,
                got_height: frame.height,
            });
        }
        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::Write {
            frame: index,
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "encoder input closed"),
        })?;
        stdin
            .write_all(&frame.data)
            .map_err(|source| VideoError::Write { frame: index, source })
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());
        let status = self.child.wait().map_err(|source| VideoError::Wait {
            program: self.settings.program.display().to_string(),
            source,
        })?;
        if status.success() {
            tracing::info!("Wrote {}", self.settings.output.display());
            Ok(())
        } else {
            Err(VideoError::EncoderFailed {
                status: status.to_string(),
            })
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.wait();
        }
    }
}

/// Writes each frame as `<prefix>_<index>.png` in a directory
#[derive(Clone, Debug)]
pub struct PngSequence {
    dir: PathBuf,
    prefix: String,
    written: usize,
}

impl PngSequence {
    /// Create the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::Image`] if the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, VideoError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| VideoError::Image {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            written: 0,
        })
    }

    /// Path of frame `index`
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{index:05}.png", self.prefix))
    }

    /// Number of frames written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for PngSequence {
    fn write_frame(&mut self, index: usize, frame: &RgbFrame) -> Result<(), VideoError> {
        save_png(frame, &self.frame_path(index))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        tracing::info!("Wrote {} frames to {}", self.written, self.dir.display());
        Ok(())
    }
}

/// Save a frame as PNG.
///
/// # Errors
///
/// Returns [`VideoError::Image`] if encoding or writing fails.
pub fn save_png(frame: &RgbFrame, path: &Path) -> Result<(), VideoError> {
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .map_err(|e| VideoError::Image {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Render every frame of `plan` and feed them to `sink` in order.
///
/// Returns the number of frames written.
///
/// # Errors
///
/// Returns [`VideoError::NoFrames`] for an empty plan, or the first render
/// or sink error.
#[allow(clippy::cast_precision_loss)]
pub fn render_rotation<S: FrameSink + ?Sized>(
    scene: &BrainScene,
    plan: &RotationPlan,
    width: u32,
    height: u32,
    sink: &mut S,
) -> Result<usize, VideoError> {
    let total = plan.frame_count();
    if total == 0 {
        return Err(VideoError::NoFrames {
            fps: plan.fps,
            duration_s: plan.duration_s,
        });
    }
    let batch = batch_size(
        rayon::current_num_threads(),
        width,
        height,
        scene.style.supersample,
    );
    tracing::info!(
        "Rendering {total} frames at {width}x{height}, {:.3} deg/frame",
        plan.deg_per_frame()
    );
    tracing::debug!("{batch} frames per batch");

    for start in (0..total).step_by(batch) {
        let end = (start + batch).min(total);
        let frames = (start..end)
            .into_par_iter()
            .map(|i| scene.render(&plan.view_for(i), width, height))
            .collect::<Result<Vec<_>, RenderError>>()?;
        for (i, frame) in (start..end).zip(&frames) {
            tracing::info!(
                "{:.2}% or {}°",
                i as f64 / total as f64 * 100.0,
                plan.rotation_at(i)
            );
            sink.write_frame(i, frame)?;
        }
    }
    sink.finish()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainplot_core::{build_electrode_plot, ElectrodeDataset, PlotOptions};

    use crate::scene::SceneStyle;

    #[derive(Default)]
    struct Collect {
        indices: Vec<usize>,
        sizes: Vec<(u32, u32)>,
        finished: bool,
    }

    impl FrameSink for Collect {
        fn write_frame(&mut self, index: usize, frame: &RgbFrame) -> Result<(), VideoError> {
            self.indices.push(index);
            self.sizes.push((frame.width, frame.height));
            Ok(())
        }

        fn finish(&mut self) -> Result<(), VideoError> {
            self.finished = true;
            Ok(())
        }
    }

    fn scene() -> BrainScene {
        let dataset =
            ElectrodeDataset::from_json_str(r#"{"coords": [[20.0, 0.0, 0.0]], "t_values": [1.5]}"#).unwrap();
        let plot = build_electrode_plot(&dataset, &PlotOptions::default()).unwrap();
        BrainScene::new(
            Vec::new(),
            plot,
            SceneStyle {
                supersample: 1,
                ..SceneStyle::default()
            },
        )
    }

    #[test]
    fn test_default_plan() {
        let plan = RotationPlan::default();
        assert_eq!(plan.frame_count(), 200);
        assert!((plan.deg_per_frame() - 1.8).abs() < 1e-6);
        let view = plan.view_for(50);
        assert!((view.azimuth_deg - 180.0).abs() < 1e-4);
        assert_eq!(view.elevation_deg, 83.0);
        assert_eq!(view.distance, 450.0);
    }

    #[test]
    fn test_frames_written_in_order() {
        let plan = RotationPlan {
            fps: 5,
            duration_s: 3,
            ..RotationPlan::default()
        };
        let mut sink = Collect::default();
        let written = render_rotation(&scene(), &plan, 24, 16, &mut sink).unwrap();
        assert_eq!(written, 15);
        assert_eq!(sink.indices, (0..15).collect::<Vec<_>>());
        assert!(sink.sizes.iter().all(|&s| s == (24, 16)));
        assert!(sink.finished);
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = RotationPlan {
            fps: 0,
            ..RotationPlan::default()
        };
        let mut sink = Collect::default();
        let err = render_rotation(&scene(), &plan, 8, 8, &mut sink).unwrap_err();
        assert!(matches!(err, VideoError::NoFrames { fps: 0, duration_s: 8 }));
        assert!(!sink.finished);
    }

    #[test]
    fn test_encoder_args() {
        let settings = EncoderSettings {
            program: PathBuf::from("ffmpeg"),
            ..EncoderSettings::new("out.mp4", 1080, 720, 25)
        };
        let args: Vec<String> = settings
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 1080x720 -r 25 -i pipe:"));
        assert!(joined.ends_with("-pix_fmt yuv444p -vcodec libx264 -r 25 out.mp4"));
        assert!(args.contains(&"-y".to_string()));
    }

    #[test]
    fn test_missing_encoder_reports_spawn_error() {
        let settings = EncoderSettings {
            program: PathBuf::from("/nonexistent/brainplot-ffmpeg"),
            ..EncoderSettings::new("out.mp4", 8, 8, 25)
        };
        assert!(matches!(
            FfmpegEncoder::spawn(settings),
            Err(VideoError::Spawn { .. })
        ));
    }

    #[test]
    fn test_batch_bounded_by_pixel_budget() {
        assert_eq!(batch_size(16, 64, 64, 2), MAX_BATCH);
        assert_eq!(batch_size(2, 64, 64, 2), 2);
        // 2160x2160 supersampled frames: three fit the budget
        assert_eq!(batch_size(16, 1080, 1080, 2), 3);
        assert_eq!(batch_size(16, 8192, 8192, 4), 1);
        assert_eq!(batch_size(0, 8, 8, 1), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_is_encoder_failure() {
        let settings = EncoderSettings {
            program: PathBuf::from("false"),
            ..EncoderSettings::new("out.mp4", 8, 8, 25)
        };
        let mut encoder = FfmpegEncoder::spawn(settings).unwrap();
        assert!(matches!(
            encoder.finish(),
            Err(VideoError::EncoderFailed { .. })
        ));
    }

    #[test]
    fn test_wait_error_names_waiting() {
        let err = VideoError::Wait {
            program: "ffmpeg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"),
        };
        assert_eq!(err.to_string(), "Failed to wait for encoder 'ffmpeg': interrupted");
    }

    #[test]
    fn test_png_sequence_and_snapshot() {
        let dir = std::env::temp_dir().join(format!("brainplot-video-test-{}", std::process::id()));
        let mut sink = PngSequence::create(&dir, "frame").unwrap();
        let frame = RgbFrame::filled(4, 3, [10, 20, 30]);
        sink.write_frame(7, &frame).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.written(), 1);
        let path = sink.frame_path(7);
        assert!(path.ends_with("frame_00007.png"));

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 20, 30]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
