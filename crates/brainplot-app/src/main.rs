//! Brainplot Application
//!
//! Renders electrode t-scores on translucent brain surfaces, either as a
//! rotating flythrough video, a still snapshot or an interactive window.
//!
//! # Usage
//!
//! ```bash
//! # Rotating video using brainplot.toml (default)
//! brainplot
//!
//! # Interactive view, turned 30 degrees and raised 10
//! brainplot show --rotation 30 --elevation 10
//!
//! # Still image
//! brainplot snapshot --output brainPlot.png
//! ```

mod config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use brainplot_core::{build_electrode_plot, ElectrodeDataset};
use brainplot_native::{
    render_rotation, save_png, BrainScene, FfmpegEncoder, PngSequence, SurfaceMesh, ViewAngles,
};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{AppConfig, VideoFormat, DEFAULT_CONFIG_PATH};

/// Brainplot Application
#[derive(Parser, Debug)]
#[command(name = "brainplot")]
#[command(author, version, about = "Electrode t-score plots on brain surfaces", long_about = None)]
struct Cli {
    /// Config file (created with defaults if missing)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Electrode data file, overriding the config
    #[arg(long)]
    data: Option<PathBuf>,

    /// Surface mesh (repeat for several), overriding the config
    #[arg(long = "mesh")]
    meshes: Vec<PathBuf>,

    /// Frame width
    #[arg(long)]
    width: Option<u32>,

    /// Frame height
    #[arg(long)]
    height: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// View offsets shared by `show` and `snapshot`
#[derive(clap::Args, Debug, Clone, Default)]
struct ViewArgs {
    /// Degrees about the vertical axis
    #[arg(long, allow_hyphen_values = true)]
    rotation: Option<f32>,

    /// Degrees above the horizon
    #[arg(long, allow_hyphen_values = true)]
    elevation: Option<f32>,

    /// Extra camera distance
    #[arg(long, allow_hyphen_values = true)]
    distance: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a rotating flythrough (default if no subcommand)
    Video {
        /// Output video file or PNG directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write numbered PNG frames instead of encoding a video
        #[arg(long)]
        png_sequence: bool,

        /// Frames per second
        #[arg(long)]
        fps: Option<u32>,

        /// Length in seconds
        #[arg(long)]
        duration: Option<u32>,

        /// Total rotation in degrees
        #[arg(long)]
        degrees: Option<f32>,
    },

    /// Open an interactive window
    Show {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Render a single PNG
    Snapshot {
        /// Output image
        #[arg(short, long, default_value = "brainPlot.png")]
        output: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Brainplot v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(data) = cli.data {
        config.scene.data = data;
    }
    if !cli.meshes.is_empty() {
        config.scene.meshes = cli.meshes;
    }
    if let Some(width) = cli.width {
        config.scene.width = width;
    }
    if let Some(height) = cli.height {
        config.scene.height = height;
    }

    match cli.command {
        None => run_video(&config),
        Some(Commands::Video {
            output,
            png_sequence,
            fps,
            duration,
            degrees,
        }) => {
            if let Some(output) = output {
                config.video.output = output;
            }
            if png_sequence {
                config.video.format = VideoFormat::PngSequence;
            }
            if let Some(fps) = fps {
                config.video.fps = fps;
            }
            if let Some(duration) = duration {
                config.video.duration_s = duration;
            }
            if let Some(degrees) = degrees {
                config.video.degrees = degrees;
            }
            run_video(&config)
        }
        Some(Commands::Show { view }) => {
            apply_view_args(&mut config, &view);
            run_show(&config)
        }
        Some(Commands::Snapshot { output, view }) => {
            apply_view_args(&mut config, &view);
            run_snapshot(&config, &output)
        }
    }
}

fn apply_view_args(config: &mut AppConfig, args: &ViewArgs) {
    if let Some(rotation) = args.rotation {
        config.view.rotation = rotation;
    }
    if let Some(elevation) = args.elevation {
        config.view.elevation = elevation;
    }
    if let Some(distance) = args.distance {
        config.view.distance = distance;
    }
}

/// Load meshes and electrode data into a scene
fn build_scene(config: &AppConfig) -> anyhow::Result<BrainScene> {
    let mesh_style = config.mesh.mesh_style();
    let meshes = config
        .scene
        .meshes
        .iter()
        .map(|path| {
            SurfaceMesh::load(path)
                .map(|mesh| (mesh, mesh_style))
                .with_context(|| format!("Failed to load mesh {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let dataset = ElectrodeDataset::load(&config.scene.data)
        .with_context(|| format!("Failed to load electrodes from {}", config.scene.data.display()))?;
    let plot = build_electrode_plot(&dataset, &config.electrodes.plot_options())
        .context("Failed to style electrodes")?;

    Ok(BrainScene::new(meshes, plot, config.scene.scene_style()))
}

/// Render the rotating flythrough
fn run_video(config: &AppConfig) -> anyhow::Result<()> {
    let scene = build_scene(config)?;
    let plan = config.video.rotation_plan();
    let (width, height) = (config.scene.width, config.scene.height);

    let frames = match config.video.format {
        VideoFormat::Mp4 => {
            let mut encoder = FfmpegEncoder::spawn(config.video.encoder_settings(width, height))?;
            render_rotation(&scene, &plan, width, height, &mut encoder)?
        }
        VideoFormat::PngSequence => {
            let mut sink = PngSequence::create(config.video.output_path(), "frame")?;
            render_rotation(&scene, &plan, width, height, &mut sink)?
        }
    };
    info!("Rendered {frames} frames");
    Ok(())
}

/// Render one still image
fn run_snapshot(config: &AppConfig, output: &Path) -> anyhow::Result<()> {
    let scene = build_scene(config)?;
    let view: ViewAngles = config.view.view_angles();
    let frame = scene.render(&view, config.scene.width, config.scene.height)?;
    save_png(&frame, output)?;
    info!("Wrote {}", output.display());
    Ok(())
}

/// Open the interactive viewer
fn run_show(config: &AppConfig) -> anyhow::Result<()> {
    #[cfg(feature = "viewer")]
    {
        use brainplot_native::viewer::{run_viewer, ViewerConfig};

        let scene = build_scene(config)?;
        let viewer_config = ViewerConfig {
            width: config.scene.width,
            height: config.scene.height,
            title: "Brain Plot".to_string(),
            initial_view: config.view.view_angles(),
        };
        run_viewer(scene, viewer_config).map_err(|e| anyhow::anyhow!("{}", e))?;
    }

    #[cfg(not(feature = "viewer"))]
    {
        let _ = config;
        anyhow::bail!(
            "Interactive viewer not enabled. Rebuild with --features viewer:\n\
             cargo run -p brainplot-app --features viewer -- show"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::try_parse_from(["brainplot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_view_args_override_config() {
        let cli = Cli::try_parse_from([
            "brainplot",
            "--mesh",
            "a.vtk",
            "--mesh",
            "b.vtk",
            "snapshot",
            "--rotation",
            "-45",
            "--elevation",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.meshes, vec![PathBuf::from("a.vtk"), PathBuf::from("b.vtk")]);
        let Some(Commands::Snapshot { output, view }) = cli.command else {
            panic!("expected snapshot");
        };
        assert_eq!(output, PathBuf::from("brainPlot.png"));

        let mut config = AppConfig::default();
        apply_view_args(&mut config, &view);
        assert_eq!(config.view.rotation, -45.0);
        assert_eq!(config.view.elevation, 10.0);
        assert_eq!(config.view.distance, 0.0);
    }

    #[cfg(not(feature = "viewer"))]
    #[test]
    fn test_show_requires_viewer_feature() {
        let err = run_show(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--features viewer"));
    }

    #[test]
    fn test_build_scene_reports_missing_mesh() {
        let mut config = AppConfig::default();
        config.scene.meshes = vec![PathBuf::from("/nonexistent/lh.vtk")];
        let err = build_scene(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lh.vtk"));
    }
}
