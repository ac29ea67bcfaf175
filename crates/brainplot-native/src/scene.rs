//! Scene composition
//!
//! A [`BrainScene`] holds the surface meshes and the electrode plot and
//! renders them for a given view. Drawing order:
//!
//! 1. Opaque markers, writing depth
//! 2. Translucent mesh triangles and markers, sorted back to front
//! 3. Supersample resolve
//! 4. Colorbar and subject labels

use brainplot_core::{ElectrodePlot, MarkerLayer, Rgb};

use crate::error::RenderError;
use crate::math::{scale, to_f32};
use crate::mesh::{MeshStyle, SurfaceMesh};
use crate::render::overlay::{draw_overlays, ScreenLabel};
use crate::render::raster::{shade, Framebuffer, RgbFrame, ShadedVertex, SphereSprite, MAX_SUPERSAMPLE};
use crate::render::{Camera3D, ViewAngles};

/// Default supersampling factor per axis
pub const DEFAULT_SUPERSAMPLE: u32 = 2;

/// Horizontal gap between an electrode and its label, in output pixels
const LABEL_OFFSET_PX: f32 = 6.0;

/// Scene-wide colors and quality
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneStyle {
    /// Clear color
    pub background: Rgb,
    /// Text and colorbar frame color
    pub foreground: Rgb,
    /// Supersampling factor per axis (1 disables)
    pub supersample: u32,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            background: [1.0, 1.0, 1.0],
            foreground: [0.0, 0.0, 0.0],
            supersample: DEFAULT_SUPERSAMPLE,
        }
    }
}

enum Translucent {
    Triangle([ShadedVertex; 3], f32),
    Sphere(SphereSprite, f32),
}

impl Translucent {
    fn depth(&self) -> f32 {
        match self {
            Self::Triangle(v, _) => (v[0].depth + v[1].depth + v[2].depth) / 3.0,
            Self::Sphere(s, _) => s.depth,
        }
    }
}

/// Meshes plus electrode markers, ready to render from any view
#[derive(Clone, Debug)]
pub struct BrainScene {
    /// Surfaces with their materials
    pub meshes: Vec<(SurfaceMesh, MeshStyle)>,
    /// Electrode layers, colorbar and labels
    pub plot: ElectrodePlot,
    /// Colors and quality
    pub style: SceneStyle,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(c: Rgb) -> [u8; 3] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl BrainScene {
    /// Create a scene
    pub fn new(meshes: Vec<(SurfaceMesh, MeshStyle)>, plot: ElectrodePlot, style: SceneStyle) -> Self {
        Self {
            meshes,
            plot,
            style,
        }
    }

    /// Render one frame.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] for a zero-sized frame, an unsupported
    /// supersample factor, or an overlay failure.
    pub fn render(&self, view: &ViewAngles, width: u32, height: u32) -> Result<RgbFrame, RenderError> {
        self.render_supersampled(view, width, height, self.style.supersample)
    }

    /// Render one frame with an explicit supersample factor, e.g. a cheap
    /// preview while the view is moving.
    ///
    /// # Errors
    ///
    /// Same as [`BrainScene::render`].
    pub fn render_supersampled(
        &self,
        view: &ViewAngles,
        width: u32,
        height: u32,
        ss: u32,
    ) -> Result<RgbFrame, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        if ss == 0 || ss > MAX_SUPERSAMPLE {
            return Err(RenderError::InvalidSupersample(ss));
        }

        let camera = Camera3D::from_view(view, width * ss, height * ss);
        let mut fb = Framebuffer::new(width * ss, height * ss, self.style.background)?;
        let mut translucent = Vec::new();

        for layer in &self.plot.layers {
            if layer.is_invisible() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let alpha = layer.opacity.min(1.0) as f32;
            for i in 0..layer.len() {
                let Some(sprite) = marker_sprite(&camera, layer, i) else {
                    continue;
                };
                if alpha >= 1.0 {
                    fb.fill_sphere(&sprite, 1.0, true);
                } else {
                    translucent.push(Translucent::Sphere(sprite, alpha));
                }
            }
        }

        for (mesh, style) in &self.meshes {
            if style.opacity <= 0.0 {
                continue;
            }
            let vertices = shade_vertices(&camera, mesh, style);
            for tri in &mesh.triangles {
                let [a, b, c] = tri.map(|i| vertices[i as usize]);
                let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                    continue;
                };
                if style.opacity >= 1.0 {
                    fb.fill_triangle([a, b, c], 1.0, true);
                } else {
                    translucent.push(Translucent::Triangle([a, b, c], style.opacity));
                }
            }
        }

        translucent.sort_by(|a, b| b.depth().total_cmp(&a.depth()));
        for item in &translucent {
            match item {
                Translucent::Triangle(v, alpha) => fb.fill_triangle(*v, *alpha, false),
                Translucent::Sphere(s, alpha) => fb.fill_sphere(s, *alpha, false),
            }
        }

        let mut frame = fb.resolve(ss)?;
        let labels = self.screen_labels(view, width, height);
        draw_overlays(
            &mut frame,
            Some(&self.plot.colorbar),
            &labels,
            to_u8(self.style.foreground),
        )?;
        Ok(frame)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn screen_labels(&self, view: &ViewAngles, width: u32, height: u32) -> Vec<ScreenLabel> {
        if self.plot.labels.is_empty() {
            return Vec::new();
        }
        let camera = Camera3D::from_view(view, width, height);
        self.plot
            .labels
            .iter()
            .filter_map(|label| {
                let p = camera.project(to_f32(label.position))?;
                let on_screen = (0.0..width as f32).contains(&p.x) && (0.0..height as f32).contains(&p.y);
                on_screen.then(|| ScreenLabel {
                    x: (p.x + LABEL_OFFSET_PX).round() as i32,
                    y: p.y.round() as i32,
                    text: label.text.clone(),
                })
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn marker_sprite(camera: &Camera3D, layer: &MarkerLayer, i: usize) -> Option<SphereSprite> {
    let center = to_f32(layer.positions[i]);
    let p = camera.project(center)?;
    let world_radius = (layer.diameter_at(i) / 2.0) as f32;
    Some(SphereSprite {
        cx: p.x,
        cy: p.y,
        radius_px: camera.pixel_radius(world_radius, p.depth),
        depth: p.depth,
        world_radius,
        color: layer.color_at(i),
    })
}

fn shade_vertices(camera: &Camera3D, mesh: &SurfaceMesh, style: &MeshStyle) -> Vec<Option<ShadedVertex>> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .map(|(&position, &normal)| {
            let p = camera.project(position)?;
            let mut n = camera.view_normal(normal);
            // Two-sided lighting; surfaces are seen from inside and out.
            if n[2] < 0.0 {
                n = scale(n, -1.0);
            }
            Some(ShadedVertex {
                x: p.x,
                y: p.y,
                depth: p.depth,
                color: shade(style.color, n),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainplot_core::{build_electrode_plot, ElectrodeDataset, PlotOptions};

    const WHITE: [u8; 3] = [255, 255, 255];

    fn plot(options: &PlotOptions) -> ElectrodePlot {
        let json = r#"{
            "subjects": ["S01"],
            "coords": [[0.0, 0.0, 0.0]],
            "t_values": [2.0],
            "settings": { "single_subject": true, "electrode_size": 100.0 }
        }"#;
        let dataset = ElectrodeDataset::from_json_str(json).unwrap();
        build_electrode_plot(&dataset, options).unwrap()
    }

    fn backdrop() -> SurfaceMesh {
        // Square behind the origin as seen from +Y
        SurfaceMesh::new(
            vec![
                [-400.0, -100.0, -400.0],
                [400.0, -100.0, -400.0],
                [400.0, -100.0, 400.0],
                [-400.0, -100.0, 400.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    fn style(supersample: u32) -> SceneStyle {
        SceneStyle {
            supersample,
            ..SceneStyle::default()
        }
    }

    #[test]
    fn test_marker_drawn_at_center() {
        let scene = BrainScene::new(Vec::new(), plot(&PlotOptions::default()), style(1));
        let frame = scene.render(&ViewAngles::default(), 64, 64).unwrap();
        assert_eq!((frame.width, frame.height), (64, 64));
        let center = frame.pixel(32, 32);
        assert_ne!(center, WHITE);
        assert!(center.iter().map(|&c| u32::from(c)).sum::<u32>() < 600);
        assert_eq!(frame.pixel(2, 2), WHITE);
    }

    #[test]
    fn test_translucent_mesh_tints_background() {
        let scene = BrainScene::new(
            vec![(backdrop(), MeshStyle::default())],
            plot(&PlotOptions::default()),
            style(2),
        );
        let frame = scene.render(&ViewAngles::default(), 64, 64).unwrap();
        let corner = frame.pixel(4, 4);
        assert!(corner[0] < 250 && corner[0] > 200, "corner {corner:?}");
        // The opaque marker hides the mesh behind it.
        assert!(frame.pixel(32, 32)[0] < 200);
    }

    #[test]
    fn test_invisible_layer_skipped() {
        let options = PlotOptions {
            opacity_threshold: 5.0,
            opacity: 0.0,
            ..PlotOptions::default()
        };
        let scene = BrainScene::new(Vec::new(), plot(&options), style(1));
        let frame = scene.render(&ViewAngles::default(), 64, 64).unwrap();
        assert_eq!(frame.pixel(32, 32), WHITE);
    }

    #[test]
    fn test_subthreshold_marker_is_faded() {
        let options = PlotOptions {
            opacity_threshold: 5.0,
            opacity: 0.2,
            ..PlotOptions::default()
        };
        let scene = BrainScene::new(Vec::new(), plot(&options), style(1));
        let faded = scene.render(&ViewAngles::default(), 64, 64).unwrap().pixel(32, 32);
        let opaque = BrainScene::new(Vec::new(), plot(&PlotOptions::default()), style(1))
            .render(&ViewAngles::default(), 64, 64)
            .unwrap()
            .pixel(32, 32);
        assert!(faded[0] > opaque[0]);
        assert_ne!(faded, WHITE);
    }

    #[test]
    fn test_labels_follow_projection() {
        let options = PlotOptions {
            label_subjects: true,
            ..PlotOptions::default()
        };
        let scene = BrainScene::new(Vec::new(), plot(&options), style(1));
        let labels = scene.screen_labels(&ViewAngles::default(), 64, 64);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "S01");
        assert_eq!((labels[0].x, labels[0].y), (38, 32));
    }

    #[test]
    fn test_bad_sizes_rejected() {
        let scene = BrainScene::new(Vec::new(), plot(&PlotOptions::default()), style(1));
        assert!(matches!(
            scene.render(&ViewAngles::default(), 0, 10),
            Err(RenderError::InvalidSize { .. })
        ));
        let scene = BrainScene::new(Vec::new(), plot(&PlotOptions::default()), style(9));
        assert_eq!(
            scene.render(&ViewAngles::default(), 8, 8).unwrap_err(),
            RenderError::InvalidSupersample(9)
        );
    }
}
