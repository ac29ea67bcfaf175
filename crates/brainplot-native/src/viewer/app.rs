//! `eframe` application for the interactive view

use crate::render::camera::ViewAngles;
use crate::scene::BrainScene;

/// Degrees of orbit per dragged point
const ORBIT_DEG_PER_POINT: f32 = 0.4;

/// Zoom sensitivity per scrolled point
const ZOOM_PER_POINT: f32 = 0.002;

/// Configuration for the viewer window
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// Window title
    pub title: String,
    /// View restored by `R`
    pub initial_view: ViewAngles,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1080,
            title: "Brain Plot".to_string(),
            initial_view: ViewAngles::default(),
        }
    }
}

/// Input gathered for one UI frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    /// Pointer movement while the primary button is held, in points
    pub drag: [f32; 2],
    /// Vertical scroll, in points (positive = away from the user)
    pub scroll: f32,
    /// Reset to the initial view
    pub reset: bool,
}

impl Controls {
    /// True when the controls change the view
    pub fn is_active(&self) -> bool {
        self.drag != [0.0, 0.0] || self.scroll != 0.0 || self.reset
    }
}

/// Update `view` from one frame of input
pub fn apply_controls(view: &mut ViewAngles, initial: &ViewAngles, controls: Controls) {
    if controls.reset {
        *view = *initial;
        return;
    }
    if controls.drag != [0.0, 0.0] {
        view.orbit(
            -controls.drag[0] * ORBIT_DEG_PER_POINT,
            -controls.drag[1] * ORBIT_DEG_PER_POINT,
        );
    }
    if controls.scroll != 0.0 {
        view.zoom((-controls.scroll * ZOOM_PER_POINT).exp());
    }
}

/// Last rendered image and what it was rendered for
struct Rendered {
    texture: egui::TextureHandle,
    view: ViewAngles,
    size: [u32; 2],
    preview: bool,
}

/// Viewer application
pub struct BrainViewerApp {
    scene: BrainScene,
    config: ViewerConfig,
    view: ViewAngles,
    rendered: Option<Rendered>,
}

impl BrainViewerApp {
    /// Create the app for a scene
    #[must_use]
    pub fn new(scene: BrainScene, config: ViewerConfig) -> Self {
        let view = config.initial_view;
        Self {
            scene,
            config,
            view,
            rendered: None,
        }
    }

    fn is_current(&self, size: [u32; 2], preview: bool) -> bool {
        self.rendered.as_ref().is_some_and(|r| {
            r.view == self.view && r.size == size && (preview || !r.preview)
        })
    }

    fn refresh(&mut self, ctx: &egui::Context, size: [u32; 2], preview: bool) {
        if self.is_current(size, preview) {
            return;
        }
        let supersample = if preview { 1 } else { self.scene.style.supersample };
        let frame = match self
            .scene
            .render_supersampled(&self.view, size[0], size[1], supersample)
        {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Render failed: {e}");
                return;
            }
        };
        let image = egui::ColorImage::from_rgb(
            [frame.width as usize, frame.height as usize],
            &frame.data,
        );
        match self.rendered.as_mut() {
            Some(rendered) => {
                rendered.texture.set(image, egui::TextureOptions::LINEAR);
                rendered.view = self.view;
                rendered.size = size;
                rendered.preview = preview;
            }
            None => {
                self.rendered = Some(Rendered {
                    texture: ctx.load_texture("brain-scene", image, egui::TextureOptions::LINEAR),
                    view: self.view,
                    size,
                    preview,
                });
            }
        }
        if preview {
            // Follow up with a full-quality frame once input stops.
            ctx.request_repaint();
        }
    }
}

impl eframe::App for BrainViewerApp {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (controls, close) = ctx.input(|i| {
            let drag = if i.pointer.primary_down() {
                let d = i.pointer.delta();
                [d.x, d.y]
            } else {
                [0.0, 0.0]
            };
            (
                Controls {
                    drag,
                    scroll: i.smooth_scroll_delta.y,
                    reset: i.key_pressed(egui::Key::R),
                },
                i.key_pressed(egui::Key::Escape),
            )
        });
        if close {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }
        apply_controls(&mut self.view, &self.config.initial_view, controls);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let ppp = ctx.pixels_per_point();
                let size = [
                    (rect.width() * ppp).round().max(1.0) as u32,
                    (rect.height() * ppp).round().max(1.0) as u32,
                ];
                self.refresh(ctx, size, controls.is_active());
                if let Some(rendered) = &self.rendered {
                    ui.painter().image(
                        rendered.texture.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
            });
    }
}

/// Open the viewer window and block until it is closed.
///
/// # Errors
///
/// Returns an error if the native window cannot be created.
#[allow(clippy::cast_precision_loss)]
pub fn run_viewer(scene: BrainScene, config: ViewerConfig) -> eframe::Result<()> {
    tracing::info!("Controls: left drag orbits, scroll zooms, R resets the view, Escape quits");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_inner_size([config.width as f32, config.height as f32]),
        ..Default::default()
    };
    let title = config.title.clone();
    let app = BrainViewerApp::new(scene, config);
    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))))
}
