//! Native preview: the backdrop in an eframe window
//!
//! Runs the scene directly off egui's repaint loop. egui already coalesces
//! window resizes, so there is no debounce here; the panel size is read
//! every frame.

mod diagnostics;
mod painter;

use eframe::egui;
use rand::rngs::StdRng;
use tracing::info;

use crate::core::random::RngSource;
use crate::core::scene::{FrameReport, Scene};
use crate::theme::{backdrop_visuals, colors};
use crate::time::now_millis;

pub use diagnostics::{FpsCounter, PopulationHistory};
pub use painter::PainterSurface;

pub struct BackdropApp {
    scene: Option<Scene>,
    rng: RngSource<StdRng>,
    /// Accumulated document scroll, in points
    scroll_y: f32,
    pointer_inside: bool,
    pub(crate) fps_counter: FpsCounter,
    pub(crate) history: PopulationHistory,
    pub(crate) last_report: Option<FrameReport>,
    pub(crate) show_diagnostics: bool,
}

impl BackdropApp {
    pub fn new(cc: &eframe::CreationContext<'_>, rng: RngSource<StdRng>) -> Self {
        cc.egui_ctx.set_visuals(backdrop_visuals());
        info!("preview started, press D for diagnostics");

        Self {
            scene: None,
            rng,
            scroll_y: 0.0,
            pointer_inside: false,
            fps_counter: FpsCounter::new(),
            history: PopulationHistory::default(),
            last_report: None,
            show_diagnostics: false,
        }
    }

    /// Forward hover, leave, scroll and the diagnostics toggle to the scene.
    fn handle_input(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let (hover, scroll, toggle) = ctx.input(|i| {
            (
                i.pointer.hover_pos(),
                i.smooth_scroll_delta.y,
                i.key_pressed(egui::Key::D),
            )
        });

        if toggle {
            self.show_diagnostics = !self.show_diagnostics;
        }

        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        match hover.filter(|pos| rect.contains(*pos)) {
            Some(pos) => {
                let local = pos - rect.min;
                scene.pointer_move(local.x, local.y);
                self.pointer_inside = true;
            }
            None if self.pointer_inside => {
                scene.pointer_leave();
                self.pointer_inside = false;
            }
            None => {}
        }

        if scroll != 0.0 {
            // wheel down is a negative delta
            self.scroll_y = (self.scroll_y - scroll).max(0.0);
            scene.scroll(self.scroll_y);
        }
    }
}

impl eframe::App for BackdropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.fps_counter.tick();

        let [r, g, b] = colors::BACKGROUND;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::from_rgb(r, g, b)))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let now = now_millis();

                self.handle_input(ctx, rect);

                let rng = &mut self.rng;
                let scene = self
                    .scene
                    .get_or_insert_with(|| Scene::new(rect.width(), rect.height(), now, rng));

                let painter = ui.painter_at(rect);
                let mut surface = PainterSurface::new(&painter, rect.min);
                let report = scene.frame(now, rect.width(), rect.height(), &mut surface, &mut self.rng);

                self.history.record(&report);
                self.last_report = Some(report);
            });

        if self.show_diagnostics {
            self.draw_diagnostics(ctx);
        }

        ctx.request_repaint();
    }
}
