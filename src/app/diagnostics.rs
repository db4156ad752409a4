//! Diagnostics window: fps, grid and line census, population history

use std::collections::VecDeque;

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use super::BackdropApp;
use crate::core::scene::FrameReport;
use crate::time::now_millis;

/// Frames kept in the population chart
const HISTORY_LEN: usize = 600;
const FPS_WINDOW: usize = 60;

/// FPS over the last `FPS_WINDOW` frames
pub struct FpsCounter {
    frames: VecDeque<f64>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: VecDeque::with_capacity(FPS_WINDOW + 1),
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(now_millis());
    }

    pub fn tick_at(&mut self, now_ms: f64) {
        self.frames.push_back(now_ms);
        if self.frames.len() > FPS_WINDOW {
            self.frames.pop_front();
        }
    }

    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.frames.front(), self.frames.back()) else {
            return 0.0;
        };
        let elapsed = last - first;
        if self.frames.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (self.frames.len() as f64 - 1.0) / (elapsed / 1000.0)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling per-frame line population, split by source.
#[derive(Default)]
pub struct PopulationHistory {
    pointer: VecDeque<[f64; 2]>,
    ambient: VecDeque<[f64; 2]>,
}

impl PopulationHistory {
    pub fn record(&mut self, report: &FrameReport) {
        let x = report.frame as f64;
        for (series, value) in [
            (&mut self.pointer, report.lines.pointer),
            (&mut self.ambient, report.lines.ambient),
        ] {
            series.push_back([x, value as f64]);
            if series.len() > HISTORY_LEN {
                series.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pointer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointer.is_empty()
    }
}

impl BackdropApp {
    pub(crate) fn draw_diagnostics(&self, ctx: &egui::Context) {
        let Some(report) = self.last_report else {
            return;
        };

        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-8.0, 8.0))
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.set_min_width(280.0);
                ui.label(format!("{:.0} fps", self.fps_counter.fps()));
                ui.label(format!("profile {:?}", report.profile));
                ui.label(format!("{} points / {} nearby", report.points, report.nearby));
                ui.label(format!(
                    "{} lines: {} pending, {} steady, {} disappearing",
                    report.lines.total(),
                    report.lines.pending,
                    report.lines.steady,
                    report.lines.disappearing,
                ));
                ui.label(format!(
                    "{} pointer batches / {} ambient batches",
                    report.pointer_batches, report.ambient_batches,
                ));

                Plot::new("line_population")
                    .height(120.0)
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .include_y(0.0)
                    .legend(Legend::default())
                    .show(ui, |plot_ui| {
                        plot_ui.line(
                            Line::new(PlotPoints::from_iter(self.history.pointer.iter().copied()))
                                .name("pointer"),
                        );
                        plot_ui.line(
                            Line::new(PlotPoints::from_iter(self.history.ambient.iter().copied()))
                                .name("ambient"),
                        );
                    });
            });
    }
}
