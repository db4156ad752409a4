//! `egui::Painter` as a backdrop surface

use eframe::egui;

use crate::core::surface::{Dot, Segment, Surface};
use crate::theme::{colors, ink};

/// Paints into a panel whose top-left corner is `origin`.
pub struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a egui::Painter, origin: egui::Pos2) -> Self {
        Self { painter, origin }
    }

    fn pos(&self, [x, y]: [f32; 2]) -> egui::Pos2 {
        self.origin + egui::vec2(x, y)
    }
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self, width: f32, height: f32) {
        let [r, g, b] = colors::BACKGROUND;
        let rect = egui::Rect::from_min_size(self.origin, egui::vec2(width, height));
        self.painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(r, g, b));
    }

    fn fill_dot(&mut self, dot: &Dot) {
        self.painter.circle_filled(self.pos(dot.center), dot.radius, ink(dot.alpha));
    }

    fn stroke_segment(&mut self, segment: &Segment) {
        let points = [self.pos(segment.from), self.pos(segment.to)];
        let stroke = egui::Stroke::new(segment.width, ink(segment.alpha));

        match segment.dash {
            None => {
                self.painter.line_segment(points, stroke);
            }
            Some([on, off]) => {
                // egui walks the pattern forward from the offset; canvas offsets
                // shift it backward, so negate and wrap into one period.
                let offset = (-segment.dash_offset).rem_euclid(on + off);
                self.painter.extend(egui::Shape::dashed_line_with_offset(
                    &points,
                    stroke,
                    &[on],
                    &[off],
                    offset,
                ));
            }
        }
    }
}
