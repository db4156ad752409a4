//! Drawing abstraction shared by the canvas, egui and headless hosts.
//!
//! Coordinates are CSS pixels; hosts apply their own device-pixel scaling.
//! All primitives are drawn in the theme ink colour, only alpha varies.

/// Filled circle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dot {
    pub center: [f32; 2],
    pub radius: f32,
    pub alpha: f32,
}

/// Stroked straight segment, optionally dashed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub width: f32,
    pub alpha: f32,
    /// `[dash, gap]`; `None` draws a continuous stroke
    pub dash: Option<[f32; 2]>,
    /// Canvas-style dash offset (negative values scroll the pattern forward)
    pub dash_offset: f32,
}

pub trait Surface {
    /// Clear the visible area before a frame.
    fn clear(&mut self, width: f32, height: f32);
    fn fill_dot(&mut self, dot: &Dot);
    fn stroke_segment(&mut self, segment: &Segment);
}

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear { width: f32, height: f32 },
    Dot(Dot),
    Segment(Segment),
}

/// Surface that records draw calls, used by the headless host and tests.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last `clear`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn dots(&self) -> impl Iterator<Item = &Dot> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Dot(d) => Some(d),
            _ => None,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Segment(s) => Some(s),
            _ => None,
        })
    }
}

impl Surface for DrawList {
    fn clear(&mut self, width: f32, height: f32) {
        // Only the last frame is kept
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_dot(&mut self, dot: &Dot) {
        self.commands.push(DrawCommand::Dot(*dot));
    }

    fn stroke_segment(&mut self, segment: &Segment) {
        self.commands.push(DrawCommand::Segment(*segment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_list_keeps_only_last_frame() {
        let mut list = DrawList::new();
        list.clear(10.0, 10.0);
        list.fill_dot(&Dot { center: [1.0, 1.0], radius: 1.0, alpha: 0.5 });
        list.clear(10.0, 10.0);
        assert_eq!(list.commands().len(), 1);
        assert_eq!(list.dots().count(), 0);
    }
}
