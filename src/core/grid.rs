//! Grid field: per-frame point positions, intensities and the nearby subset.
//!
//! The grid is anchored to (column, row), so a key names the same dot across
//! frames even though its pixel position drifts.

use std::collections::HashMap;

use serde::Serialize;

use super::profile::Profile;
use super::surface::{Dot, Surface};

pub const DEPTH_LAYERS: u32 = 5;
pub const BASE_ALPHA: f32 = 0.05;
pub const DEPTH_INTENSITY_BOOST: f32 = 0.35;
pub const PEAK_INTENSITY: f32 = 0.9;
pub const PARALLAX_STRENGTH_X: f32 = 48.0;
pub const PARALLAX_STRENGTH_Y: f32 = 32.0;
/// Falloff above which a dot may anchor a pointer line
pub const LINE_THRESHOLD: f32 = 0.55;

/// Composite grid coordinate, the identity of a dot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridKey {
    pub col: i32,
    pub row: i32,
}

impl GridKey {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    fn depth_seed(self) -> u32 {
        self.col.unsigned_abs() + self.row.unsigned_abs()
    }

    /// Depth layer normalized to `[0, 1]`; 0 is nearest the camera.
    pub fn depth(self) -> f32 {
        if DEPTH_LAYERS > 1 {
            (self.depth_seed() % DEPTH_LAYERS) as f32 / (DEPTH_LAYERS - 1) as f32
        } else {
            0.0
        }
    }

    /// `1 - depth`. Depends on the key only.
    pub fn closeness(self) -> f32 {
        1.0 - self.depth()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub key: GridKey,
    pub x: f32,
    pub y: f32,
    pub closeness: f32,
    pub falloff: f32,
    pub intensity: f32,
    pub radius: f32,
}

/// Pointer as seen by the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

/// Everything the generator needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FieldInput<'a> {
    pub width: f32,
    pub height: f32,
    /// Simulation clock driving the depth bob
    pub time: f32,
    pub pointer: PointerSample,
    pub drift: [f32; 2],
    /// Vertical scroll displacement
    pub scroll_offset: f32,
    pub profile: &'a Profile,
}

/// Column/row span covering the viewport plus a one-cell margin on every side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub first_col: i32,
    pub first_row: i32,
    pub cols: i32,
    pub rows: i32,
}

impl GridBounds {
    pub fn covering(width: f32, height: f32, spacing: f32) -> Self {
        let span = |extent: f32| {
            if spacing > 0.0 && extent > 0.0 {
                (extent / spacing).ceil() as i32 + 2
            } else {
                2
            }
        };
        Self {
            first_col: -1,
            first_row: -1,
            cols: span(width),
            rows: span(height),
        }
    }

    pub fn len(&self) -> usize {
        (self.cols.max(0) * self.rows.max(0)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: GridKey) -> bool {
        (self.first_col..self.first_col + self.cols).contains(&key.col)
            && (self.first_row..self.first_row + self.rows).contains(&key.row)
    }
}

/// Points of one frame, in row-major order, with a key index.
#[derive(Debug, Default)]
pub struct GridField {
    points: Vec<Point>,
    index: HashMap<GridKey, usize>,
    nearby: Vec<Point>,
}

impl GridField {
    pub fn build(input: &FieldInput<'_>) -> Self {
        let profile = input.profile;
        let bounds = GridBounds::covering(input.width, input.height, profile.spacing);

        let pointer_norm_x = if input.width > 0.0 { input.pointer.x / input.width - 0.5 } else { 0.0 };
        let pointer_norm_y = if input.height > 0.0 { input.pointer.y / input.height - 0.5 } else { 0.0 };

        let mut points = Vec::with_capacity(bounds.len());
        let mut index = HashMap::with_capacity(bounds.len());
        let mut nearby = Vec::new();

        for row in bounds.first_row..bounds.first_row + bounds.rows {
            for col in bounds.first_col..bounds.first_col + bounds.cols {
                let key = GridKey::new(col, row);
                let depth = key.depth();
                let closeness = 1.0 - depth;
                let parallax = 0.35 + closeness * 0.65;
                let bob = (input.time * 0.6 + key.depth_seed() as f32 * 0.35).sin() * 6.0 * (depth - 0.5);

                let x = col as f32 * profile.spacing
                    + input.drift[0]
                    + parallax * pointer_norm_x * PARALLAX_STRENGTH_X;
                let y = row as f32 * profile.spacing
                    + input.drift[1]
                    + input.scroll_offset
                    + parallax * pointer_norm_y * PARALLAX_STRENGTH_Y
                    + bob;

                let falloff = falloff(input.pointer.x - x, input.pointer.y - y, profile.influence);
                let base = BASE_ALPHA + closeness * DEPTH_INTENSITY_BOOST;
                let intensity = base + falloff * falloff * (PEAK_INTENSITY - base);

                let point = Point {
                    key,
                    x,
                    y,
                    closeness,
                    falloff,
                    intensity,
                    radius: profile.radius + closeness * 0.9 + falloff * 1.4,
                };

                if falloff > LINE_THRESHOLD {
                    nearby.push(point);
                }
                index.insert(key, points.len());
                points.push(point);
            }
        }

        Self { points, index, nearby }
    }

    #[inline]
    pub fn get(&self, key: GridKey) -> Option<&Point> {
        self.index.get(&key).map(|&i| &self.points[i])
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Points close enough to the pointer to anchor lines.
    pub fn nearby(&self) -> &[Point] {
        &self.nearby
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        for p in &self.points {
            surface.fill_dot(&Dot {
                center: [p.x, p.y],
                radius: p.radius,
                alpha: p.intensity,
            });
        }
    }
}

/// Linear pointer falloff, 1 at the pointer and 0 at or beyond `influence`.
pub fn falloff(dx: f32, dy: f32, influence: f32) -> f32 {
    if influence <= 0.0 {
        return 0.0;
    }
    let distance = (dx * dx + dy * dy).sqrt();
    (1.0 - distance / influence).max(0.0)
}
