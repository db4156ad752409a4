//! Per-mount simulation state and the frame pipeline.
//!
//! Input handlers only write primitive fields; everything else happens in
//! [`Scene::frame`], one call per displayed frame.

use serde::Serialize;

use super::ambient::AmbientSpawner;
use super::grid::{FieldInput, GridField, GridKey, PointerSample};
use super::lines::{generate_lines, GenerateOptions, LineCensus, LineSet, LineSource};
use super::profile::{self, Profile, ProfileKind};
use super::random::RandomSource;
use super::surface::Surface;

/// Upper bound on a frame's elapsed time, in seconds
pub const MAX_DELTA: f32 = 0.06;
/// Simulation clock advance per frame
pub const TIME_STEP: f32 = 0.01;
pub const SCROLL_FACTOR: f32 = 0.05;
/// Per-frame easing of drift toward its wave target
const DRIFT_EASING: f32 = 0.025;
/// Per-frame easing of an inactive pointer toward the viewport centre
const POINTER_EASING: f32 = 0.02;
const DRIFT_AMPLITUDE: f32 = 12.0;

#[inline]
fn interpolate(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Summary of one frame, for logging and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub profile: ProfileKind,
    pub points: usize,
    pub nearby: usize,
    pub lines: LineCensus,
    /// Pointer batches generated since mount
    pub pointer_batches: u64,
    /// Ambient spawn ticks that added lines since mount
    pub ambient_batches: u64,
    pub delta_seconds: f32,
}

/// Cell, nearby count and live line count of a failed pointer batch. A
/// same-cell refill is only retried once one of them changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StallKey {
    cell: GridKey,
    nearby: usize,
    live: usize,
}

pub struct Scene {
    pointer: PointerSample,
    drift: [f32; 2],
    scroll_offset: f32,
    last_cell: Option<GridKey>,
    /// Conditions under which the last pointer batch came back empty
    stalled: Option<StallKey>,
    ambient: AmbientSpawner,
    lines: LineSet,
    time: f32,
    last_timestamp: f64,
    frame: u64,
    pointer_batches: u64,
    ambient_batches: u64,
    profile: ProfileKind,
}

impl Scene {
    /// Fresh scene for a `width` x `height` viewport; the pointer starts
    /// inactive at the centre and `now_ms` seeds the frame clock.
    pub fn new(width: f32, height: f32, now_ms: f64, rng: &mut dyn RandomSource) -> Self {
        Self {
            pointer: PointerSample { x: width / 2.0, y: height / 2.0, active: false },
            drift: [0.0, 0.0],
            scroll_offset: 0.0,
            last_cell: None,
            stalled: None,
            ambient: AmbientSpawner::new(rng),
            lines: LineSet::new(),
            time: 0.0,
            last_timestamp: now_ms,
            frame: 0,
            pointer_batches: 0,
            ambient_batches: 0,
            profile: profile::for_width(width).kind,
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = PointerSample { x, y, active: true };
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.active = false;
    }

    /// `scroll_y` is the document scroll position in CSS pixels.
    pub fn scroll(&mut self, scroll_y: f32) {
        self.scroll_offset = scroll_y * SCROLL_FACTOR;
    }

    pub fn pointer(&self) -> PointerSample {
        self.pointer
    }

    pub fn lines(&self) -> &LineSet {
        &self.lines
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Run one frame at host time `now_ms` and draw it onto `surface`.
    pub fn frame(
        &mut self,
        now_ms: f64,
        width: f32,
        height: f32,
        surface: &mut dyn Surface,
        rng: &mut dyn RandomSource,
    ) -> FrameReport {
        self.time += TIME_STEP;
        self.frame += 1;

        let config = profile::for_width(width);
        if config.kind != self.profile {
            tracing::info!(profile = ?config.kind, width, "Responsive profile changed");
            self.profile = config.kind;
        }

        let dt = (((now_ms - self.last_timestamp) / 1000.0) as f32).clamp(0.0, MAX_DELTA);
        self.last_timestamp = now_ms;

        surface.clear(width, height);

        let wave = [
            (self.time * 0.8).sin() * DRIFT_AMPLITUDE,
            (self.time * 0.6).cos() * DRIFT_AMPLITUDE,
        ];
        self.drift[0] = interpolate(self.drift[0], wave[0], DRIFT_EASING);
        self.drift[1] = interpolate(self.drift[1], wave[1], DRIFT_EASING);

        let field = GridField::build(&FieldInput {
            width,
            height,
            time: self.time,
            pointer: self.pointer,
            drift: self.drift,
            scroll_offset: self.scroll_offset,
            profile: config,
        });
        field.draw(surface);

        self.reconcile_pointer(&field, config, rng);

        if self.ambient.tick(field.points(), &mut self.lines, config, dt, rng) > 0 {
            self.ambient_batches += 1;
        }

        self.lines.step(dt);
        self.lines.draw(&field, surface);

        if !self.pointer.active {
            self.pointer.x = interpolate(self.pointer.x, width / 2.0, POINTER_EASING);
            self.pointer.y = interpolate(self.pointer.y, height / 2.0, POINTER_EASING);
        }

        tracing::trace!(frame = self.frame, dt, lines = self.lines.len(), "Frame");

        FrameReport {
            frame: self.frame,
            profile: config.kind,
            points: field.len(),
            nearby: field.nearby().len(),
            lines: self.lines.census(),
            pointer_batches: self.pointer_batches,
            ambient_batches: self.ambient_batches,
            delta_seconds: dt,
        }
    }

    /// Keep pointer lines in step with the cell under the pointer.
    fn reconcile_pointer(&mut self, field: &GridField, config: &Profile, rng: &mut dyn RandomSource) {
        let nearby = field.nearby();
        if !(self.pointer.active && nearby.len() > 1) {
            if !self.lines.is_empty() {
                self.lines.retire(LineSource::Pointer);
            }
            self.last_cell = None;
            self.stalled = None;
            return;
        }

        let cell = GridKey::new(
            (self.pointer.x / config.spacing).floor() as i32,
            (self.pointer.y / config.spacing).floor() as i32,
        );

        let request = if self.last_cell != Some(cell) {
            self.lines.retire(LineSource::Pointer);
            let remaining = config.pointer_lines.saturating_sub(self.lines.count(LineSource::Pointer));
            self.last_cell = Some(cell);
            if remaining == 0 {
                config.pointer_lines
            } else {
                remaining
            }
        } else if !self.lines.has_live(LineSource::Pointer) {
            config.pointer_lines
        } else {
            self.stalled = None;
            return;
        };

        let occupied = self.lines.live_pairs();
        let key = StallKey { cell, nearby: nearby.len(), live: occupied.len() };
        if self.stalled == Some(key) {
            return;
        }

        let batch = generate_lines(nearby, &GenerateOptions::pointer(request), &occupied, rng);
        tracing::debug!(
            col = cell.col,
            row = cell.row,
            requested = request,
            created = batch.len(),
            "Pointer batch"
        );
        if batch.is_empty() {
            self.stalled = Some(key);
            return;
        }
        self.stalled = None;
        self.pointer_batches += 1;
        self.lines.extend(batch);
    }
}
