//! Transient lines between grid points: generation, lifecycle and rendering.
//!
//! A line is `Pending` until its stagger delay runs out, `Steady` until its
//! lifespan is used up (or it is retired by the pointer path), then
//! `Disappearing` until its progress decays to zero and it is dropped.

use std::collections::HashSet;

use serde::Serialize;

use super::grid::{GridField, GridKey, Point};
use super::random::RandomSource;
use super::surface::{Segment, Surface};

/// Dash scroll speed in pixels per second
pub const DASH_SCROLL_SPEED: f32 = 90.0;
/// Progress at or below which a disappearing line is dropped
pub const REMOVAL_EPSILON: f32 = 0.001;
/// Retry budget per requested line
pub const RETRY_FACTOR: usize = 8;
/// Re-picks allowed when both endpoints land on the same point
const END_PICK_GUARD: usize = 5;

const DASHED_PATTERN: [f32; 2] = [8.0, 6.0];
const DOTTED_PATTERN: [f32; 2] = [2.0, 5.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    Pointer,
    Ambient,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineState {
    Pending,
    Steady,
    Disappearing,
}

/// Visual style with its per-variant parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineStyle {
    Solid,
    Dashed { speed: f32 },
    Dotted { speed: f32 },
    Glitch { dash: [f32; 2], jitter: [f32; 2] },
}

impl LineStyle {
    /// Number of variants drawn from by [`LineStyle::random`]
    pub const COUNT: usize = 4;

    /// Uniform pick over the four variants, then roll its parameters.
    pub fn random(rng: &mut dyn RandomSource) -> Self {
        match rng.index(Self::COUNT) {
            0 => LineStyle::Solid,
            1 => LineStyle::Dashed {
                speed: DASH_SCROLL_SPEED * rng.range((0.8, 1.2)),
            },
            2 => LineStyle::Dotted {
                speed: DASH_SCROLL_SPEED * 0.6 * rng.range((0.8, 1.2)),
            },
            _ => LineStyle::Glitch {
                dash: [rng.next_unit() * 6.0 + 2.0, rng.next_unit() * 8.0 + 4.0],
                jitter: [(rng.next_unit() - 0.5) * 4.0, (rng.next_unit() - 0.5) * 4.0],
            },
        }
    }

    pub fn dash(&self) -> Option<[f32; 2]> {
        match *self {
            LineStyle::Solid => None,
            LineStyle::Dashed { .. } => Some(DASHED_PATTERN),
            LineStyle::Dotted { .. } => Some(DOTTED_PATTERN),
            LineStyle::Glitch { dash, .. } => Some(dash),
        }
    }

    pub fn dash_speed(&self) -> f32 {
        match *self {
            LineStyle::Dashed { speed } | LineStyle::Dotted { speed } => speed,
            LineStyle::Solid | LineStyle::Glitch { .. } => 0.0,
        }
    }

    /// Endpoint displacement, non-zero for glitch lines only.
    pub fn jitter(&self) -> [f32; 2] {
        match *self {
            LineStyle::Glitch { jitter, .. } => jitter,
            _ => [0.0, 0.0],
        }
    }

    fn opacity_scale(&self) -> f32 {
        match self {
            LineStyle::Glitch { .. } => 0.9,
            _ => 1.0,
        }
    }
}

/// Unordered endpoint pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairKey(GridKey, GridKey);

impl PairKey {
    pub fn new(a: GridKey, b: GridKey) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub start: GridKey,
    pub end: GridKey,
    pub style: LineStyle,
    pub dash_offset: f32,
    pub width: f32,
    pub opacity: f32,
    pub source: LineSource,
    pub state: LineState,
    /// Drawn fraction and opacity multiplier, always within `[0, 1]`
    pub progress: f32,
    /// Seconds left before a pending line shows
    pub activation_delay: f32,
    pub disappear_duration: f32,
    pub lifespan: f32,
    pub age: f32,
}

impl Line {
    pub fn pair(&self) -> PairKey {
        PairKey::new(self.start, self.end)
    }

    pub fn is_disappearing(&self) -> bool {
        self.state == LineState::Disappearing
    }

    /// Start fading out. Disappearing is terminal.
    pub fn retire(&mut self) {
        self.state = LineState::Disappearing;
    }

    /// Advance by `dt` seconds. Returns `false` once the line has fully faded.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.age += dt;

        match self.state {
            LineState::Pending => {
                self.activation_delay -= dt;
                if self.activation_delay <= 0.0 {
                    self.state = LineState::Steady;
                    self.progress = 1.0;
                } else {
                    self.progress = 0.0;
                }
            }
            LineState::Disappearing => {
                let rate = if self.disappear_duration > 0.0 { dt / self.disappear_duration } else { 1.0 };
                self.progress = (self.progress - rate).clamp(0.0, 1.0);
                if self.progress <= REMOVAL_EPSILON {
                    return false;
                }
            }
            LineState::Steady => self.progress = 1.0,
        }

        if self.state == LineState::Steady && self.age >= self.lifespan {
            self.state = LineState::Disappearing;
        }

        let speed = self.style.dash_speed();
        if self.style.dash().is_some() && speed != 0.0 {
            self.dash_offset -= speed * dt;
        } else {
            self.dash_offset = 0.0;
        }

        true
    }

    /// Segment for the current frame, or `None` while pending or when an
    /// endpoint is outside the current grid.
    pub fn segment(&self, field: &GridField) -> Option<Segment> {
        if self.state == LineState::Pending {
            return None;
        }
        let start = field.get(self.start)?;
        let end = field.get(self.end)?;
        let progress = self.progress.clamp(0.0, 1.0);
        let [jx, jy] = self.style.jitter();
        let dx = end.x + jx - start.x;
        let dy = end.y + jy - start.y;
        Some(Segment {
            from: [start.x, start.y],
            to: [start.x + dx * progress, start.y + dy * progress],
            width: self.width,
            alpha: self.opacity * progress,
            dash: self.style.dash(),
            dash_offset: self.dash_offset,
        })
    }
}

/// Tuning for one call to [`generate_lines`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerateOptions {
    pub max_lines: usize,
    pub source: LineSource,
    pub base_opacity: f32,
    pub width_range: (f32, f32),
    /// Activation delay step between consecutive lines of a batch
    pub stagger: f32,
    pub disappear_range: (f32, f32),
    pub lifespan_range: (f32, f32),
}

impl GenerateOptions {
    pub fn pointer(max_lines: usize) -> Self {
        Self {
            max_lines,
            source: LineSource::Pointer,
            base_opacity: 0.45,
            width_range: (1.0, 1.8),
            stagger: 0.05,
            disappear_range: (0.2, 0.4),
            lifespan_range: (3.0, 4.5),
        }
    }

    pub fn ambient(max_lines: usize) -> Self {
        Self {
            max_lines,
            source: LineSource::Ambient,
            base_opacity: 0.35,
            width_range: (0.8, 1.4),
            stagger: 0.08,
            disappear_range: (0.5, 0.9),
            lifespan_range: (3.5, 6.0),
        }
    }
}

/// Build up to `options.max_lines` pending lines between random candidates.
///
/// Pairs in `occupied` (and pairs already picked in this batch) are skipped.
/// The request is capped at half the candidate count and the loop gives up
/// after `RETRY_FACTOR` attempts per line, so the batch may come back short.
pub fn generate_lines(
    candidates: &[Point],
    options: &GenerateOptions,
    occupied: &HashSet<PairKey>,
    rng: &mut dyn RandomSource,
) -> Vec<Line> {
    let max = options.max_lines.min(candidates.len() / 2);
    let mut lines = Vec::with_capacity(max);
    if max == 0 {
        return lines;
    }

    let mut used: HashSet<PairKey> = HashSet::with_capacity(max);
    let mut attempts = 0;
    while lines.len() < max && attempts < max * RETRY_FACTOR {
        attempts += 1;

        let start = rng.index(candidates.len());
        let mut end = rng.index(candidates.len());
        let mut guard = 0;
        while end == start && guard < END_PICK_GUARD {
            end = rng.index(candidates.len());
            guard += 1;
        }
        if end == start {
            continue;
        }

        let (start, end) = (&candidates[start], &candidates[end]);
        let pair = PairKey::new(start.key, end.key);
        if occupied.contains(&pair) || !used.insert(pair) {
            continue;
        }

        let style = LineStyle::random(rng);
        let disappear_duration = rng.range(options.disappear_range);
        let width = rng.range(options.width_range);
        let opacity = options.base_opacity + start.closeness * 0.35 + rng.next_unit() * 0.1;
        let lifespan = rng.range(options.lifespan_range);

        lines.push(Line {
            start: start.key,
            end: end.key,
            style,
            dash_offset: 0.0,
            width,
            opacity: opacity * style.opacity_scale(),
            source: options.source,
            state: LineState::Pending,
            progress: 0.0,
            activation_delay: lines.len() as f32 * options.stagger,
            disappear_duration,
            lifespan,
            age: 0.0,
        });
    }

    lines
}

/// Population summary of the live collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LineCensus {
    pub pending: usize,
    pub steady: usize,
    pub disappearing: usize,
    pub pointer: usize,
    pub ambient: usize,
}

impl LineCensus {
    pub fn total(&self) -> usize {
        self.pending + self.steady + self.disappearing
    }
}

/// Ordered live collection of lines.
#[derive(Debug, Default)]
pub struct LineSet {
    lines: Vec<Line>,
}

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn extend(&mut self, batch: Vec<Line>) {
        self.lines.extend(batch);
    }

    pub fn count(&self, source: LineSource) -> usize {
        self.lines.iter().filter(|l| l.source == source).count()
    }

    /// Whether `source` has any pending or steady line.
    pub fn has_live(&self, source: LineSource) -> bool {
        self.lines.iter().any(|l| l.source == source && !l.is_disappearing())
    }

    /// Pairs currently held by pending or steady lines.
    pub fn live_pairs(&self) -> HashSet<PairKey> {
        self.lines
            .iter()
            .filter(|l| !l.is_disappearing())
            .map(Line::pair)
            .collect()
    }

    /// Retire every line from `source`.
    pub fn retire(&mut self, source: LineSource) {
        for line in self.lines.iter_mut().filter(|l| l.source == source) {
            line.retire();
        }
    }

    /// Advance every line and drop the ones that have faded out.
    pub fn step(&mut self, dt: f32) {
        self.lines.retain_mut(|line| line.advance(dt));
    }

    pub fn census(&self) -> LineCensus {
        let mut census = LineCensus::default();
        for line in &self.lines {
            match line.state {
                LineState::Pending => census.pending += 1,
                LineState::Steady => census.steady += 1,
                LineState::Disappearing => census.disappearing += 1,
            }
            match line.source {
                LineSource::Pointer => census.pointer += 1,
                LineSource::Ambient => census.ambient += 1,
            }
        }
        census
    }

    pub fn draw(&self, field: &GridField, surface: &mut dyn Surface) {
        for segment in self.lines.iter().filter_map(|l| l.segment(field)) {
            surface.stroke_segment(&segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{FieldInput, PointerSample};
    use crate::core::profile::DESKTOP;
    use crate::core::random::{RngSource, Sequence};
    use crate::core::surface::DrawList;

    fn candidates(n: i32) -> Vec<Point> {
        (0..n)
            .map(|i| Point {
                key: GridKey::new(i, 0),
                x: i as f32 * 60.0,
                y: 0.0,
                closeness: GridKey::new(i, 0).closeness(),
                falloff: 1.0,
                intensity: 0.9,
                radius: 2.0,
            })
            .collect()
    }

    fn line(state: LineState) -> Line {
        Line {
            start: GridKey::new(0, 0),
            end: GridKey::new(1, 0),
            style: LineStyle::Solid,
            dash_offset: 0.0,
            width: 1.0,
            opacity: 0.5,
            source: LineSource::Pointer,
            state,
            progress: if state == LineState::Pending { 0.0 } else { 1.0 },
            activation_delay: 0.0,
            disappear_duration: 0.3,
            lifespan: 4.0,
            age: 0.0,
        }
    }

    fn field() -> GridField {
        GridField::build(&FieldInput {
            width: 1920.0,
            height: 1080.0,
            time: 0.0,
            pointer: PointerSample { x: 960.0, y: 540.0, active: false },
            drift: [0.0, 0.0],
            scroll_offset: 0.0,
            profile: &DESKTOP,
        })
    }

    #[test]
    fn pair_key_is_unordered() {
        let a = GridKey::new(3, -1);
        let b = GridKey::new(-2, 4);
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        assert_ne!(PairKey::new(a, b), PairKey::new(a, a));
    }

    #[test]
    fn batch_pairs_are_unique() {
        let pts = candidates(12);
        for seed in 0..32 {
            let mut rng = RngSource::seeded(seed);
            let batch = generate_lines(&pts, &GenerateOptions::pointer(18), &HashSet::new(), &mut rng);
            let pairs: HashSet<_> = batch.iter().map(Line::pair).collect();
            assert_eq!(pairs.len(), batch.len(), "seed {seed}");
            assert!(batch.iter().all(|l| l.start != l.end));
        }
    }

    #[test]
    fn batch_is_pending_and_staggered() {
        let pts = candidates(40);
        let mut rng = RngSource::seeded(7);
        let batch = generate_lines(&pts, &GenerateOptions::pointer(18), &HashSet::new(), &mut rng);
        assert!(!batch.is_empty() && batch.len() <= 18);
        for (i, l) in batch.iter().enumerate() {
            assert_eq!(l.state, LineState::Pending);
            assert_eq!(l.progress, 0.0);
            assert!((l.activation_delay - i as f32 * 0.05).abs() < 1e-6);
            assert_eq!(l.source, LineSource::Pointer);
            assert!((1.0..=1.8).contains(&l.width));
            assert!((0.2..=0.4).contains(&l.disappear_duration));
            assert!((3.0..=4.5).contains(&l.lifespan));
        }
    }

    #[test]
    fn staggered_batch_becomes_steady_in_time() {
        let pts = candidates(40);
        let mut rng = RngSource::seeded(11);
        let mut set = LineSet::new();
        set.extend(generate_lines(&pts, &GenerateOptions::pointer(18), &HashSet::new(), &mut rng));
        let n = set.len();
        let dt = 0.01;
        let steps = (0.05 * n as f32 / dt).ceil() as usize;
        for _ in 0..steps {
            set.step(dt);
        }
        let last = set.lines().last().unwrap();
        assert_eq!(last.state, LineState::Steady);
        assert_eq!(last.progress, 1.0);
    }

    #[test]
    fn request_capped_by_half_the_candidates() {
        let pts = candidates(5);
        let mut rng = RngSource::seeded(3);
        let batch = generate_lines(&pts, &GenerateOptions::ambient(10), &HashSet::new(), &mut rng);
        assert!(batch.len() <= 2);
        assert!(generate_lines(&candidates(1), &GenerateOptions::ambient(10), &HashSet::new(), &mut rng).is_empty());
    }

    #[test]
    fn retry_budget_bounds_degenerate_sources() {
        // Always the same index: every attempt collides with itself
        let mut rng = Sequence::new(vec![0.0]);
        let batch = generate_lines(&candidates(10), &GenerateOptions::pointer(4), &HashSet::new(), &mut rng);
        assert!(batch.is_empty());
    }

    #[test]
    fn occupied_pairs_are_not_recreated() {
        let pts = candidates(2);
        let occupied: HashSet<_> = [PairKey::new(pts[1].key, pts[0].key)].into_iter().collect();
        let mut rng = RngSource::seeded(5);
        let batch = generate_lines(&pts, &GenerateOptions::pointer(1), &occupied, &mut rng);
        assert!(batch.is_empty());
    }

    #[test]
    fn style_parameters_follow_variant() {
        // index 0.3 -> dashed, jitter sample 0.5 -> speed * 1.0
        let mut rng = Sequence::new(vec![0.3, 0.5]);
        let dashed = LineStyle::random(&mut rng);
        assert_eq!(dashed.dash(), Some([8.0, 6.0]));
        assert!((dashed.dash_speed() - 90.0).abs() < 1e-4);
        assert_eq!(dashed.jitter(), [0.0, 0.0]);

        let mut rng = Sequence::new(vec![0.6, 0.5]);
        let dotted = LineStyle::random(&mut rng);
        assert_eq!(dotted.dash(), Some([2.0, 5.0]));
        assert!((dotted.dash_speed() - 54.0).abs() < 1e-4);

        let mut rng = Sequence::new(vec![0.9, 0.5, 0.5, 1.0, 0.0]);
        let glitch = LineStyle::random(&mut rng);
        assert_eq!(glitch.dash(), Some([5.0, 8.0]));
        assert_eq!(glitch.jitter(), [2.0, -2.0]);
        assert_eq!(glitch.dash_speed(), 0.0);

        let mut rng = Sequence::new(vec![0.1]);
        assert_eq!(LineStyle::random(&mut rng), LineStyle::Solid);
        assert_eq!(LineStyle::Solid.dash(), None);
    }

    #[test]
    fn pending_line_snaps_to_steady() {
        let mut l = line(LineState::Pending);
        l.activation_delay = 0.1;
        assert!(l.advance(0.05));
        assert_eq!((l.state, l.progress), (LineState::Pending, 0.0));
        assert!(l.advance(0.05));
        assert_eq!((l.state, l.progress), (LineState::Steady, 1.0));
    }

    #[test]
    fn steady_line_retires_after_lifespan() {
        let mut l = line(LineState::Steady);
        l.age = 4.0;
        assert!(l.advance(0.016));
        assert_eq!(l.state, LineState::Disappearing);
        assert_eq!(l.progress, 1.0);
    }

    #[test]
    fn disappearing_line_fades_then_drops() {
        let mut set = LineSet::new();
        let mut l = line(LineState::Disappearing);
        l.disappear_duration = 0.3;
        set.extend(vec![l]);

        set.step(0.1);
        assert!((set.lines()[0].progress - 0.667).abs() < 1e-3);
        set.step(0.1);
        assert!((set.lines()[0].progress - 0.333).abs() < 1e-3);
        set.step(0.1);
        assert!(set.is_empty(), "line should be dropped after the third step");
    }

    #[test]
    fn zero_duration_disappears_in_one_step() {
        let mut l = line(LineState::Disappearing);
        l.disappear_duration = 0.0;
        assert!(!l.advance(0.001));
    }

    #[test]
    fn disappearing_is_terminal() {
        let mut rng = RngSource::seeded(99);
        let mut set = LineSet::new();
        set.extend(generate_lines(&candidates(30), &GenerateOptions::ambient(10), &HashSet::new(), &mut rng));
        let mut retired: HashSet<PairKey> = HashSet::new();
        for frame in 0..900 {
            if frame == 10 {
                set.retire(LineSource::Ambient);
            }
            set.step(1.0 / 60.0);
            for l in set.lines() {
                assert!((0.0..=1.0).contains(&l.progress));
                if l.is_disappearing() {
                    retired.insert(l.pair());
                    assert!(l.progress > REMOVAL_EPSILON);
                } else {
                    assert!(!retired.contains(&l.pair()), "line left disappearing");
                }
            }
        }
        assert!(set.is_empty());
    }

    #[test]
    fn dash_offset_scrolls_even_while_pending() {
        let mut l = line(LineState::Pending);
        l.style = LineStyle::Dashed { speed: 100.0 };
        l.activation_delay = 1.0;
        l.advance(0.1);
        assert!((l.dash_offset + 10.0).abs() < 1e-4);

        let mut solid = line(LineState::Steady);
        solid.dash_offset = 3.0;
        solid.advance(0.1);
        assert_eq!(solid.dash_offset, 0.0);
    }

    #[test]
    fn segment_applies_progress_and_jitter() {
        let field = field();
        let mut l = line(LineState::Steady);
        l.style = LineStyle::Glitch { dash: [3.0, 5.0], jitter: [2.0, -1.0] };
        l.progress = 0.5;
        let seg = l.segment(&field).unwrap();
        let a = field.get(l.start).unwrap();
        let b = field.get(l.end).unwrap();
        assert_eq!(seg.from, [a.x, a.y]);
        assert!((seg.to[0] - (a.x + (b.x + 2.0 - a.x) * 0.5)).abs() < 1e-4);
        assert!((seg.to[1] - (a.y + (b.y - 1.0 - a.y) * 0.5)).abs() < 1e-4);
        assert!((seg.alpha - 0.25).abs() < 1e-6);
        assert_eq!(seg.dash, Some([3.0, 5.0]));
    }

    #[test]
    fn pending_and_orphaned_lines_are_not_drawn() {
        let field = field();
        let mut set = LineSet::new();
        let mut orphan = line(LineState::Steady);
        orphan.end = GridKey::new(500, 500);
        set.extend(vec![line(LineState::Pending), orphan.clone(), line(LineState::Steady)]);

        let mut list = DrawList::new();
        set.draw(&field, &mut list);
        assert_eq!(list.segments().count(), 1);
        // the orphan is skipped, not removed
        assert_eq!(set.len(), 3);
        assert!(orphan.segment(&field).is_none());
    }

    #[test]
    fn retire_touches_one_source_only() {
        let mut set = LineSet::new();
        let mut ambient = line(LineState::Steady);
        ambient.source = LineSource::Ambient;
        set.extend(vec![line(LineState::Steady), ambient]);
        set.retire(LineSource::Pointer);
        assert!(!set.has_live(LineSource::Pointer));
        assert!(set.has_live(LineSource::Ambient));
        let census = set.census();
        assert_eq!((census.steady, census.disappearing, census.total()), (1, 1, 2));
    }
}
