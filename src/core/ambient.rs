//! Periodic ambient lines, independent of the pointer.

use super::grid::Point;
use super::lines::{generate_lines, GenerateOptions, LineSet, LineSource};
use super::profile::Profile;
use super::random::RandomSource;

/// Seconds between spawn ticks
pub const SPAWN_INTERVAL: (f32, f32) = (1.1, 2.5);

#[derive(Debug, Clone)]
pub struct AmbientSpawner {
    elapsed: f32,
    next: f32,
}

impl AmbientSpawner {
    pub fn new(rng: &mut dyn RandomSource) -> Self {
        Self {
            elapsed: 0.0,
            next: rng.range(SPAWN_INTERVAL),
        }
    }

    /// Interval the current tick is waiting for.
    pub fn next_interval(&self) -> f32 {
        self.next
    }

    /// Accumulate `dt` and, when the interval elapses, top the ambient
    /// population up by at most one burst. Returns the number of lines added.
    pub fn tick(
        &mut self,
        points: &[Point],
        lines: &mut LineSet,
        profile: &Profile,
        dt: f32,
        rng: &mut dyn RandomSource,
    ) -> usize {
        if points.len() < 2 {
            return 0;
        }

        self.elapsed += dt;
        if self.elapsed < self.next {
            return 0;
        }
        self.elapsed = 0.0;
        self.next = rng.range(SPAWN_INTERVAL);

        let ambient = lines.count(LineSource::Ambient);
        let spawn = profile.ambient_burst.min(profile.ambient_total.saturating_sub(ambient));
        if spawn == 0 {
            return 0;
        }

        let batch = generate_lines(points, &GenerateOptions::ambient(spawn), &lines.live_pairs(), rng);
        let added = batch.len();
        tracing::trace!(added, ambient, "Ambient spawn");
        lines.extend(batch);
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{FieldInput, GridField, PointerSample};
    use crate::core::lines::LineState;
    use crate::core::profile::{DESKTOP, MOBILE};
    use crate::core::random::{RngSource, Sequence};

    fn points() -> Vec<Point> {
        GridField::build(&FieldInput {
            width: 1280.0,
            height: 720.0,
            time: 0.0,
            pointer: PointerSample { x: 640.0, y: 360.0, active: false },
            drift: [0.0, 0.0],
            scroll_offset: 0.0,
            profile: &DESKTOP,
        })
        .points()
        .to_vec()
    }

    #[test]
    fn waits_for_interval() {
        // First interval = 1.1 + 0.5 * 1.4 = 1.8s
        let mut rng = Sequence::new(vec![0.5]);
        let mut spawner = AmbientSpawner::new(&mut rng);
        assert!((spawner.next_interval() - 1.8).abs() < 1e-6);

        let pts = points();
        let mut lines = LineSet::new();
        let mut rng = RngSource::seeded(1);
        assert_eq!(spawner.tick(&pts, &mut lines, &DESKTOP, 1.0, &mut rng), 0);
        assert!(lines.is_empty());
        let added = spawner.tick(&pts, &mut lines, &DESKTOP, 0.9, &mut rng);
        assert_eq!(added, DESKTOP.ambient_burst);
        assert!(lines.lines().iter().all(|l| l.source == LineSource::Ambient && l.state == LineState::Pending));
        assert!((1.1..=2.5).contains(&spawner.next_interval()));
    }

    #[test]
    fn population_is_capped() {
        let pts = points();
        let mut rng = RngSource::seeded(2);
        let mut spawner = AmbientSpawner::new(&mut rng);
        let mut lines = LineSet::new();
        for _ in 0..20 {
            spawner.tick(&pts, &mut lines, &MOBILE, 3.0, &mut rng);
            assert!(lines.count(LineSource::Ambient) <= MOBILE.ambient_total);
        }
        assert_eq!(lines.count(LineSource::Ambient), MOBILE.ambient_total);
    }

    #[test]
    fn idle_without_points() {
        let mut rng = RngSource::seeded(3);
        let mut spawner = AmbientSpawner::new(&mut rng);
        let mut lines = LineSet::new();
        assert_eq!(spawner.tick(&points()[..1], &mut lines, &DESKTOP, 10.0, &mut rng), 0);
        assert!(lines.is_empty());
    }
}
