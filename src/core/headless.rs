//! Host with a virtual clock and a recording surface.
//!
//! Drives the full frame/timer/listener protocol without a display, for the
//! CLI and for tests.

use serde::Serialize;

use super::driver::{FrameDriver, FrameHandle, Host, TimerHandle, Viewport};
use super::random::RandomSource;
use super::scene::FrameReport;
use super::surface::DrawList;

/// Calls the driver made into the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HostCounters {
    pub frames_requested: u64,
    pub frames_cancelled: u64,
    pub timers_started: u64,
    pub timers_cleared: u64,
    pub surface_resizes: u64,
}

#[derive(Debug)]
pub struct HeadlessHost {
    now: f64,
    viewport: Viewport,
    backing: (u32, u32),
    surface: DrawList,
    next_id: i32,
    frame: Option<FrameHandle>,
    timers: Vec<(TimerHandle, f64)>,
    listening: bool,
    counters: HostCounters,
}

impl HeadlessHost {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            now: 0.0,
            viewport,
            backing: (0, 0),
            surface: DrawList::new(),
            next_id: 1,
            frame: None,
            timers: Vec::new(),
            listening: false,
            counters: HostCounters::default(),
        }
    }

    fn next_handle(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn advance(&mut self, ms: f64) {
        self.now += ms.max(0.0);
    }

    /// Change the viewport without notifying anyone, like a window drag.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn counters(&self) -> HostCounters {
        self.counters
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn drawn(&self) -> &DrawList {
        &self.surface
    }

    /// Consume the outstanding frame request, as a display refresh would.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.frame.take()
    }

    /// Remove and return the timers whose deadline has passed.
    pub fn take_due_timers(&mut self) -> Vec<TimerHandle> {
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) = self.timers.drain(..).partition(|(_, at)| *at <= now);
        self.timers = pending;
        due.into_iter().map(|(handle, _)| handle).collect()
    }
}

impl Host for HeadlessHost {
    type Surface = DrawList;

    fn now_ms(&self) -> f64 {
        self.now
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn surface(&mut self) -> &mut DrawList {
        &mut self.surface
    }

    fn resize_surface(&mut self, viewport: &Viewport) {
        self.backing = viewport.backing_size();
        self.counters.surface_resizes += 1;
    }

    fn request_frame(&mut self) -> Option<FrameHandle> {
        let handle = FrameHandle(self.next_handle());
        self.frame = Some(handle);
        self.counters.frames_requested += 1;
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.frame == Some(handle) {
            self.frame = None;
        }
        self.counters.frames_cancelled += 1;
    }

    fn start_timer(&mut self, delay_ms: u32) -> Option<TimerHandle> {
        let handle = TimerHandle(self.next_handle());
        self.timers.push((handle, self.now + f64::from(delay_ms)));
        self.counters.timers_started += 1;
        Some(handle)
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        self.timers.retain(|(h, _)| *h != handle);
        self.counters.timers_cleared += 1;
    }

    fn listen(&mut self) {
        self.listening = true;
    }

    fn unlisten(&mut self) {
        self.listening = false;
    }
}

impl<R: RandomSource> FrameDriver<HeadlessHost, R> {
    /// Advance the virtual clock by `ms`, firing due timers and then the
    /// pending frame, if any.
    pub fn tick(&mut self, ms: f64) -> Option<FrameReport> {
        self.host_mut().advance(ms);
        for _ in self.host_mut().take_due_timers() {
            self.on_resize_settled();
        }
        self.host_mut().take_frame()?;
        let now = self.host().now();
        self.on_frame(now)
    }

    /// Tick at `frame_ms` intervals until the clock reaches `until_ms`.
    pub fn run_until(&mut self, until_ms: f64, frame_ms: f64) -> Option<FrameReport> {
        let mut last = None;
        while self.host().now() + frame_ms <= until_ms {
            if let Some(report) = self.tick(frame_ms) {
                last = Some(report);
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lines::LineSource;
    use crate::core::random::RngSource;
    use crate::mount_state::MountState;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn mount(seed: u64) -> FrameDriver<HeadlessHost, RngSource<rand::rngs::StdRng>> {
        FrameDriver::mount(
            HeadlessHost::new(Viewport::new(1920.0, 1080.0, 3.0)),
            RngSource::seeded(seed),
        )
    }

    #[test]
    fn mount_sizes_subscribes_and_schedules() {
        let driver = mount(1);
        let host = driver.host();
        assert!(host.is_listening());
        assert_eq!(host.backing_size(), (3840, 2160));
        assert_eq!(host.counters().surface_resizes, 1);
        assert_eq!(host.counters().frames_requested, 1);
        assert!(driver.frame_pending());
    }

    #[test]
    fn each_frame_schedules_exactly_one_more() {
        let mut driver = mount(2);
        for _ in 0..10 {
            assert!(driver.tick(FRAME_MS).is_some());
        }
        assert_eq!(driver.host().counters().frames_requested, 11);
        assert_eq!(driver.scene().frame_count(), 10);
    }

    #[test]
    fn idle_desktop_first_frame() {
        let mut driver = mount(3);
        let report = driver.tick(FRAME_MS).unwrap();
        assert_eq!(report.points, 34 * 20);
        assert_eq!(report.lines.pointer, 0);
    }

    #[test]
    fn resize_burst_is_debounced() {
        let mut driver = mount(4);
        driver.run_until(1000.0, 10.0);
        let before = driver.host().counters();

        for _ in 0..5 {
            driver.host_mut().set_viewport(Viewport::new(800.0, 600.0, 1.0));
            driver.on_resize();
            driver.tick(10.0);
        }
        // last event at t = 1040
        let last_event = 1040.0;
        assert_eq!(driver.host().counters().surface_resizes, before.surface_resizes);

        driver.run_until(last_event + 110.0, 10.0);
        assert_eq!(driver.host().counters().surface_resizes, before.surface_resizes);

        driver.run_until(last_event + 130.0, 10.0);
        let after = driver.host().counters();
        assert_eq!(after.surface_resizes, before.surface_resizes + 1);
        assert_eq!(after.frames_cancelled, before.frames_cancelled + 1);
        assert_eq!(after.timers_started, before.timers_started + 5);
        assert_eq!(after.timers_cleared, before.timers_cleared + 4);
        assert_eq!(driver.host().backing_size(), (800, 600));
        assert!(driver.frame_pending());
    }

    #[test]
    fn resized_grid_follows_new_profile() {
        let mut driver = mount(5);
        driver.tick(FRAME_MS);
        driver.host_mut().set_viewport(Viewport::new(600.0, 900.0, 2.0));
        driver.on_resize();
        let report = driver.run_until(driver.host().now() + 200.0, FRAME_MS).unwrap();
        // ceil(600/42)+2 by ceil(900/42)+2
        assert_eq!(report.points, 17 * 24);
        assert_eq!(driver.host().backing_size(), (1200, 1800));
    }

    #[test]
    fn unmount_releases_everything() {
        let mut driver = mount(6);
        driver.tick(FRAME_MS);
        driver.on_resize();
        driver.unmount();

        let host = driver.host();
        assert_eq!(driver.state(), MountState::Unmounted);
        assert!(!host.is_listening());
        assert_eq!(host.active_timers(), 0);
        assert!(!driver.frame_pending());

        let counters = host.counters();
        driver.on_pointer_move(10.0, 10.0);
        driver.on_resize();
        driver.on_resize_settled();
        assert!(driver.on_frame(5000.0).is_none());
        assert!(driver.tick(FRAME_MS).is_none());
        assert_eq!(driver.host().counters(), counters);

        // second unmount is a no-op
        driver.unmount();
        assert_eq!(driver.host().counters(), counters);
    }

    #[test]
    fn pointer_session_end_to_end() {
        let mut driver = mount(7);
        driver.tick(FRAME_MS);
        driver.on_pointer_move(910.0, 500.0);
        let report = driver.tick(FRAME_MS).unwrap();
        assert_eq!(report.pointer_batches, 1);
        assert!(report.lines.pointer > 0);
        assert!(driver.host().drawn().segments().count() <= report.lines.total());

        driver.on_pointer_leave();
        driver.run_until(driver.host().now() + 1000.0, FRAME_MS);
        assert_eq!(driver.scene().lines().count(LineSource::Pointer), 0);
    }
}
