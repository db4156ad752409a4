//! Frame driver: owns the scene for one mount and talks to the host.
//!
//! The host delivers frames, input and timer callbacks strictly one at a
//! time; the driver never blocks. Unmounting cancels the pending frame,
//! clears the resize timer and drops all listeners, after which every
//! callback is a no-op.

use tracing::{debug, info};

use super::random::RandomSource;
use super::scene::{FrameReport, Scene};
use super::surface::Surface;
use crate::mount_state::MountState;

/// Quiet period before a resize is applied
pub const RESIZE_DEBOUNCE_MS: u32 = 120;
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// CSS viewport size plus the raw device pixel ratio reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self { width, height, device_pixel_ratio }
    }

    /// Device pixel ratio clamped to `MAX_PIXEL_RATIO`; 1 when unusable.
    pub fn pixel_ratio(&self) -> f32 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        }
    }

    /// Backing store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        (
            (self.width.max(0.0) * ratio) as u32,
            (self.height.max(0.0) * ratio) as u32,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerHandle(pub i32);

/// Environment services the driver needs.
pub trait Host {
    type Surface: Surface;

    /// High-resolution timestamp in milliseconds.
    fn now_ms(&self) -> f64;
    fn viewport(&self) -> Viewport;
    fn surface(&mut self) -> &mut Self::Surface;
    /// Reallocate the backing store for `viewport` and reset the DPR transform.
    fn resize_surface(&mut self, viewport: &Viewport);
    /// Ask for one frame callback at the next display refresh.
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
    /// One-shot timer; the host calls `on_resize_settled` when it fires.
    fn start_timer(&mut self, delay_ms: u32) -> Option<TimerHandle>;
    fn clear_timer(&mut self, handle: TimerHandle);
    /// Subscribe to pointer move/leave, scroll (passive) and resize.
    fn listen(&mut self);
    fn unlisten(&mut self);
}

pub struct FrameDriver<H: Host, R: RandomSource> {
    host: H,
    rng: R,
    scene: Scene,
    state: MountState,
    pending_frame: Option<FrameHandle>,
    resize_timer: Option<TimerHandle>,
    last_report: Option<FrameReport>,
}

impl<H: Host, R: RandomSource> FrameDriver<H, R> {
    /// Size the surface, subscribe to input and schedule the first frame.
    pub fn mount(mut host: H, mut rng: R) -> Self {
        let viewport = host.viewport();
        host.resize_surface(&viewport);
        let scene = Scene::new(viewport.width, viewport.height, host.now_ms(), &mut rng);
        host.listen();
        let pending_frame = host.request_frame();

        info!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio(),
            "Backdrop mounted"
        );

        Self {
            host,
            rng,
            scene,
            state: MountState::Mounted,
            pending_frame,
            resize_timer: None,
            last_report: None,
        }
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Whether a frame callback is outstanding.
    pub fn frame_pending(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Run one frame and schedule the next.
    pub fn on_frame(&mut self, now_ms: f64) -> Option<FrameReport> {
        if !self.state.is_mounted() {
            return None;
        }
        self.pending_frame = None;

        let viewport = self.host.viewport();
        let report = self.scene.frame(
            now_ms,
            viewport.width,
            viewport.height,
            self.host.surface(),
            &mut self.rng,
        );
        self.last_report = Some(report);

        self.pending_frame = self.host.request_frame();
        Some(report)
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.state.is_mounted() {
            self.scene.pointer_move(x, y);
        }
    }

    pub fn on_pointer_leave(&mut self) {
        if self.state.is_mounted() {
            self.scene.pointer_leave();
        }
    }

    pub fn on_scroll(&mut self, scroll_y: f32) {
        if self.state.is_mounted() {
            self.scene.scroll(scroll_y);
        }
    }

    /// Restart the debounce window.
    pub fn on_resize(&mut self) {
        if !self.state.is_mounted() {
            return;
        }
        if let Some(timer) = self.resize_timer.take() {
            self.host.clear_timer(timer);
        }
        self.resize_timer = self.host.start_timer(RESIZE_DEBOUNCE_MS);
    }

    /// Debounce expired: cancel the in-flight frame, resize, reschedule.
    pub fn on_resize_settled(&mut self) {
        if !self.state.is_mounted() || self.resize_timer.take().is_none() {
            return;
        }
        if let Some(frame) = self.pending_frame.take() {
            self.host.cancel_frame(frame);
        }
        let viewport = self.host.viewport();
        self.host.resize_surface(&viewport);
        self.pending_frame = self.host.request_frame();
        debug!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio(),
            "Surface resized"
        );
    }

    /// Stop the loop and release every subscription. Idempotent.
    pub fn unmount(&mut self) {
        if !self.state.is_mounted() {
            return;
        }
        if let Some(frame) = self.pending_frame.take() {
            self.host.cancel_frame(frame);
        }
        if let Some(timer) = self.resize_timer.take() {
            self.host.clear_timer(timer);
        }
        self.host.unlisten();
        self.state = MountState::Unmounted;
        info!(frames = self.scene.frame_count(), "Backdrop unmounted");
    }
}

impl<H: Host, R: RandomSource> Drop for FrameDriver<H, R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped() {
        assert_eq!(Viewport::new(100.0, 100.0, 3.0).pixel_ratio(), 2.0);
        assert_eq!(Viewport::new(100.0, 100.0, 1.5).pixel_ratio(), 1.5);
        assert_eq!(Viewport::new(100.0, 100.0, 0.0).pixel_ratio(), 1.0);
        assert_eq!(Viewport::new(100.0, 100.0, f32::NAN).pixel_ratio(), 1.0);
    }

    #[test]
    fn backing_size_scales_with_ratio() {
        assert_eq!(Viewport::new(1920.0, 1080.0, 2.0).backing_size(), (3840, 2160));
        assert_eq!(Viewport::new(800.0, 600.0, 4.0).backing_size(), (1600, 1200));
        assert_eq!(Viewport::new(-5.0, 10.0, 1.0).backing_size(), (0, 10));
    }
}
