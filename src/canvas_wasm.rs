//! WASM host: HTML canvas 2D surface, requestAnimationFrame loop, DOM listeners
//!
//! The driver lives in `Rc<RefCell<_>>`; every JS callback holds a `Weak`
//! and does nothing once the backdrop is gone.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::rngs::StdRng;
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent, Window,
};

use crate::core::driver::{FrameDriver, FrameHandle, Host, TimerHandle, Viewport};
use crate::core::random::RngSource;
use crate::core::surface::{Dot, Segment, Surface};
use crate::theme::{colors, ink_css};
use crate::time::now_millis;

/// Canvas element id used when neither the caller nor `window.__backdrop_canvas` names one
pub const DEFAULT_CANVAS_ID: &str = "backdrop";

type WebDriver = FrameDriver<WebHost, RngSource<StdRng>>;

// ============================================================================
// CanvasSurface - CanvasRenderingContext2d as a Surface
// ============================================================================

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl Surface for CanvasSurface {
    fn clear(&mut self, width: f32, height: f32) {
        self.ctx.clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    fn fill_dot(&mut self, dot: &Dot) {
        let ctx = &self.ctx;
        ctx.begin_path();
        ctx.set_fill_style_str(&ink_css(dot.alpha));
        if ctx
            .arc(
                dot.center[0] as f64,
                dot.center[1] as f64,
                dot.radius.max(0.0) as f64,
                0.0,
                std::f64::consts::TAU,
            )
            .is_ok()
        {
            ctx.fill();
        }
    }

    fn stroke_segment(&mut self, segment: &Segment) {
        let ctx = &self.ctx;
        let dash = js_sys::Array::new();
        if let Some([on, off]) = segment.dash {
            dash.push(&JsValue::from_f64(on as f64));
            dash.push(&JsValue::from_f64(off as f64));
        }

        ctx.save();
        ctx.set_line_width(segment.width as f64);
        ctx.set_stroke_style_str(&ink_css(segment.alpha));
        if let Err(e) = ctx.set_line_dash(&dash) {
            error!(?e, "Failed to set line dash");
        }
        ctx.set_line_dash_offset(segment.dash_offset as f64);
        ctx.begin_path();
        ctx.move_to(segment.from[0] as f64, segment.from[1] as f64);
        ctx.line_to(segment.to[0] as f64, segment.to[1] as f64);
        ctx.stroke();
        ctx.restore();
    }
}

// ============================================================================
// WebHost - browser services for the frame driver
// ============================================================================

struct Callbacks {
    frame: Closure<dyn FnMut(f64)>,
    pointer_move: Closure<dyn FnMut(PointerEvent)>,
    pointer_leave: Closure<dyn FnMut()>,
    scroll: Closure<dyn FnMut()>,
    resize: Closure<dyn FnMut()>,
    resize_settled: Closure<dyn FnMut()>,
}

impl Callbacks {
    fn new(window: &Window, driver: &Weak<RefCell<WebDriver>>) -> Self {
        let weak = driver.clone();
        let frame = Closure::wrap(Box::new(move |timestamp: f64| {
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_frame(timestamp);
            }
        }) as Box<dyn FnMut(f64)>);

        let weak = driver.clone();
        let pointer_move = Closure::wrap(Box::new(move |e: PointerEvent| {
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_pointer_move(e.client_x() as f32, e.client_y() as f32);
            }
        }) as Box<dyn FnMut(PointerEvent)>);

        let weak = driver.clone();
        let pointer_leave = Closure::wrap(Box::new(move || {
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_pointer_leave();
            }
        }) as Box<dyn FnMut()>);

        let weak = driver.clone();
        let window_clone = window.clone();
        let scroll = Closure::wrap(Box::new(move || {
            let scroll_y = window_clone.scroll_y().unwrap_or(0.0);
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_scroll(scroll_y as f32);
            }
        }) as Box<dyn FnMut()>);

        let weak = driver.clone();
        let resize = Closure::wrap(Box::new(move || {
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_resize();
            }
        }) as Box<dyn FnMut()>);

        let weak = driver.clone();
        let resize_settled = Closure::wrap(Box::new(move || {
            if let Some(driver) = weak.upgrade() {
                driver.borrow_mut().on_resize_settled();
            }
        }) as Box<dyn FnMut()>);

        Self {
            frame,
            pointer_move,
            pointer_leave,
            scroll,
            resize,
            resize_settled,
        }
    }

    /// `(event, listener, passive)` for every DOM subscription
    fn listeners(&self) -> [(&'static str, &js_sys::Function, bool); 4] {
        [
            ("pointermove", self.pointer_move.as_ref().unchecked_ref(), false),
            ("pointerleave", self.pointer_leave.as_ref().unchecked_ref(), false),
            ("scroll", self.scroll.as_ref().unchecked_ref(), true),
            ("resize", self.resize.as_ref().unchecked_ref(), false),
        ]
    }
}

pub struct WebHost {
    window: Window,
    canvas: HtmlCanvasElement,
    surface: CanvasSurface,
    callbacks: Callbacks,
}

impl WebHost {
    fn dimension(value: Result<JsValue, JsValue>) -> f32 {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
    }
}

impl Host for WebHost {
    type Surface = CanvasSurface;

    fn now_ms(&self) -> f64 {
        now_millis()
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(
            Self::dimension(self.window.inner_width()),
            Self::dimension(self.window.inner_height()),
            self.window.device_pixel_ratio() as f32,
        )
    }

    fn surface(&mut self) -> &mut CanvasSurface {
        &mut self.surface
    }

    fn resize_surface(&mut self, viewport: &Viewport) {
        let (width, height) = viewport.backing_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", viewport.width));
        let _ = style.set_property("height", &format!("{}px", viewport.height));

        let ratio = viewport.pixel_ratio() as f64;
        if let Err(e) = self.surface.ctx.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0) {
            error!(?e, "Failed to set canvas transform");
        }
    }

    fn request_frame(&mut self) -> Option<FrameHandle> {
        self.window
            .request_animation_frame(self.callbacks.frame.as_ref().unchecked_ref())
            .map(FrameHandle)
            .map_err(|e| error!(?e, "Failed to request animation frame"))
            .ok()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            error!(?e, "Failed to cancel animation frame");
        }
    }

    fn start_timer(&mut self, delay_ms: u32) -> Option<TimerHandle> {
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                self.callbacks.resize_settled.as_ref().unchecked_ref(),
                delay_ms as i32,
            )
            .map(TimerHandle)
            .map_err(|e| error!(?e, "Failed to start resize timer"))
            .ok()
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        self.window.clear_timeout_with_handle(handle.0);
    }

    fn listen(&mut self) {
        let passive = AddEventListenerOptions::new();
        passive.set_passive(true);

        for (event, listener, is_passive) in self.callbacks.listeners() {
            let result = if is_passive {
                self.window
                    .add_event_listener_with_callback_and_add_event_listener_options(event, listener, &passive)
            } else {
                self.window.add_event_listener_with_callback(event, listener)
            };
            if let Err(e) = result {
                error!(event, ?e, "Failed to add event listener");
            }
        }
    }

    fn unlisten(&mut self) {
        for (event, listener, _) in self.callbacks.listeners() {
            if let Err(e) = self.window.remove_event_listener_with_callback(event, listener) {
                error!(event, ?e, "Failed to remove event listener");
            }
        }
    }
}

// ============================================================================
// Mount / unmount
// ============================================================================

/// Live backdrop. Dropping the handle (or calling `unmount`) stops it.
#[wasm_bindgen]
pub struct BackdropHandle {
    driver: Rc<RefCell<WebDriver>>,
}

#[wasm_bindgen]
impl BackdropHandle {
    /// Cancel the frame loop, remove listeners and clear the resize timer.
    pub fn unmount(&self) {
        self.driver.borrow_mut().unmount();
    }
}

/// Full-viewport, behind-content, pointer-transparent styling.
fn style_canvas(canvas: &HtmlCanvasElement) {
    let [r, g, b] = colors::BACKGROUND;
    let style = canvas.style();
    for (name, value) in [
        ("position", "fixed".to_string()),
        ("inset", "0".to_string()),
        ("z-index", "-10".to_string()),
        ("pointer-events", "none".to_string()),
        ("background", format!("rgb({}, {}, {})", r, g, b)),
    ] {
        if let Err(e) = style.set_property(name, &value) {
            warn!(name, ?e, "Failed to style canvas");
        }
    }
    let _ = canvas.set_attribute("aria-hidden", "true");
}

fn configured_canvas_id(window: &Window) -> String {
    js_sys::Reflect::get(window, &JsValue::from_str("__backdrop_canvas"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| DEFAULT_CANVAS_ID.to_string())
}

/// Mount the backdrop on a canvas element.
///
/// Returns `None` without subscribing to anything when the canvas or its 2D
/// context is unavailable.
#[wasm_bindgen(js_name = mountBackdrop)]
pub fn mount_backdrop(canvas_id: Option<String>) -> Option<BackdropHandle> {
    let window = web_sys::window()?;
    let id = canvas_id.unwrap_or_else(|| configured_canvas_id(&window));

    let Some(canvas) = window
        .document()
        .and_then(|d| d.get_element_by_id(&id))
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    else {
        warn!(id = %id, "No canvas element, backdrop not mounted");
        return None;
    };

    let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        warn!(id = %id, "No 2D context, backdrop not mounted");
        return None;
    };

    style_canvas(&canvas);

    let driver = Rc::new_cyclic(|weak: &Weak<RefCell<WebDriver>>| {
        let host = WebHost {
            callbacks: Callbacks::new(&window, weak),
            window: window.clone(),
            canvas,
            surface: CanvasSurface { ctx },
        };
        RefCell::new(FrameDriver::mount(host, RngSource::from_entropy()))
    });

    info!(id = %id, "Backdrop attached to canvas");
    Some(BackdropHandle { driver })
}
