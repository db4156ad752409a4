//! Matrix backdrop - animated point grid with pointer-reactive connecting lines
//!
//! The simulation in [`core`] is host-agnostic. Hosts:
//! - `wasm`: HTML canvas, mounted with `mountBackdrop(canvasId)`
//! - `native`: eframe preview window ([`app`])
//! - `cli`: headless run on [`core::HeadlessHost`]

pub mod core;
pub mod mount_state;
pub mod theme;
pub mod time;

#[cfg(feature = "native")]
pub mod app;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod canvas_wasm;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use canvas_wasm::{mount_backdrop, BackdropHandle};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();
}
