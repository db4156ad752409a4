//! Platform-agnostic core - shared between the web host, the native preview and the CLI

pub mod ambient;
pub mod driver;
pub mod grid;
pub mod headless;
pub mod lines;
pub mod profile;
pub mod random;
pub mod scene;
pub mod surface;

pub use driver::{FrameDriver, Host, Viewport, RESIZE_DEBOUNCE_MS};
pub use grid::{GridField, GridKey, Point};
pub use headless::HeadlessHost;
pub use lines::{Line, LineSet, LineSource, LineState, LineStyle};
pub use profile::Profile;
pub use random::{RandomSource, RngSource};
pub use scene::{FrameReport, Scene};
pub use surface::{DrawList, Surface};
