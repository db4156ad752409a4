//! Shared mount state
//!
//! Used by the frame driver on every host (web, headless).

/// Lifecycle of one mounted backdrop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountState {
    Mounted,
    Unmounted,
}

impl MountState {
    pub fn is_mounted(&self) -> bool {
        matches!(self, MountState::Mounted)
    }
}
