//! Responsive tuning profiles, selected by viewport width.

use serde::Serialize;

pub const MOBILE_BREAKPOINT: f32 = 640.0;
pub const TABLET_BREAKPOINT: f32 = 1024.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Mobile,
    Tablet,
    Desktop,
}

/// Fixed tuning bundle for one width bucket.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Profile {
    pub kind: ProfileKind,
    /// Grid spacing in CSS pixels
    pub spacing: f32,
    /// Pointer influence radius in CSS pixels
    pub influence: f32,
    /// Base dot radius
    pub radius: f32,
    /// Maximum pointer-triggered lines per batch
    pub pointer_lines: usize,
    /// Ambient lines per spawn tick
    pub ambient_burst: usize,
    /// Ambient population cap
    pub ambient_total: usize,
}

pub const MOBILE: Profile = Profile {
    kind: ProfileKind::Mobile,
    spacing: 42.0,
    influence: 170.0,
    radius: 1.1,
    pointer_lines: 8,
    ambient_burst: 2,
    ambient_total: 8,
};

pub const TABLET: Profile = Profile {
    kind: ProfileKind::Tablet,
    spacing: 52.0,
    influence: 200.0,
    radius: 1.25,
    pointer_lines: 12,
    ambient_burst: 2,
    ambient_total: 10,
};

pub const DESKTOP: Profile = Profile {
    kind: ProfileKind::Desktop,
    spacing: 60.0,
    influence: 220.0,
    radius: 1.4,
    pointer_lines: 18,
    ambient_burst: 3,
    ambient_total: 12,
};

/// Pick the profile for a viewport width. Pure lookup, no allocation.
pub fn for_width(width: f32) -> &'static Profile {
    if width <= MOBILE_BREAKPOINT {
        &MOBILE
    } else if width <= TABLET_BREAKPOINT {
        &TABLET
    } else {
        &DESKTOP
    }
}
