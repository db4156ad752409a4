//! Black background, white ink.
//!
//! Every dot and line is drawn in `INK`; only the alpha varies.

/// RGB triples shared by all hosts
pub mod colors {
    pub const BACKGROUND: [u8; 3] = [0, 0, 0];
    pub const INK: [u8; 3] = [255, 255, 255];
}

/// Alpha in `[0, 1]` to a byte, clamped.
pub fn alpha_byte(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// CSS `rgba()` string in the ink colour.
pub fn ink_css(alpha: f32) -> String {
    let [r, g, b] = colors::INK;
    format!("rgba({}, {}, {}, {:.3})", r, g, b, alpha.clamp(0.0, 1.0))
}

#[cfg(feature = "native")]
pub fn ink(alpha: f32) -> egui::Color32 {
    let [r, g, b] = colors::INK;
    egui::Color32::from_rgba_unmultiplied(r, g, b, alpha_byte(alpha))
}

/// Dark egui visuals with a pure black panel, for the preview window
#[cfg(feature = "native")]
pub fn backdrop_visuals() -> egui::Visuals {
    let [r, g, b] = colors::BACKGROUND;
    let background = egui::Color32::from_rgb(r, g, b);

    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = background;
    visuals.window_fill = egui::Color32::from_rgba_unmultiplied(12, 12, 12, 220);
    visuals.extreme_bg_color = background;
    visuals.override_text_color = Some(egui::Color32::from_rgb(160, 160, 160));
    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;
    visuals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(alpha_byte(-1.0), 0);
        assert_eq!(alpha_byte(0.5), 128);
        assert_eq!(alpha_byte(2.0), 255);
    }

    #[test]
    fn css_color_is_white_rgba() {
        assert_eq!(ink_css(0.25), "rgba(255, 255, 255, 0.250)");
    }
}
