use foundation::color::Hex;
use serde::Serialize;

/// Paint for one cluster of a k-means layer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    pub visible: bool,
    pub color: Hex,
    pub fill_opacity: f32,
}

impl LayerStyle {
    pub const SHOWN_OPACITY: f32 = 0.7;

    pub const fn new(visible: bool, color: Hex, fill_opacity: f32) -> Self {
        Self {
            visible,
            color,
            fill_opacity,
        }
    }

    pub const fn shown(color: Hex) -> Self {
        Self::new(true, color, Self::SHOWN_OPACITY)
    }

    /// Unchecked clusters keep their color so re-checking restores them as-is.
    pub const fn hidden(color: Hex) -> Self {
        Self::new(false, color, 0.0)
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::shown(Hex::rgb(0xff, 0xff, 0xff))
    }
}

/// Outline weights for parent layers.
pub const THIN_LINE_WEIGHT: f32 = 0.5;
pub const THICK_LINE_WEIGHT: f32 = 3.0;
