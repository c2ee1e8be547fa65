use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Hue step between consecutive colours; keeps neighbours apart however many
/// colours are drawn.
const GOLDEN_ANGLE: f32 = 137.508;

/// `i`-th colour of an open-ended sequence of distinct hues.
pub fn series_color(i: usize) -> Color32 {
    let hue = (i as f32 * GOLDEN_ANGLE) % 360.0;
    let rgb: Srgb = Hsl::new(hue, 0.65, 0.55).into_color();
    let rgb = rgb.into_format::<u8>();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Fixed colour per brand so a brand looks the same on every page.
#[derive(Debug, Clone, Default)]
pub struct BrandColors {
    mapping: HashMap<String, Color32>,
}

impl BrandColors {
    /// `brands` in first-seen order; order decides the colour.
    pub fn new(brands: &[String]) -> Self {
        let mapping = brands
            .iter()
            .enumerate()
            .map(|(i, b)| (b.clone(), series_color(i)))
            .collect();
        Self { mapping }
    }

    pub fn color_for(&self, brand: &str) -> Color32 {
        self.mapping.get(brand).copied().unwrap_or(Color32::GRAY)
    }
}
