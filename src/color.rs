use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use getaround_insights::chart::HistogramSpec;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// `n` distinct colours on evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: group label → Color32
// ---------------------------------------------------------------------------

/// Colours for the groups of one histogram, e.g. `checkin_type` values.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    opacity: f32,
}

impl ColorMap {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>, opacity: f32) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let mapping = labels
            .iter()
            .zip(generate_palette(labels.len()))
            .map(|(label, c)| (label.to_string(), c))
            .collect();
        ColorMap {
            mapping,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    pub fn for_histogram(spec: &HistogramSpec) -> Self {
        ColorMap::new(spec.series.iter().map(|s| s.name.as_str()), spec.opacity)
    }

    /// Bar fill for a group; unknown labels fall back to gray.
    pub fn color_for(&self, label: &str) -> Color32 {
        let base = self.mapping.get(label).copied().unwrap_or(Color32::GRAY);
        base.gamma_multiply(self.opacity)
    }
}
