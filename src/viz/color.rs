use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.65, 0.5).into_color();
            let [r, g, b] = [rgb.red, rgb.green, rgb.blue].map(|c| (c * 255.0).round() as u8);
            Color32::from_rgb(r, g, b)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Layer colours
// ---------------------------------------------------------------------------

/// One colour per layout layer; the node markers of a layer share it.
#[derive(Debug, Clone, Default)]
pub struct LayerColors {
    colors: Vec<Color32>,
}

impl LayerColors {
    pub fn new(n_layers: usize) -> Self {
        Self {
            colors: generate_palette(n_layers),
        }
    }

    pub fn color_for(&self, layer: usize) -> Color32 {
        self.colors.get(layer).copied().unwrap_or(Color32::GRAY)
    }

    /// Legend entries (`layer k` -> colour) for the side panel.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.colors
            .iter()
            .enumerate()
            .map(|(layer, &c)| (format!("layer {layer}"), c))
            .collect()
    }
}
