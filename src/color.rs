use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsv, IntoColor, Srgb};

use crate::data::model::INVALID_EMITTER_ID;

/// Colour for emitter cells that are not integers.
pub const INVALID_COLOR: Color32 = Color32::from_rgb(255, 0, 0);

/// Colour for every other negative id (noise, unknown).
pub const UNAVAILABLE_COLOR: Color32 = Color32::from_rgb(128, 128, 128);

/// Fallback for points whose id has no entry in the colour map.
pub const NEUTRAL_COLOR: Color32 = Color32::from_rgb(160, 160, 164);

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Divide the HSV value of `color` by `factor`.
fn darker(color: Color32, factor: f32) -> Color32 {
    let rgb = Srgb::new(
        color.r() as f32 / 255.0,
        color.g() as f32 / 255.0,
        color.b() as f32 / 255.0,
    );
    let mut hsv: Hsv = rgb.into_color();
    hsv.value /= factor;
    let rgb: Srgb = hsv.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

/// The fixed, ordered palette cycled through for non-negative ids.
pub fn default_palette() -> Vec<Color32> {
    vec![
        darker(Color32::from_rgb(0, 255, 0), 1.2),
        Color32::from_rgb(0, 0, 255),
        darker(Color32::from_rgb(0, 255, 255), 1.5),
        Color32::from_rgb(255, 0, 255),
        darker(Color32::from_rgb(255, 255, 0), 1.5),
        Color32::from_rgb(0, 0, 128),
        Color32::from_rgb(0, 128, 0),
        Color32::from_rgb(0, 128, 128),
        Color32::from_rgb(128, 0, 128),
        Color32::from_rgb(128, 128, 0),
        Color32::from_rgb(160, 160, 164),
        Color32::from_rgb(0xFF, 0x57, 0x33),
        Color32::from_rgb(0x33, 0xFF, 0xBD),
        Color32::from_rgb(0xA2, 0x33, 0xFF),
        Color32::from_rgb(0xFF, 0xC3, 0x00),
    ]
}

// ---------------------------------------------------------------------------
// Emitter colour registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub id: i64,
    pub label: String,
    pub color: Color32,
}

/// Stable emitter id → colour assignment plus label lookup.
///
/// Non-negative ids get palette colours lazily, in the order they are first
/// requested; the same sequence of requests always yields the same mapping.
#[derive(Debug, Clone)]
pub struct EmitterColorRegistry {
    palette: Vec<Color32>,
    assigned: BTreeMap<i64, Color32>,
    next_index: usize,
    labels: BTreeMap<i64, String>,
}

impl EmitterColorRegistry {
    pub fn new(labels: BTreeMap<i64, String>) -> Self {
        Self::with_palette(default_palette(), labels)
    }

    pub fn with_palette(palette: Vec<Color32>, labels: BTreeMap<i64, String>) -> Self {
        Self {
            palette,
            assigned: BTreeMap::new(),
            next_index: 0,
            labels,
        }
    }

    pub fn color_for(&mut self, id: i64) -> Color32 {
        if id == INVALID_EMITTER_ID {
            return INVALID_COLOR;
        }
        if id < 0 {
            return UNAVAILABLE_COLOR;
        }
        if let Some(color) = self.assigned.get(&id) {
            return *color;
        }
        if self.palette.is_empty() {
            return Color32::BLACK;
        }
        let color = self.palette[self.next_index % self.palette.len()];
        self.next_index += 1;
        self.assigned.insert(id, color);
        color
    }

    pub fn label_for(&self, id: i64) -> String {
        if id == INVALID_EMITTER_ID {
            return "Invalid Emitter ID".to_string();
        }
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Emitter {id}"))
    }

    /// Forget all assigned colours.  Reference labels are kept.
    pub fn reset(&mut self) {
        self.assigned.clear();
        self.next_index = 0;
    }

    /// Resolve a colour for every id, including the fixed colours of
    /// negative ids, for handing to the renderer.
    pub fn color_map<I>(&mut self, ids: I) -> BTreeMap<i64, Color32>
    where
        I: IntoIterator<Item = i64>,
    {
        ids.into_iter().map(|id| (id, self.color_for(id))).collect()
    }

    /// Legend rows for the given ids, sorted by id.
    pub fn legend_entries<I>(&mut self, ids: I) -> Vec<LegendEntry>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .map(|id| LegendEntry {
                id,
                label: self.label_for(id),
                color: self.color_for(id),
            })
            .collect()
    }
}
