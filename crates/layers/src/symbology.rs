use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// sRGB RGBA in `[0, 1]`.
pub type Color = [f32; 4];

pub mod palette {
    use super::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }

    pub const GRAY: Color = rgb(128, 128, 128);
    pub const GREEN: Color = rgb(0, 128, 0);
    pub const LIGHT_GREEN: Color = rgb(0xcc, 0xeb, 0xc5);
    pub const DARK_GREEN: Color = rgb(0, 100, 0);
    pub const ORANGE: Color = rgb(255, 165, 0);
    pub const BLACK: Color = rgb(0, 0, 0);
    pub const DARK_RED: Color = rgb(139, 0, 0);
}

/// `#rrggbb`; alpha is carried separately as opacity.
pub fn color_to_hex(color: Color) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(color[0]),
        channel(color[1]),
        channel(color[2])
    )
}

/// Fill and stroke of one polygon layer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    pub fill_color: Color,
    pub fill_opacity: f32,
    pub stroke_color: Color,
    /// Stroke width in pixels.
    pub stroke_weight: f32,
}

impl StyleSpec {
    pub const fn filled(
        fill_color: Color,
        fill_opacity: f32,
        stroke_color: Color,
        stroke_weight: f32,
    ) -> Self {
        Self {
            fill_color,
            fill_opacity,
            stroke_color,
            stroke_weight,
        }
    }

    /// Stroke only; the fill is fully transparent.
    pub const fn outline(stroke_color: Color, stroke_weight: f32) -> Self {
        Self::filled(stroke_color, 0.0, stroke_color, stroke_weight)
    }

    /// Leaflet-style path options (`fillColor`, `fillOpacity`, `color`, `weight`).
    pub fn to_style_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "fillColor".to_string(),
            Value::String(color_to_hex(self.fill_color)),
        );
        obj.insert("fillOpacity".to_string(), Value::from(self.fill_opacity));
        obj.insert(
            "color".to_string(),
            Value::String(color_to_hex(self.stroke_color)),
        );
        obj.insert("weight".to_string(), Value::from(self.stroke_weight));
        Value::Object(obj)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStyle {
    pub font_size_pt: f32,
    pub color: Color,
}

impl LabelStyle {
    pub const fn new(font_size_pt: f32, color: Color) -> Self {
        Self {
            font_size_pt,
            color,
        }
    }

    pub fn to_style_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("fontSize".to_string(), Value::from(self.font_size_pt));
        obj.insert("color".to_string(), Value::String(color_to_hex(self.color)));
        Value::Object(obj)
    }
}

/// One immutable style per layer role. Layers copy the style they need, so
/// nothing downstream refers back to a shared or mutable style source.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Symbology {
    pub base: StyleSpec,
    pub unselected: StyleSpec,
    pub selected: StyleSpec,
    pub department_outline: StyleSpec,
    pub highlight: StyleSpec,
    pub department_label: LabelStyle,
    pub commune_label: LabelStyle,
}

impl Default for Symbology {
    fn default() -> Self {
        use palette::*;
        Self {
            base: StyleSpec::outline(GRAY, 0.5),
            unselected: StyleSpec::filled(LIGHT_GREEN, 0.5, GREEN, 1.0),
            selected: StyleSpec::filled(ORANGE, 0.7, BLACK, 1.5),
            department_outline: StyleSpec::outline(DARK_GREEN, 2.0),
            highlight: StyleSpec::filled(ORANGE, 0.6, BLACK, 1.0),
            department_label: LabelStyle::new(11.0, DARK_GREEN),
            commune_label: LabelStyle::new(10.0, DARK_RED),
        }
    }
}
