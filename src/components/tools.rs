use egui::Color32;
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Largest brush footprint, in pixels.
pub const BRUSH_MAX_SIZE: u32 = 32;

/// Swatches offered on start.
pub const DEFAULT_PALETTE: [&str; 6] = [
    "#000000", "#ffffff", "#ef4444", "#3b82f6", "#8d5524", "#e0ac69",
];

// ============================================================================
// TOOL
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
    Picker,
    Select,
    Move,
    Zoom,
    #[serde(rename = "hand")]
    Pan,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Fill => "Fill",
            Tool::Picker => "Color Picker",
            Tool::Select => "Select",
            Tool::Move => "Move",
            Tool::Zoom => "Zoom",
            Tool::Pan => "Hand",
        }
    }

    /// Single-key shortcut (case-insensitive).  Space maps to the hand tool;
    /// the session treats it as a hold-to-pan override.
    pub fn from_shortcut(key: &str) -> Option<Tool> {
        match key.to_ascii_lowercase().as_str() {
            "b" => Some(Tool::Brush),
            "e" => Some(Tool::Eraser),
            "f" => Some(Tool::Fill),
            "p" => Some(Tool::Picker),
            "m" => Some(Tool::Select),
            "v" => Some(Tool::Move),
            "z" => Some(Tool::Zoom),
            " " | "space" => Some(Tool::Pan),
            _ => None,
        }
    }

    /// Tools that write pixels through the paint engine.
    pub fn is_paint_tool(&self) -> bool {
        matches!(self, Tool::Brush | Tool::Eraser | Tool::Fill | Tool::Picker)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushShape {
    #[default]
    Square,
    Circle,
    Spray,
}

impl BrushShape {
    pub fn label(&self) -> &'static str {
        match self {
            BrushShape::Square => "Square",
            BrushShape::Circle => "Circle",
            BrushShape::Spray => "Spray",
        }
    }

    pub fn from_name(name: &str) -> Option<BrushShape> {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" => Some(BrushShape::Square),
            "circle" => Some(BrushShape::Circle),
            "spray" => Some(BrushShape::Spray),
            _ => None,
        }
    }
}

// ============================================================================
// TOOL CONFIG - one immutable value per paint call
// ============================================================================

/// Everything the paint engine needs to know about the current tool.
/// The session owns the only mutable copy and hands out clones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolConfig {
    pub tool: Tool,
    /// Always opaque; opacity is carried separately.
    pub color: Color32,
    /// Footprint side in pixels, 1..=BRUSH_MAX_SIZE.
    pub size: u32,
    /// 0.0..=1.0
    pub opacity: f32,
    pub shape: BrushShape,
    pub mirror: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            color: Color32::from_rgb(255, 0, 0),
            size: 1,
            opacity: 1.0,
            shape: BrushShape::Square,
            mirror: false,
        }
    }
}

impl ToolConfig {
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_color(mut self, color: Color32) -> Self {
        self.color = opaque(color);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.clamp(1, BRUSH_MAX_SIZE);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self
    }

    pub fn with_shape(mut self, shape: BrushShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Current color as an image pixel.
    pub fn rgba(&self) -> Rgba<u8> {
        Rgba([self.color.r(), self.color.g(), self.color.b(), 255])
    }
}

fn opaque(color: Color32) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgb(r, g, b)
}

// ============================================================================
// HEX COLORS
// ============================================================================

/// Parse `#rrggbb`, `rrggbb` or `#rgb` into an opaque color.
pub fn parse_hex_color(text: &str) -> Option<Color32> {
    let hex = text.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let val = u32::from_str_radix(hex, 16).ok()?;
            Some(Color32::from_rgb(
                ((val >> 16) & 0xFF) as u8,
                ((val >> 8) & 0xFF) as u8,
                (val & 0xFF) as u8,
            ))
        }
        3 => {
            let val = u16::from_str_radix(hex, 16).ok()?;
            let expand = |n: u16| (n as u8 & 0xF) * 17;
            Some(Color32::from_rgb(expand(val >> 8), expand(val >> 4), expand(val)))
        }
        _ => None,
    }
}

/// Lower-case `#rrggbb`.
pub fn to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Opaque color from an image pixel, alpha dropped.
pub fn color_from_rgba(px: Rgba<u8>) -> Color32 {
    Color32::from_rgb(px[0], px[1], px[2])
}

/// Parsed default swatches.
pub fn default_palette() -> Vec<Color32> {
    DEFAULT_PALETTE.iter().filter_map(|h| parse_hex_color(h)).collect()
}
