use std::path::{Path, PathBuf};

use egui::Color32;

use crate::components::history::DEFAULT_HISTORY_LIMIT;
use crate::components::tools::{
    BRUSH_MAX_SIZE, BrushShape, default_palette, parse_hex_color, to_hex,
};

pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.1;

// ============================================================================
// EDITOR SETTINGS — read from key=value lines
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Snapshots kept by the history log (minimum 1).
    pub history_limit: usize,
    /// Upper bound for the brush size slider.
    pub brush_max_size: u32,
    pub default_color: Color32,
    pub default_size: u32,
    pub default_opacity: f32,
    pub default_shape: BrushShape,
    pub palette: Vec<Color32>,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    /// Preferred GPU adapter for the preview ("high performance" / "low power").
    pub preferred_gpu: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            brush_max_size: BRUSH_MAX_SIZE,
            default_color: Color32::from_rgb(255, 0, 0),
            default_size: 1,
            default_opacity: 1.0,
            default_shape: BrushShape::Square,
            palette: default_palette(),
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            zoom_step: ZOOM_STEP,
            preferred_gpu: "high performance".to_string(),
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/hyskin/hyskin_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\HySkin\hyskin_settings.cfg
    /// On macOS:   ~/Library/Application Support/HySkin/hyskin_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("hyskin").join("hyskin_settings.cfg"))
        }
        #[cfg(not(target_os = "linux"))]
        {
            Some(crate::logger::data_dir().join("HySkin").join("hyskin_settings.cfg"))
        }
    }

    /// Load from the default location (defaults if missing).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path` (returns default if file missing or corrupt).
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse `key=value` lines.  Unknown keys and bad values keep defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "history_limit" => {
                    s.history_limit = val.parse().unwrap_or(DEFAULT_HISTORY_LIMIT).max(1);
                }
                "brush_max_size" => {
                    s.brush_max_size = val.parse().unwrap_or(BRUSH_MAX_SIZE).clamp(1, BRUSH_MAX_SIZE);
                }
                "default_color" => {
                    if let Some(c) = parse_hex_color(val) {
                        s.default_color = c;
                    }
                }
                "default_size" => {
                    s.default_size = val.parse().unwrap_or(1);
                }
                "default_opacity" => {
                    if let Ok(o) = val.parse::<f32>()
                        && o.is_finite()
                    {
                        s.default_opacity = o.clamp(0.0, 1.0);
                    }
                }
                "default_shape" => {
                    s.default_shape = BrushShape::from_name(val).unwrap_or_default();
                }
                "palette" => {
                    let colors: Vec<Color32> = val.split(',').filter_map(parse_hex_color).collect();
                    if !colors.is_empty() {
                        s.palette = colors;
                    }
                }
                "zoom_min" => s.zoom_min = val.parse().unwrap_or(ZOOM_MIN),
                "zoom_max" => s.zoom_max = val.parse().unwrap_or(ZOOM_MAX),
                "zoom_step" => s.zoom_step = val.parse().unwrap_or(ZOOM_STEP),
                "preferred_gpu" => s.preferred_gpu = val.to_string(),
                _ => {}
            }
        }

        if !(s.zoom_min > 0.0 && s.zoom_min <= s.zoom_max) {
            s.zoom_min = ZOOM_MIN;
            s.zoom_max = ZOOM_MAX;
        }
        if !(s.zoom_step > 0.0) {
            s.zoom_step = ZOOM_STEP;
        }
        s.default_size = s.default_size.clamp(1, s.brush_max_size);
        s
    }

    pub fn to_config_string(&self) -> String {
        let palette: Vec<String> = self.palette.iter().map(|c| to_hex(*c)).collect();
        format!(
            "history_limit={}\n\
             brush_max_size={}\n\
             default_color={}\n\
             default_size={}\n\
             default_opacity={}\n\
             default_shape={}\n\
             palette={}\n\
             zoom_min={}\n\
             zoom_max={}\n\
             zoom_step={}\n\
             preferred_gpu={}\n",
            self.history_limit,
            self.brush_max_size,
            to_hex(self.default_color),
            self.default_size,
            self.default_opacity,
            self.default_shape.label().to_ascii_lowercase(),
            palette.join(","),
            self.zoom_min,
            self.zoom_max,
            self.zoom_step,
            self.preferred_gpu,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(EditorSettings::parse(""), EditorSettings::default());
    }

    #[test]
    fn test_defaults_match_editor_start_state() {
        let s = EditorSettings::default();
        assert_eq!(s.history_limit, 20);
        assert_eq!(s.brush_max_size, 32);
        assert_eq!(to_hex(s.default_color), "#ff0000");
        assert_eq!(s.palette, default_palette());
        assert_eq!((s.zoom_min, s.zoom_max, s.zoom_step), (0.5, 4.0, 0.1));
    }

    #[test]
    fn test_parse_overrides_and_ignores_garbage() {
        let s = EditorSettings::parse(
            "history_limit=5\n\
             default_color=#3b82f6\n\
             default_shape=spray\n\
             default_opacity=7\n\
             palette=#000000, #ffffff, nope\n\
             bogus line\n\
             unknown_key=1\n",
        );
        assert_eq!(s.history_limit, 5);
        assert_eq!(to_hex(s.default_color), "#3b82f6");
        assert_eq!(s.default_shape, BrushShape::Spray);
        assert_eq!(s.default_opacity, 1.0);
        assert_eq!(s.palette.len(), 2);
    }

    #[test]
    fn test_history_limit_has_floor_of_one() {
        assert_eq!(EditorSettings::parse("history_limit=0").history_limit, 1);
        assert_eq!(EditorSettings::parse("history_limit=abc").history_limit, 20);
    }

    #[test]
    fn test_bad_zoom_bounds_fall_back() {
        let s = EditorSettings::parse("zoom_min=5\nzoom_max=1\nzoom_step=-1");
        assert_eq!((s.zoom_min, s.zoom_max, s.zoom_step), (ZOOM_MIN, ZOOM_MAX, ZOOM_STEP));
    }

    #[test]
    fn test_config_string_parses_back() {
        let mut s = EditorSettings::default();
        s.history_limit = 7;
        s.default_shape = BrushShape::Circle;
        s.default_size = 4;
        assert_eq!(EditorSettings::parse(&s.to_config_string()), s);
    }

    #[test]
    fn test_load_from_written_file() {
        let dir = std::env::temp_dir().join(format!("hyskin_settings_{}", uuid::Uuid::new_v4()));
        let path = dir.join("hyskin_settings.cfg");
        let mut s = EditorSettings::default();
        s.preferred_gpu = "low power".into();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, s.to_config_string()).unwrap();
        assert_eq!(EditorSettings::load_from(&path), s);
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(EditorSettings::load_from(&path), EditorSettings::default());
    }
}
