// ============================================================================
// EDITOR SESSION — owns all editing state and routes input to it
// ============================================================================

use std::path::Path;

use egui::{Color32, Modifiers, Pos2, Vec2};
use image::RgbaImage;
use uuid::Uuid;

use crate::canvas::{SurfaceId, TEXTURE_SIZE};
use crate::components::history::HistoryLog;
use crate::components::layers::LayerStack;
use crate::components::tools::{BrushShape, Tool, ToolConfig, to_hex};
use crate::gpu::texture::TextureSink;
use crate::io::{self, AssetError};
use crate::ops::paint::{PaintEngine, StrokeOutcome};
use crate::ops::transform::{SelectionState, SelectionTransform};
use crate::ops::uv_paint::{Camera, UvPaintBridge};
use crate::rig::Rig;
use crate::settings::EditorSettings;

/// Canvas coordinates are clamped to this many pixels either side of the
/// origin before they reach any tool.
pub const POINTER_LIMIT: i32 = TEXTURE_SIZE as i32 * 4;

/// Zoom and pan of the 2D canvas view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub zoom: f32,
    /// Screen-space offset of the canvas origin.
    pub pan: Vec2,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl ViewState {
    /// Screen position to the texture pixel under it, clamped to
    /// `±POINTER_LIMIT`.
    pub fn screen_to_canvas(&self, screen: Pos2) -> (i32, i32) {
        let local = (screen.to_vec2() - self.pan) / self.zoom;
        let limit = POINTER_LIMIT as f32;
        let clamp = |v: f32| {
            if v.is_nan() {
                0
            } else {
                v.floor().clamp(-limit, limit) as i32
            }
        };
        (clamp(local.x), clamp(local.y))
    }
}

/// The owning context: settings, layers, history, tool state and the
/// selection state machine live here, and every input event goes through it.
pub struct EditorSession {
    id: Uuid,
    settings: EditorSettings,
    layers: LayerStack,
    history: HistoryLog,
    tool: ToolConfig,
    selection: SelectionTransform,
    engine: PaintEngine,
    uv_bridge: UvPaintBridge,
    view: ViewState,
    drawing: bool,
    paint_on_3d: bool,
    /// Tool to restore when the temporary hand (space) is released.
    tool_before_hand: Option<Tool>,
    /// (screen position, pan) when a pan drag started.
    pan_anchor: Option<(Pos2, Vec2)>,
}

impl EditorSession {
    pub fn new(settings: EditorSettings, rig: &Rig) -> Self {
        Self::with_engine(settings, rig, PaintEngine::new())
    }

    /// Session whose spray pattern is reproducible.
    pub fn with_seed(settings: EditorSettings, rig: &Rig, seed: u64) -> Self {
        Self::with_engine(settings, rig, PaintEngine::with_seed(seed))
    }

    fn with_engine(settings: EditorSettings, rig: &Rig, engine: PaintEngine) -> Self {
        let layers = LayerStack::with_default_layers(TEXTURE_SIZE, TEXTURE_SIZE);
        let mut history = HistoryLog::new(settings.history_limit);
        history.save(&layers, "Initial state");

        let tool = ToolConfig::default()
            .with_color(settings.default_color)
            .with_size(settings.default_size.min(settings.brush_max_size))
            .with_opacity(settings.default_opacity)
            .with_shape(settings.default_shape);

        let id = Uuid::new_v4();
        log_info!("Session {} started ({} layers, history limit {})", id, layers.len(), history.capacity());

        Self {
            id,
            settings,
            layers,
            history,
            tool,
            selection: SelectionTransform::new(),
            engine,
            uv_bridge: UvPaintBridge::new(rig, Camera::default()),
            view: ViewState::default(),
            drawing: false,
            paint_on_3d: false,
            tool_before_hand: None,
            pan_anchor: None,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn tool_config(&self) -> ToolConfig {
        self.tool
    }

    pub fn tool(&self) -> Tool {
        self.tool.tool
    }

    pub fn selection(&self) -> &SelectionTransform {
        &self.selection
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn paint_on_3d(&self) -> bool {
        self.paint_on_3d
    }

    pub fn composite(&self) -> &RgbaImage {
        self.layers.composite()
    }

    pub fn uv_bridge(&self) -> &UvPaintBridge {
        &self.uv_bridge
    }

    // ========================================================================
    // TOOL STATE
    // ========================================================================

    /// Switch tools.  A pending selection survives only a switch to Move,
    /// the tool that consumes it; any other switch discards it.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != Tool::Move && self.selection.reset() {
            log_warn!("Switching to {} discarded the floating selection", tool.label());
        }
        self.tool = self.tool.with_tool(tool);
        self.tool_before_hand = None;
    }

    pub fn set_color(&mut self, color: Color32) {
        self.tool = self.tool.with_color(color);
    }

    /// Swatches offered next to the color picker.
    pub fn palette(&self) -> &[Color32] {
        &self.settings.palette
    }

    /// Take the brush color from palette slot `index`.  Returns `false` for
    /// an empty slot.
    pub fn select_swatch(&mut self, index: usize) -> bool {
        match self.settings.palette.get(index) {
            Some(&color) => {
                self.set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_size(&mut self, size: u32) {
        self.tool = self.tool.with_size(size.min(self.settings.brush_max_size));
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.tool = self.tool.with_opacity(opacity);
    }

    pub fn set_shape(&mut self, shape: BrushShape) {
        self.tool = self.tool.with_shape(shape);
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.tool = self.tool.with_mirror(mirror);
    }

    pub fn set_paint_on_3d(&mut self, enabled: bool) {
        self.paint_on_3d = enabled;
    }

    // ========================================================================
    // LAYERS
    // ========================================================================

    pub fn add_layer(&mut self, name: &str) -> SurfaceId {
        let id = self.layers.add_layer(name);
        self.layers.recomposite();
        id
    }

    pub fn set_active_layer(&mut self, id: SurfaceId) {
        self.layers.set_active(id);
    }

    pub fn toggle_layer_visibility(&mut self, id: SurfaceId) {
        self.layers.toggle_visibility(id);
    }

    /// Replace the bottom layer with `image` and record it in history.
    pub fn load_base_image(&mut self, image: &RgbaImage) {
        if let Some(bottom) = self.layers.layers().last().map(|l| l.id) {
            self.history.ensure_baseline(&self.layers, bottom);
        }
        if let Some(id) = self.layers.load_base_image(image) {
            self.history.save_surface(&self.layers, id, "Load base image");
        }
    }

    pub fn load_base_image_file(&mut self, path: &Path) -> Result<Option<String>, AssetError> {
        let loaded = io::load_image_file(path)?;
        self.load_base_image(&loaded.image);
        Ok(loaded.warning)
    }

    pub fn export_png(&self, path: &Path) -> Result<(), AssetError> {
        io::export_png(self.layers.composite(), path)
    }

    /// Feed the composite to the renderer if it changed since the last frame.
    pub fn present_texture(&mut self, sink: &mut dyn TextureSink) -> bool {
        self.layers.present_texture(sink)
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    pub fn undo(&mut self) -> Option<String> {
        let label = self.history.undo(&mut self.layers)?;
        log_info!("Undo: {}", label);
        Some(label)
    }

    pub fn redo(&mut self) -> Option<String> {
        let label = self.history.redo(&mut self.layers)?;
        log_info!("Redo: {}", label);
        Some(label)
    }

    // ========================================================================
    // VIEW
    // ========================================================================

    pub fn zoom_by(&mut self, delta: f32) {
        self.view.zoom = (self.view.zoom + delta).clamp(self.settings.zoom_min, self.settings.zoom_max);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.settings.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-self.settings.zoom_step);
    }

    /// Mouse wheel: scrolling up zooms in.
    pub fn scroll(&mut self, delta_y: f32) {
        if delta_y < 0.0 {
            self.zoom_in();
        } else if delta_y > 0.0 {
            self.zoom_out();
        }
    }

    // ========================================================================
    // 2D POINTER
    // ========================================================================

    pub fn pointer_down(&mut self, screen: Pos2, modifiers: Modifiers) {
        let (x, y) = self.view.screen_to_canvas(screen);
        match self.tool.tool {
            Tool::Pan => self.pan_anchor = Some((screen, self.view.pan)),
            Tool::Zoom => {
                if modifiers.alt {
                    self.zoom_out();
                } else {
                    self.zoom_in();
                }
            }
            Tool::Select => self.selection.begin(x, y),
            Tool::Move => {
                self.selection.start_drag(x, y);
            }
            Tool::Brush | Tool::Eraser | Tool::Fill | Tool::Picker => self.begin_stroke(x, y),
        }
    }

    pub fn pointer_move(&mut self, screen: Pos2) {
        if let Some((start, pan)) = self.pan_anchor {
            self.view.pan = pan + (screen - start);
            return;
        }
        let (x, y) = self.view.screen_to_canvas(screen);
        match self.selection.state() {
            SelectionState::DraggingMove { .. } => self.selection.update_drag(x, y),
            SelectionState::DraggingNewRect { .. } => self.selection.update(x, y),
            _ => {
                if self.drawing {
                    self.stroke_at(x, y);
                }
            }
        }
    }

    pub fn pointer_up(&mut self) {
        if self.drawing {
            self.end_stroke();
            return;
        }
        match self.selection.state() {
            SelectionState::DraggingNewRect { .. } => {
                self.ensure_active_baseline();
                self.selection.finalize(&mut self.layers, &mut self.history);
            }
            SelectionState::DraggingMove { .. } => {
                self.ensure_active_baseline();
                self.selection.drop_selection(&mut self.layers, &mut self.history);
            }
            _ => {}
        }
        self.pan_anchor = None;
    }

    // ========================================================================
    // 3D POINTER (paint on the rig)
    // ========================================================================

    /// `ndc` is the pointer in normalized device coordinates of the preview.
    pub fn pointer_down_3d(&mut self, ndc: glam::Vec2) {
        if !self.paint_on_3d || !self.tool.tool.is_paint_tool() {
            return;
        }
        let (w, h) = (self.layers.width(), self.layers.height());
        if let Some((x, y)) = self.uv_bridge.pick_pixel(ndc, w, h) {
            self.begin_stroke(x, y);
        }
    }

    pub fn pointer_move_3d(&mut self, ndc: glam::Vec2) {
        if self.paint_on_3d && self.drawing {
            self.stroke_at_ndc(ndc);
        }
    }

    pub fn pointer_up_3d(&mut self) {
        if self.drawing {
            self.end_stroke();
        }
    }

    fn stroke_at_ndc(&mut self, ndc: glam::Vec2) {
        let (w, h) = (self.layers.width(), self.layers.height());
        if let Some((x, y)) = self.uv_bridge.pick_pixel(ndc, w, h) {
            self.stroke_at(x, y);
        }
    }

    // ========================================================================
    // STROKES
    // ========================================================================

    /// Only brush and eraser strokes stay open until pointer-up; fill and
    /// picker finish on the first dab.
    fn begin_stroke(&mut self, x: i32, y: i32) {
        self.drawing = matches!(self.tool.tool, Tool::Brush | Tool::Eraser);
        if self.tool.tool != Tool::Picker {
            self.ensure_active_baseline();
        }
        self.stroke_at(x, y);
    }

    /// History entries are per surface, so the first edit on a layer needs
    /// that layer's prior state in the log before it can be undone.
    fn ensure_active_baseline(&mut self) {
        if let Some(id) = self.layers.active_id() {
            self.history.ensure_baseline(&self.layers, id);
        }
    }

    fn stroke_at(&mut self, x: i32, y: i32) {
        let config = self.tool;
        let Some((surface, composite)) = self.layers.active_and_composite_mut() else {
            return;
        };
        match self.engine.apply_stroke(surface, x, y, &config, composite) {
            StrokeOutcome::Ignored => {}
            StrokeOutcome::Painted => {
                self.layers.recomposite();
            }
            StrokeOutcome::Filled => {
                self.layers.recomposite();
                self.drawing = false;
                self.history.save(&self.layers, "Fill");
            }
            StrokeOutcome::Picked(color) => {
                log_info!("Picked {}", to_hex(color));
                self.tool = self.tool.with_color(color).with_tool(Tool::Brush);
                self.drawing = false;
            }
        }
    }

    fn end_stroke(&mut self) {
        self.drawing = false;
        let label = match self.tool.tool {
            Tool::Eraser => "Eraser stroke",
            _ => "Brush stroke",
        };
        self.history.save(&self.layers, label);
    }

    // ========================================================================
    // KEYBOARD
    // ========================================================================

    /// Returns `true` when the key did something.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if modifiers.ctrl || modifiers.command {
            match key.to_ascii_lowercase().as_str() {
                "z" => {
                    self.undo();
                }
                "y" => {
                    self.redo();
                }
                "+" | "=" => self.zoom_in(),
                "-" => self.zoom_out(),
                _ => return false,
            }
            return true;
        }

        match Tool::from_shortcut(key) {
            Some(Tool::Pan) => {
                if self.tool.tool != Tool::Pan {
                    self.tool_before_hand = Some(self.tool.tool);
                    self.tool = self.tool.with_tool(Tool::Pan);
                }
                true
            }
            Some(tool) => {
                self.set_tool(tool);
                true
            }
            None => false,
        }
    }

    /// Releasing space restores the tool that was active before it.
    pub fn key_up(&mut self, key: &str) -> bool {
        if !matches!(key, " " | "space") || self.tool.tool != Tool::Pan {
            return false;
        }
        self.pan_anchor = None;
        if let Some(previous) = self.tool_before_hand.take() {
            self.tool = self.tool.with_tool(previous);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{RasterSurface, TRANSPARENT};
    use crate::components::tools::parse_hex_color;
    use image::Rgba;

    fn session() -> EditorSession {
        let rig = Rig::default_rig().unwrap();
        EditorSession::with_seed(EditorSettings::default(), &rig, 1)
    }

    fn click(s: &mut EditorSession, x: f32, y: f32) {
        s.pointer_down(Pos2::new(x, y), Modifiers::NONE);
        s.pointer_up();
    }

    fn drag(s: &mut EditorSession, from: (f32, f32), to: (f32, f32)) {
        s.pointer_down(Pos2::new(from.0, from.1), Modifiers::NONE);
        s.pointer_move(Pos2::new(to.0, to.1));
        s.pointer_up();
    }

    fn active_pixel(s: &EditorSession, x: u32, y: u32) -> Rgba<u8> {
        s.layers().get_active().unwrap().pixel(x, y)
    }

    #[test]
    fn test_starts_with_initial_state_entry() {
        let s = session();
        assert_eq!(s.layers().len(), 3);
        assert_eq!(s.history().labels(), vec!["Initial state"]);
        assert_eq!(s.tool(), Tool::Brush);
    }

    #[test]
    fn test_stroke_commits_once() {
        let mut s = session();
        s.pointer_down(Pos2::new(1.0, 1.0), Modifiers::NONE);
        for x in 2..10 {
            s.pointer_move(Pos2::new(x as f32, 1.0));
        }
        s.pointer_up();
        assert_eq!(s.history().len(), 2);
        assert_eq!(active_pixel(&s, 9, 1), Rgba([255, 0, 0, 255]));
        assert!(!s.is_drawing());
    }

    #[test]
    fn test_move_without_drawing_does_not_paint() {
        let mut s = session();
        s.pointer_move(Pos2::new(5.0, 5.0));
        s.pointer_up();
        assert_eq!(s.history().len(), 1);
        assert!(s.layers().get_active().unwrap().is_blank());
    }

    #[test]
    fn test_fill_commits_immediately() {
        let mut s = session();
        s.set_tool(Tool::Fill);
        s.pointer_down(Pos2::new(3.0, 3.0), Modifiers::NONE);
        assert!(!s.is_drawing());
        s.pointer_up();
        assert_eq!(s.history().labels(), vec!["Initial state", "Fill"]);
    }

    #[test]
    fn test_picker_switches_back_to_brush_without_commit() {
        let mut s = session();
        s.set_color(parse_hex_color("#8d5524").unwrap());
        s.set_size(4);
        click(&mut s, 10.0, 10.0);
        s.set_color(Color32::WHITE);
        s.set_tool(Tool::Picker);
        click(&mut s, 11.0, 11.0);
        assert_eq!(s.tool(), Tool::Brush);
        assert_eq!(to_hex(s.tool_config().color), "#8d5524");
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_tool_switch_discards_selection() {
        let mut s = session();
        s.set_size(4);
        click(&mut s, 0.0, 0.0);
        s.set_tool(Tool::Select);
        drag(&mut s, (0.0, 0.0), (3.0, 3.0));
        assert!(s.selection().floating().is_some());
        assert_eq!(active_pixel(&s, 0, 0), TRANSPARENT);

        s.set_tool(Tool::Brush);
        assert!(s.selection().is_idle());
        assert_eq!(s.history().labels().last().copied(), Some("Cut selection"));
    }

    #[test]
    fn test_move_drops_at_offset() {
        let mut s = session();
        s.set_size(2);
        click(&mut s, 0.0, 0.0);
        s.set_tool(Tool::Select);
        drag(&mut s, (0.0, 0.0), (1.0, 1.0));
        s.set_tool(Tool::Move);
        drag(&mut s, (0.0, 0.0), (10.0, 5.0));
        assert_eq!(active_pixel(&s, 10, 5), Rgba([255, 0, 0, 255]));
        assert_eq!(active_pixel(&s, 0, 0), TRANSPARENT);
        assert_eq!(
            s.history().labels(),
            vec!["Initial state", "Brush stroke", "Cut selection", "Drop selection"]
        );
    }

    #[test]
    fn test_first_stroke_on_upper_layer_is_undoable() {
        let mut s = session();
        let details = s.layers().layers()[0].id;
        s.set_active_layer(details);
        s.set_size(4);
        click(&mut s, 10.0, 10.0);
        assert_eq!(active_pixel(&s, 10, 10), Rgba([255, 0, 0, 255]));

        assert_eq!(s.undo().as_deref(), Some("Brush stroke"));
        assert_eq!(active_pixel(&s, 10, 10), TRANSPARENT);
        assert_eq!(*s.composite().get_pixel(10, 10), TRANSPARENT);
        assert_eq!(s.redo().as_deref(), Some("Brush stroke"));
        assert_eq!(active_pixel(&s, 10, 10), Rgba([255, 0, 0, 255]));

        // a second stroke on the same layer needs no new baseline
        click(&mut s, 20.0, 20.0);
        assert_eq!(
            s.history().labels(),
            vec!["Initial state", "Initial state", "Brush stroke", "Brush stroke"]
        );
    }

    #[test]
    fn test_first_fill_and_cut_on_upper_layer_are_undoable() {
        let mut s = session();
        let details = s.layers().layers()[0].id;
        s.set_active_layer(details);
        s.set_tool(Tool::Fill);
        click(&mut s, 0.0, 0.0);
        assert_eq!(s.undo().as_deref(), Some("Fill"));
        assert!(s.layers().get_active().unwrap().is_blank());

        let overlay = s.layers().layers()[1].id;
        s.set_active_layer(overlay);
        s.set_tool(Tool::Select);
        drag(&mut s, (0.0, 0.0), (3.0, 3.0));
        assert_eq!(s.history().labels().last().copied(), Some("Cut selection"));
        let len = s.history().len();
        assert_eq!(s.undo().as_deref(), Some("Cut selection"));
        assert_eq!(s.history().pointer(), Some(len - 2));
    }

    #[test]
    fn test_pointer_far_off_canvas_is_clamped() {
        let view = ViewState::default();
        assert_eq!(view.screen_to_canvas(Pos2::new(-3e9, 3e9)), (-POINTER_LIMIT, POINTER_LIMIT));
        assert_eq!(view.screen_to_canvas(Pos2::new(f32::NAN, 7.5)), (0, 7));

        let mut s = session();
        s.set_size(2);
        click(&mut s, 5.0, 5.0);
        s.set_tool(Tool::Select);
        drag(&mut s, (-3e9, 0.0), (3e9, 0.0));
        assert_eq!(s.selection().floating().map(|f| (f.rect.width, f.rect.height)), Some((TEXTURE_SIZE, 1)));

        s.set_tool(Tool::Select);
        drag(&mut s, (4.0, 4.0), (7.0, 7.0));
        s.set_tool(Tool::Move);
        drag(&mut s, (5.0, 5.0), (-3e9, 5.0));
        assert!(s.selection().is_idle());
        assert_eq!(active_pixel(&s, 5, 5), TRANSPARENT);
    }

    #[test]
    fn test_palette_swatch_sets_color() {
        let mut s = session();
        assert!(!s.palette().is_empty());
        let second = s.palette()[1];
        assert!(s.select_swatch(1));
        assert_eq!(s.tool_config().color, second);
        assert!(!s.select_swatch(s.palette().len()));
        assert_eq!(s.tool_config().color, second);
    }

    #[test]
    fn test_zoom_tool_and_bounds() {
        let mut s = session();
        s.set_tool(Tool::Zoom);
        click(&mut s, 0.0, 0.0);
        assert!((s.view().zoom - 1.1).abs() < 1e-5);
        s.pointer_down(Pos2::ZERO, Modifiers::ALT);
        s.pointer_up();
        assert!((s.view().zoom - 1.0).abs() < 1e-5);
        for _ in 0..100 {
            s.zoom_in();
        }
        assert_eq!(s.view().zoom, 4.0);
        for _ in 0..100 {
            s.scroll(1.0);
        }
        assert_eq!(s.view().zoom, 0.5);
    }

    #[test]
    fn test_pan_moves_view_and_changes_mapping() {
        let mut s = session();
        s.set_tool(Tool::Pan);
        drag(&mut s, (0.0, 0.0), (20.0, 10.0));
        assert_eq!(s.view().pan, Vec2::new(20.0, 10.0));
        assert_eq!(s.view().screen_to_canvas(Pos2::new(25.0, 10.0)), (5, 0));
    }

    #[test]
    fn test_space_is_temporary_hand() {
        let mut s = session();
        s.set_tool(Tool::Eraser);
        assert!(s.key_down(" ", Modifiers::NONE));
        assert_eq!(s.tool(), Tool::Pan);
        assert!(s.key_up(" "));
        assert_eq!(s.tool(), Tool::Eraser);
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut s = session();
        click(&mut s, 0.0, 0.0);
        assert!(s.key_down("z", Modifiers::CTRL));
        assert_eq!(active_pixel(&s, 0, 0), TRANSPARENT);
        assert!(s.key_down("y", Modifiers::CTRL));
        assert_eq!(active_pixel(&s, 0, 0), Rgba([255, 0, 0, 255]));
        assert!(s.key_down("e", Modifiers::NONE));
        assert_eq!(s.tool(), Tool::Eraser);
        assert!(s.key_down("=", Modifiers::CTRL));
        assert!((s.view().zoom - 1.1).abs() < 1e-5);
        assert!(!s.key_down("q", Modifiers::NONE));
    }

    #[test]
    fn test_3d_paint_requires_mode_flag() {
        let mut s = session();
        s.pointer_down_3d(glam::Vec2::ZERO);
        s.pointer_up_3d();
        assert_eq!(s.history().len(), 1);

        s.set_paint_on_3d(true);
        s.pointer_down_3d(glam::Vec2::ZERO);
        s.pointer_move_3d(glam::Vec2::new(0.01, 0.0));
        s.pointer_up_3d();
        assert_eq!(s.history().len(), 2);
        assert!(!s.layers().get_active().unwrap().is_blank());
    }

    #[test]
    fn test_load_base_image_is_undoable() {
        let mut s = session();
        let img = RgbaImage::from_pixel(TEXTURE_SIZE, TEXTURE_SIZE, Rgba([9, 9, 9, 255]));
        s.load_base_image(&img);
        assert_eq!(*s.composite().get_pixel(5, 5), Rgba([9, 9, 9, 255]));
        assert_eq!(s.undo().as_deref(), Some("Load base image"));
        assert_eq!(*s.composite().get_pixel(5, 5), TRANSPARENT);
    }
}
