// ============================================================================
// SELECTION TRANSFORM — rectangular cut, float, drag and drop
// ============================================================================

use image::RgbaImage;

use crate::canvas::{RasterSurface, clip_rect};
use crate::components::history::HistoryLog;
use crate::components::layers::LayerStack;

/// Axis-aligned pixel rectangle, always non-negative in size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    /// Rectangle spanned by two corner pixels, both included.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: a.0.abs_diff(b.0).saturating_add(1),
            height: a.1.abs_diff(b.1).saturating_add(1),
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Half-open hit test: `[x, x + width) × [y, y + height)`.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && (px as i64) < self.x as i64 + self.width as i64
            && (py as i64) < self.y as i64 + self.height as i64
    }
}

/// Pixels lifted off the active surface, waiting to be dropped.
#[derive(Clone, Debug)]
pub struct FloatingSelection {
    pub rect: SelectionRect,
    pub pixels: RgbaImage,
    pub offset: (i32, i32),
}

impl FloatingSelection {
    /// Where the snapshot would land if dropped now.
    pub fn position(&self) -> (i32, i32) {
        (
            self.rect.x.saturating_add(self.offset.0),
            self.rect.y.saturating_add(self.offset.1),
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rect
            .contains(x.saturating_sub(self.offset.0), y.saturating_sub(self.offset.1))
    }
}

#[derive(Clone, Debug, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    DraggingNewRect {
        anchor: (i32, i32),
        current: (i32, i32),
    },
    Committed(FloatingSelection),
    DraggingMove {
        floating: FloatingSelection,
        drag_origin: (i32, i32),
        drag_start_offset: (i32, i32),
    },
}

/// `idle → dragging-new-rect → committed → dragging-move → idle`.
///
/// Calls that do not apply to the current state are no-ops.
#[derive(Default)]
pub struct SelectionTransform {
    state: SelectionState,
}

impl SelectionTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SelectionState::Idle)
    }

    /// Rectangle being drawn, or the floating snapshot's rectangle at its
    /// current offset.
    pub fn live_rect(&self) -> Option<SelectionRect> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::DraggingNewRect { anchor, current } => {
                Some(SelectionRect::from_corners(*anchor, *current))
            }
            SelectionState::Committed(f) | SelectionState::DraggingMove { floating: f, .. } => {
                let (x, y) = f.position();
                Some(SelectionRect { x, y, ..f.rect })
            }
        }
    }

    pub fn floating(&self) -> Option<&FloatingSelection> {
        match &self.state {
            SelectionState::Committed(f) | SelectionState::DraggingMove { floating: f, .. } => Some(f),
            _ => None,
        }
    }

    /// Start a new rectangle.  Any pending selection is abandoned first.
    pub fn begin(&mut self, x: i32, y: i32) {
        self.reset();
        self.state = SelectionState::DraggingNewRect {
            anchor: (x, y),
            current: (x, y),
        };
    }

    pub fn update(&mut self, x: i32, y: i32) {
        if let SelectionState::DraggingNewRect { current, .. } = &mut self.state {
            *current = (x, y);
        }
    }

    /// Cut the rectangle out of the active surface and float it.
    /// Returns `true` when a selection was committed.
    pub fn finalize(&mut self, stack: &mut LayerStack, history: &mut HistoryLog) -> bool {
        let SelectionState::DraggingNewRect { anchor, current } = self.state else {
            return false;
        };
        self.state = SelectionState::Idle;

        let wanted = SelectionRect::from_corners(anchor, current);
        let Some(surface) = stack.get_active_mut() else {
            return false;
        };
        let Some((x0, y0, x1, y1)) = clip_rect(
            wanted.x,
            wanted.y,
            wanted.width,
            wanted.height,
            surface.width(),
            surface.height(),
        ) else {
            return false;
        };

        let rect = SelectionRect {
            x: x0 as i32,
            y: y0 as i32,
            width: x1 - x0,
            height: y1 - y0,
        };
        if rect.area() == 0 {
            return false;
        }

        let pixels = surface.read_region(rect.x, rect.y, rect.width, rect.height);
        surface.clear_region(rect.x, rect.y, rect.width, rect.height);
        stack.recomposite();
        history.save(stack, "Cut selection");

        log_info!(
            "Selection cut {}x{} at ({}, {})",
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
        self.state = SelectionState::Committed(FloatingSelection {
            rect,
            pixels,
            offset: (0, 0),
        });
        true
    }

    /// Pick up the floating snapshot if `(x, y)` is inside it.
    pub fn start_drag(&mut self, x: i32, y: i32) -> bool {
        let state = std::mem::take(&mut self.state);
        match state {
            SelectionState::Committed(floating) if floating.contains(x, y) => {
                let drag_start_offset = floating.offset;
                self.state = SelectionState::DraggingMove {
                    floating,
                    drag_origin: (x, y),
                    drag_start_offset,
                };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    pub fn update_drag(&mut self, x: i32, y: i32) {
        if let SelectionState::DraggingMove {
            floating,
            drag_origin,
            drag_start_offset,
        } = &mut self.state
        {
            floating.offset = (
                drag_start_offset.0.saturating_add(x.saturating_sub(drag_origin.0)),
                drag_start_offset.1.saturating_add(y.saturating_sub(drag_origin.1)),
            );
        }
    }

    /// Paste the snapshot at its current offset onto the active surface.
    /// Returns `true` when pixels were written.
    pub fn drop_selection(&mut self, stack: &mut LayerStack, history: &mut HistoryLog) -> bool {
        let state = std::mem::take(&mut self.state);
        let SelectionState::DraggingMove { floating, .. } = state else {
            self.state = state;
            return false;
        };

        let Some(surface) = stack.get_active_mut() else {
            log_warn!("Selection dropped with no active layer, pixels discarded");
            return false;
        };
        let (x, y) = floating.position();
        surface.draw_region(x, y, &floating.pixels);
        stack.recomposite();
        history.save(stack, "Drop selection");
        log_info!("Selection dropped at ({}, {})", x, y);
        true
    }

    /// Return to idle, discarding any floating pixels without writing them
    /// back.  Returns `true` if a snapshot was thrown away.
    pub fn reset(&mut self) -> bool {
        let discarded = self.floating().is_some();
        if discarded {
            log_warn!("Pending selection discarded");
        }
        self.state = SelectionState::Idle;
        discarded
    }
}
