use std::collections::VecDeque;

use crate::canvas::{RasterSurface, SurfaceId};
use crate::components::layers::LayerStack;

/// Default number of snapshots kept before the oldest is evicted.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

// ============================================================================
// SNAPSHOT ENTRY
// ============================================================================

/// Full copy of one surface's raster at a point in time.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub surface_id: SurfaceId,
    pub label: String,
    data: Vec<u8>,
}

impl HistoryEntry {
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }
}

// ============================================================================
// HISTORY LOG - linear snapshot history with a movable pointer
// ============================================================================

/// Bounded, linear undo/redo log of surface snapshots.
///
/// Each entry is the state of one surface *after* an edit.  The pointer marks
/// the entry that matches what is currently on screen; undo moves it back one
/// and restores that entry, redo moves it forward.  Saving while the pointer is
/// not at the tail discards the forward entries first.
///
/// Every operation is total: missing surfaces and exhausted history are no-ops.
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    pointer: Option<usize>,
    capacity: usize,
    total_memory: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLog {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            pointer: None,
            capacity: capacity.max(1),
            total_memory: 0,
        }
    }

    /// Snapshot the active surface.  No-op when the stack has none.
    pub fn save(&mut self, stack: &LayerStack, label: &str) {
        if let Some(id) = stack.active_id() {
            self.save_surface(stack, id, label);
        }
    }

    /// Snapshot a specific surface.  No-op when `id` is unknown.
    pub fn save_surface(&mut self, stack: &LayerStack, id: SurfaceId, label: &str) {
        let Some(surface) = stack.get(id) else {
            return;
        };

        // Drop the redo branch
        let keep = self.pointer.map_or(0, |p| p + 1);
        while self.entries.len() > keep {
            if let Some(removed) = self.entries.pop_back() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }

        let entry = HistoryEntry {
            surface_id: id,
            label: label.to_string(),
            data: surface.as_bytes().to_vec(),
        };
        self.total_memory += entry.memory_size();
        self.entries.push_back(entry);

        while self.entries.len() > self.capacity {
            if let Some(removed) = self.entries.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
        self.pointer = Some(self.entries.len() - 1);
    }

    /// Record the current state of `id` unless the entry at the pointer
    /// already belongs to it, so the next edit on `id` has something to undo
    /// back to.  Returns `true` when an entry was added.
    pub fn ensure_baseline(&mut self, stack: &LayerStack, id: SurfaceId) -> bool {
        let current = self.pointer.and_then(|p| self.entries.get(p));
        if current.is_some_and(|e| e.surface_id == id) || stack.get(id).is_none() {
            return false;
        }
        self.save_surface(stack, id, "Initial state");
        true
    }

    /// Step back one entry and restore it.  Returns the label of the step
    /// that was undone.
    pub fn undo(&mut self, stack: &mut LayerStack) -> Option<String> {
        let current = self.pointer?;
        if current == 0 {
            return None;
        }
        let undone = self.entries[current].label.clone();
        self.pointer = Some(current - 1);
        self.restore(current - 1, stack);
        Some(undone)
    }

    /// Step forward one entry and restore it.  Returns the label of the step
    /// that was redone.
    pub fn redo(&mut self, stack: &mut LayerStack) -> Option<String> {
        let current = self.pointer?;
        if current + 1 >= self.entries.len() {
            return None;
        }
        self.pointer = Some(current + 1);
        self.restore(current + 1, stack);
        Some(self.entries[current + 1].label.clone())
    }

    fn restore(&self, index: usize, stack: &mut LayerStack) {
        let Some(entry) = self.entries.get(index) else {
            return;
        };
        match stack.get_mut(entry.surface_id) {
            Some(surface) => {
                if surface.replace_bytes(&entry.data) {
                    stack.recomposite();
                } else {
                    log_warn!("History: snapshot \"{}\" does not fit surface {}", entry.label, entry.surface_id);
                }
            }
            None => {
                log_warn!("History: surface {} no longer exists, skipping restore", entry.surface_id);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.pointer.is_some_and(|p| p > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.pointer.is_some_and(|p| p + 1 < self.entries.len())
    }

    /// Labels oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry matching the current state, `None` before the first save.
    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes held by all snapshots (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = None;
        self.total_memory = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn stack_with_layer() -> (LayerStack, SurfaceId) {
        let mut stack = LayerStack::new(4, 4);
        let id = stack.add_layer("Layer");
        (stack, id)
    }

    fn paint(stack: &mut LayerStack, id: SurfaceId, x: u32, value: u8) {
        stack
            .get_mut(id)
            .unwrap()
            .put_pixel(x, 0, Rgba([value, value, value, 255]));
    }

    #[test]
    fn test_empty_log_is_noop() {
        let (mut stack, _) = stack_with_layer();
        let mut log = HistoryLog::new(5);
        assert!(log.undo(&mut stack).is_none());
        assert!(log.redo(&mut stack).is_none());
        assert!(!log.can_undo());
        assert_eq!(log.pointer(), None);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let (mut stack, id) = stack_with_layer();
        let mut log = HistoryLog::new(5);
        paint(&mut stack, id, 0, 10);
        log.save(&stack, "Initial state");
        let original = stack.get(id).unwrap().pixels.clone();

        paint(&mut stack, id, 1, 200);
        log.save(&stack, "Brush stroke");
        let mutated = stack.get(id).unwrap().pixels.clone();

        assert_eq!(log.undo(&mut stack).as_deref(), Some("Brush stroke"));
        assert_eq!(stack.get(id).unwrap().pixels, original);
        assert_eq!(log.redo(&mut stack).as_deref(), Some("Brush stroke"));
        assert_eq!(stack.get(id).unwrap().pixels, mutated);
        assert_eq!(*stack.composite().get_pixel(1, 0), Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_capacity_bounds_entries_and_undos() {
        let (mut stack, id) = stack_with_layer();
        let mut log = HistoryLog::new(3);
        for i in 0..7u8 {
            paint(&mut stack, id, 0, i);
            log.save(&stack, "Brush stroke");
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.pointer(), Some(2));

        let mut undos = 0;
        while log.undo(&mut stack).is_some() {
            undos += 1;
        }
        assert_eq!(undos, 2);
        assert_eq!(stack.get(id).unwrap().pixel(0, 0), Rgba([4, 4, 4, 255]));
    }

    #[test]
    fn test_save_after_undo_prunes_redo() {
        let (mut stack, id) = stack_with_layer();
        let mut log = HistoryLog::new(10);
        log.save(&stack, "Initial state");
        paint(&mut stack, id, 0, 1);
        log.save(&stack, "a");
        paint(&mut stack, id, 0, 2);
        log.save(&stack, "b");

        log.undo(&mut stack);
        assert!(log.can_redo());
        paint(&mut stack, id, 0, 3);
        log.save(&stack, "c");

        assert!(!log.can_redo());
        assert!(log.redo(&mut stack).is_none());
        assert_eq!(log.labels(), vec!["Initial state", "a", "c"]);
    }

    #[test]
    fn test_restore_into_missing_surface_is_skipped() {
        let (mut stack, id) = stack_with_layer();
        let mut log = HistoryLog::new(5);
        log.save(&stack, "Initial state");
        paint(&mut stack, id, 0, 9);
        log.save(&stack, "Brush stroke");

        let mut replacement = LayerStack::new(4, 4);
        assert_eq!(log.undo(&mut replacement).as_deref(), Some("Brush stroke"));
        assert!(replacement.is_empty());
        assert_eq!(log.pointer(), Some(0));
    }

    #[test]
    fn test_save_surface_targets_given_layer() {
        let mut stack = LayerStack::new(2, 2);
        let bottom = stack.add_layer("bottom");
        let top = stack.add_layer("top");
        stack.set_active(top);
        let mut log = HistoryLog::new(5);
        log.save_surface(&stack, bottom, "Load base image");
        assert_eq!(log.entries().next().map(|e| e.surface_id), Some(bottom));
        log.save_surface(&stack, 42, "nothing");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_baseline_lets_first_edit_on_other_layer_undo() {
        let mut stack = LayerStack::new(4, 4);
        let bottom = stack.add_layer("bottom");
        let top = stack.add_layer("top");
        let mut log = HistoryLog::new(10);
        log.save_surface(&stack, bottom, "Initial state");

        assert!(!log.ensure_baseline(&stack, bottom));
        assert!(log.ensure_baseline(&stack, top));
        assert!(!log.ensure_baseline(&stack, top));
        assert!(!log.ensure_baseline(&stack, 99));

        paint(&mut stack, top, 2, 50);
        log.save_surface(&stack, top, "Brush stroke");
        assert_eq!(log.undo(&mut stack).as_deref(), Some("Brush stroke"));
        assert_eq!(stack.get(top).unwrap().pixel(2, 0)[3], 0);
        assert_eq!(log.labels(), vec!["Initial state", "Initial state", "Brush stroke"]);
    }

    #[test]
    fn test_memory_usage_tracks_snapshots() {
        let (stack, _) = stack_with_layer();
        let mut log = HistoryLog::new(2);
        log.save(&stack, "a");
        log.save(&stack, "b");
        log.save(&stack, "c");
        assert_eq!(log.memory_usage(), 2 * 4 * 4 * 4);
        log.clear();
        assert_eq!(log.memory_usage(), 0);
        assert!(log.is_empty());
    }
}
