//! Freehand whiteboard with bounded undo/redo
//!
//! Every committed change (a finished stroke, a clear, a background change)
//! first records a full snapshot of the canvas. Undo and redo swap the whole
//! canvas for a snapshot and the view repaints from it.

pub mod canvas;
pub mod history;

use anyhow::Result;

use crate::core::storage::KeyValueStore;
pub use canvas::{Canvas, Point, Rgba, Stroke, Tool};
use history::History;

/// Key under which a notebook's drawing is persisted
pub fn storage_key(slug: &str) -> String {
    format!("whiteboard:{}", slug)
}

pub struct Whiteboard {
    canvas: Canvas,
    active: Option<Stroke>,
    history: History<Canvas>,
    /// Changed since the last save
    dirty: bool,
}

impl Whiteboard {
    pub fn new(history_capacity: usize) -> Self {
        Self::with_canvas(Canvas::default(), history_capacity)
    }

    pub fn with_canvas(canvas: Canvas, history_capacity: usize) -> Self {
        Self {
            canvas,
            active: None,
            history: History::new(history_capacity),
            dirty: false,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Stroke currently being drawn, not yet part of the canvas
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
    }

    pub fn begin_stroke(&mut self, tool: Tool, color: Rgba, width: f32, at: Point) {
        self.active = Some(Stroke::new(tool, color, width, at));
    }

    pub fn extend_stroke(&mut self, to: Point) {
        if let Some(stroke) = self.active.as_mut() {
            stroke.push(to);
        }
    }

    /// Commit the active stroke. Returns `false` if nothing was being drawn.
    pub fn end_stroke(&mut self) -> bool {
        let Some(stroke) = self.active.take() else {
            return false;
        };
        self.history.record(self.canvas.clone());
        for p in &stroke.points {
            self.canvas.include(*p);
        }
        self.canvas.strokes.push(stroke);
        self.dirty = true;
        true
    }

    pub fn cancel_stroke(&mut self) {
        self.active = None;
    }

    /// Remove all strokes. Clearing an empty canvas records nothing.
    pub fn clear(&mut self) {
        self.active = None;
        if self.canvas.is_empty() {
            return;
        }
        self.history.record(self.canvas.clone());
        self.canvas.strokes.clear();
        self.dirty = true;
    }

    pub fn set_background(&mut self, background: Rgba) {
        if self.canvas.background == background {
            return;
        }
        self.history.record(self.canvas.clone());
        self.canvas.background = background;
        self.dirty = true;
    }

    pub fn undo(&mut self) -> bool {
        self.active = None;
        match self.history.undo(self.canvas.clone()) {
            Some(previous) => {
                self.canvas = previous;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.active = None;
        match self.history.redo(self.canvas.clone()) {
            Some(next) => {
                self.canvas = next;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Load the drawing saved for `slug`; a missing or unreadable entry gives
    /// an empty canvas. History starts empty.
    pub fn load<S: KeyValueStore>(store: &S, slug: &str, history_capacity: usize) -> Self {
        let canvas = store
            .get(&storage_key(slug))
            .and_then(|json| match serde_json::from_str::<Canvas>(&json) {
                Ok(canvas) => Some(canvas),
                Err(e) => {
                    tracing::warn!("Discarding unreadable whiteboard {}: {}", slug, e);
                    None
                }
            })
            .unwrap_or_default();
        Self::with_canvas(canvas, history_capacity)
    }

    pub fn save<S: KeyValueStore>(&mut self, store: &mut S, slug: &str) -> Result<()> {
        let json = serde_json::to_string(&self.canvas)?;
        store.set(&storage_key(slug), &json)?;
        self.dirty = false;
        tracing::debug!("Saved whiteboard for {}", slug);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStore;

    fn draw(wb: &mut Whiteboard, x: f32) {
        wb.begin_stroke(Tool::Pen, Rgba::WHITE, 2.0, Point::new(x, 0.0));
        wb.extend_stroke(Point::new(x, 10.0));
        assert!(wb.end_stroke());
    }

    #[test]
    fn test_undo_redo_repaints_from_snapshots() {
        let mut wb = Whiteboard::new(50);
        draw(&mut wb, 1.0);
        draw(&mut wb, 2.0);
        assert_eq!(wb.canvas().strokes.len(), 2);

        assert!(wb.undo());
        assert_eq!(wb.canvas().strokes.len(), 1);
        assert!(wb.undo());
        assert!(wb.canvas().is_empty());
        assert!(!wb.undo());

        assert!(wb.redo());
        assert!(wb.redo());
        assert_eq!(wb.canvas().strokes.len(), 2);
        assert!(!wb.redo());
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut wb = Whiteboard::new(50);
        draw(&mut wb, 1.0);
        wb.clear();
        assert!(wb.canvas().is_empty());
        wb.clear();
        assert!(wb.undo());
        assert_eq!(wb.canvas().strokes.len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut wb = Whiteboard::new(3);
        for i in 0..10 {
            draw(&mut wb, i as f32);
        }
        let mut undone = 0;
        while wb.undo() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(wb.canvas().strokes.len(), 7);
    }

    #[test]
    fn test_new_stroke_drops_redo() {
        let mut wb = Whiteboard::new(10);
        draw(&mut wb, 1.0);
        wb.undo();
        assert!(wb.can_redo());
        draw(&mut wb, 2.0);
        assert!(!wb.can_redo());
    }

    #[test]
    fn test_end_without_begin() {
        let mut wb = Whiteboard::new(10);
        assert!(!wb.end_stroke());
        assert!(!wb.can_undo());
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let mut wb = Whiteboard::new(10);
        draw(&mut wb, 4.0);
        wb.set_background(Rgba::WHITE);
        assert!(wb.is_dirty());
        wb.save(&mut store, "ideas").unwrap();
        assert!(!wb.is_dirty());

        let loaded = Whiteboard::load(&store, "ideas", 10);
        assert_eq!(loaded.canvas(), wb.canvas());
        assert!(!loaded.can_undo());

        store.set(&storage_key("bad"), "nope").unwrap();
        assert!(Whiteboard::load(&store, "bad", 10).canvas().is_empty());
    }
}
