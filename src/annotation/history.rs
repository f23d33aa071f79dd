//! Ordered stroke collection with bounded snapshot undo/redo.
//!
//! Every mutating operation stores the whole stroke sequence as a snapshot.
//! Strokes are shared through `Arc`, so a snapshot costs one pointer per
//! stroke rather than a deep copy of the points.

use std::collections::VecDeque;
use std::sync::Arc;

use super::model::{Color, Stroke};
use crate::geometry::Point;

type Snapshot = Vec<Arc<Stroke>>;

/// Availability flags reported after a history change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_edits: bool,
}

pub struct StrokeHistory {
    strokes: Snapshot,
    pending: Option<Stroke>,
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    capacity: usize,
}

impl StrokeHistory {
    pub fn new(capacity: usize) -> Self {
        StrokeHistory {
            strokes: Vec::new(),
            pending: None,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Committed strokes in drawing order.
    pub fn strokes(&self) -> &[Arc<Stroke>] {
        &self.strokes
    }

    /// The stroke being drawn, if a drag is active.
    pub fn pending(&self) -> Option<&Stroke> {
        self.pending.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            has_edits: !self.strokes.is_empty(),
        }
    }

    /// Start a new in-progress stroke, replacing any unfinished one.
    pub fn begin_stroke(&mut self, point: Point, color: Color, width: f64) {
        self.pending = Some(Stroke::new(point, color, width));
    }

    pub fn append_point(&mut self, point: Point) {
        if let Some(stroke) = self.pending.as_mut() {
            stroke.push(point);
        }
    }

    /// Move the in-progress stroke into history. Returns `None` when nothing
    /// changed: no stroke in progress, or a click too short to draw.
    pub fn commit_stroke(&mut self) -> Option<HistoryStatus> {
        let stroke = self.pending.take()?;
        if stroke.is_degenerate() {
            log::debug!("[HISTORY] Dropping stroke with {} point(s)", stroke.len());
            return None;
        }
        self.push_undo(self.strokes.clone());
        self.strokes.push(Arc::new(stroke));
        self.redo_stack.clear();
        log::debug!("[HISTORY] Committed stroke #{}", self.strokes.len());
        Some(self.status())
    }

    pub fn undo(&mut self) -> Option<HistoryStatus> {
        let previous = self.undo_stack.pop_back()?;
        let current = std::mem::replace(&mut self.strokes, previous);
        self.redo_stack.push(current);
        Some(self.status())
    }

    pub fn redo(&mut self) -> Option<HistoryStatus> {
        let next = self.redo_stack.pop()?;
        let current = std::mem::replace(&mut self.strokes, next);
        self.push_undo(current);
        Some(self.status())
    }

    /// Remove every stroke. Undoable like any other edit.
    pub fn clear_all(&mut self) -> HistoryStatus {
        let current = std::mem::take(&mut self.strokes);
        self.push_undo(current);
        self.pending = None;
        self.redo_stack.clear();
        self.status()
    }

    /// Forget strokes and both stacks, for a new capture.
    pub fn reset(&mut self) {
        self.strokes.clear();
        self.pending = None;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(history: &mut StrokeHistory, x: f64) -> Option<HistoryStatus> {
        history.begin_stroke(Point::new(x, 0.0), Color::RED, 3.0);
        history.append_point(Point::new(x, 10.0));
        history.commit_stroke()
    }

    fn xs(history: &StrokeHistory) -> Vec<f64> {
        history.strokes().iter().map(|s| s.points()[0].x).collect()
    }

    #[test]
    fn commit_reports_status() {
        let mut h = StrokeHistory::new(50);
        let status = draw(&mut h, 1.0).unwrap();
        assert_eq!(status, HistoryStatus { can_undo: true, can_redo: false, has_edits: true });
        assert_eq!(h.strokes().len(), 1);
        assert!(h.pending().is_none());
    }

    #[test]
    fn clicks_are_discarded() {
        let mut h = StrokeHistory::new(50);
        h.begin_stroke(Point::new(1.0, 1.0), Color::RED, 3.0);
        assert_eq!(h.commit_stroke(), None);
        assert!(h.strokes().is_empty());
        assert!(!h.can_undo());
    }

    #[test]
    fn append_without_begin_is_noop() {
        let mut h = StrokeHistory::new(50);
        h.append_point(Point::new(1.0, 1.0));
        assert!(h.pending().is_none());
        assert_eq!(h.commit_stroke(), None);
    }

    #[test]
    fn undo_then_redo_restores_sequence() {
        let mut h = StrokeHistory::new(50);
        for x in [1.0, 2.0, 3.0] {
            draw(&mut h, x);
        }
        let before = h.strokes().to_vec();

        h.undo().unwrap();
        assert_eq!(xs(&h), vec![1.0, 2.0]);
        let status = h.redo().unwrap();
        assert_eq!(h.strokes(), &before[..]);
        assert_eq!(status, HistoryStatus { can_undo: true, can_redo: false, has_edits: true });
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut h = StrokeHistory::new(50);
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        draw(&mut h, 1.0);
        assert_eq!(h.redo(), None);
        assert_eq!(xs(&h), vec![1.0]);
    }

    #[test]
    fn new_stroke_clears_redo() {
        let mut h = StrokeHistory::new(50);
        draw(&mut h, 1.0);
        draw(&mut h, 2.0);
        h.undo();
        assert!(h.can_redo());
        draw(&mut h, 3.0);
        assert!(!h.can_redo());
        assert_eq!(xs(&h), vec![1.0, 3.0]);
    }

    #[test]
    fn clear_all_is_undoable() {
        let mut h = StrokeHistory::new(50);
        draw(&mut h, 1.0);
        draw(&mut h, 2.0);
        let status = h.clear_all();
        assert_eq!(status, HistoryStatus { can_undo: true, can_redo: false, has_edits: false });
        assert!(h.strokes().is_empty());

        h.undo();
        assert_eq!(xs(&h), vec![1.0, 2.0]);
        h.redo();
        assert!(h.strokes().is_empty());
    }

    #[test]
    fn undo_stack_is_capped_fifo() {
        let mut h = StrokeHistory::new(3);
        for x in 0..10 {
            draw(&mut h, x as f64);
            assert!(h.undo_depth() <= 3);
        }
        assert_eq!(h.undo_depth(), 3);

        while h.undo().is_some() {}
        // Oldest snapshots (0..=6 strokes) were evicted; the earliest left holds 7.
        assert_eq!(h.strokes().len(), 7);
        assert_eq!(h.redo_depth(), 3);
    }
}
