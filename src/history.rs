//! History controller — per-board undo/redo stacks.
//!
//! DESIGN
//! ======
//! Each board owns two stacks, most recent last. The undo stack mirrors what
//! is persisted for the board; the redo stack holds shapes that were deleted
//! from the store by an undo. This module never talks to storage: the sync
//! engine issues the matching store request and calls the `revert_*` helpers
//! if that request fails.
//!
//! Redo re-admits a shape as a new entity with a fresh identifier, because
//! the undo already retired the old identifier in the store.
//!
//! Each board carries an epoch that advances whenever redo history is
//! discarded (a commit or a full replace). A revert only restores the stacks
//! if the epoch is unchanged and the reverted shape is still on top, so a
//! late store failure never resurrects history a newer commit threw away.

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use std::collections::HashMap;

use crate::board::BoardId;
use crate::shape::{Shape, ShapeId};

/// Undo and redo stacks of one board.
#[derive(Debug, Clone, Default)]
pub struct BoardHistory {
    undo: Vec<Shape>,
    redo: Vec<Shape>,
    epoch: u64,
}

impl BoardHistory {
    #[must_use]
    pub fn undo_stack(&self) -> &[Shape] {
        &self.undo
    }

    #[must_use]
    pub fn redo_stack(&self) -> &[Shape] {
        &self.redo
    }
}

/// Result of a redo: the re-identified shape and the identifier it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Redone {
    pub shape: Shape,
    pub retired: ShapeId,
}

#[derive(Debug, Default)]
pub struct HistoryController {
    boards: HashMap<BoardId, BoardHistory>,
}

impl HistoryController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn board_mut(&mut self, board: &BoardId) -> &mut BoardHistory {
        self.boards.entry(board.clone()).or_default()
    }

    #[must_use]
    pub fn board(&self, board: &BoardId) -> Option<&BoardHistory> {
        self.boards.get(board)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Push a newly drawn shape. Discards divergent redo history.
    pub fn commit(&mut self, board: &BoardId, shape: Shape) {
        let history = self.board_mut(board);
        history.undo.push(shape);
        history.redo.clear();
        history.epoch += 1;
    }

    /// Move the most recent shape to the redo stack and return it.
    pub fn undo(&mut self, board: &BoardId) -> Option<Shape> {
        let history = self.board_mut(board);
        let shape = history.undo.pop()?;
        history.redo.push(shape.clone());
        Some(shape)
    }

    /// Move the most recently undone shape back under a fresh identifier.
    pub fn redo(&mut self, board: &BoardId) -> Option<Redone> {
        let history = self.board_mut(board);
        let original = history.redo.pop()?;
        let retired = original.id.clone();
        let mut id = ShapeId::generate();
        while id == retired {
            id = ShapeId::generate();
        }
        let shape = original.with_id(id);
        history.undo.push(shape.clone());
        Some(Redone { shape, retired })
    }

    /// Overwrite the board with a freshly loaded sequence and drop redo state.
    pub fn replace_all(&mut self, board: &BoardId, shapes: Vec<Shape>) {
        let history = self.board_mut(board);
        history.undo = shapes;
        history.redo.clear();
        history.epoch += 1;
    }

    /// Overwrite the undo stack with a reloaded sequence, keeping redo state.
    /// Used for the reload that follows an undo, so the undone shape stays
    /// redoable.
    pub fn refresh(&mut self, board: &BoardId, shapes: Vec<Shape>) {
        let history = self.board_mut(board);
        let redo = std::mem::take(&mut history.redo);
        let kept: Vec<Shape> = redo.into_iter().filter(|s| !shapes.iter().any(|u| u.id == s.id)).collect();
        history.undo = shapes;
        history.redo = kept;
    }

    pub fn clear(&mut self, board: &BoardId) {
        self.replace_all(board, Vec::new());
    }

    /// Undo an `undo` whose store delete failed. `epoch` is the board's
    /// epoch right after the undo. Returns `false` if later history changes
    /// made the revert unsafe; the stacks are then left alone.
    pub fn revert_undo(&mut self, board: &BoardId, shape: &Shape, epoch: u64) -> bool {
        let history = self.board_mut(board);
        let on_top = history.redo.last().is_some_and(|s| s.id == shape.id);
        if history.epoch != epoch || !on_top {
            return false;
        }
        history.redo.pop();
        if !history.undo.iter().any(|s| s.id == shape.id) {
            history.undo.push(shape.clone());
        }
        true
    }

    /// Undo a `redo` whose store create failed. The re-identified shape is
    /// always dropped from the undo stack, since the store never got it; the
    /// original goes back onto the redo stack only if nothing superseded the
    /// redo. Returns whether it did.
    pub fn revert_redo(&mut self, board: &BoardId, redone: &Redone, epoch: u64) -> bool {
        let history = self.board_mut(board);
        let on_top = history.undo.last().is_some_and(|s| s.id == redone.shape.id);
        if let Some(pos) = history.undo.iter().rposition(|s| s.id == redone.shape.id) {
            history.undo.remove(pos);
        }
        if history.epoch != epoch || !on_top {
            return false;
        }
        history.redo.push(redone.shape.clone().with_id(redone.retired.clone()));
        true
    }

    /// Adopt an identifier assigned by the store. Returns `false` if the
    /// shape is no longer tracked.
    pub fn rename(&mut self, board: &BoardId, from: &ShapeId, to: &ShapeId) -> bool {
        let history = self.board_mut(board);
        let found = history.undo.iter_mut().chain(history.redo.iter_mut()).find(|s| &s.id == from);
        match found {
            Some(shape) => {
                shape.id = to.clone();
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn undo_stack(&self, board: &BoardId) -> &[Shape] {
        self.boards.get(board).map(|h| h.undo.as_slice()).unwrap_or_default()
    }

    #[must_use]
    pub fn redo_stack(&self, board: &BoardId) -> &[Shape] {
        self.boards.get(board).map(|h| h.redo.as_slice()).unwrap_or_default()
    }

    /// Advances whenever the board's redo history is discarded.
    #[must_use]
    pub fn epoch(&self, board: &BoardId) -> u64 {
        self.boards.get(board).map_or(0, |h| h.epoch)
    }

    #[must_use]
    pub fn can_undo(&self, board: &BoardId) -> bool {
        !self.undo_stack(board).is_empty()
    }

    #[must_use]
    pub fn can_redo(&self, board: &BoardId) -> bool {
        !self.redo_stack(board).is_empty()
    }

    #[must_use]
    pub fn contains(&self, board: &BoardId, id: &ShapeId) -> bool {
        self.undo_stack(board).iter().any(|s| &s.id == id)
    }
}
