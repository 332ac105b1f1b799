//! Board registry — known board identifiers and the active pointer.
//!
//! DESIGN
//! ======
//! The registry is the only owner of "which boards exist" and "which one is
//! on screen". Boards are never deleted. A `default` board is registered and
//! active from construction, so `active()` is always defined.
//!
//! Switching boards has remote side effects; those live in the sync engine,
//! which calls `set_active` before issuing the board's load.

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorCode;

pub const DEFAULT_BOARD_ID: &str = "default";
const BOARD_ID_PREFIX: &str = "board-";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("unknown board: {0}")]
    UnknownBoard(BoardId),
    #[error("invalid board id: {0:?}")]
    InvalidId(String),
}

impl ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBoard(_) => "E_UNKNOWN_BOARD",
            Self::InvalidId(_) => "E_INVALID_BOARD_ID",
        }
    }
}

/// Board identifier as used by the shape store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(String);

impl BoardId {
    /// Parse an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` for empty or whitespace-padded input.
    pub fn parse(raw: &str) -> Result<Self, BoardError> {
        if raw.is_empty() || raw.trim() != raw {
            return Err(BoardError::InvalidId(raw.to_owned()));
        }
        Ok(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn default_board() -> Self {
        Self(DEFAULT_BOARD_ID.to_owned())
    }

    fn generate() -> Self {
        Self(format!("{BOARD_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone)]
pub struct BoardRegistry {
    /// Known boards in registration order.
    boards: Vec<BoardId>,
    active: BoardId,
}

impl BoardRegistry {
    /// Registry holding only `initial`, which is also active.
    #[must_use]
    pub fn new(initial: BoardId) -> Self {
        Self { boards: vec![initial.clone()], active: initial }
    }

    /// Register a fresh board. The active board is unchanged.
    pub fn create_board(&mut self) -> BoardId {
        let mut id = BoardId::generate();
        while self.contains(&id) {
            id = BoardId::generate();
        }
        self.boards.push(id.clone());
        info!(board = %id, total = self.boards.len(), "board created");
        id
    }

    /// Register an identifier that already exists elsewhere, e.g. in the
    /// store from an earlier session. Returns `false` if it was known.
    pub fn adopt(&mut self, id: BoardId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.boards.push(id);
        true
    }

    /// Point the registry at `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` if `id` was never registered.
    pub fn set_active(&mut self, id: &BoardId) -> Result<(), BoardError> {
        self.ensure_known(id)?;
        self.active = id.clone();
        Ok(())
    }

    #[must_use]
    pub fn active(&self) -> &BoardId {
        &self.active
    }

    #[must_use]
    pub fn is_active(&self, id: &BoardId) -> bool {
        &self.active == id
    }

    #[must_use]
    pub fn contains(&self, id: &BoardId) -> bool {
        self.boards.contains(id)
    }

    /// # Errors
    ///
    /// Returns `UnknownBoard` if `id` was never registered.
    pub fn ensure_known(&self, id: &BoardId) -> Result<(), BoardError> {
        if self.contains(id) { Ok(()) } else { Err(BoardError::UnknownBoard(id.clone())) }
    }

    #[must_use]
    pub fn boards(&self) -> &[BoardId] {
        &self.boards
    }
}

impl Default for BoardRegistry {
    fn default() -> Self {
        Self::new(BoardId::default_board())
    }
}
