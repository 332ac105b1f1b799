//! Remote shape store — the persistence contract the sync engine consumes.
//!
//! DESIGN
//! ======
//! The store is a CRUD service keyed by board and shape identifier. It is
//! the source of truth for what a board contains; local history is reset
//! from it on every load. Two implementations ship with the crate:
//! `MemoryShapeStore` (in-process, used by tests and offline mode) and
//! `HttpShapeStore` (REST client for the shapes API).
//!
//! ERROR HANDLING
//! ==============
//! Transport failures surface as `Unavailable` and are retryable. Deleting
//! an identifier the store does not hold may succeed or return `NotFound`;
//! callers treat both as the same terminal state.

pub mod http;
pub mod memory;

pub use http::HttpShapeStore;
pub use memory::MemoryShapeStore;

use crate::board::BoardId;
use crate::error::ErrorCode;
use crate::shape::{Shape, ShapeId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("shape store unavailable: {0}")]
    Unavailable(String),
    #[error("shape not found: {0}")]
    NotFound(ShapeId),
    #[error("malformed store response: {0}")]
    Decode(String),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Decode(_) => "E_STORE_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Persistence backend for board shapes.
#[async_trait::async_trait]
pub trait ShapeStore: Send + Sync {
    /// All shapes of a board in persisted order. An unknown board is empty.
    async fn list(&self, board: &BoardId) -> Result<Vec<Shape>, StoreError>;

    /// Persist a shape. The returned shape carries the identifier the store
    /// settled on, which may differ from the one sent.
    async fn create(&self, board: &BoardId, shape: &Shape) -> Result<Shape, StoreError>;

    async fn delete(&self, board: &BoardId, id: &ShapeId) -> Result<(), StoreError>;

    async fn delete_all(&self, board: &BoardId) -> Result<(), StoreError>;
}
