//! In-memory shape store.
//!
//! Keeps each board's shapes in insertion order. The `offline` switch makes
//! every call fail with `Unavailable`, which is how tests and the shell's
//! offline mode simulate a dead backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use super::{ShapeStore, StoreError};
use crate::board::BoardId;
use crate::shape::{Shape, ShapeId};

#[derive(Debug, Default)]
pub struct MemoryShapeStore {
    boards: RwLock<HashMap<BoardId, Vec<Shape>>>,
    offline: AtomicBool,
}

impl MemoryShapeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Put shapes on a board directly, bypassing the offline switch.
    pub async fn seed(&self, board: &BoardId, shapes: Vec<Shape>) {
        self.boards.write().await.entry(board.clone()).or_default().extend(shapes);
    }

    /// Current contents of a board, bypassing the offline switch.
    pub async fn snapshot(&self, board: &BoardId) -> Vec<Shape> {
        self.boards.read().await.get(board).cloned().unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.is_offline() { Err(StoreError::Unavailable("store is offline".into())) } else { Ok(()) }
    }
}

#[async_trait::async_trait]
impl ShapeStore for MemoryShapeStore {
    async fn list(&self, board: &BoardId) -> Result<Vec<Shape>, StoreError> {
        self.check_online()?;
        Ok(self.snapshot(board).await)
    }

    async fn create(&self, board: &BoardId, shape: &Shape) -> Result<Shape, StoreError> {
        self.check_online()?;
        let mut boards = self.boards.write().await;
        let shapes = boards.entry(board.clone()).or_default();
        match shapes.iter_mut().find(|s| s.id == shape.id) {
            Some(existing) => *existing = shape.clone(),
            None => shapes.push(shape.clone()),
        }
        Ok(shape.clone())
    }

    async fn delete(&self, board: &BoardId, id: &ShapeId) -> Result<(), StoreError> {
        self.check_online()?;
        let mut boards = self.boards.write().await;
        let shapes = boards.get_mut(board).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let pos = shapes.iter().position(|s| &s.id == id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        shapes.remove(pos);
        Ok(())
    }

    async fn delete_all(&self, board: &BoardId) -> Result<(), StoreError> {
        self.check_online()?;
        self.boards.write().await.remove(board);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
