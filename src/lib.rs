//! Multi-board shape state manager.
//!
//! Local undo/redo history per board, kept in step with a remote shape
//! store by the [`SyncEngine`], and rendered through a [`RenderSink`].

pub mod board;
pub mod config;
pub mod error;
pub mod history;
pub mod render;
pub mod shape;
pub mod shell;
pub mod store;
pub mod sync;

pub use board::{BoardError, BoardId, BoardRegistry};
pub use config::{Config, ConfigError};
pub use error::ErrorCode;
pub use history::HistoryController;
pub use render::{ConsoleSink, RenderSink, Surface};
pub use shape::{Gesture, Geometry, Point, Shape, ShapeError, ShapeId, Style, Tool};
pub use store::{HttpShapeStore, MemoryShapeStore, ShapeStore, StoreError};
pub use sync::{BoardSnapshot, LoadOutcome, LoadState, SyncEngine, SyncError};
