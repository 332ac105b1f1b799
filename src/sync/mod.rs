//! Sync engine — keeps local board history and the remote store in step.
//!
//! DESIGN
//! ======
//! Every user operation updates local state first and then issues store
//! requests. The state lock (`EngineState`) is only held for the synchronous
//! part of an operation; store requests are pushed onto the board's lane
//! while the lock is held, so the lane sees them in issue order, and are
//! awaited after the lock is released. Several operations may therefore be
//! in flight at once.
//!
//! Loads (switch, reload, the refresh after an undo) and clears carry a
//! ticket from the same sequence as every other request. A result is applied
//! only if no newer snapshot of the board was applied already; a load result
//! additionally needs its board to still be active with no newer load of it
//! issued. Mutations issued
//! while a snapshot is in flight are journaled and replayed on top of it.
//!
//! ERROR HANDLING
//! ==============
//! Unknown boards are rejected before any store request is issued. Undo and
//! redo restore the stacks when the store rejects them. A failed create is
//! not rolled back: the shape stays visible until the next reload replaces
//! local history with what the store holds.

mod journal;
mod lane;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::board::{BoardError, BoardId, BoardRegistry};
use crate::error::ErrorCode;
use crate::history::{HistoryController, Redone};
use crate::render::RenderSink;
use crate::shape::{Shape, ShapeId};
use crate::store::{ShapeStore, StoreError};
use journal::{Journal, Op};
use lane::{Lane, Reply};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store lane for board {0} is closed")]
    LaneClosed(BoardId),
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Board(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::LaneClosed(_) => "E_LANE_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::Board(_) | Self::LaneClosed(_) => false,
        }
    }
}

/// What happened to a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// History was replaced and, if the board is active, rendered.
    Applied { shapes: usize },
    /// A newer load or a board switch superseded this one.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    FetchInFlight,
}

/// Point-in-time view of one board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub board: BoardId,
    pub active: bool,
    pub undo: Vec<Shape>,
    pub redo: Vec<Shape>,
    pub load: LoadState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    /// Switch or explicit reload: history is reset to the store contents.
    Replace,
    /// Reload after an undo: the redo stack survives.
    Refresh,
}

// =============================================================================
// STATE
// =============================================================================

/// Per-board request bookkeeping.
struct BoardSync {
    lane: Lane,
    journal: Journal,
    /// Loads and clears issued but not yet completed.
    snapshots: usize,
    /// Loads issued but not yet completed.
    fetches: usize,
    /// Ticket of the newest load issued.
    latest_load: u64,
    /// Ticket of the newest snapshot applied to history.
    applied: u64,
    /// Sequence counter at the last repaint by an applied snapshot.
    painted_at: u64,
}

impl BoardSync {
    fn new(lane: Lane) -> Self {
        Self { lane, journal: Journal::default(), snapshots: 0, fetches: 0, latest_load: 0, applied: 0, painted_at: 0 }
    }

    /// Journal a mutation if some snapshot may have been taken before it.
    fn record(&mut self, seq: u64, op: Op) {
        if self.snapshots > 0 {
            self.journal.record(seq, op);
        }
    }

    fn snapshot_done(&mut self) {
        self.snapshots = self.snapshots.saturating_sub(1);
        if self.snapshots == 0 {
            self.journal.clear();
        }
    }
}

struct EngineState {
    registry: BoardRegistry,
    history: HistoryController,
    boards: HashMap<BoardId, BoardSync>,
    seq: u64,
}

impl EngineState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn board_sync(&mut self, board: &BoardId, store: &Arc<dyn ShapeStore>) -> &mut BoardSync {
        self.boards
            .entry(board.clone())
            .or_insert_with(|| BoardSync::new(Lane::spawn(board.clone(), Arc::clone(store))))
    }

    fn load_state(&self, board: &BoardId) -> LoadState {
        match self.boards.get(board) {
            Some(sync) if sync.fetches > 0 => LoadState::FetchInFlight,
            _ => LoadState::Idle,
        }
    }

    fn rollback_undo(&mut self, board: &BoardId, seq: u64, shape: &Shape, epoch: u64) {
        if !self.history.revert_undo(board, shape, epoch) {
            warn!(%board, shape_id = %shape.id, "history moved on; undo not reverted until next reload");
        }
        if let Some(sync) = self.boards.get_mut(board) {
            sync.journal.forget(seq);
        }
    }

    fn rollback_redo(&mut self, board: &BoardId, seq: u64, redone: &Redone, epoch: u64) {
        if !self.history.revert_redo(board, redone, epoch) {
            warn!(%board, shape_id = %redone.retired, "history moved on; redo entry dropped");
        }
        if let Some(sync) = self.boards.get_mut(board) {
            sync.journal.forget(seq);
        }
    }

    fn rename(&mut self, board: &BoardId, from: &ShapeId, to: &ShapeId) {
        self.history.rename(board, from, to);
        if let Some(sync) = self.boards.get_mut(board) {
            sync.journal.rename(from, to);
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Cheap to clone; clones share state, store and sink.
#[derive(Clone)]
pub struct SyncEngine {
    state: Arc<Mutex<EngineState>>,
    store: Arc<dyn ShapeStore>,
    sink: Arc<dyn RenderSink>,
}

impl SyncEngine {
    /// Engine whose only board is `default`, already active.
    #[must_use]
    pub fn new(store: Arc<dyn ShapeStore>, sink: Arc<dyn RenderSink>) -> Self {
        Self::with_initial_board(store, sink, BoardId::default_board())
    }

    #[must_use]
    pub fn with_initial_board(store: Arc<dyn ShapeStore>, sink: Arc<dyn RenderSink>, initial: BoardId) -> Self {
        let state = EngineState {
            registry: BoardRegistry::new(initial),
            history: HistoryController::new(),
            boards: HashMap::new(),
            seq: 0,
        };
        Self { state: Arc::new(Mutex::new(state)), store, sink }
    }

    // -------------------------------------------------------------------------
    // Boards
    // -------------------------------------------------------------------------

    /// Register a fresh board without switching to it.
    pub async fn create_board(&self) -> BoardId {
        self.state.lock().await.registry.create_board()
    }

    /// Register a board that already exists in the store. Returns `false`
    /// if it was already known.
    pub async fn adopt_board(&self, board: BoardId) -> bool {
        self.state.lock().await.registry.adopt(board)
    }

    pub async fn active_board(&self) -> BoardId {
        self.state.lock().await.registry.active().clone()
    }

    pub async fn boards(&self) -> Vec<BoardId> {
        self.state.lock().await.registry.boards().to_vec()
    }

    pub async fn load_state(&self, board: &BoardId) -> LoadState {
        self.state.lock().await.load_state(board)
    }

    /// # Errors
    ///
    /// Returns `UnknownBoard` if `board` was never registered.
    pub async fn snapshot(&self, board: &BoardId) -> Result<BoardSnapshot, SyncError> {
        let state = self.state.lock().await;
        state.registry.ensure_known(board)?;
        Ok(BoardSnapshot {
            board: board.clone(),
            active: state.registry.is_active(board),
            undo: state.history.undo_stack(board).to_vec(),
            redo: state.history.redo_stack(board).to_vec(),
            load: state.load_state(board),
        })
    }

    /// Make `board` active and render it from the store.
    ///
    /// The surface is cleared before the fetch is issued, so a failed or
    /// superseded fetch never leaves another board's shapes on screen.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` (nothing changes) or the store error of the
    /// fetch (the board stays active with an empty surface and its stacks
    /// untouched).
    pub async fn switch_board(&self, board: &BoardId) -> Result<LoadOutcome, SyncError> {
        let (ticket, reply) = {
            let mut state = self.state.lock().await;
            state.registry.set_active(board)?;
            self.sink.clear();
            self.begin_load(&mut state, board)?
        };
        info!(%board, "switched board");
        self.finish_load(board, LoadKind::Replace, ticket, reply).await
    }

    /// Replace `board`'s history with the store contents.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` or the store error of the fetch.
    pub async fn reload(&self, board: &BoardId) -> Result<LoadOutcome, SyncError> {
        let (ticket, reply) = {
            let mut state = self.state.lock().await;
            state.registry.ensure_known(board)?;
            self.begin_load(&mut state, board)?
        };
        self.finish_load(board, LoadKind::Replace, ticket, reply).await
    }

    /// Delete every shape of `board` in the store, then empty both stacks.
    ///
    /// Nothing changes locally until the store confirms.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` or the store error; on error the stacks and
    /// the surface are untouched.
    pub async fn clear_board(&self, board: &BoardId) -> Result<(), SyncError> {
        let (ticket, reply) = {
            let mut state = self.state.lock().await;
            state.registry.ensure_known(board)?;
            let ticket = state.next_seq();
            let sync = state.board_sync(board, &self.store);
            sync.record(ticket, Op::Cleared);
            let reply = sync.lane.delete_all()?;
            sync.snapshots += 1;
            (ticket, reply)
        };

        let result = lane::settle(board, reply).await;
        let mut state = self.state.lock().await;
        let active = state.registry.is_active(board);
        let now = state.seq;
        let sync = state.board_sync(board, &self.store);

        if let Err(e) = result {
            sync.journal.forget(ticket);
            sync.snapshot_done();
            error!(%board, error = %e, "clear failed");
            return Err(e);
        }
        if ticket <= sync.applied {
            sync.snapshot_done();
            debug!(%board, ticket, "clear superseded by newer snapshot");
            return Ok(());
        }

        let shapes = sync.journal.replay_after(ticket, Vec::new());
        sync.applied = ticket;
        sync.snapshot_done();
        if active {
            sync.painted_at = now;
            self.paint(&shapes);
        }
        state.history.replace_all(board, shapes);
        info!(%board, "board cleared");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Shapes
    // -------------------------------------------------------------------------

    /// Commit `shape` to `board`, render it if the board is active, then
    /// persist it. Returns the shape as stored.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` (nothing changes) or the store error. A failed
    /// create is not rolled back.
    pub async fn commit_shape(&self, board: &BoardId, shape: Shape) -> Result<Shape, SyncError> {
        let reply = {
            let mut state = self.state.lock().await;
            state.registry.ensure_known(board)?;
            state.history.commit(board, shape.clone());
            if state.registry.is_active(board) {
                self.sink.draw(&shape);
            }
            let seq = state.next_seq();
            let sync = state.board_sync(board, &self.store);
            sync.record(seq, Op::Created(shape.clone()));
            sync.lane.create(shape.clone())?
        };
        debug!(%board, shape_id = %shape.id, kind = shape.geometry.kind(), "shape committed");

        let stored = match lane::settle(board, reply).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(%board, shape_id = %shape.id, error = %e, "create failed; shape kept until next reload");
                return Err(e);
            }
        };
        if stored.id != shape.id {
            debug!(%board, local = %shape.id, stored = %stored.id, "store assigned identifier");
            self.state.lock().await.rename(board, &shape.id, &stored.id);
        }
        Ok(stored)
    }

    /// Undo the latest shape of `board`: delete it from the store and
    /// refresh the board. Returns `None` if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` or the delete's store error; on error the
    /// stacks are restored. A failed refresh is logged and the board is
    /// repainted from local history instead.
    pub async fn undo(&self, board: &BoardId) -> Result<Option<Shape>, SyncError> {
        let (seq, epoch, shape, reply) = {
            let mut state = self.state.lock().await;
            state.registry.ensure_known(board)?;
            let Some(shape) = state.history.undo(board) else {
                return Ok(None);
            };
            let epoch = state.history.epoch(board);
            let seq = state.next_seq();
            let sync = state.board_sync(board, &self.store);
            sync.record(seq, Op::Deleted(shape.id.clone()));
            match sync.lane.delete(shape.id.clone()) {
                Ok(reply) => (seq, epoch, shape, reply),
                Err(e) => {
                    state.rollback_undo(board, seq, &shape, epoch);
                    return Err(e);
                }
            }
        };

        match lane::settle(board, reply).await {
            Ok(()) => debug!(%board, shape_id = %shape.id, "shape undone"),
            Err(SyncError::Store(StoreError::NotFound(_))) => {
                warn!(%board, shape_id = %shape.id, "undone shape was already gone");
            }
            Err(e) => {
                error!(%board, shape_id = %shape.id, error = %e, "undo delete failed");
                self.state.lock().await.rollback_undo(board, seq, &shape, epoch);
                return Err(e);
            }
        }

        if let Err(e) = self.refresh(board).await {
            warn!(%board, error = %e, "refresh after undo failed; repainting from local history");
            self.repaint(board).await;
        }
        Ok(Some(shape))
    }

    /// Redo the latest undone shape of `board` under a new identifier.
    /// Returns the shape as stored, or `None` if there was nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns `UnknownBoard` or the create's store error; on error the
    /// stacks are restored.
    pub async fn redo(&self, board: &BoardId) -> Result<Option<Shape>, SyncError> {
        let (seq, epoch, redone, reply) = {
            let mut state = self.state.lock().await;
            state.registry.ensure_known(board)?;
            let Some(redone) = state.history.redo(board) else {
                return Ok(None);
            };
            let epoch = state.history.epoch(board);
            let seq = state.next_seq();
            let sync = state.board_sync(board, &self.store);
            sync.record(seq, Op::Created(redone.shape.clone()));
            match sync.lane.create(redone.shape.clone()) {
                Ok(reply) => (seq, epoch, redone, reply),
                Err(e) => {
                    state.rollback_redo(board, seq, &redone, epoch);
                    return Err(e);
                }
            }
        };

        let stored = match lane::settle(board, reply).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(%board, shape_id = %redone.shape.id, error = %e, "redo create failed");
                self.state.lock().await.rollback_redo(board, seq, &redone, epoch);
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        if stored.id != redone.shape.id {
            state.rename(board, &redone.shape.id, &stored.id);
        }
        // A snapshot applied since the redo was issued has drawn or dropped it.
        let repainted = state.boards.get(board).is_some_and(|sync| sync.painted_at >= seq);
        if !repainted && state.registry.is_active(board) && state.history.contains(board, &stored.id) {
            self.sink.draw(&stored);
        }
        debug!(%board, shape_id = %stored.id, retired = %redone.retired, "shape redone");
        Ok(Some(stored))
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    async fn refresh(&self, board: &BoardId) -> Result<LoadOutcome, SyncError> {
        let (ticket, reply) = {
            let mut state = self.state.lock().await;
            self.begin_load(&mut state, board)?
        };
        self.finish_load(board, LoadKind::Refresh, ticket, reply).await
    }

    fn begin_load(&self, state: &mut EngineState, board: &BoardId) -> Result<(u64, Reply<Vec<Shape>>), SyncError> {
        let ticket = state.next_seq();
        let sync = state.board_sync(board, &self.store);
        let reply = sync.lane.list()?;
        sync.snapshots += 1;
        sync.fetches += 1;
        sync.latest_load = ticket;
        debug!(%board, ticket, "load issued");
        Ok((ticket, reply))
    }

    async fn finish_load(
        &self,
        board: &BoardId,
        kind: LoadKind,
        ticket: u64,
        reply: Reply<Vec<Shape>>,
    ) -> Result<LoadOutcome, SyncError> {
        let result = lane::settle(board, reply).await;

        let mut state = self.state.lock().await;
        let active = state.registry.is_active(board);
        let now = state.seq;
        let sync = state.board_sync(board, &self.store);
        sync.fetches = sync.fetches.saturating_sub(1);
        let current = active && sync.latest_load == ticket;
        let fresh = ticket > sync.applied;

        let fetched = match result {
            Ok(shapes) if current && fresh => shapes,
            Ok(_) => {
                sync.snapshot_done();
                warn!(%board, ticket, "discarding stale load");
                return Ok(LoadOutcome::Discarded);
            }
            Err(e) if current => {
                sync.snapshot_done();
                error!(%board, error = %e, "load failed");
                return Err(e);
            }
            Err(e) => {
                sync.snapshot_done();
                warn!(%board, ticket, error = %e, "stale load failed");
                return Ok(LoadOutcome::Discarded);
            }
        };

        let shapes = sync.journal.replay_after(ticket, fetched);
        sync.applied = ticket;
        sync.snapshot_done();
        sync.painted_at = now;
        match kind {
            LoadKind::Replace => state.history.replace_all(board, shapes.clone()),
            LoadKind::Refresh => state.history.refresh(board, shapes.clone()),
        }
        self.paint(&shapes);
        info!(%board, count = shapes.len(), "board loaded");
        Ok(LoadOutcome::Applied { shapes: shapes.len() })
    }

    /// Clear the surface and draw `shapes` in order.
    fn paint(&self, shapes: &[Shape]) {
        self.sink.clear();
        for shape in shapes {
            self.sink.draw(shape);
        }
    }

    async fn repaint(&self, board: &BoardId) {
        let state = self.state.lock().await;
        if state.registry.is_active(board) {
            self.paint(state.history.undo_stack(board));
        }
    }
}
