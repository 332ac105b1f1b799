//! Per-board request lane.
//!
//! Every store request for a board goes through that board's lane: an
//! unbounded queue drained by one background task, one request at a time,
//! in the order requests were submitted. Submission never blocks, so the
//! engine can enqueue while holding its state lock and the enqueue order is
//! the issue order. A delete is therefore never seen by the store before
//! the create it undoes, and a list sees every mutation issued before it.
//!
//! When a create comes back under an identifier the store assigned, the lane
//! records the alias before running the next job. Deletes resolve their
//! identifier through it when they run, so a delete queued against the
//! local identifier reaches the stored shape.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::SyncError;
use crate::board::BoardId;
use crate::shape::{Shape, ShapeId};
use crate::store::{ShapeStore, StoreError};

type Job = Box<dyn FnOnce(Arc<dyn ShapeStore>, BoardId) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Pending completion of a submitted request.
pub(crate) type Reply<T> = oneshot::Receiver<Result<T, StoreError>>;

type Aliases = Arc<Mutex<HashMap<ShapeId, ShapeId>>>;

pub(crate) struct Lane {
    board: BoardId,
    tx: mpsc::UnboundedSender<Job>,
    /// Local identifier to store-assigned identifier.
    aliases: Aliases,
}

impl Lane {
    /// Start the worker for `board`. Must be called inside a tokio runtime.
    pub(crate) fn spawn(board: BoardId, store: Arc<dyn ShapeStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker_board = board.clone();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job(Arc::clone(&store), worker_board.clone()).await;
            }
            debug!(board = %worker_board, "store lane closed");
        });
        Self { board, tx, aliases: Aliases::default() }
    }

    fn submit<T, F, Fut>(&self, op: F) -> Result<Reply<T>, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn ShapeStore>, BoardId) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |store, board| {
            Box::pin(async move {
                // The caller may have stopped waiting; the store effect stands.
                let _ = reply_tx.send(op(store, board).await);
            })
        });
        self.tx
            .send(job)
            .map_err(|_| SyncError::LaneClosed(self.board.clone()))?;
        Ok(reply_rx)
    }

    pub(crate) fn list(&self) -> Result<Reply<Vec<Shape>>, SyncError> {
        self.submit(|store, board| async move { store.list(&board).await })
    }

    pub(crate) fn create(&self, shape: Shape) -> Result<Reply<Shape>, SyncError> {
        let aliases = Arc::clone(&self.aliases);
        self.submit(move |store, board| async move {
            store.create(&board, &shape).await.inspect(|stored| {
                if stored.id != shape.id {
                    aliases
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(shape.id.clone(), stored.id.clone());
                }
            })
        })
    }

    pub(crate) fn delete(&self, id: ShapeId) -> Result<Reply<()>, SyncError> {
        let aliases = Arc::clone(&self.aliases);
        self.submit(move |store, board| async move {
            let resolved = aliases.lock().unwrap_or_else(PoisonError::into_inner).get(&id).cloned();
            let id = resolved.unwrap_or(id);
            store.delete(&board, &id).await
        })
    }

    pub(crate) fn delete_all(&self) -> Result<Reply<()>, SyncError> {
        self.submit(|store, board| async move { store.delete_all(&board).await })
    }
}

/// Wait for a submitted request to finish.
pub(crate) async fn settle<T>(board: &BoardId, reply: Reply<T>) -> Result<T, SyncError> {
    reply
        .await
        .map_err(|_| SyncError::LaneClosed(board.clone()))?
        .map_err(SyncError::from)
}
