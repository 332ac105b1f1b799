//! Render sinks — where the sync engine sends what should be on screen.
//!
//! The engine only ever calls `clear` followed by `draw` in sequence order,
//! so a sink never needs to inspect history. `Surface` records the painted
//! shapes (tests and the shell's `show` command read it back);
//! `ConsoleSink` prints each call for the interactive shell.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::shape::Shape;

pub trait RenderSink: Send + Sync {
    fn clear(&self);

    fn draw(&self, shape: &Shape);
}

// =============================================================================
// SURFACE
// =============================================================================

#[derive(Debug, Default)]
struct SurfaceState {
    painted: Vec<Shape>,
    clears: usize,
}

/// In-memory canvas: the shapes drawn since the last clear, in draw order.
#[derive(Debug, Default)]
pub struct Surface {
    state: Mutex<SurfaceState>,
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn painted(&self) -> Vec<Shape> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).painted.clone()
    }

    /// Number of `clear` calls received so far.
    #[must_use]
    pub fn clears(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clears
    }
}

impl RenderSink for Surface {
    fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.painted.clear();
        state.clears += 1;
    }

    fn draw(&self, shape: &Shape) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).painted.push(shape.clone());
    }
}

// =============================================================================
// CONSOLE
// =============================================================================

/// Prints render calls to stdout and mirrors them into a `Surface`.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    surface: Surface,
}

impl ConsoleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

impl RenderSink for ConsoleSink {
    fn clear(&self) {
        self.surface.clear();
        let _ = writeln!(std::io::stdout(), "~ canvas cleared");
    }

    fn draw(&self, shape: &Shape) {
        self.surface.draw(shape);
        let _ = writeln!(std::io::stdout(), "+ {shape}");
    }
}
