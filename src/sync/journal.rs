//! Mutations issued while a snapshot (load or clear) is in flight.
//!
//! A snapshot's store request sits somewhere in the board lane. Mutations
//! issued after it reach the store later, so its result does not include
//! them. When the snapshot is applied, entries newer than its sequence
//! number are replayed on top of the fetched shapes.

use crate::shape::{Shape, ShapeId};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    Created(Shape),
    Deleted(ShapeId),
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    seq: u64,
    op: Op,
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<Entry>,
}

impl Journal {
    pub(crate) fn record(&mut self, seq: u64, op: Op) {
        self.entries.push(Entry { seq, op });
    }

    /// Drop the entry of a mutation whose store request failed.
    pub(crate) fn forget(&mut self, seq: u64) {
        self.entries.retain(|e| e.seq != seq);
    }

    /// Follow an identifier change made by the store.
    pub(crate) fn rename(&mut self, from: &ShapeId, to: &ShapeId) {
        for entry in &mut self.entries {
            match &mut entry.op {
                Op::Created(shape) if &shape.id == from => shape.id = to.clone(),
                Op::Deleted(id) if id == from => *id = to.clone(),
                _ => {}
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Apply every entry newer than `seq` to `base`, in issue order.
    pub(crate) fn replay_after(&self, seq: u64, mut base: Vec<Shape>) -> Vec<Shape> {
        for entry in self.entries.iter().filter(|e| e.seq > seq) {
            match &entry.op {
                Op::Created(shape) => {
                    if !base.iter().any(|s| s.id == shape.id) {
                        base.push(shape.clone());
                    }
                }
                Op::Deleted(id) => base.retain(|s| &s.id != id),
                Op::Cleared => base.clear(),
            }
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Geometry, Segment, Style};

    fn line(n: f64) -> Shape {
        Shape::new(Geometry::Line(Segment { x1: 0.0, y1: 0.0, x2: n, y2: n }), &Style::default())
    }

    #[test]
    fn replay_skips_entries_at_or_before_snapshot() {
        let a = line(1.0);
        let b = line(2.0);
        let mut journal = Journal::default();
        journal.record(3, Op::Created(a));
        journal.record(5, Op::Created(b.clone()));

        assert_eq!(journal.replay_after(3, Vec::new()), vec![b]);
    }

    #[test]
    fn replay_applies_creates_and_deletes_in_order() {
        let a = line(1.0);
        let b = line(2.0);
        let mut journal = Journal::default();
        journal.record(2, Op::Created(b.clone()));
        journal.record(3, Op::Deleted(a.id.clone()));

        assert_eq!(journal.replay_after(1, vec![a]), vec![b]);
    }

    #[test]
    fn replay_does_not_duplicate_listed_shape() {
        let a = line(1.0);
        let mut journal = Journal::default();
        journal.record(2, Op::Created(a.clone()));

        assert_eq!(journal.replay_after(1, vec![a.clone()]), vec![a]);
    }

    #[test]
    fn cleared_drops_everything_before_it() {
        let a = line(1.0);
        let b = line(2.0);
        let mut journal = Journal::default();
        journal.record(2, Op::Cleared);
        journal.record(3, Op::Created(b.clone()));

        assert_eq!(journal.replay_after(1, vec![a]), vec![b]);
    }

    #[test]
    fn forget_and_rename() {
        let a = line(1.0);
        let mut journal = Journal::default();
        journal.record(2, Op::Created(a.clone()));
        journal.record(3, Op::Deleted(a.id.clone()));
        journal.forget(3);
        assert_eq!(journal.len(), 1);

        let server = ShapeId::from("server-1");
        journal.rename(&a.id, &server);
        let replayed = journal.replay_after(0, Vec::new());
        assert_eq!(replayed[0].id, server);
    }
}
