use std::collections::VecDeque;

use num_bigint::BigInt;
use tracing::debug;

use crate::engine::Mode;
use crate::vector::Vector2;

/// Inverse data for one mutating primitive.
///
/// Popped operands are stored as `Option<BigInt>`: `None` means the pop
/// found the stack empty and produced zero, so undo must not push anything
/// back for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Pointer moved; `from` is the previous position.
    Move { from: Vector2 },
    /// Velocity replaced; `from` is the previous velocity.
    Accelerate { from: Vector2 },
    /// A conditional arrow popped `popped` and replaced the velocity.
    Branch { popped: Option<BigInt>, from: Vector2 },
    /// Popped `a` then `b`, pushed one result.
    Math { a: Option<BigInt>, b: Option<BigInt> },
    /// Popped one value, pushed 0 or 1.
    Not { popped: Option<BigInt> },
    /// Popped `a` then `b`, pushed 0 or 1.
    GreaterThan { a: Option<BigInt>, b: Option<BigInt> },
    ModeChange { from: Mode },
    /// Popped one value, pushed it twice.
    Duplicate { popped: Option<BigInt> },
    /// Popped `a` then `b`, pushed `a` then `b`.
    Swap { a: Option<BigInt>, b: Option<BigInt> },
    Discard { popped: Option<BigInt> },
    /// Popped `y`, `x`, `v`. `previous` is the overwritten cell, absent if
    /// the write was skipped.
    Place {
        y: Option<BigInt>,
        x: Option<BigInt>,
        v: Option<BigInt>,
        previous: Option<(usize, usize, char)>,
    },
    /// Popped `y`, `x`, pushed one value.
    Grab { y: Option<BigInt>, x: Option<BigInt> },
    /// Pushed one value.
    PushLiteral,
    PrintInt { popped: Option<BigInt>, text: String },
    PrintChar { popped: Option<BigInt>, text: String },
    /// Pushed a digit taken from input.
    ReadInt { digit: u8 },
    /// Pushed a character taken from input.
    ReadChar { ch: char },
}

/// Per-step history of deltas.
///
/// Primitives [`record`](DeltaLog::record) deltas in the order they are
/// applied; [`commit`](DeltaLog::commit) closes the step as one group.
/// [`pop`](DeltaLog::pop) hands back the newest group ordered newest delta
/// first, which is the order to undo it in.
pub trait DeltaLog {
    fn record(&mut self, delta: Delta);
    fn commit(&mut self);
    fn pop(&mut self) -> Option<Vec<Delta>>;
    /// Number of committed groups available to undo.
    fn depth(&self) -> usize;
}

/// A log that keeps nothing; used when reversal is not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl DeltaLog for NullLog {
    #[inline(always)]
    fn record(&mut self, _delta: Delta) {}

    #[inline(always)]
    fn commit(&mut self) {}

    fn pop(&mut self) -> Option<Vec<Delta>> {
        None
    }

    fn depth(&self) -> usize {
        0
    }
}

/// A log that keeps committed groups, optionally capped at `limit` groups
/// with the oldest evicted first.
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    groups: VecDeque<Vec<Delta>>,
    pending: Vec<Delta>,
    limit: Option<usize>,
}

impl RecordingLog {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl DeltaLog for RecordingLog {
    fn record(&mut self, delta: Delta) {
        self.pending.push(delta);
    }

    fn commit(&mut self) {
        let mut group = std::mem::take(&mut self.pending);
        group.reverse();
        self.groups.push_back(group);
        if let Some(limit) = self.limit {
            while self.groups.len() > limit {
                self.groups.pop_front();
                debug!(limit, "evicted oldest delta group");
            }
        }
    }

    fn pop(&mut self) -> Option<Vec<Delta>> {
        self.groups.pop_back()
    }

    fn depth(&self) -> usize {
        self.groups.len()
    }
}
