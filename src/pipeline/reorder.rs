use std::collections::BTreeMap;

use crate::foundation::core::{FrameBuffer, FrameIndex};

/// Holds out-of-order frames until every earlier frame has been flushed.
#[derive(Debug, Default)]
pub struct ReorderBuffer {
    pending: BTreeMap<u64, FrameBuffer>,
    next: u64,
}

impl ReorderBuffer {
    /// Empty buffer whose flush cursor starts at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next frame index the sink expects.
    pub fn next_to_flush(&self) -> FrameIndex {
        FrameIndex(self.next)
    }

    /// Frames waiting for an earlier gap to fill.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Buffer `frame`; returns `false` (and drops it) when it was already flushed or is a duplicate.
    pub fn insert(&mut self, index: FrameIndex, frame: FrameBuffer) -> bool {
        if index.0 < self.next || self.pending.contains_key(&index.0) {
            return false;
        }
        self.pending.insert(index.0, frame);
        true
    }

    /// Take the frame at the flush cursor if it has arrived, advancing the cursor.
    pub fn pop_ready(&mut self) -> Option<(FrameIndex, FrameBuffer)> {
        let frame = self.pending.remove(&self.next)?;
        let index = FrameIndex(self.next);
        self.next += 1;
        Some((index, frame))
    }

    /// Drop every buffered frame at or beyond `start`; returns how many were dropped.
    pub fn discard_from(&mut self, start: FrameIndex) -> usize {
        self.pending.split_off(&start.0).len()
    }
}
