//! Linear undo/redo over immutable snapshots of the mask set.
//!
//! Each committed edit pushes the state *before* the edit onto `past`. Undo
//! moves the current state onto `future` and hands back the top of `past`;
//! redo is the mirror image. A new edit clears `future`. There is no branching.
//!
//! Snapshots share their mask and group vectors with the store through `Arc`,
//! so undo and redo only move pointers.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::mask::{Mask, MaskGroup};

/// Immutable copy of the full mask set at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    masks: Arc<Vec<Mask>>,
    groups: Arc<Vec<MaskGroup>>,
    label: String,
}

impl HistorySnapshot {
    /// Wraps vectors already shared with the live store.
    pub fn from_shared(
        masks: Arc<Vec<Mask>>,
        groups: Arc<Vec<MaskGroup>>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            masks,
            groups,
            label: label.into(),
        }
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn groups(&self) -> &[MaskGroup] {
        &self.groups
    }

    /// Description of the edit that followed this snapshot.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shared_masks(&self) -> &Arc<Vec<Mask>> {
        &self.masks
    }

    pub fn into_parts(self) -> (Arc<Vec<Mask>>, Arc<Vec<MaskGroup>>) {
        (self.masks, self.groups)
    }
}

/// Bounded linear history.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistorySnapshot>,
    future: Vec<HistorySnapshot>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Records the state before a committed edit and clears the redo stack.
    pub fn record(&mut self, before: HistorySnapshot) {
        self.past.push_back(before);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Returns the state to restore, parking `current` on the redo stack.
    pub fn undo(&mut self, current: HistorySnapshot) -> Option<HistorySnapshot> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Returns the state to restore, parking `current` on the undo stack.
    pub fn redo(&mut self, current: HistorySnapshot) -> Option<HistorySnapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Label of the edit that the next undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(HistorySnapshot::label)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(poolviz_core::constants::HISTORY_MAX_DEPTH)
    }
}
