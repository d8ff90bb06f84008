/// Unsaved-change tracking
///
/// Every content mutation bumps a revision. A save snapshots the revision it is
/// about to persist and, on success, acknowledges through that revision only, so
/// edits made while the save was in flight keep the model dirty.

/// Point in the edit history captured when a save starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveCheckpoint {
    epoch: u64,
    revision: u64,
}

impl SaveCheckpoint {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Derives the dirty flag from a revision counter and an acknowledged-through pointer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    revision: u64,
    acknowledged: u64,
    /// Bumped on load/reset; checkpoints from an older epoch are ignored
    epoch: u64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a content mutation
    pub fn mark(&mut self) {
        self.revision += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.revision > self.acknowledged
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn checkpoint(&self) -> SaveCheckpoint {
        SaveCheckpoint {
            epoch: self.epoch,
            revision: self.revision,
        }
    }

    /// Acknowledge a successful persist of `checkpoint`
    ///
    /// Returns `false` when the checkpoint belongs to a workflow that has since been
    /// replaced, in which case nothing changes.
    pub fn acknowledge(&mut self, checkpoint: SaveCheckpoint) -> bool {
        if checkpoint.epoch != self.epoch {
            return false;
        }
        self.acknowledged = self.acknowledged.max(checkpoint.revision);
        true
    }

    /// Treat everything up to now as persisted
    pub fn mark_saved(&mut self) {
        self.acknowledged = self.revision;
    }

    /// Start a fresh history for a newly loaded or cleared workflow
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.revision = 0;
        self.acknowledged = 0;
    }
}
