//! Transaction journal seam.
//!
//! On-chain, a reverted call leaves no trace. Off-chain collaborators need
//! an explicit journal to get the same all-or-nothing behavior: the
//! manager takes a checkpoint before its first write and either commits
//! or reverts to it.

use crate::VenueResult;

/// Opaque checkpoint handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint(pub u64);

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait StateJournal: Send + Sync {
    /// Record the current state of every collaborator.
    fn checkpoint(&self) -> Checkpoint;

    /// Discard the checkpoint and keep all writes made since.
    fn commit(&self, checkpoint: Checkpoint) -> VenueResult<()>;

    /// Restore the state recorded at the checkpoint.
    fn revert(&self, checkpoint: Checkpoint) -> VenueResult<()>;

    /// Current block time (Unix seconds).
    fn block_timestamp(&self) -> u64;
}
