//! One-shot placement commitment.

use std::time::Instant;

use crate::pose::Pose;

use super::error::CommitRejected;

/// The frozen pose of a placed object.
///
/// Created exactly once per session on the first valid commit; never
/// mutated afterward, invalidated when the session restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRecord {
    /// The committed pose, an immutable snapshot of the candidate.
    pub pose: Pose,
    /// When the placement was committed.
    pub placed_at: Instant,
}

/// Transitions a candidate pose into a fixed anchor, irreversibly within a
/// session.
#[derive(Debug, Default)]
pub struct PlacementCommitter {
    record: Option<PlacementRecord>,
}

impl PlacementCommitter {
    /// Create a committer with no placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the candidate pose.
    ///
    /// Rejected when no candidate is available or a record already exists;
    /// a second invocation is a no-op, never an overwrite.
    pub fn commit(
        &mut self,
        candidate: Option<Pose>,
        now: Instant,
    ) -> Result<PlacementRecord, CommitRejected> {
        if self.record.is_some() {
            return Err(CommitRejected::AlreadyPlaced);
        }
        let pose = candidate.ok_or(CommitRejected::NoCandidatePose)?;
        let record = PlacementRecord {
            pose,
            placed_at: now,
        };
        self.record = Some(record);
        Ok(record)
    }

    /// The committed record, if placement happened.
    pub fn record(&self) -> Option<&PlacementRecord> {
        self.record.as_ref()
    }

    /// Whether an object has been placed.
    pub fn is_placed(&self) -> bool {
        self.record.is_some()
    }

    /// Invalidate the record for a session restart.
    pub fn reset(&mut self) {
        self.record = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_freezes_pose() {
        let mut committer = PlacementCommitter::new();
        let pose = Pose::identity();
        let record = committer.commit(Some(pose), Instant::now()).unwrap();
        assert_eq!(record.pose, pose);
        assert!(committer.is_placed());
    }

    #[test]
    fn test_commit_without_candidate_is_rejected() {
        let mut committer = PlacementCommitter::new();
        assert_eq!(
            committer.commit(None, Instant::now()),
            Err(CommitRejected::NoCandidatePose)
        );
        assert!(!committer.is_placed());
    }

    #[test]
    fn test_second_commit_is_rejected_not_overwritten() {
        let mut committer = PlacementCommitter::new();
        let first = committer
            .commit(Some(Pose::identity()), Instant::now())
            .unwrap();

        let other = Pose::from_raw([1.0, 1.0, 1.0], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            committer.commit(Some(other), Instant::now()),
            Err(CommitRejected::AlreadyPlaced)
        );
        assert_eq!(committer.record().unwrap().pose, first.pose);
    }

    #[test]
    fn test_reset_invalidates_record() {
        let mut committer = PlacementCommitter::new();
        committer
            .commit(Some(Pose::identity()), Instant::now())
            .unwrap();
        committer.reset();
        assert!(committer.record().is_none());
    }
}
