//! In-flight run tracking for cancellation support

use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Tracks active invocations so they can all be cancelled on shutdown
#[derive(Clone, Default)]
pub struct RunTracker {
    /// Map of invocation_id to cancellation token
    active: Arc<DashMap<String, CancellationToken>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `token` until the returned guard is dropped
    pub fn guard(&self, token: CancellationToken) -> RunGuard {
        let id = Uuid::new_v4().to_string();
        self.active.insert(id.clone(), token);
        RunGuard {
            id,
            tracker: self.clone(),
        }
    }

    /// Cancel every tracked invocation; returns how many there were
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for entry in self.active.iter() {
            entry.value().cancel();
            cancelled += 1;
        }
        cancelled
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Removes its invocation from the tracker when dropped, including when the
/// call future itself is dropped mid-run
pub struct RunGuard {
    id: String,
    tracker: RunTracker,
}

impl RunGuard {
    pub fn invocation_id(&self) -> &str {
        &self.id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.tracker.active.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_untracks_on_drop() {
        let tracker = RunTracker::new();
        {
            let guard = tracker.guard(CancellationToken::new());
            assert!(!guard.invocation_id().is_empty());
            assert_eq!(tracker.active_count(), 1);
        }
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_guards_get_distinct_ids() {
        let tracker = RunTracker::new();
        let first = tracker.guard(CancellationToken::new());
        let second = tracker.guard(CancellationToken::new());

        assert_ne!(first.invocation_id(), second.invocation_id());
        assert_eq!(tracker.active_count(), 2);
    }

    #[test]
    fn test_cancel_all() {
        let tracker = RunTracker::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        let _a = tracker.guard(first.clone());
        let _b = tracker.guard(second.clone());

        assert_eq!(tracker.cancel_all(), 2);
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
    }

    #[test]
    fn test_finished_runs_are_not_cancelled() {
        let tracker = RunTracker::new();
        let token = CancellationToken::new();
        drop(tracker.guard(token.clone()));

        assert_eq!(tracker.cancel_all(), 0);
        assert!(!token.is_cancelled());
    }
}
