use std::collections::HashSet;

/// Notification ids handled since the process started.
///
/// Nothing is persisted: after a restart, mails the mailbox still reports
/// as unread are processed again.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id`; returns `false` if it had been seen before.
    pub fn mark_seen(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_owned())
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_sighting_is_rejected() {
        let mut dedup = DedupTracker::new();
        assert!(dedup.mark_seen("m1"));
        assert!(!dedup.mark_seen("m1"));
        assert!(dedup.mark_seen("m2"));
        assert!(dedup.is_seen("m1"));
        assert!(!dedup.is_seen("m3"));
        assert_eq!(dedup.len(), 2);
    }
}
