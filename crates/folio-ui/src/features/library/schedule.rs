//! Deferred settle refreshes represented as data.
//!
//! Hosts read [`SettleSchedule::next_due`] to arm a timer; tests advance a
//! virtual clock instead.

/// Pending one-shot refreshes, keyed by due time in epoch milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettleSchedule {
    due: Vec<i64>,
}

impl SettleSchedule {
    /// Queue a refresh at `due_at_ms`.
    pub fn schedule(&mut self, due_at_ms: i64) {
        self.due.push(due_at_ms);
    }

    /// Remove every entry due at or before `now_ms`, returning how many fired.
    pub fn take_due(&mut self, now_ms: i64) -> usize {
        let before = self.due.len();
        self.due.retain(|due| *due > now_ms);
        before - self.due.len()
    }

    /// Earliest due time, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<i64> {
        self.due.iter().copied().min()
    }

    /// Number of queued refreshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.due.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}
