//! Task id generation.
//!
//! Ids are chosen by the store, not by SQLite. The default generator is
//! derived from the wall clock in milliseconds; tests use a counter.

use std::fmt;

/// Source of fresh task ids.
pub trait IdGenerator: fmt::Debug + Send {
    /// Produce the next id, or `None` once no larger id exists.
    fn next_id(&mut self) -> Option<i64>;

    /// Called once the store knows the largest id already persisted.
    fn observe(&mut self, _existing_max: i64) {}
}

/// Millisecond wall-clock ids, strictly increasing within the process.
///
/// Two calls in the same millisecond (or a clock that steps backwards)
/// yield `last + 1` instead of a duplicate.
#[derive(Debug, Default)]
pub struct ClockIds {
    last: i64,
}

impl ClockIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ClockIds {
    fn next_id(&mut self) -> Option<i64> {
        let now = chrono::Utc::now().timestamp_millis();
        let id = if now > self.last {
            now
        } else {
            self.last.checked_add(1)?
        };
        self.last = id;
        Some(id)
    }

    fn observe(&mut self, existing_max: i64) {
        self.last = self.last.max(existing_max);
    }
}

/// Deterministic counter ids.
#[derive(Debug)]
pub struct SequentialIds {
    /// `None` once `i64::MAX` has been handed out or observed.
    next: Option<i64>,
}

impl SequentialIds {
    /// Start counting at `first`.
    #[must_use]
    pub fn starting_at(first: i64) -> Self {
        Self { next: Some(first) }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> Option<i64> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(id)
    }

    fn observe(&mut self, existing_max: i64) {
        if self.next.is_some_and(|next| existing_max >= next) {
            self.next = existing_max.checked_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_ids_strictly_increase_within_same_millisecond() {
        let mut ids = ClockIds::new();
        let generated: Vec<i64> = (0..1000).map(|_| ids.next_id().unwrap()).collect();

        for pair in generated.windows(2) {
            assert!(pair[1] > pair[0], "{} !> {}", pair[1], pair[0]);
        }
    }

    #[test]
    fn test_clock_ids_are_millisecond_scale() {
        let before = chrono::Utc::now().timestamp_millis();
        let id = ClockIds::new().next_id().unwrap();
        assert!(id >= before);
    }

    #[test]
    fn test_clock_ids_skip_past_existing_rows() {
        let mut ids = ClockIds::new();
        let far_future = chrono::Utc::now().timestamp_millis() + 60_000;
        ids.observe(far_future);
        assert_eq!(ids.next_id(), Some(far_future + 1));
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::starting_at(10);
        assert_eq!(ids.next_id(), Some(10));
        assert_eq!(ids.next_id(), Some(11));

        ids.observe(40);
        assert_eq!(ids.next_id(), Some(41));

        // Lower maxima never rewind the counter
        ids.observe(3);
        assert_eq!(ids.next_id(), Some(42));
    }

    #[test]
    fn test_ids_exhausted_at_max() {
        let mut clock = ClockIds::new();
        clock.observe(i64::MAX);
        assert_eq!(clock.next_id(), None);

        let mut seq = SequentialIds::default();
        seq.observe(i64::MAX);
        assert_eq!(seq.next_id(), None);

        let mut last = SequentialIds::starting_at(i64::MAX);
        assert_eq!(last.next_id(), Some(i64::MAX));
        assert_eq!(last.next_id(), None);
    }
}
