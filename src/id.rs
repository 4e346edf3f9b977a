use serde::{Deserialize, Serialize};

/// Monotonic ID generator shared by treaties, negotiations and crises.
/// No two records of any kind share an ID, so an event's `*_id` field is
/// unambiguous across the whole registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u64) -> Self {
        Self { next: start }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Make sure future IDs stay above `used`. Restoring a snapshot calls this
    /// for every stored record so a stale counter can never hand out a live ID.
    pub fn reserve_past(&mut self, used: u64) {
        if used >= self.next {
            self.next = used + 1;
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
