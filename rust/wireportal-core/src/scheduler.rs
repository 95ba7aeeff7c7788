use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::world::{Block, Location, PlayerId};

/// Immutable snapshot carried across the commit delay. Holds coordinates and ids only;
/// everything live is re-read when the commit fires.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PendingCommit {
    pub player: PlayerId,
    pub player_name: String,
    /// The activated cap as it was at schedule time.
    pub start: Block,
    pub origin: Location,
    pub destination: Location,
}

/// Single-shot deferred execution on the host's tick loop.
pub trait Scheduler {
    fn schedule(&mut self, delay_ticks: u32, commit: PendingCommit);
}

struct Entry {
    due: u64,
    // Monotonic increasing sequence to keep pop order deterministic
    seq: u64,
    commit: PendingCommit,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the earliest due, then earliest scheduled
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic tick-indexed queue of pending commits.
#[derive(Default)]
pub struct TickScheduler {
    tick: u64,
    seq: u64,
    queue: BinaryHeap<Entry>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Tick at which the next commit is due, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|e| e.due)
    }

    /// Move the clock to `tick` and return every commit now due, in schedule order.
    pub fn advance(&mut self, tick: u64) -> Vec<PendingCommit> {
        self.tick = self.tick.max(tick);
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|e| e.due <= self.tick) {
            if let Some(e) = self.queue.pop() {
                due.push(e.commit);
            }
        }
        due
    }
}

impl Scheduler for TickScheduler {
    fn schedule(&mut self, delay_ticks: u32, commit: PendingCommit) {
        self.seq = self.seq.wrapping_add(1);
        self.queue.push(Entry { due: self.tick + u64::from(delay_ticks), seq: self.seq, commit });
    }
}
