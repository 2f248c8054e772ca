use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

/// A discovered URL waiting to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
    pub parent_url: Option<String>,
    pub priority: u32,
}

#[derive(Debug)]
struct Queued {
    entry: FrontierEntry,
    seq: Reverse<u64>,
}

impl Queued {
    fn key(&self) -> (u32, Reverse<u64>) {
        (self.entry.priority, self.seq)
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Per-seed max-priority queue with its visited set.
///
/// Highest priority pops first, equal priorities pop in insertion order. A URL
/// is marked visited the moment it is popped, so duplicates still queued are
/// discarded on their way out.
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<Queued>,
    visited: HashSet<String>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FrontierEntry) {
        let seq = Reverse(self.next_seq);
        self.next_seq += 1;
        self.heap.push(Queued { entry, seq });
    }

    /// Pops the best entry not visited yet and marks it visited.
    pub fn pop_unvisited(&mut self) -> Option<FrontierEntry> {
        while let Some(Queued { entry, .. }) = self.heap.pop() {
            if self.visited.insert(entry.url.clone()) {
                return Some(entry);
            }
        }
        None
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Queued entries, duplicates and already visited ones included.
    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
