use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A term with its count, ordered so that the *worse* entry is greater:
/// lower count first, and among equal counts the lexicographically larger term.
/// The heap top is then always the next entry to evict.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ranked {
    count: u64,
    term: String,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.term.cmp(&other.term))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded top-K selection by count.
/// - Holds at most `capacity` entries
/// - Evicts by ascending count, ties by descending term
///
/// Complexity: O(n log k) for n offers, O(k) memory.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Ranked>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1 << 16) + 1),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offer one candidate; returns whether it is (currently) kept.
    pub fn offer(&mut self, term: &str, count: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Ranked {
                count,
                term: term.to_string(),
            });
            return true;
        }
        let beats_worst = match self.heap.peek() {
            Some(worst) => {
                count > worst.count || (count == worst.count && term < worst.term.as_str())
            }
            None => false,
        };
        if beats_worst {
            self.heap.pop();
            self.heap.push(Ranked {
                count,
                term: term.to_string(),
            });
        }
        beats_worst
    }

    /// Kept entries, best first: count descending, ties by ascending term
    pub fn into_sorted_vec(self) -> Vec<(String, u64)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|r| (r.term, r.count))
            .collect()
    }
}
