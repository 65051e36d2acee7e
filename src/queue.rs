//! Min-priority queue with identity tracking.
//!
//! A plain [BinaryHeap](std::collections::BinaryHeap) cannot re-prioritize an element that is
//! already resident, which the search needs in order to lower the f-score of an open cell or to
//! drop a pruned path. [PriorityQueue] keeps a map from item to heap slot so that
//! [decrease_priority](PriorityQueue::decrease_priority) and [remove](PriorityQueue::remove)
//! run in `O(log n)`.
use fxhash::FxHashMap;
use std::cmp::Ordering;
use std::hash::Hash;

#[derive(Clone, Debug)]
struct HeapEntry<T, P> {
    item: T,
    priority: P,
    // Insertion sequence number, used to break priority ties in FIFO order.
    seq: u64,
}

impl<T, P: PartialOrd> HeapEntry<T, P> {
    /// Orders per priority first, then by insertion order so equal priorities pop
    /// deterministically.
    fn precedes(&self, other: &Self) -> bool {
        match self.priority.partial_cmp(&other.priority) {
            Some(Ordering::Less) => true,
            Some(Ordering::Greater) => false,
            _ => self.seq < other.seq,
        }
    }
}

/// Binary min-heap over `T` ordered by `P`, with an index map from item to heap position.
#[derive(Clone, Debug)]
pub struct PriorityQueue<T, P = f64> {
    heap: Vec<HeapEntry<T, P>>,
    positions: FxHashMap<T, usize>,
    next_seq: u64,
}

impl<T, P> Default for PriorityQueue<T, P> {
    fn default() -> Self {
        PriorityQueue {
            heap: Vec::new(),
            positions: FxHashMap::default(),
            next_seq: 0,
        }
    }
}

impl<T, P> PriorityQueue<T, P>
where
    T: Copy + Eq + Hash,
    P: PartialOrd + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PriorityQueue {
            heap: Vec::with_capacity(capacity),
            positions: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// The current priority of `item`, if it is queued.
    pub fn priority(&self, item: &T) -> Option<P> {
        self.positions.get(item).map(|&ix| self.heap[ix].priority)
    }

    /// Removes every item. The tie-breaking sequence restarts so reused queues behave like new
    /// ones.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.positions.clear();
        self.next_seq = 0;
    }

    /// Inserts `item` with `priority`. If the item is already queued its priority is replaced
    /// instead and `false` is returned.
    pub fn push(&mut self, item: T, priority: P) -> bool {
        if self.contains(&item) {
            self.change_priority(&item, priority);
            return false;
        }
        let ix = self.heap.len();
        self.heap.push(HeapEntry {
            item,
            priority,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.positions.insert(item, ix);
        self.sift_up(ix);
        true
    }

    pub fn peek_min(&self) -> Option<(&T, P)> {
        self.heap.first().map(|e| (&e.item, e.priority))
    }

    pub fn pop_min(&mut self) -> Option<(T, P)> {
        if self.heap.is_empty() {
            return None;
        }
        let entry = self.take(0);
        Some((entry.item, entry.priority))
    }

    /// Removes an arbitrary queued item, returning its priority.
    pub fn remove(&mut self, item: &T) -> Option<P> {
        let ix = *self.positions.get(item)?;
        Some(self.take(ix).priority)
    }

    /// Lowers the priority of a queued item. Returns `false` if the item is not queued or
    /// `priority` is not lower than its current one.
    pub fn decrease_priority(&mut self, item: &T, priority: P) -> bool {
        match self.positions.get(item) {
            Some(&ix) if priority < self.heap[ix].priority => {
                self.heap[ix].priority = priority;
                self.sift_up(ix);
                true
            }
            _ => false,
        }
    }

    /// Sets the priority of a queued item in either direction.
    pub fn change_priority(&mut self, item: &T, priority: P) -> bool {
        let Some(&ix) = self.positions.get(item) else {
            return false;
        };
        self.heap[ix].priority = priority;
        let ix = self.sift_up(ix);
        self.sift_down(ix);
        true
    }

    /// Iterates queued items in heap order, which is not priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, P)> + '_ {
        self.heap.iter().map(|e| (&e.item, e.priority))
    }

    fn take(&mut self, ix: usize) -> HeapEntry<T, P> {
        let entry = self.heap.swap_remove(ix);
        self.positions.remove(&entry.item);
        if ix < self.heap.len() {
            // The former last entry now sits in the vacated slot.
            self.positions.insert(self.heap[ix].item, ix);
            let ix = self.sift_up(ix);
            self.sift_down(ix);
        }
        entry
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].item, a);
        self.positions.insert(self.heap[b].item, b);
    }

    fn sift_up(&mut self, mut ix: usize) -> usize {
        while ix > 0 {
            let parent = (ix - 1) / 2;
            if !self.heap[ix].precedes(&self.heap[parent]) {
                break;
            }
            self.swap(ix, parent);
            ix = parent;
        }
        ix
    }

    fn sift_down(&mut self, mut ix: usize) -> usize {
        let n = self.heap.len();
        loop {
            let left = 2 * ix + 1;
            let right = left + 1;
            let mut smallest = ix;
            if left < n && self.heap[left].precedes(&self.heap[smallest]) {
                smallest = left;
            }
            if right < n && self.heap[right].precedes(&self.heap[smallest]) {
                smallest = right;
            }
            if smallest == ix {
                return ix;
            }
            self.swap(ix, smallest);
            ix = smallest;
        }
    }
}
