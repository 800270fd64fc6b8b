//! Priority indexes over the vocabulary collection
//!
//! The UI needs two orderings over the same records: "due soonest" for
//! the study queue and "reviewed most recently" for the vocabulary list.
//! Both are binary heaps whose entries are handles to the one shared
//! [`Vocab`] record, so a committed review is immediately visible to both
//! views and only the heap positions need fixing up. A text → slot map
//! keeps removal at O(log n) instead of a linear scan.
//!
//! Keys are always read from the record's current card at comparison
//! time; the index never caches a copy of the sort key. The one rule a
//! caller must follow is to remove a record before mutating its key and
//! reinsert it afterwards, which is what [`PriorityIndex::reposition`]
//! does.

use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use super::models::Vocab;

/// Shared handle to a vocabulary record; the collection and both indexes
/// all point at the same allocation.
pub type SharedVocab = Rc<RefCell<Vocab>>;

/// Sort key of the due index: soonest due date first.
pub type DueKey = DateTime<Utc>;

/// Sort key of the recency index: latest review first. Never-reviewed
/// records (`last_review == None`) sort last.
pub type RecencyKey = Reverse<Option<DateTime<Utc>>>;

pub fn due_key(vocab: &Vocab) -> DueKey {
    vocab.card.due
}

pub fn recency_key(vocab: &Vocab) -> RecencyKey {
    Reverse(vocab.card.last_review)
}

/// Binary min-heap over shared vocabulary records, keyed by a field of
/// the record's card. Records are identified by their `text`, which must
/// be unique within one index.
#[derive(Debug)]
pub struct PriorityIndex<K: Ord> {
    key_of: fn(&Vocab) -> K,
    heap: Vec<SharedVocab>,
    /// text → current position in `heap`
    slots: HashMap<String, usize>,
}

impl<K: Ord> PriorityIndex<K> {
    pub fn new(key_of: fn(&Vocab) -> K) -> Self {
        Self {
            key_of,
            heap: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Insert a record handle. O(log n).
    pub fn insert(&mut self, item: SharedVocab) {
        let pos = self.heap.len();
        self.slots.insert(item.borrow().text.clone(), pos);
        self.heap.push(item);
        self.sift_up(pos);
    }

    /// Remove the record stored under `text`, if present. O(log n).
    pub fn remove(&mut self, text: &str) -> Option<SharedVocab> {
        let pos = self.slots.remove(text)?;
        let last = self.heap.len() - 1;

        if pos == last {
            return self.heap.pop();
        }

        self.heap.swap(pos, last);
        let removed = self.heap.pop();
        self.slots.insert(self.heap[pos].borrow().text.clone(), pos);
        self.sift_down(pos);
        self.sift_up(pos);
        removed
    }

    /// Re-home a record whose sort key changed: remove, then reinsert
    /// under the key's current value. O(log n).
    pub fn reposition(&mut self, item: &SharedVocab) {
        let text = item.borrow().text.clone();
        self.remove(&text);
        self.insert(Rc::clone(item));
    }

    /// Snapshot of the `limit` front records in key order. Peek only; the
    /// live heap is untouched. Equal keys order by `text`, so the result
    /// is stable within a call.
    pub fn top_k(&self, limit: usize) -> Vec<SharedVocab> {
        let take = limit.min(self.heap.len());
        let mut scratch = self.heap.clone();
        let mut front = Vec::with_capacity(take);

        while front.len() < take {
            let last = scratch.len() - 1;
            scratch.swap(0, last);
            if let Some(item) = scratch.pop() {
                front.push(item);
            }
            sift_down_in(&mut scratch, 0, self.key_of);
        }

        front
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !precedes(&self.heap, pos, parent, self.key_of) {
                break;
            }
            self.swap_slots(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut smallest = pos;
            for child in [2 * pos + 1, 2 * pos + 2] {
                if child < self.heap.len() && precedes(&self.heap, child, smallest, self.key_of) {
                    smallest = child;
                }
            }
            if smallest == pos {
                break;
            }
            self.swap_slots(pos, smallest);
            pos = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].borrow().text.clone(), a);
        self.slots.insert(self.heap[b].borrow().text.clone(), b);
    }
}

/// Heap ordering: by extracted key, then by text.
fn precedes<K: Ord>(heap: &[SharedVocab], a: usize, b: usize, key_of: fn(&Vocab) -> K) -> bool {
    let item_a = heap[a].borrow();
    let item_b = heap[b].borrow();
    match key_of(&item_a).cmp(&key_of(&item_b)) {
        Ordering::Equal => item_a.text < item_b.text,
        ordering => ordering == Ordering::Less,
    }
}

/// `sift_down` over a detached buffer; used by [`PriorityIndex::top_k`]
/// on its scratch copy, where slot bookkeeping does not apply.
fn sift_down_in<K: Ord>(heap: &mut [SharedVocab], mut pos: usize, key_of: fn(&Vocab) -> K) {
    loop {
        let mut smallest = pos;
        for child in [2 * pos + 1, 2 * pos + 2] {
            if child < heap.len() && precedes(heap, child, smallest, key_of) {
                smallest = child;
            }
        }
        if smallest == pos {
            return;
        }
        heap.swap(pos, smallest);
        pos = smallest;
    }
}
