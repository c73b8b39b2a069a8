//! FIFO compilation cache keyed by `(target, full source text)` (`spec.md` §4.10).

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::result::{CompilationResult, Target};

type Key = (Target, String);

pub struct Cache {
    capacity: usize,
    order: VecDeque<Key>,
    entries: FxHashMap<Key, Rc<CompilationResult>>,
    hits: u64,
    misses: u64,
}

impl Cache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::new(), entries: FxHashMap::default(), hits: 0, misses: 0 }
    }

    pub fn get(&mut self, target: Target, source: &str) -> Option<Rc<CompilationResult>> {
        let key: Key = (target, source.to_string());
        match self.entries.get(&key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts a freshly compiled result, evicting the oldest entry first if
    /// at capacity. A key already present is left untouched (the driver only
    /// calls this after a confirmed miss).
    pub fn insert(&mut self, target: Target, source: String, result: Rc<CompilationResult>) {
        let key = (target, source);
        if self.entries.contains_key(&key) {
            return;
        }
        if self.capacity > 0 && self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, result);
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
