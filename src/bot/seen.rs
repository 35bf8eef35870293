//! Bounded memory of inbox items already handed to the pipeline.

use std::collections::{HashSet, VecDeque};

/// Remembers the most recent `capacity` fullnames, evicting the oldest.
#[derive(Debug)]
pub struct SeenItems {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl SeenItems {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Record `fullname`; returns `false` if it was already present.
    pub fn insert(&mut self, fullname: &str) -> bool {
        if self.members.contains(fullname) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(fullname.to_string());
        self.members.insert(fullname.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
