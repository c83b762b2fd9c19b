//! Bounded deque for the notification history
//!
//! Fixed capacity, oldest entries are evicted first.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct BoundedDeque<T> {
    cap: usize,
    buf: VecDeque<T>,
}

impl<T> BoundedDeque<T> {
    /// A capacity of 0 turns every push into a no-op.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            buf: VecDeque::with_capacity(cap.min(1024)),
        }
    }

    /// Push a value, returning the evicted oldest one when full
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.cap == 0 {
            return None;
        }
        let evicted = if self.buf.len() == self.cap {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// Newest to oldest
    pub fn iter_rev(&self) -> impl Iterator<Item = &T> {
        self.buf.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }
}

impl<T> Default for BoundedDeque<T> {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_returns_oldest() {
        let mut deque = BoundedDeque::new(2);
        assert_eq!(deque.push("a"), None);
        assert_eq!(deque.push("b"), None);
        assert_eq!(deque.push("c"), Some("a"));
        assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(deque.last(), Some(&"c"));
    }

    #[test]
    fn test_zero_capacity() {
        let mut deque = BoundedDeque::new(0);
        deque.push(1);
        assert!(deque.is_empty());
    }
}
