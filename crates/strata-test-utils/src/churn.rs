//! Insert/erase workload over allocator-backed nodes.
//!
//! Models a keyed container living entirely in the allocator under test:
//! [`NodeMap`] takes its bucket array, every node and every node payload
//! from `A`. Keys `0..keys` are inserted in order and, once past the
//! warm-up, every fifth insertion erases the key inserted five steps
//! earlier. The erase/insert pairs have identical node and payload sizes,
//! which is the steady state a recycling allocator is built for.

use std::iter;
use std::mem;

use allocator_api2::alloc::Allocator;
use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;

const MIN_BUCKETS: usize = 16;

/// Entry stored per key. The node, its payload and its link all come from `A`.
pub struct Node<A: Allocator> {
    /// Key the node was inserted under.
    pub key: u64,
    /// Small string-like payload.
    pub payload: Vec<u8, A>,
    next: Option<Box<Node<A>, A>>,
}

/// Chained hash map from `u64` keys to [`Node`]s.
///
/// Buckets are singly linked lists with head insertion. The bucket array
/// doubles when the map holds more entries than buckets.
pub struct NodeMap<A: Allocator + Clone> {
    buckets: Vec<Option<Box<Node<A>, A>>, A>,
    len: usize,
    alloc: A,
}

impl<A: Allocator + Clone> NodeMap<A> {
    /// Empty map with room for `capacity` entries before the first rehash.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let count = capacity.max(MIN_BUCKETS).next_power_of_two();
        Self {
            buckets: Self::empty_buckets(count, &alloc),
            len: 0,
            alloc,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets currently allocated.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Insert `payload` under `key`. Returns the node it replaced, if any.
    pub fn insert(&mut self, key: u64, payload: Vec<u8, A>) -> Option<Box<Node<A>, A>> {
        let old = self.remove(key);
        if self.len >= self.buckets.len() {
            self.rehash(self.buckets.len() * 2);
        }
        let idx = self.bucket_of(key);
        let next = self.buckets[idx].take();
        self.buckets[idx] = Some(Box::new_in(Node { key, payload, next }, self.alloc.clone()));
        self.len += 1;
        old
    }

    /// The node stored under `key`.
    pub fn get(&self, key: u64) -> Option<&Node<A>> {
        self.chain(self.bucket_of(key)).find(|n| n.key == key)
    }

    /// Unlink and return the node stored under `key`.
    pub fn remove(&mut self, key: u64) -> Option<Box<Node<A>, A>> {
        let idx = self.bucket_of(key);
        let mut link = &mut self.buckets[idx];
        while link.as_ref().is_some_and(|n| n.key != key) {
            link = &mut link.as_mut()?.next;
        }
        let mut node = link.take()?;
        *link = node.next.take();
        self.len -= 1;
        Some(node)
    }

    /// Every node, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Node<A>> + '_ {
        (0..self.buckets.len()).flat_map(move |idx| self.chain(idx))
    }

    fn chain(&self, idx: usize) -> impl Iterator<Item = &Node<A>> + '_ {
        iter::successors(self.buckets[idx].as_deref(), |n| n.next.as_deref())
    }

    fn bucket_of(&self, key: u64) -> usize {
        let bits = self.buckets.len().trailing_zeros();
        (key.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> (64 - bits)) as usize
    }

    fn rehash(&mut self, count: usize) {
        let fresh = Self::empty_buckets(count, &self.alloc);
        let old = mem::replace(&mut self.buckets, fresh);
        for mut head in old {
            while let Some(mut node) = head {
                head = node.next.take();
                let idx = self.bucket_of(node.key);
                node.next = self.buckets[idx].take();
                self.buckets[idx] = Some(node);
            }
        }
    }

    fn empty_buckets(count: usize, alloc: &A) -> Vec<Option<Box<Node<A>, A>>, A> {
        let mut buckets = Vec::with_capacity_in(count, alloc.clone());
        buckets.resize_with(count, || None);
        buckets
    }
}

impl<A: Allocator + Clone> Drop for NodeMap<A> {
    fn drop(&mut self) {
        // Unlink iteratively so long chains do not recurse.
        for head in self.buckets.iter_mut() {
            let mut next = head.take();
            while let Some(mut node) = next {
                next = node.next.take();
            }
        }
    }
}

/// Outcome of [`run_churn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChurnReport {
    /// Keys inserted.
    pub inserted: u64,
    /// Keys erased during the run.
    pub erased: u64,
    /// Keys still present when the run finished.
    pub live: usize,
}

/// Run the workload, calling `checkpoint(i)` after each step `i`.
///
/// The map is sized for `keys` entries up front, so the bucket array is
/// allocated once before the first step. All nodes and the bucket array are
/// released before returning.
pub fn run_churn<A, F>(alloc: &A, keys: u64, mut checkpoint: F) -> ChurnReport
where
    A: Allocator + Clone,
    F: FnMut(u64),
{
    let mut map = NodeMap::with_capacity_in(keys as usize, alloc.clone());
    let mut erased = 0;

    for i in 0..keys {
        let mut payload = Vec::with_capacity_in(2, alloc.clone());
        payload.extend_from_slice(b"42");
        map.insert(i, payload);

        if i > 10 && i % 5 == 0 && map.remove(i - 5).is_some() {
            erased += 1;
        }
        checkpoint(i);
    }

    debug_assert!(map.iter().all(|node| node.payload[..] == b"42"[..]));
    ChurnReport {
        inserted: keys,
        erased,
        live: map.len(),
    }
}
