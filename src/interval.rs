use std::rc::Rc;

use crate::error::{Error, Result};

/// A closed interval `[left, right]` carrying an opaque payload.
///
/// Pure value type: read-only accessors, no state beyond its endpoints and
/// payload. `Interval` never appears bare inside the index — callers wrap
/// it in [`IntervalHandle`] before handing it to [`crate::IntervalSkipList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval<K, V> {
    left: K,
    right: K,
    value: V,
}

/// Reference-counted handle to an [`Interval`].
///
/// The index stores these handles, never the interval's content directly —
/// cloning a handle is a refcount bump, not a copy. The caller's own clone
/// keeps the payload alive independent of however long the interval spends
/// inside the index. Two handles are the *same* interval, for marker
/// bookkeeping purposes, iff they point at the same allocation
/// ([`Rc::ptr_eq`]); two handles with equal endpoints and payload but
/// distinct allocations are treated as distinct intervals, so each remains
/// independently removable.
pub type IntervalHandle<K, V> = Rc<Interval<K, V>>;

impl<K: Ord + Clone, V> Interval<K, V> {
    /// Construct a new interval. Fails if `left > right`.
    pub fn new(left: K, right: K, value: V) -> Result<Self> {
        if left > right {
            return Err(Error::InvariantViolation(
                "interval left endpoint must not exceed right endpoint".into(),
            ));
        }
        Ok(Interval { left, right, value })
    }

    /// Construct a new interval wrapped in a handle, ready for `insert`.
    pub fn new_handle(left: K, right: K, value: V) -> Result<IntervalHandle<K, V>> {
        Ok(Rc::new(Self::new(left, right, value)?))
    }

    /// The left (lower) endpoint.
    pub fn left(&self) -> &K {
        &self.left
    }

    /// The right (upper) endpoint.
    pub fn right(&self) -> &K {
        &self.right
    }

    /// The payload carried by this interval.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Does this interval contain the point `k`?
    pub fn contains(&self, k: &K) -> bool {
        &self.left <= k && k <= &self.right
    }

    /// Does this interval cover the closed segment `[a, b]`?
    ///
    /// Used by the marker-adjustment protocol to decide whether a skip-list
    /// edge between two endpoint keys lies entirely inside this interval.
    pub fn contains_interval(&self, a: &K, b: &K) -> bool {
        &self.left <= a && b <= &self.right
    }
}
