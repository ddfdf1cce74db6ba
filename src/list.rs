use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::interval::IntervalHandle;
use crate::node::{Node, NodeId};

/// Upper bound on a node's level. Source material uses 48; at
/// `promotion_probability = 0.5` this bounds the index to roughly 2^48
/// endpoints before a node could theoretically need another level.
pub const MAX_LEVEL: usize = 48;

const HEADER: NodeId = 0;

/// Construction knobs for an [`IntervalSkipList`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Hard cap on a node's level. Defaults to [`MAX_LEVEL`].
    pub max_level: usize,
    /// Probability of promoting a node to the next level during random
    /// level generation. Defaults to 0.5.
    pub promotion_probability: f64,
    /// Fixed RNG seed, for deterministic tests. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_level: MAX_LEVEL,
            promotion_probability: 0.5,
            seed: None,
        }
    }
}

/// Diagnostic snapshot of an [`IntervalSkipList`]'s internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub node_count: usize,
    pub max_level: usize,
    pub marker_entries: usize,
}

/// A dynamic interval skip list answering stabbing queries in expected
/// `O(log n + k)`.
///
/// Nodes live in a slab (`Vec<Option<Node<K, V>>>`); freed slots are
/// reused via a free list rather than shrinking the slab. Slot 0 is
/// always the header sentinel and is never freed.
pub struct IntervalSkipList<K, V> {
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    max_level: usize,
    options_max_level: usize,
    promotion_probability: f64,
    len: usize,
    rng: StdRng,
}

impl<K: Ord + Clone, V> IntervalSkipList<K, V> {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_options(Options {
            seed: Some(seed),
            ..Options::default()
        })
    }

    pub fn with_options(options: Options) -> Self {
        let options_max_level = options.max_level.min(MAX_LEVEL);
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        log::debug!(
            "new interval skip list: max_level={options_max_level} p={}",
            options.promotion_probability
        );
        IntervalSkipList {
            nodes: vec![Some(Node::new_header(options_max_level))],
            free: Vec::new(),
            max_level: 0,
            options_max_level,
            promotion_probability: options.promotion_probability,
            len: 0,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stats(&self) -> Stats {
        let marker_entries = self
            .nodes
            .iter()
            .flatten()
            .map(|n| {
                let edge_entries: usize = (0..=n.top_level).map(|l| n.markers_at(l).len()).sum();
                edge_entries + n.eq_markers.len()
            })
            .sum();
        Stats {
            node_count: self.len,
            max_level: self.max_level,
            marker_entries,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let (_, candidate) = self.search(key);
        matches!(candidate, Some(id) if self.node(id).key.as_ref() == Some(key))
    }

    /// Insert `interval` into the index, creating or reusing endpoint
    /// nodes as needed and placing its markers.
    pub fn insert(&mut self, interval: IntervalHandle<K, V>) -> Result<()> {
        let left_key = interval.left().clone();
        let right_key = interval.right().clone();

        let left_id = self.insert_endpoint_node(&left_key);
        let right_id = self.insert_endpoint_node(&right_key);

        self.node_mut(left_id).owner_count += 1;
        self.node_mut(right_id).owner_count += 1;

        self.place_markers(&interval, left_id, right_id);
        Ok(())
    }

    /// Remove `interval` from the index. Fails with [`Error::NotFound`]
    /// if it is not present at both endpoints.
    pub fn remove(&mut self, interval: &IntervalHandle<K, V>) -> Result<()> {
        let left_key = interval.left().clone();
        let right_key = interval.right().clone();

        let left_id = self.find_owning_node(&left_key)?;
        let right_id = self.find_owning_node(&right_key)?;

        self.remove_markers(interval, left_id, right_id);
        self.detach_endpoint(left_id);
        self.detach_endpoint(right_id);
        Ok(())
    }

    fn find_owning_node(&self, key: &K) -> Result<NodeId> {
        let (_, candidate) = self.search(key);
        match candidate {
            Some(id) if self.node(id).key.as_ref() == Some(key) && self.node(id).owner_count > 0 => {
                Ok(id)
            }
            _ => {
                log::debug!("remove: endpoint key not present in index");
                Err(Error::NotFound)
            }
        }
    }

    /// Stabbing query: append every interval containing `key` to `out`.
    pub fn find(&self, key: &K, out: &mut Vec<IntervalHandle<K, V>>) {
        let mut current = HEADER;
        let mut level = self.max_level as isize;
        while level >= 0 {
            let lvl = level as usize;
            loop {
                match self.node(current).forward_at(lvl) {
                    Some(next) if self.node(next).key.as_ref().expect("non-header key") <= key => {
                        current = next;
                    }
                    _ => break,
                }
            }
            if current != HEADER {
                let node = self.node(current);
                if node.key.as_ref() == Some(key) {
                    out.extend(node.eq_markers.iter().cloned());
                    return;
                }
                out.extend(node.markers_at(lvl).iter().cloned());
            }
            level -= 1;
        }
    }

    // ---- internal node-slab plumbing -------------------------------------

    fn node(&self, id: NodeId) -> &Node<K, V> {
        self.nodes[id].as_ref().expect("slab slot referenced after being freed")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.nodes[id].as_mut().expect("slab slot referenced after being freed")
    }

    fn key_clone(&self, id: NodeId) -> K {
        self.node(id).key.clone().expect("header has no key")
    }

    fn alloc_node(&mut self, key: Option<K>, levels: usize) -> NodeId {
        let node = Node::new(key, levels);
        if let Some(id) = self.free.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn free_node(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.free.push(id);
    }

    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < self.options_max_level && self.rng.gen_bool(self.promotion_probability) {
            level += 1;
        }
        if level > self.max_level {
            log::debug!("max level raised from {} to {level}", self.max_level);
            self.max_level = level;
        }
        level
    }

    /// Descend from the header, building the predecessor vector. Levels
    /// above the current observed max level keep their default `HEADER`
    /// entry, matching the "never-visited levels point at the header"
    /// rule for a fresh level raise.
    fn search(&self, key: &K) -> (Vec<NodeId>, Option<NodeId>) {
        let mut update = vec![HEADER; self.options_max_level + 1];
        let mut current = HEADER;
        let mut level = self.max_level as isize;
        while level >= 0 {
            let lvl = level as usize;
            loop {
                match self.node(current).forward_at(lvl) {
                    Some(next) if self.node(next).key.as_ref().expect("non-header key") < key => {
                        current = next;
                    }
                    _ => break,
                }
            }
            update[lvl] = current;
            level -= 1;
        }
        (update, self.node(current).forward_at(0))
    }

    fn insert_endpoint_node(&mut self, key: &K) -> NodeId {
        let (update, candidate) = self.search(key);
        if let Some(id) = candidate {
            if self.node(id).key.as_ref() == Some(key) {
                return id;
            }
        }
        let level = self.random_level();
        let id = self.alloc_node(Some(key.clone()), level);
        for i in 0..=level {
            let pred = update[i];
            let next = self.node(pred).forward_at(i);
            self.node_mut(id).set_forward_at(i, next);
            self.node_mut(pred).set_forward_at(i, Some(id));
        }
        self.len += 1;
        self.adjust_markers_on_insert(id, &update);
        id
    }

    fn detach_endpoint(&mut self, id: NodeId) {
        let owner_count = {
            let node = self.node_mut(id);
            node.owner_count -= 1;
            node.owner_count
        };
        if owner_count > 0 {
            return;
        }
        let key = self.key_clone(id);
        let (update, _) = self.search(&key);
        self.adjust_markers_on_delete(id, &update);
        for lvl in 0..=self.node(id).top_level {
            let next = self.node(id).forward_at(lvl);
            self.node_mut(update[lvl]).set_forward_at(lvl, next);
        }
        self.len -= 1;
        self.free_node(id);
    }

    // ---- marker placement / removal (spec.md 4.D) -------------------------

    fn place_markers(&mut self, interval: &IntervalHandle<K, V>, left_id: NodeId, right_id: NodeId) {
        self.walk_endpoints(interval, left_id, right_id, true);
    }

    fn remove_markers(&mut self, interval: &IntervalHandle<K, V>, left_id: NodeId, right_id: NodeId) {
        self.walk_endpoints(interval, left_id, right_id, false);
    }

    /// Shared ascending-then-descending traversal used by both marker
    /// placement and marker removal; `place` selects which operation is
    /// applied to each visited marker list.
    fn walk_endpoints(
        &mut self,
        interval: &IntervalHandle<K, V>,
        left_id: NodeId,
        right_id: NodeId,
        place: bool,
    ) {
        let touch_eq = |list: &mut IntervalSkipList<K, V>, node: NodeId| {
            let key = list.key_clone(node);
            if interval.contains(&key) {
                if place {
                    list.node_mut(node).eq_markers.insert(interval.clone());
                } else {
                    list.node_mut(node).eq_markers.remove(interval);
                }
            }
        };
        let touch_edge = |list: &mut IntervalSkipList<K, V>, node: NodeId, level: usize| {
            if place {
                list.node_mut(node).markers_at_mut(level).insert(interval.clone());
            } else {
                list.node_mut(node).markers_at_mut(level).remove(interval);
            }
        };

        touch_eq(self, left_id);

        let mut current = left_id;
        let mut i = 0usize;
        // Phase P1: ascend while the edge out of `current` stays inside I.
        while current != right_id {
            let key_current = self.key_clone(current);
            let next = match self.node(current).forward_at(i) {
                Some(n) => n,
                None => break,
            };
            let key_next = self.key_clone(next);
            if !interval.contains_interval(&key_current, &key_next) {
                break;
            }
            loop {
                if i + 1 > self.node(current).top_level {
                    break;
                }
                let next_hi = match self.node(current).forward_at(i + 1) {
                    Some(n) => n,
                    None => break,
                };
                let key_next_hi = self.key_clone(next_hi);
                if !interval.contains_interval(&key_current, &key_next_hi) {
                    break;
                }
                i += 1;
            }
            touch_edge(self, current, i);
            current = self.node(current).forward_at(i).expect("just-marked edge must exist");
            touch_eq(self, current);
        }

        // Phase P2: descend from wherever P1 stopped until reaching R.
        while current != right_id {
            loop {
                if i == 0 {
                    break;
                }
                let spans = match self.node(current).forward_at(i) {
                    Some(n) => {
                        let key_current = self.key_clone(current);
                        let key_n = self.key_clone(n);
                        interval.contains_interval(&key_current, &key_n)
                    }
                    None => false,
                };
                if spans {
                    break;
                }
                i -= 1;
            }
            touch_edge(self, current, i);
            current = self
                .node(current)
                .forward_at(i)
                .expect("descending path must reach the right endpoint");
            touch_eq(self, current);
        }
    }

    // ---- marker adjustment on insert (spec.md 4.D, phases I1/I2) ----------

    fn adjust_markers_on_insert(&mut self, x: NodeId, update: &[NodeId]) {
        let top = self.node(x).top_level;
        let key_x = self.key_clone(x);

        let mut promoted: Vec<IntervalHandle<K, V>> = Vec::new();
        let mut i = 0usize;
        while i + 1 <= top {
            let far = match self.node(x).forward_at(i + 1) {
                Some(f) => f,
                None => break,
            };
            let key_far = self.key_clone(far);

            let mut next_promoted = Vec::new();
            let current_markers: Vec<_> = self.node_mut(update[i]).markers_at_mut(i).drain_all();
            for m in current_markers {
                if m.contains_interval(&key_x, &key_far) {
                    if let Some(start) = self.node(x).forward_at(i) {
                        self.strip_edge_markers(i, start, far, &m);
                    }
                    next_promoted.push(m);
                } else {
                    self.node_mut(x).markers_at_mut(i).insert(m);
                }
            }

            let mut still_promoted = Vec::new();
            for m in promoted {
                if m.contains_interval(&key_x, &key_far) {
                    if let Some(start) = self.node(x).forward_at(i) {
                        self.strip_edge_markers(i, start, far, &m);
                    }
                    still_promoted.push(m);
                } else {
                    let succ = self.node(x).forward_at(i).expect("level-i successor must exist");
                    let key_succ = self.key_clone(succ);
                    if m.contains(&key_succ) {
                        self.node_mut(succ).eq_markers.insert(m.clone());
                    }
                    self.node_mut(x).markers_at_mut(i).insert(m);
                }
            }
            still_promoted.extend(next_promoted);
            promoted = still_promoted;
            i += 1;
        }

        // i now names x's topmost outgoing edge; finalize it.
        let tail: Vec<_> = self.node_mut(update[i]).markers_at_mut(i).drain_all();
        for m in tail {
            self.node_mut(x).markers_at_mut(i).insert(m);
        }
        if let Some(succ) = self.node(x).forward_at(i) {
            let key_succ = self.key_clone(succ);
            for m in promoted {
                if m.contains(&key_succ) {
                    self.node_mut(succ).eq_markers.insert(m.clone());
                }
                self.node_mut(x).markers_at_mut(i).insert(m);
            }
        } else {
            for m in promoted {
                self.node_mut(x).markers_at_mut(i).insert(m);
            }
        }

        self.adjust_incoming_edges_on_insert(x, update, top, &key_x);

        let mut eq: Vec<IntervalHandle<K, V>> = Vec::new();
        for lvl in 0..=top {
            eq.extend(self.node(x).markers_at(lvl).iter().cloned());
        }
        for m in eq {
            self.node_mut(x).eq_markers.insert(m);
        }
    }

    /// Phase I2: edges entering `x`. Markers on the finer `i-1` chain
    /// between `update[i+1]` and `update[i]` that now span all the way
    /// from `update[i+1]` to `x` are consolidated onto the `update[i] ->
    /// x` edge, mirroring phase I1's treatment of the successor side.
    fn adjust_incoming_edges_on_insert(&mut self, x: NodeId, update: &[NodeId], top: usize, key_x: &K) {
        let mut i = 0usize;
        while i + 1 <= top {
            let far = update[i + 1];
            let near = update[i];
            // Header-originating edges are never marked (spec.md 4.D edge
            // cases), and the header carries no key to compare against.
            if far != near && far != HEADER {
                let key_far = self.key_clone(far);
                let mut cursor = self.node(far).forward_at(i);
                while let Some(cur) = cursor {
                    if cur == near {
                        break;
                    }
                    let candidates: Vec<_> = self.node(cur).markers_at(i).iter().cloned().collect();
                    for m in candidates {
                        if m.contains_interval(&key_far, key_x) {
                            self.node_mut(cur).markers_at_mut(i).remove(&m);
                            self.node_mut(near).markers_at_mut(i).insert(m);
                        }
                    }
                    cursor = self.node(cur).forward_at(i);
                }
            }
            i += 1;
        }
    }

    /// Remove `marker` from `markers_at(level)` for every node from
    /// `start` (inclusive) up to `stop` (exclusive).
    fn strip_edge_markers(&mut self, level: usize, mut current: NodeId, stop: NodeId, marker: &IntervalHandle<K, V>) {
        while current != stop {
            self.node_mut(current).markers_at_mut(level).remove(marker);
            current = self
                .node(current)
                .forward_at(level)
                .expect("marked path must reach the stop node");
        }
    }

    // ---- marker adjustment on delete (spec.md 4.D, phases D1/D2) ----------

    fn adjust_markers_on_delete(&mut self, x: NodeId, update: &[NodeId]) {
        let top = self.node(x).top_level;
        let mut level = top as isize;
        while level >= 0 {
            let i = level as usize;
            let pred = update[i];
            let succ = self.node(x).forward_at(i);
            // `pred` is the header whenever x is the tallest node at this
            // level; the header carries no key, and per spec.md 4.D's edge
            // cases an edge outgoing from it is never marked, so there is
            // nothing to span onto and `markers(pred, i)` is already empty.
            let key_pred = if pred == HEADER { None } else { Some(self.key_clone(pred)) };
            let key_succ = succ.map(|s| self.key_clone(s));

            // D1: pred's old edge into x.
            let left_markers: Vec<_> = self.node_mut(pred).markers_at_mut(i).drain_all();
            for m in left_markers {
                let spans = match (&key_pred, &key_succ) {
                    (Some(kp), Some(ks)) => m.contains_interval(kp, ks),
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if spans {
                    self.node_mut(pred).markers_at_mut(i).insert(m);
                } else if i > 0 {
                    let far = if i + 1 < update.len() { update[i + 1] } else { pred };
                    if far == pred {
                        self.node_mut(pred).markers_at_mut(i - 1).insert(m);
                    } else {
                        self.demote_edge_markers(i - 1, far, pred, &m);
                    }
                }
            }

            // D2: x's own edge leaving toward succ.
            let right_markers: Vec<_> = self.node_mut(x).markers_at_mut(i).drain_all();
            for m in right_markers {
                let spans = match (&key_pred, &key_succ) {
                    (Some(kp), Some(ks)) => m.contains_interval(kp, ks),
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if spans {
                    self.node_mut(pred).markers_at_mut(i).insert(m);
                } else if i > 0 {
                    if let Some(s) = succ {
                        let far = if i < top { self.node(x).forward_at(i + 1) } else { None };
                        match far {
                            Some(f) if f != s => self.demote_edge_markers(i - 1, s, f, &m),
                            _ => self.node_mut(s).markers_at_mut(i - 1).insert(m),
                        }
                    }
                }
            }
            level -= 1;
        }
    }

    /// Insert `marker` into `markers_at(level)` for every node from `start`
    /// (inclusive) up to `stop` (exclusive) — the inverse of
    /// `strip_edge_markers`.
    fn demote_edge_markers(&mut self, level: usize, mut current: NodeId, stop: NodeId, marker: &IntervalHandle<K, V>) {
        while current != stop {
            self.node_mut(current).markers_at_mut(level).insert(marker.clone());
            current = self
                .node(current)
                .forward_at(level)
                .expect("demotion path must reach the stop node");
        }
    }
}

impl<K: Ord + Clone, V> Default for IntervalSkipList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
