//! Rank-balanced ordered index stored in an arena
//!
//! Nodes live in a vector and refer to each other by [`NodeId`]. Every node
//! carries an AVL balance factor (`right height - left height`) and a rank
//! (`1 + size of left subtree`), which gives logarithmic insertion, lookup,
//! positional access and deletion. Ranks are maintained incrementally along
//! the mutated path and never recomputed from scratch.

use std::cmp::Ordering;
use std::fmt;

/// Handle to a node inside an [`OrderedIndex`]
///
/// Handles stay valid until the node they name is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct Node<T> {
    item: T,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    balance: i8,
    rank: usize,
}

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Balanced tree with positional access
///
/// A sorted index keeps items in comparator order, placing equal keys after
/// the ones already present. An unsorted index behaves as a positional list:
/// [`OrderedIndex::insert`] appends and [`OrderedIndex::insert_at`] splices.
pub struct OrderedIndex<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    root: Option<NodeId>,
    len: usize,
    comparator: Option<Comparator<T>>,
}

impl<T> Default for OrderedIndex<T> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<T> fmt::Debug for OrderedIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedIndex")
            .field("len", &self.len)
            .field("sorted", &self.is_sorted())
            .finish_non_exhaustive()
    }
}

impl<T> OrderedIndex<T> {
    /// Create an index ordered by the given comparator
    pub fn sorted<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            comparator: Some(Box::new(compare)),
        }
    }

    /// Create a positional index without key ordering
    pub fn unsorted() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            comparator: None,
        }
    }

    /// Whether this index was constructed with a comparator
    pub const fn is_sorted(&self) -> bool {
        self.comparator.is_some()
    }

    /// Number of items currently stored
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Test if the index holds no items
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every item
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Insert an item
    ///
    /// Sorted indexes place the item after every equal key; unsorted indexes
    /// append it at the end.
    pub fn insert(&mut self, item: T) -> NodeId {
        let mut parent = None;
        let mut go_left = false;
        let mut cursor = self.root;

        while let Some(current) = cursor {
            parent = Some(current);
            if self.compare_with(&item, current) == Ordering::Less {
                self.update(current, |node| node.rank += 1);
                go_left = true;
                cursor = self.left(current);
            } else {
                go_left = false;
                cursor = self.right(current);
            }
        }

        self.attach(item, parent, go_left)
    }

    /// Insert an item so that it ends up at in-order `position`
    ///
    /// Positions past the end append. On a sorted index the caller is
    /// responsible for keeping comparator order.
    pub fn insert_at(&mut self, position: usize, item: T) -> NodeId {
        let mut remaining = position.min(self.len);
        let mut parent = None;
        let mut go_left = false;
        let mut cursor = self.root;

        while let Some(current) = cursor {
            parent = Some(current);
            let rank = self.rank(current);
            if remaining < rank {
                self.update(current, |node| node.rank += 1);
                go_left = true;
                cursor = self.left(current);
            } else {
                remaining -= rank;
                go_left = false;
                cursor = self.right(current);
            }
        }

        self.attach(item, parent, go_left)
    }

    /// Find the first in-order item comparing equal to `key`
    ///
    /// The result is not necessarily the most recently inserted equal item.
    /// Unsorted indexes have no keys and always report "not found".
    pub fn lookup(&self, key: &T) -> Option<NodeId> {
        let compare = self.comparator.as_ref()?;
        let mut found = None;
        let mut cursor = self.root;

        while let Some(current) = cursor {
            let node = self.node(current)?;
            match compare(key, &node.item) {
                Ordering::Less => cursor = node.left,
                Ordering::Greater => cursor = node.right,
                Ordering::Equal => {
                    found = Some(current);
                    cursor = node.left;
                }
            }
        }

        found
    }

    /// Handle of the item at in-order position `index`
    pub fn nth_node(&self, index: usize) -> Option<NodeId> {
        let mut remaining = index;
        let mut cursor = self.root;

        while let Some(current) = cursor {
            let rank = self.rank(current);
            match (remaining + 1).cmp(&rank) {
                Ordering::Equal => return Some(current),
                Ordering::Less => cursor = self.left(current),
                Ordering::Greater => {
                    remaining -= rank;
                    cursor = self.right(current);
                }
            }
        }

        None
    }

    /// Item at in-order position `index`
    pub fn nth(&self, index: usize) -> Option<&T> {
        self.nth_node(index).and_then(|id| self.get(id))
    }

    /// Item stored under a handle
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.item)
    }

    /// In-order position of a node
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let mut position = self.node(id)?.rank - 1;
        let mut child = id;

        while let Some(parent) = self.parent(child) {
            if self.right(parent) == Some(child) {
                position += self.rank(parent);
            }
            child = parent;
        }

        Some(position)
    }

    /// Remove a node and return its item
    ///
    /// A node with two children first exchanges places with its in-order
    /// successor, so the unlinked position always has at most one child.
    /// The root is no exception.
    pub fn delete(&mut self, id: NodeId) -> Option<T> {
        self.node(id)?;

        if let (Some(_), Some(right)) = (self.left(id), self.right(id)) {
            let successor = self.leftmost(right);
            self.exchange_with_successor(id, successor);
        }

        let mut child = id;
        while let Some(parent) = self.parent(child) {
            if self.left(parent) == Some(child) {
                self.update(parent, |node| node.rank -= 1);
            }
            child = parent;
        }

        let parent = self.parent(id);
        let was_left = parent.is_some_and(|p| self.left(p) == Some(id));
        let replacement = self.left(id).or_else(|| self.right(id));
        self.replace_child(parent, id, replacement);

        let node = self.slots.get_mut(id.0).and_then(Option::take)?;
        self.free.push(id.0);
        self.len -= 1;

        if let Some(parent) = parent {
            self.retrace_delete(parent, was_left);
        }

        Some(node.item)
    }

    /// Iterate over items in order
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            index: self,
            next: self.root.map(|root| self.leftmost(root)),
        }
    }

    /// Verify balance factors, ranks, parent links and the item count
    ///
    /// Intended for tests and debug assertions; runs in linear time.
    pub fn check_invariants(&self) -> bool {
        match self.root {
            None => self.len == 0,
            Some(root) => {
                self.parent(root).is_none()
                    && self
                        .verify_subtree(root)
                        .is_some_and(|(_, size)| size == self.len)
            }
        }
    }

    /// Height and size of a subtree, or `None` if an invariant is broken
    fn verify_subtree(&self, id: NodeId) -> Option<(usize, usize)> {
        let node = self.node(id)?;
        let mut heights = [0usize; 2];
        let mut sizes = [0usize; 2];

        for (slot, child) in [node.left, node.right].into_iter().enumerate() {
            if let Some(child) = child {
                if self.parent(child) != Some(id) {
                    return None;
                }
                let (height, size) = self.verify_subtree(child)?;
                if let (Some(h), Some(s)) = (heights.get_mut(slot), sizes.get_mut(slot)) {
                    *h = height;
                    *s = size;
                }
            }
        }

        let [left_height, right_height] = heights;
        let [left_size, right_size] = sizes;
        let balance = right_height as i64 - left_height as i64;

        let consistent = balance.abs() <= 1
            && balance == i64::from(node.balance)
            && node.rank == left_size + 1;

        consistent.then_some((
            left_height.max(right_height) + 1,
            left_size + right_size + 1,
        ))
    }

    fn compare_with(&self, item: &T, id: NodeId) -> Ordering {
        match (&self.comparator, self.node(id)) {
            (Some(compare), Some(node)) => compare(item, &node.item),
            _ => Ordering::Greater,
        }
    }

    fn attach(&mut self, item: T, parent: Option<NodeId>, go_left: bool) -> NodeId {
        let id = self.allocate(Node {
            item,
            parent,
            left: None,
            right: None,
            balance: 0,
            rank: 1,
        });

        match parent {
            None => self.root = Some(id),
            Some(parent) => self.update(parent, |node| {
                if go_left {
                    node.left = Some(id);
                } else {
                    node.right = Some(id);
                }
            }),
        }

        self.len += 1;
        self.retrace_insert(id);
        id
    }

    fn allocate(&mut self, node: Node<T>) -> NodeId {
        if let Some(slot) = self.free.pop() {
            if let Some(entry) = self.slots.get_mut(slot) {
                *entry = Some(node);
                return NodeId(slot);
            }
        }
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    fn retrace_insert(&mut self, inserted: NodeId) {
        let mut child = inserted;

        while let Some(parent) = self.parent(child) {
            let delta = if self.left(parent) == Some(child) { -1 } else { 1 };
            let balance = self.balance(parent) + delta;
            self.update(parent, |node| node.balance = balance);

            match balance {
                0 => break,
                -1 | 1 => child = parent,
                _ => {
                    self.rebalance(parent);
                    break;
                }
            }
        }
    }

    fn retrace_delete(&mut self, start: NodeId, shrunk_left: bool) {
        let mut node = start;
        let mut from_left = shrunk_left;

        loop {
            let balance = self.balance(node) + if from_left { 1 } else { -1 };
            self.update(node, |n| n.balance = balance);

            let subtree = match balance {
                -1 | 1 => break,
                0 => node,
                _ => {
                    let root = self.rebalance(node);
                    if self.balance(root) != 0 {
                        break;
                    }
                    root
                }
            };

            let Some(parent) = self.parent(subtree) else {
                break;
            };
            from_left = self.left(parent) == Some(subtree);
            node = parent;
        }
    }

    /// Restore balance at a node whose factor reached +/-2
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        if self.balance(id) > 0 {
            if let Some(right) = self.right(id) {
                if self.balance(right) < 0 {
                    self.rotate_right(right);
                }
            }
            self.rotate_left(id)
        } else {
            if let Some(left) = self.left(id) {
                if self.balance(left) > 0 {
                    self.rotate_left(left);
                }
            }
            self.rotate_right(id)
        }
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.right(x) else {
            return x;
        };
        let parent = self.parent(x);
        let inner = self.left(y);

        self.update(x, |node| node.right = inner);
        if let Some(inner) = inner {
            self.update(inner, |node| node.parent = Some(x));
        }
        self.update(y, |node| node.left = Some(x));
        self.replace_child(parent, x, Some(y));
        self.update(x, |node| node.parent = Some(y));

        // x and its left subtree now hang off y's left side
        let x_rank = self.rank(x);
        self.update(y, |node| node.rank += x_rank);

        let x_balance = self.balance(x) - 1 - self.balance(y).max(0);
        let y_balance = self.balance(y) - 1 + x_balance.min(0);
        self.update(x, |node| node.balance = x_balance);
        self.update(y, |node| node.balance = y_balance);

        y
    }

    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.left(x) else {
            return x;
        };
        let parent = self.parent(x);
        let inner = self.right(y);

        self.update(x, |node| node.left = inner);
        if let Some(inner) = inner {
            self.update(inner, |node| node.parent = Some(x));
        }
        self.update(y, |node| node.right = Some(x));
        self.replace_child(parent, x, Some(y));
        self.update(x, |node| node.parent = Some(y));

        let y_rank = self.rank(y);
        self.update(x, |node| node.rank -= y_rank);

        let x_balance = self.balance(x) + 1 - self.balance(y).min(0);
        let y_balance = self.balance(y) + 1 + x_balance.max(0);
        self.update(x, |node| node.balance = x_balance);
        self.update(y, |node| node.balance = y_balance);

        y
    }

    /// Swap the tree positions of `z` and its in-order successor `s`
    ///
    /// Items stay in their slots so outstanding handles keep naming the same
    /// item. Balance factors and ranks belong to positions and are swapped.
    fn exchange_with_successor(&mut self, z: NodeId, s: NodeId) {
        let z_parent = self.parent(z);
        let z_left = self.left(z);
        let z_right = self.right(z);
        let s_parent = self.parent(s);
        let s_right = self.right(s);
        let (z_balance, z_rank) = (self.balance(z), self.rank(z));
        let (s_balance, s_rank) = (self.balance(s), self.rank(s));

        self.replace_child(z_parent, z, Some(s));
        self.update(s, |node| {
            node.left = z_left;
            node.balance = z_balance;
            node.rank = z_rank;
        });
        if let Some(left) = z_left {
            self.update(left, |node| node.parent = Some(s));
        }

        self.update(z, |node| {
            node.left = None;
            node.right = s_right;
            node.balance = s_balance;
            node.rank = s_rank;
        });
        if let Some(right) = s_right {
            self.update(right, |node| node.parent = Some(z));
        }

        if s_parent == Some(z) {
            self.update(s, |node| node.right = Some(z));
            self.update(z, |node| node.parent = Some(s));
        } else {
            self.update(s, |node| node.right = z_right);
            if let Some(right) = z_right {
                self.update(right, |node| node.parent = Some(s));
            }
            if let Some(parent) = s_parent {
                self.update(parent, |node| node.left = Some(z));
            }
            self.update(z, |node| node.parent = s_parent);
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => self.update(parent, |node| {
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    node.right = new;
                }
            }),
        }
        if let Some(new) = new {
            self.update(new, |node| node.parent = parent);
        }
    }

    fn leftmost(&self, start: NodeId) -> NodeId {
        let mut current = start;
        while let Some(left) = self.left(current) {
            current = left;
        }
        current
    }

    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.right(id) {
            return Some(self.leftmost(right));
        }
        let mut child = id;
        while let Some(parent) = self.parent(child) {
            if self.left(parent) == Some(child) {
                return Some(parent);
            }
            child = parent;
        }
        None
    }

    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn update(&mut self, id: NodeId, apply: impl FnOnce(&mut Node<T>)) {
        if let Some(node) = self.slots.get_mut(id.0).and_then(Option::as_mut) {
            apply(node);
        }
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.left)
    }

    fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.right)
    }

    fn balance(&self, id: NodeId) -> i8 {
        self.node(id).map_or(0, |node| node.balance)
    }

    fn rank(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |node| node.rank)
    }
}

/// In-order iterator over an [`OrderedIndex`]
pub struct Iter<'a, T> {
    index: &'a OrderedIndex<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.index.successor(current);
        self.index.get(current)
    }
}

impl<'a, T> IntoIterator for &'a OrderedIndex<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
