//! # intpat-rs
//!
//! An integer-keyed map built on a PATRICIA trie: a binary radix trie that
//! branches only where stored keys actually diverge, on the highest differing
//! bit.
//!
//! Every branch records the common prefix of its subtree as a `(prefix, mask)`
//! pair, with `mask` a run of low-order ones. Insertion descends until the key
//! leaves the recorded prefixes and splices a single new branch in at that
//! point; nothing above it is touched and nothing is rebalanced.
//!
//! ## Example
//!
//! ```rust
//! use intpat_rs::IntPatricia;
//!
//! let mut tree: IntPatricia<u32, &str> = IntPatricia::new();
//! tree.insert(4, "y");
//! tree.insert(5, "z");
//!
//! assert_eq!(tree.get(4), Some(&"y"));
//! assert_eq!(tree.get(6), None);
//!
//! // 4 and 5 share every bit above bit 0.
//! let p = tree.prefix(7).unwrap();
//! assert_eq!((p.bits(), p.mask()), (4, 1));
//! ```

#![forbid(unsafe_code)]

use log::trace;

mod key;

pub use key::{PatriciaKey, Prefix};

use key::{is_left, lcp_mask, mask_off};

/// The trie at the reference key width.
pub type IntPatricia32<V> = IntPatricia<u32, V>;

// =============================================================================
// Pointer type
// =============================================================================

/// Tagged 32-bit handle into one of the two node arenas.
///
/// - Bit 31 = 1: leaf (index into `leaves`)
/// - Bit 31 = 0: branch (index into `branches`)
/// - Special: 0xFFFF_FFFF = NULL (empty tree)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Ptr(u32);

impl Ptr {
    const LEAF_BIT: u32 = 1 << 31;
    const INDEX_MASK: u32 = Self::LEAF_BIT - 1;
    const NULL: Ptr = Ptr(u32::MAX);

    #[inline]
    fn leaf(idx: usize) -> Self {
        assert!(idx < Self::INDEX_MASK as usize, "leaf arena exhausted");
        Self(idx as u32 | Self::LEAF_BIT)
    }

    #[inline]
    fn branch(idx: usize) -> Self {
        assert!(idx < Self::INDEX_MASK as usize, "branch arena exhausted");
        Self(idx as u32)
    }

    #[inline]
    fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn is_leaf(self) -> bool {
        !self.is_null() && (self.0 & Self::LEAF_BIT) != 0
    }

    #[inline]
    fn leaf_idx(self) -> usize {
        debug_assert!(self.is_leaf());
        (self.0 & Self::INDEX_MASK) as usize
    }

    #[inline]
    fn branch_idx(self) -> usize {
        debug_assert!(!self.is_null() && !self.is_leaf());
        self.0 as usize
    }
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Clone)]
struct Leaf<K, V> {
    key: K,
    value: V,
}

/// Internal node. `children[0]` holds the keys whose branching bit is 0.
#[derive(Clone, Copy)]
struct Branch<K> {
    prefix: K,
    mask: K,
    children: [Ptr; 2],
}

impl<K: PatriciaKey> Branch<K> {
    /// Whether `key` agrees with this branch on every bit above the mask.
    #[inline]
    fn matches(&self, key: K) -> bool {
        mask_off(key, self.mask) == self.prefix
    }

    #[inline]
    fn side(&self, key: K) -> usize {
        usize::from(!is_left(key, self.mask))
    }
}

/// Borrowed view of a node, resolved from a [`Ptr`].
enum NodeRef<'a, K, V> {
    Leaf(&'a Leaf<K, V>),
    Branch(&'a Branch<K>),
}

// =============================================================================
// IntPatricia
// =============================================================================

/// A map from fixed-width unsigned integers to `V`, stored as a PATRICIA trie.
///
/// The key width is `K::BITS`. Every operation visits at most `K::BITS + 1`
/// nodes.
#[derive(Clone)]
pub struct IntPatricia<K, V> {
    leaves: Vec<Leaf<K, V>>,
    branches: Vec<Branch<K>>,
    root: Ptr,
}

impl<K: PatriciaKey, V> IntPatricia<K, V> {
    pub fn new() -> Self {
        Self {
            leaves: Vec::new(),
            branches: Vec::new(),
            root: Ptr::NULL,
        }
    }

    /// Preallocates room for `n` keys (and the `n - 1` branches joining them).
    pub fn with_capacity(n: usize) -> Self {
        Self {
            leaves: Vec::with_capacity(n),
            branches: Vec::with_capacity(n.saturating_sub(1)),
            root: Ptr::NULL,
        }
    }

    /// Every leaf is reachable: leaves are only allocated for new keys and
    /// nothing is ever removed.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    pub fn clear(&mut self) {
        self.leaves.clear();
        self.branches.clear();
        self.root = Ptr::NULL;
    }

    pub fn memory_usage(&self) -> usize {
        self.leaves.capacity() * std::mem::size_of::<Leaf<K, V>>()
            + self.branches.capacity() * std::mem::size_of::<Branch<K>>()
    }

    pub fn shrink_to_fit(&mut self) {
        self.leaves.shrink_to_fit();
        self.branches.shrink_to_fit();
    }

    #[inline]
    fn node(&self, ptr: Ptr) -> NodeRef<'_, K, V> {
        if ptr.is_leaf() {
            NodeRef::Leaf(&self.leaves[ptr.leaf_idx()])
        } else {
            NodeRef::Branch(&self.branches[ptr.branch_idx()])
        }
    }

    /// A leaf's key, or a branch's stored prefix.
    #[inline]
    fn effective_prefix(&self, ptr: Ptr) -> K {
        match self.node(ptr) {
            NodeRef::Leaf(leaf) => leaf.key,
            NodeRef::Branch(branch) => branch.prefix,
        }
    }

    /// Follows matching branches from the root and returns the first node
    /// that is a leaf or does not match `key`.
    #[inline]
    fn descend(&self, key: K) -> Option<Ptr> {
        if self.root.is_null() {
            return None;
        }
        let mut cur = self.root;
        while let NodeRef::Branch(branch) = self.node(cur) {
            if !branch.matches(key) {
                break;
            }
            cur = branch.children[branch.side(key)];
        }
        Some(cur)
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.root.is_null() {
            self.root = self.alloc_leaf(key, value);
            trace!("insert {:?}: new root leaf", key);
            return None;
        }

        // (branch index, child slot) of the last matching branch.
        let mut parent: Option<(usize, usize)> = None;
        let mut depth = 0usize;
        let mut cur = self.root;
        loop {
            if cur.is_leaf() {
                let leaf = &mut self.leaves[cur.leaf_idx()];
                if leaf.key == key {
                    trace!("insert {:?}: overwrite at depth {}", key, depth);
                    return Some(std::mem::replace(&mut leaf.value, value));
                }
                break;
            }
            let idx = cur.branch_idx();
            let branch = &self.branches[idx];
            if !branch.matches(key) {
                break;
            }
            let side = branch.side(key);
            parent = Some((idx, side));
            cur = branch.children[side];
            depth += 1;
        }

        let leaf = self.alloc_leaf(key, value);
        let joined = self.join(cur, leaf);
        match parent {
            None => self.root = joined,
            Some((idx, side)) => self.branches[idx].children[side] = joined,
        }
        trace!("insert {:?}: spliced branch at depth {}", key, depth);
        None
    }

    /// Allocates a branch over two subtrees with distinct effective prefixes.
    fn join(&mut self, a: Ptr, b: Ptr) -> Ptr {
        let pa = self.effective_prefix(a);
        let pb = self.effective_prefix(b);
        let mask = lcp_mask(pa, pb);
        let children = if is_left(pa, mask) { [a, b] } else { [b, a] };
        let ptr = Ptr::branch(self.branches.len());
        self.branches.push(Branch {
            prefix: mask_off(pa, mask),
            mask,
            children,
        });
        ptr
    }

    fn alloc_leaf(&mut self, key: K, value: V) -> Ptr {
        let ptr = Ptr::leaf(self.leaves.len());
        self.leaves.push(Leaf { key, value });
        ptr
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let ptr = self.descend(key)?;
        match self.node(ptr) {
            NodeRef::Leaf(leaf) if leaf.key == key => Some(&leaf.value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let ptr = self.descend(key)?;
        if !ptr.is_leaf() {
            return None;
        }
        let leaf = &mut self.leaves[ptr.leaf_idx()];
        if leaf.key == key {
            Some(&mut leaf.value)
        } else {
            None
        }
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the most specific stored prefix on the path `key` would take.
    ///
    /// The descent stops at the first node `key` does not fall under. For a
    /// branch that is its common prefix and mask; for a leaf it is the leaf's
    /// key with an empty mask. The result says nothing about whether `key`
    /// itself is stored. Returns `None` for an empty tree.
    pub fn prefix(&self, key: K) -> Option<Prefix<K>> {
        let ptr = self.descend(key)?;
        Some(match self.node(ptr) {
            NodeRef::Leaf(leaf) => Prefix::new(leaf.key, K::ZERO),
            NodeRef::Branch(branch) => Prefix::new(branch.prefix, branch.mask),
        })
    }
}

impl<K: PatriciaKey, V> Default for IntPatricia<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PatriciaKey, V> std::fmt::Debug for IntPatricia<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntPatricia")
            .field("len", &self.len())
            .field("branches", &self.branches.len())
            .finish_non_exhaustive()
    }
}

impl<K: PatriciaKey, V> Extend<(K, V)> for IntPatricia<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: PatriciaKey, V> FromIterator<(K, V)> for IntPatricia<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}
