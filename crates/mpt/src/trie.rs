//! This module contains [Trie], a hexary merkle patricia trie persisted into
//! a [KeyValueStore].

use crate::{NodeRef, TrieError, TrieNode, TrieResult};
use alloc::{vec, vec::Vec};
use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::Decodable;
use alloy_trie::{Nibbles, EMPTY_ROOT_HASH};
use sable_kv::SharedStore;

/// A merkle patricia trie over a [KeyValueStore].
///
/// The trie is mutation-in-place from the caller's viewpoint: every `insert`
/// or `remove` rewrites the nodes along the touched path, persists each
/// rewritten node into the backing store under the keccak-256 of its RLP, and
/// updates [Self::root] to the new root hash. Because superseded nodes are
/// left behind in the store, a view can be rebound to any previously produced
/// root with [Self::set_root] — this is what snapshot revert and per-account
/// storage-root bookkeeping rely on. No reference counting is performed, so
/// stale nodes accumulate in the store.
///
/// Nodes whose RLP is shorter than 32 bytes are embedded in their parent
/// rather than stored, per the standard trie layout; the root node is always
/// stored so the trie can be re-opened from its hash alone.
#[derive(Debug)]
pub struct Trie {
    /// The backing node store.
    db: SharedStore,
    /// The current root hash.
    root: B256,
}

impl Trie {
    /// Creates a new, empty [Trie] over the given store.
    pub fn new(db: SharedStore) -> Self {
        Self { db, root: EMPTY_ROOT_HASH }
    }

    /// Creates a [Trie] view over the given store, rooted at an existing
    /// root hash.
    pub fn from_root(db: SharedStore, root: B256) -> Self {
        Self { db, root }
    }

    /// Returns the current root hash of the trie.
    pub const fn root(&self) -> B256 {
        self.root
    }

    /// Rebinds the view to an existing root in the backing store.
    pub fn set_root(&mut self, root: B256) {
        self.root = root;
    }

    /// Returns a handle to the backing store.
    pub fn db(&self) -> SharedStore {
        self.db.clone()
    }

    /// Fetches the value stored under the given key, or [None] if the key is
    /// absent.
    pub fn get(&self, key: &[u8]) -> TrieResult<Option<Bytes>> {
        let path = Nibbles::unpack(key);
        let mut node = self.root_node()?;
        let mut offset = 0;
        loop {
            match node {
                TrieNode::Empty => return Ok(None),
                TrieNode::Leaf { key: leaf_key, value } => {
                    return Ok((leaf_key[..] == path[offset..]).then_some(value));
                }
                TrieNode::Extension { prefix, child } => {
                    if !path[offset..].starts_with(&prefix) {
                        return Ok(None);
                    }
                    offset += prefix.len();
                    node = self.resolve(&child)?;
                }
                TrieNode::Branch { children, value } => {
                    if offset == path.len() {
                        return Ok(value);
                    }
                    let index = path[offset] as usize;
                    offset += 1;
                    node = self.resolve(&children[index])?;
                }
            }
        }
    }

    /// Returns whether the given key is present in the trie.
    pub fn contains(&self, key: &[u8]) -> TrieResult<bool> {
        self.get(key).map(|value| value.is_some())
    }

    /// Inserts a value under the given key, replacing any existing value.
    pub fn insert(&mut self, key: &[u8], value: Bytes) -> TrieResult<()> {
        let path = Nibbles::unpack(key);
        let root = self.root_node()?;
        let new_root = self.insert_at(root, &path, 0, value)?;
        self.bind_root(new_root)
    }

    /// Removes the value stored under the given key. Removing an absent key
    /// is a no-op; the returned flag reports whether anything was removed.
    pub fn remove(&mut self, key: &[u8]) -> TrieResult<bool> {
        let path = Nibbles::unpack(key);
        let root = self.root_node()?;
        match self.remove_at(root, &path, 0)? {
            Some(new_root) => {
                self.bind_root(new_root)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Loads the node stored under the given hash.
    fn load(&self, hash: B256) -> TrieResult<TrieNode> {
        let preimage =
            self.db.borrow().get(hash.as_slice())?.ok_or(TrieError::MissingNode(hash))?;
        Ok(TrieNode::decode(&mut preimage.as_ref())?)
    }

    /// Resolves a child reference into its node.
    fn resolve(&self, node_ref: &NodeRef) -> TrieResult<TrieNode> {
        match node_ref {
            NodeRef::Empty => Ok(TrieNode::Empty),
            NodeRef::Hash(hash) => self.load(*hash),
            NodeRef::Inline(raw) => Ok(TrieNode::decode(&mut raw.as_ref())?),
        }
    }

    /// Loads the current root node.
    fn root_node(&self) -> TrieResult<TrieNode> {
        if self.root == EMPTY_ROOT_HASH {
            Ok(TrieNode::Empty)
        } else {
            self.load(self.root)
        }
    }

    /// Turns a node into the reference its parent embeds: inline when the
    /// RLP is shorter than a hash, stored-by-keccak otherwise.
    fn store(&mut self, node: &TrieNode) -> TrieResult<NodeRef> {
        if matches!(node, TrieNode::Empty) {
            return Ok(NodeRef::Empty);
        }
        let encoded = alloy_rlp::encode(node);
        if encoded.len() < 32 {
            return Ok(NodeRef::Inline(encoded.into()));
        }
        let hash = keccak256(&encoded);
        self.db.borrow_mut().set(hash.as_slice(), encoded.into())?;
        Ok(NodeRef::Hash(hash))
    }

    /// Persists the new root node (regardless of its size) and updates the
    /// root hash.
    fn bind_root(&mut self, node: TrieNode) -> TrieResult<()> {
        if matches!(node, TrieNode::Empty) {
            self.root = EMPTY_ROOT_HASH;
            return Ok(());
        }
        let encoded = alloy_rlp::encode(&node);
        let hash = keccak256(&encoded);
        self.db.borrow_mut().set(hash.as_slice(), encoded.into())?;
        self.root = hash;
        trace!(target: "trie", root = ?self.root, "Updated trie root");
        Ok(())
    }

    /// Inserts `value` at `path[offset..]` below `node`, returning the
    /// rewritten node.
    fn insert_at(
        &mut self,
        node: TrieNode,
        path: &Nibbles,
        offset: usize,
        value: Bytes,
    ) -> TrieResult<TrieNode> {
        match node {
            TrieNode::Empty => {
                Ok(TrieNode::Leaf { key: nibbles_from(&path[offset..]), value })
            }
            TrieNode::Leaf { key: leaf_key, value: leaf_value } => {
                let remainder = &path[offset..];
                if leaf_key[..] == *remainder {
                    return Ok(TrieNode::Leaf { key: leaf_key, value });
                }

                // The keys diverge; split into a branch at the fork point.
                let common = common_prefix(&leaf_key, remainder);
                let mut children: [NodeRef; 16] = Default::default();
                let mut branch_value = None;

                if leaf_key.len() == common {
                    branch_value = Some(leaf_value);
                } else {
                    let index = leaf_key[common] as usize;
                    let moved = TrieNode::Leaf {
                        key: nibbles_from(&leaf_key[common + 1..]),
                        value: leaf_value,
                    };
                    children[index] = self.store(&moved)?;
                }

                if remainder.len() == common {
                    branch_value = Some(value);
                } else {
                    let index = remainder[common] as usize;
                    let inserted =
                        TrieNode::Leaf { key: nibbles_from(&remainder[common + 1..]), value };
                    children[index] = self.store(&inserted)?;
                }

                self.wrap_fork(children, branch_value, &remainder[..common])
            }
            TrieNode::Extension { prefix, child } => {
                let remainder = &path[offset..];
                let common = common_prefix(&prefix, remainder);
                if common == prefix.len() {
                    let resolved = self.resolve(&child)?;
                    let new_child = self.insert_at(resolved, path, offset + common, value)?;
                    let child = self.store(&new_child)?;
                    return Ok(TrieNode::Extension { prefix, child });
                }

                // The key forks off inside the extension's prefix.
                let mut children: [NodeRef; 16] = Default::default();
                let mut branch_value = None;

                let extension_index = prefix[common] as usize;
                children[extension_index] = if prefix.len() == common + 1 {
                    child
                } else {
                    let tail =
                        TrieNode::Extension { prefix: nibbles_from(&prefix[common + 1..]), child };
                    self.store(&tail)?
                };

                if remainder.len() == common {
                    branch_value = Some(value);
                } else {
                    let index = remainder[common] as usize;
                    let inserted =
                        TrieNode::Leaf { key: nibbles_from(&remainder[common + 1..]), value };
                    children[index] = self.store(&inserted)?;
                }

                self.wrap_fork(children, branch_value, &remainder[..common])
            }
            TrieNode::Branch { mut children, value: branch_value } => {
                if offset == path.len() {
                    return Ok(TrieNode::Branch { children, value: Some(value) });
                }
                let index = path[offset] as usize;
                let resolved = self.resolve(&children[index])?;
                let new_child = self.insert_at(resolved, path, offset + 1, value)?;
                children[index] = self.store(&new_child)?;
                Ok(TrieNode::Branch { children, value: branch_value })
            }
        }
    }

    /// Wraps a freshly forked branch in an extension carrying the shared
    /// prefix, when there is one.
    fn wrap_fork(
        &mut self,
        children: [NodeRef; 16],
        value: Option<Bytes>,
        shared_prefix: &[u8],
    ) -> TrieResult<TrieNode> {
        let branch = TrieNode::Branch { children, value };
        if shared_prefix.is_empty() {
            return Ok(branch);
        }
        let child = self.store(&branch)?;
        Ok(TrieNode::Extension { prefix: nibbles_from(shared_prefix), child })
    }

    /// Removes `path[offset..]` below `node`. Returns [None] when the key was
    /// absent and the node is unchanged.
    fn remove_at(
        &mut self,
        node: TrieNode,
        path: &Nibbles,
        offset: usize,
    ) -> TrieResult<Option<TrieNode>> {
        match node {
            TrieNode::Empty => Ok(None),
            TrieNode::Leaf { key: leaf_key, .. } => {
                Ok((leaf_key[..] == path[offset..]).then_some(TrieNode::Empty))
            }
            TrieNode::Extension { prefix, child } => {
                if !path[offset..].starts_with(&prefix) {
                    return Ok(None);
                }
                let resolved = self.resolve(&child)?;
                let Some(new_child) = self.remove_at(resolved, path, offset + prefix.len())?
                else {
                    return Ok(None);
                };
                self.merge_into_extension(prefix, new_child).map(Some)
            }
            TrieNode::Branch { mut children, value } => {
                if offset == path.len() {
                    if value.is_none() {
                        return Ok(None);
                    }
                    return self.collapse_branch(children, None).map(Some);
                }
                let index = path[offset] as usize;
                let resolved = self.resolve(&children[index])?;
                let Some(new_child) = self.remove_at(resolved, path, offset + 1)? else {
                    return Ok(None);
                };
                children[index] = self.store(&new_child)?;
                self.collapse_branch(children, value).map(Some)
            }
        }
    }

    /// Re-attaches a rewritten child below an extension's prefix, merging
    /// pass-through nodes upward so no single-child shapes survive.
    fn merge_into_extension(&mut self, prefix: Nibbles, child: TrieNode) -> TrieResult<TrieNode> {
        Ok(match child {
            TrieNode::Empty => TrieNode::Empty,
            TrieNode::Leaf { key, value } => {
                TrieNode::Leaf { key: concat_nibbles(&prefix, &key), value }
            }
            TrieNode::Extension { prefix: child_prefix, child } => {
                TrieNode::Extension { prefix: concat_nibbles(&prefix, &child_prefix), child }
            }
            branch @ TrieNode::Branch { .. } => {
                let child = self.store(&branch)?;
                TrieNode::Extension { prefix, child }
            }
        })
    }

    /// Restores the branch invariant after a removal: a branch holding a
    /// single remaining entry collapses into a leaf or a longer
    /// extension/leaf below it.
    fn collapse_branch(
        &mut self,
        children: [NodeRef; 16],
        value: Option<Bytes>,
    ) -> TrieResult<TrieNode> {
        let occupied: Vec<usize> =
            children.iter().enumerate().filter(|(_, child)| child.is_some()).map(|(i, _)| i).collect();

        match (occupied.as_slice(), value) {
            ([], None) => Ok(TrieNode::Empty),
            ([], Some(value)) => Ok(TrieNode::Leaf { key: Nibbles::default(), value }),
            ([index], None) => {
                let child = self.resolve(&children[*index])?;
                self.merge_into_extension(
                    Nibbles::from_vec_unchecked(vec![*index as u8]),
                    child,
                )
            }
            (_, value) => Ok(TrieNode::Branch { children, value }),
        }
    }
}

/// Length of the shared prefix of two nibble slices.
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Copies a nibble slice into an owned [Nibbles].
fn nibbles_from(nibbles: &[u8]) -> Nibbles {
    Nibbles::from_vec_unchecked(nibbles.to_vec())
}

/// Concatenates two nibble paths.
fn concat_nibbles(head: &Nibbles, tail: &Nibbles) -> Nibbles {
    let mut joined = Vec::with_capacity(head.len() + tail.len());
    joined.extend_from_slice(head);
    joined.extend_from_slice(tail);
    Nibbles::from_vec_unchecked(joined)
}
