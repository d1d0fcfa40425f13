//! This module contains the [TrieNode] type and its RLP codec.

use alloc::vec::Vec;
use alloy_primitives::{Bytes, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header, EMPTY_STRING_CODE};
use alloy_trie::Nibbles;

/// The length of the branch list when RLP encoded.
const BRANCH_LIST_LENGTH: usize = 17;

/// The length of a leaf or extension node's RLP encoded list.
const LEAF_OR_EXTENSION_LIST_LENGTH: usize = 2;

/// The number of children of a branch node.
const BRANCH_CHILDREN: usize = 16;

/// Prefix for even-nibbled extension node paths.
const PREFIX_EXTENSION_EVEN: u8 = 0;

/// Prefix for odd-nibbled extension node paths.
const PREFIX_EXTENSION_ODD: u8 = 1;

/// Prefix for even-nibbled leaf node paths.
const PREFIX_LEAF_EVEN: u8 = 2;

/// Prefix for odd-nibbled leaf node paths.
const PREFIX_LEAF_ODD: u8 = 3;

/// The byte length of a node hash.
const HASH_LENGTH: usize = 32;

/// A reference from a trie node to one of its children.
///
/// Children whose RLP is 32 bytes or longer live in the backing store keyed
/// by their keccak and are referenced by [NodeRef::Hash]; shorter children
/// are embedded verbatim in their parent as [NodeRef::Inline].
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub enum NodeRef {
    /// No child.
    #[default]
    Empty,
    /// The keccak-256 of the child's RLP, under which its preimage is stored.
    Hash(B256),
    /// The raw RLP of a child shorter than 32 bytes, embedded in the parent.
    Inline(Bytes),
}

impl NodeRef {
    /// Returns whether this reference points at a child.
    pub const fn is_some(&self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Decodes a [NodeRef] from the raw RLP of a single list item.
    fn from_item(item: &[u8]) -> alloy_rlp::Result<Self> {
        match item.first() {
            Some(&EMPTY_STRING_CODE) if item.len() == 1 => Ok(Self::Empty),
            Some(&first) if first >= alloy_rlp::EMPTY_LIST_CODE => {
                if item.len() >= HASH_LENGTH {
                    return Err(alloy_rlp::Error::Custom("inline node must be shorter than a hash"));
                }
                Ok(Self::Inline(item.to_vec().into()))
            }
            Some(_) => {
                let hash = Bytes::decode(&mut &item[..])?;
                if hash.len() != HASH_LENGTH {
                    return Err(alloy_rlp::Error::Custom("child reference must be a node hash"));
                }
                Ok(Self::Hash(B256::from_slice(&hash)))
            }
            None => Err(alloy_rlp::Error::InputTooShort),
        }
    }
}

impl Encodable for NodeRef {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Empty => out.put_u8(EMPTY_STRING_CODE),
            Self::Hash(hash) => hash.encode(out),
            Self::Inline(raw) => out.put_slice(raw),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Empty => 1,
            Self::Hash(_) => HASH_LENGTH + 1,
            Self::Inline(raw) => raw.len(),
        }
    }
}

/// A [TrieNode] is a node within a standard hexary merkle patricia trie.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TrieNode {
    /// The empty node, standing in for an empty subtrie.
    Empty,
    /// A leaf node is a 2-item node with the encoding
    /// `rlp([encoded_path, value])`.
    Leaf {
        /// The remaining path to the leaf's value, in nibbles.
        key: Nibbles,
        /// The value of the leaf node.
        value: Bytes,
    },
    /// An extension node is a 2-item pointer node with the encoding
    /// `rlp([encoded_path, child])`.
    Extension {
        /// The shared path prefix of every key below, in nibbles.
        prefix: Nibbles,
        /// The pointer to the child node.
        child: NodeRef,
    },
    /// A branch node refers to up to 16 child nodes with the encoding
    /// `rlp([ v0, ..., v15, value ])`.
    Branch {
        /// The 16 child references, indexed by nibble.
        children: [NodeRef; BRANCH_CHILDREN],
        /// The value terminating exactly at this node, if any.
        value: Option<Bytes>,
    },
}

impl TrieNode {
    /// The RLP payload length of the node, without the outer list header.
    fn payload_length(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Leaf { key, value } => {
                encode_path(key, true).as_slice().length() + value.as_ref().length()
            }
            Self::Extension { prefix, child } => {
                encode_path(prefix, false).as_slice().length() + child.length()
            }
            Self::Branch { children, value } => {
                let children_length = children.iter().map(NodeRef::length).sum::<usize>();
                let value_length = value.as_ref().map_or(1, |value| value.as_ref().length());
                children_length + value_length
            }
        }
    }
}

impl Encodable for TrieNode {
    fn encode(&self, out: &mut dyn BufMut) {
        if matches!(self, Self::Empty) {
            out.put_u8(EMPTY_STRING_CODE);
            return;
        }

        Header { list: true, payload_length: self.payload_length() }.encode(out);
        match self {
            Self::Empty => unreachable!(),
            Self::Leaf { key, value } => {
                encode_path(key, true).as_slice().encode(out);
                value.as_ref().encode(out);
            }
            Self::Extension { prefix, child } => {
                encode_path(prefix, false).as_slice().encode(out);
                child.encode(out);
            }
            Self::Branch { children, value } => {
                for child in children {
                    child.encode(out);
                }
                match value {
                    Some(value) => value.as_ref().encode(out),
                    None => out.put_u8(EMPTY_STRING_CODE),
                }
            }
        }
    }

    fn length(&self) -> usize {
        if matches!(self, Self::Empty) {
            return 1;
        }
        let payload_length = self.payload_length();
        Header { list: true, payload_length }.length() + payload_length
    }
}

impl Decodable for TrieNode {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        if buf.first() == Some(&EMPTY_STRING_CODE) {
            *buf = &buf[1..];
            return Ok(Self::Empty);
        }

        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        if buf.len() < header.payload_length {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let mut payload = &buf[..header.payload_length];
        *buf = &buf[header.payload_length..];

        let mut items = Vec::with_capacity(BRANCH_LIST_LENGTH);
        while !payload.is_empty() {
            items.push(take_item(&mut payload)?);
        }

        match items.len() {
            LEAF_OR_EXTENSION_LIST_LENGTH => {
                let path = Bytes::decode(&mut &items[0][..])?;
                let (path, is_leaf) = decode_path(&path)?;
                if is_leaf {
                    let value = Bytes::decode(&mut &items[1][..])?;
                    Ok(Self::Leaf { key: path, value })
                } else {
                    let child = NodeRef::from_item(items[1])?;
                    Ok(Self::Extension { prefix: path, child })
                }
            }
            BRANCH_LIST_LENGTH => {
                let mut children: [NodeRef; BRANCH_CHILDREN] = Default::default();
                for (index, item) in items[..BRANCH_CHILDREN].iter().enumerate() {
                    children[index] = NodeRef::from_item(item)?;
                }
                let value = Bytes::decode(&mut &items[BRANCH_CHILDREN][..])?;
                let value = (!value.is_empty()).then_some(value);
                Ok(Self::Branch { children, value })
            }
            _ => Err(alloy_rlp::Error::UnexpectedLength),
        }
    }
}

/// Splits the raw RLP of the next item (header included) off the front of
/// `buf`.
fn take_item<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<&'a [u8]> {
    let original = *buf;
    let mut peek = *buf;
    let header = Header::decode(&mut peek)?;
    let item_length = original.len() - peek.len() + header.payload_length;
    if original.len() < item_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let (item, rest) = original.split_at(item_length);
    *buf = rest;
    Ok(item)
}

/// Packs a nibble path into its hex-prefix encoding.
fn encode_path(path: &Nibbles, is_leaf: bool) -> Vec<u8> {
    let flag = if is_leaf { PREFIX_LEAF_EVEN } else { PREFIX_EXTENSION_EVEN };
    let mut out = Vec::with_capacity(path.len() / 2 + 1);
    let remainder = if path.len() % 2 == 1 {
        out.push((flag + 1) << 4 | path[0]);
        &path[1..]
    } else {
        out.push(flag << 4);
        &path[..]
    };
    for pair in remainder.chunks_exact(2) {
        out.push(pair[0] << 4 | pair[1]);
    }
    out
}

/// Unpacks a hex-prefix encoded path into nibbles and the leaf flag.
fn decode_path(encoded: &[u8]) -> alloy_rlp::Result<(Nibbles, bool)> {
    let Some(&first) = encoded.first() else {
        return Err(alloy_rlp::Error::InputTooShort);
    };
    let is_leaf = match first >> 4 {
        PREFIX_EXTENSION_EVEN | PREFIX_EXTENSION_ODD => false,
        PREFIX_LEAF_EVEN | PREFIX_LEAF_ODD => true,
        _ => return Err(alloy_rlp::Error::Custom("unexpected path identifier in high-order nibble")),
    };
    let mut nibbles = Vec::with_capacity(encoded.len() * 2);
    if (first >> 4) & 1 == 1 {
        nibbles.push(first & 0x0f);
    }
    for byte in &encoded[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    Ok((Nibbles::from_vec_unchecked(nibbles), is_leaf))
}
