//! Decoder for the ordered tree map, `alloc::collections::btree::map::BTreeMap<K, V>`.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{LensError, LensResult};
use crate::host::HostValue;
use crate::providers::SyntheticProvider;
use crate::types::{Address, TypeDescriptor};

/// Trees taller than this are not plausible B-trees; treat the height field
/// as corrupt rather than recurse into garbage.
const MAX_HEIGHT: u64 = 16;

/// Node lengths past this are not plausible either (the node capacity is a
/// small constant); same treatment.
const MAX_NODE_LEN: u64 = 64;

/// One key/value pair located during traversal. Children are minted from
/// these addresses on demand.
struct PairSlot
{
    key_addr: Address,
    key_ty: Arc<TypeDescriptor>,
    val_addr: Address,
    val_ty: Arc<TypeDescriptor>,
}

/// Synthetic provider for `BTreeMap<K, V>`.
///
/// ```text
/// struct BTreeMap<K, V> { root: Root<K, V>, length: usize }
/// struct Root<K, V> { node: BoxedNode<K, V>, height: usize }
/// struct BoxedNode<K, V> { ptr: NonNull<LeafNode<K, V>> }
/// struct LeafNode<K, V> { ..., len: u16, keys: [K; CAP], vals: [V; CAP] }
/// struct InternalNode<K, V> { data: LeafNode<K, V>, edges: [BoxedNode; CAP+1] }
/// ```
///
/// A node pointer always has the leaf-node type in the debug info; when the
/// tree still has height to descend, the pointee is actually the internal
/// node, which shares the leaf layout as a prefix and appends the edge array.
/// The decoder reinterprets the pointer through the name-derived internal
/// type (`LeafNode` -> `InternalNode`) exactly when `height > 0`.
///
/// Traversal is the in-order walk: for `i in 0..=len`, descend edge `i`
/// first (internal nodes only), then yield pair `i` if `i < len`. Keys come
/// out in ascending order because that is the tree's own ordering invariant.
///
/// The flattened pairs are exposed as adjacent children, `key[i]` then
/// `val[i]` per pair, so both halves of an entry travel together under one
/// logical index.
pub struct BTreeMapProvider
{
    valobj: Box<dyn HostValue>,
    pairs: Vec<PairSlot>,
}

impl BTreeMapProvider
{
    pub fn new(valobj: Box<dyn HostValue>) -> LensResult<Self>
    {
        trace!("btree map provider for {}", valobj.name());
        let mut provider = BTreeMapProvider {
            valobj,
            pairs: Vec::new(),
        };
        provider.refresh()?;
        Ok(provider)
    }

    /// Number of key/value pairs found by the last refresh.
    pub fn len(&self) -> usize
    {
        self.pairs.len()
    }

    /// Whether the map held no pairs at the last refresh.
    pub fn is_empty(&self) -> bool
    {
        self.pairs.is_empty()
    }

    fn compute_pairs(&self) -> LensResult<Vec<PairSlot>>
    {
        let root = self.valobj.field("root")?;
        let node = root.field("node")?;
        let height = root.field("height")?.as_unsigned()?;
        if height > MAX_HEIGHT {
            return Err(LensError::LayoutMismatch {
                type_name: self.valobj.type_of().name.clone(),
                detail: format!("implausible tree height {height}"),
            });
        }

        let mut pairs = Vec::new();
        Self::walk_node(&*node, height, &mut pairs)?;
        Ok(pairs)
    }

    /// In-order traversal of one node and (recursively) its subtrees.
    fn walk_node(node: &dyn HostValue, height: u64, out: &mut Vec<PairSlot>) -> LensResult<()>
    {
        // BoxedNode -> NonNull -> first member (the raw leaf-node pointer).
        let ptr = node.field("ptr")?.field("pointer")?;
        let raw_field = ptr
            .type_of()
            .field_name(0)
            .map(str::to_owned)
            .ok_or_else(|| LensError::LayoutMismatch {
                type_name: ptr.type_of().name.clone(),
                detail: "node pointer wrapper has no members".to_string(),
            })?;
        let node_ptr = ptr.field(&raw_field)?;

        // Internal nodes append the edge array after the shared leaf prefix;
        // the pointer type in the debug info is always the leaf type, so pun
        // it through the name-derived internal type while there is height
        // left to descend.
        let internal = if height > 0 {
            let pointee = node_ptr.pointee_type()?;
            let internal_name = pointee.name.replace("LeafNode", "InternalNode");
            let internal_ty = node_ptr.type_named(&internal_name)?;
            Some(node_ptr.cast_pointer(&internal_ty)?.dereference()?)
        } else {
            None
        };
        let leaf = match &internal {
            Some(internal) => internal.field("data")?,
            None => node_ptr.dereference()?,
        };

        // The key/value arrays sit behind two uninit/manually-drop wrappers.
        let keys = leaf.field("keys")?.field("value")?.field("value")?;
        let key_ty = keys.element_type()?;
        let vals = leaf.field("vals")?.field("value")?.field("value")?;
        let val_ty = vals.element_type()?;

        let len = leaf.field("len")?.as_unsigned()?;
        if len > MAX_NODE_LEN {
            return Err(LensError::LayoutMismatch {
                type_name: leaf.type_of().name.clone(),
                detail: format!("implausible node length {len}"),
            });
        }

        for i in 0..=len {
            if let Some(internal) = &internal {
                #[allow(clippy::cast_possible_truncation)]
                let edge = internal.field("edges")?.child_at(i as usize)?;
                Self::walk_node(&*edge, height - 1, out)?;
            }
            if i < len {
                out.push(PairSlot {
                    key_addr: keys.address() + i.wrapping_mul(key_ty.byte_size),
                    key_ty: key_ty.clone(),
                    val_addr: vals.address() + i.wrapping_mul(val_ty.byte_size),
                    val_ty: val_ty.clone(),
                });
            }
        }
        Ok(())
    }

    fn parse_pair_name(name: &str) -> Option<usize>
    {
        let (kind, rest) = if let Some(rest) = name.strip_prefix("key[") {
            (0, rest)
        } else if let Some(rest) = name.strip_prefix("val[") {
            (1, rest)
        } else {
            return None;
        };
        let digits = rest.strip_suffix(']')?;
        let pair: usize = digits.parse().ok()?;
        Some(pair * 2 + kind)
    }
}

impl SyntheticProvider for BTreeMapProvider
{
    fn child_count(&self) -> usize
    {
        self.pairs.len() * 2
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let pair_index = index / 2;
        let slot = self.pairs.get(pair_index).ok_or(LensError::IndexOutOfRange {
            index,
            len: self.pairs.len() * 2,
        })?;
        if index % 2 == 0 {
            self.valobj
                .value_at_address(&format!("key[{pair_index}]"), slot.key_addr, &slot.key_ty)
        } else {
            self.valobj
                .value_at_address(&format!("val[{pair_index}]"), slot.val_addr, &slot.val_ty)
        }
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        let index = Self::parse_pair_name(name)?;
        (index < self.pairs.len() * 2).then_some(index)
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        self.pairs.clear();
        match self.compute_pairs() {
            Ok(pairs) => {
                self.pairs = pairs;
                Ok(())
            }
            Err(err) => {
                warn!("failed to decode {} as BTreeMap: {err}", self.valobj.type_of().name);
                Err(err)
            }
        }
    }

    fn has_children(&self) -> bool
    {
        true
    }
}
