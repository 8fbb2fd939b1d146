//! # Synthetic Providers
//!
//! The "value with navigable children" contract, plus the providers for the
//! structural (non-container) shapes.
//!
//! A synthetic provider owns one root value and answers count/child queries
//! for it. Container providers additionally cache decoder state (lengths,
//! base addresses, element types) that they recompute wholesale on
//! [`SyntheticProvider::refresh`]; the host calls `refresh` whenever the
//! inferior may have run (step, continue, frame switch), and a provider must
//! never serve addresses computed before that.
//!
//! Each root value gets its own provider instance; instances share nothing.

use crate::error::{LensError, LensResult};
use crate::host::HostValue;

mod btree;
mod cell;
mod deque;
mod hash;
mod rc;
mod vec;

pub use btree::BTreeMapProvider;
pub use cell::{CellProvider, RefProvider};
pub use deque::VecDequeProvider;
pub use hash::HashMapProvider;
pub use rc::RcProvider;
pub use vec::VecProvider;

/// Navigable-children contract exposed to the host debugger.
///
/// `child_index_of` returns `None` for "no such child", which the host maps
/// to its own sentinel; index 0 is a valid answer and must not be conflated
/// with "not found".
pub trait SyntheticProvider
{
    /// Number of children currently exposed.
    fn child_count(&self) -> usize;

    /// Child by logical index; fails with [`LensError::IndexOutOfRange`]
    /// past `child_count()`.
    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>;

    /// Logical index of a named child, `None` if there is none.
    fn child_index_of(&self, name: &str) -> Option<usize>;

    /// Recompute all cached layout state from the root value.
    ///
    /// Idempotent. On failure the provider must drop its previous state and
    /// report no children rather than serve stale addresses.
    fn refresh(&mut self) -> LensResult<()>;

    /// Whether the value is worth expanding at all.
    fn has_children(&self) -> bool;
}

/// Parse a sequence child name: `[3]` (or bare `3`) -> `Some(3)`.
pub(crate) fn bracketed_index(name: &str) -> Option<usize>
{
    let digits = name.trim_start_matches('[').trim_end_matches(']');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Fallback provider: defers entirely to the host's generic enumeration.
///
/// Used for every shape this library has no special handling for, so unknown
/// types still display *something*.
pub struct DefaultProvider
{
    valobj: Box<dyn HostValue>,
}

impl DefaultProvider
{
    pub fn new(valobj: Box<dyn HostValue>) -> Self
    {
        tracing::trace!("default provider for {}", valobj.name());
        DefaultProvider { valobj }
    }
}

impl SyntheticProvider for DefaultProvider
{
    fn child_count(&self) -> usize
    {
        self.valobj.num_children()
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        self.valobj.child_at(index)
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        self.valobj.index_of_child(name)
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        Ok(())
    }

    fn has_children(&self) -> bool
    {
        self.valobj.num_children() > 0
    }
}

/// Provider for values with nothing to decode: zero-field structs and unions.
///
/// Also serves as the fail-closed stand-in when a recognized container's
/// layout did not decode: zero children beats wrong children.
#[derive(Default)]
pub struct EmptyProvider;

impl EmptyProvider
{
    pub fn new() -> Self
    {
        EmptyProvider
    }
}

impl SyntheticProvider for EmptyProvider
{
    fn child_count(&self) -> usize
    {
        0
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        Err(LensError::IndexOutOfRange { index, len: 0 })
    }

    fn child_index_of(&self, _name: &str) -> Option<usize>
    {
        None
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        Ok(())
    }

    fn has_children(&self) -> bool
    {
        false
    }
}

/// Provider for plain structs and struct enum variants.
///
/// For a struct variant the first member is the reserved discriminant marker
/// and is dropped from display; everything else is the declared field list in
/// declaration order.
pub struct StructProvider
{
    valobj: Box<dyn HostValue>,
    names: Vec<String>,
}

impl StructProvider
{
    pub fn new(valobj: Box<dyn HostValue>, is_variant: bool) -> Self
    {
        tracing::trace!("struct provider for {} (variant: {is_variant})", valobj.name());
        let names = Self::field_names(&*valobj, is_variant);
        StructProvider { valobj, names }
    }

    fn field_names(valobj: &dyn HostValue, is_variant: bool) -> Vec<String>
    {
        let ty = valobj.type_of();
        let skip = usize::from(is_variant);
        ty.fields
            .iter()
            .skip(skip)
            .filter_map(|field| field.name.clone())
            .collect()
    }
}

impl SyntheticProvider for StructProvider
{
    fn child_count(&self) -> usize
    {
        self.names.len()
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let name = self.names.get(index).ok_or(LensError::IndexOutOfRange {
            index,
            len: self.names.len(),
        })?;
        self.valobj.field(name)
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        self.names.iter().position(|candidate| candidate == name)
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        // Field lists are a static property of the type; nothing to recompute.
        Ok(())
    }

    fn has_children(&self) -> bool
    {
        true
    }
}

/// Provider for tuples, tuple structs, and tuple enum variants.
///
/// Children are renamed to their bare position (`0`, `1`, ...) instead of the
/// compiler's `__0`-style member names.
pub struct TupleProvider
{
    valobj: Box<dyn HostValue>,
    offset: usize,
    size: usize,
}

impl TupleProvider
{
    pub fn new(valobj: Box<dyn HostValue>, is_variant: bool) -> Self
    {
        tracing::trace!("tuple provider for {} (variant: {is_variant})", valobj.name());
        let offset = usize::from(is_variant);
        let size = valobj.type_of().fields.len().saturating_sub(offset);
        TupleProvider { valobj, offset, size }
    }
}

impl SyntheticProvider for TupleProvider
{
    fn child_count(&self) -> usize
    {
        self.size
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        if index >= self.size {
            return Err(LensError::IndexOutOfRange {
                index,
                len: self.size,
            });
        }
        let element = self.valobj.child_at(index + self.offset)?;
        element.renamed(&index.to_string())
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            name.parse().ok()
        } else {
            None
        }
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        Ok(())
    }

    fn has_children(&self) -> bool
    {
        true
    }
}
