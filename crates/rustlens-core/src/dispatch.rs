//! # Dispatch
//!
//! The single entry point the host debugger calls: map a value's type to its
//! shape, then to the right summary formatter and synthetic provider.
//!
//! Enum dispatch is mutually recursive by design: the provider for a tagged
//! union reads the runtime discriminant, resolves the active variant's value,
//! and re-enters [`synthetic_lookup`] with it, because the active variant is itself
//! struct- or tuple-shaped and needs its own provider. The variant set is
//! closed at classification time, so this is a plain re-dispatch, not open
//! polymorphism.
//!
//! Every container decode failure degrades here to the empty provider (no
//! children) or an empty summary; nothing propagates a fault to the host.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::classify::{RustShape, classify};
use crate::error::LensResult;
use crate::host::HostValue;
use crate::providers::{
    BTreeMapProvider, CellProvider, DefaultProvider, EmptyProvider, HashMapProvider, RcProvider, RefProvider,
    StructProvider, SyntheticProvider, TupleProvider, VecDequeProvider, VecProvider,
};
use crate::summary::{borrow_summary, rc_summary, size_summary, str_summary, string_summary};
use crate::types::TypeDescriptor;

/// Classification memoized by type identity.
///
/// Shapes are a pure function of the type, so one classification per type
/// name is enough for a whole debug session. Hosts that keep a cache around
/// should route classification through it; the free functions below classify
/// from scratch and are what the cache itself uses.
#[derive(Default)]
pub struct ShapeCache
{
    shapes: HashMap<String, RustShape>,
}

impl ShapeCache
{
    pub fn new() -> Self
    {
        ShapeCache { shapes: HashMap::new() }
    }

    /// Shape of `ty`, computed at most once per type name.
    pub fn classify(&mut self, ty: &Arc<TypeDescriptor>) -> RustShape
    {
        if let Some(&shape) = self.shapes.get(&ty.name) {
            return shape;
        }
        let shape = classify(ty);
        self.shapes.insert(ty.name.clone(), shape);
        shape
    }

    /// Number of distinct type names classified so far.
    pub fn len(&self) -> usize
    {
        self.shapes.len()
    }

    /// Whether nothing has been classified yet.
    pub fn is_empty(&self) -> bool
    {
        self.shapes.is_empty()
    }
}

/// One-line summary of `valobj`, or an empty string when the type has no
/// special summary (the host then falls back to its default rendering).
///
/// Container decode failures degrade to the empty string; a failed *memory
/// read* inside a string summary stays visible as `<error: ...>` text.
pub fn summary_lookup(valobj: Box<dyn HostValue>) -> LensResult<String>
{
    let ty = valobj.type_of();
    let shape = classify(&ty);
    trace!("summary for {} ({shape:?})", ty.name);

    let text = match shape {
        RustShape::String => string_summary(&*valobj)?,
        RustShape::Str => str_summary(&*valobj)?,
        RustShape::Vec => VecProvider::new(valobj).map(|p| size_summary(p.len())).unwrap_or_default(),
        RustShape::VecDeque => VecDequeProvider::new(valobj)
            .map(|p| size_summary(p.len()))
            .unwrap_or_default(),
        RustShape::Rc => RcProvider::new(valobj, false)
            .ok()
            .and_then(|p| p.counts())
            .map(|(strong, weak)| rc_summary(strong, weak))
            .unwrap_or_default(),
        RustShape::Arc => RcProvider::new(valobj, true)
            .ok()
            .and_then(|p| p.counts())
            .map(|(strong, weak)| rc_summary(strong, weak))
            .unwrap_or_default(),
        RustShape::Ref | RustShape::RefMut => RefProvider::new(valobj, false)
            .ok()
            .and_then(|p| p.borrow_flag())
            .map(borrow_summary)
            .unwrap_or_default(),
        RustShape::RefCell => RefProvider::new(valobj, true)
            .ok()
            .and_then(|p| p.borrow_flag())
            .map(borrow_summary)
            .unwrap_or_default(),
        RustShape::HashMap => HashMapProvider::new(valobj)
            .ok()
            .and_then(|p| p.len())
            .map(size_summary)
            .unwrap_or_default(),
        RustShape::BTreeMap => BTreeMapProvider::new(valobj)
            .map(|p| size_summary(p.len()))
            .unwrap_or_default(),
        _ => String::new(),
    };
    Ok(text)
}

/// Synthetic provider for `valobj`, per its classified shape.
///
/// Tagged-union shapes re-dispatch into the active variant (see the module
/// docs); shapes without special handling get the default provider so the
/// host's generic enumeration still shows something.
pub fn synthetic_lookup(valobj: Box<dyn HostValue>) -> LensResult<Box<dyn SyntheticProvider>>
{
    let ty = valobj.type_of();
    let shape = classify(&ty);
    trace!("synthetic provider for {} ({shape:?})", ty.name);

    let provider: Box<dyn SyntheticProvider> = match shape {
        RustShape::Struct => Box::new(StructProvider::new(valobj, false)),
        RustShape::StructVariant => Box::new(StructProvider::new(valobj, true)),
        RustShape::Tuple => Box::new(TupleProvider::new(valobj, false)),
        RustShape::TupleVariant => Box::new(TupleProvider::new(valobj, true)),
        RustShape::Empty => Box::new(EmptyProvider::new()),

        RustShape::RegularEnum => {
            // The discriminant is variant 0's own first member; its value
            // selects the active variant, which then gets its own provider.
            let discriminant = valobj.child_at(0)?.child_at(0)?.as_unsigned()?;
            let active = valobj.child_at(usize::try_from(discriminant).unwrap_or(usize::MAX))?;
            return synthetic_lookup(active);
        }
        RustShape::SingletonEnum => return synthetic_lookup(valobj.child_at(0)?),

        RustShape::Vec => fail_closed(VecProvider::new(valobj)),
        RustShape::VecDeque => fail_closed(VecDequeProvider::new(valobj)),
        RustShape::BTreeMap => fail_closed(BTreeMapProvider::new(valobj)),
        RustShape::HashMap => fail_closed(HashMapProvider::new(valobj)),
        RustShape::Rc => fail_closed(RcProvider::new(valobj, false)),
        RustShape::Arc => fail_closed(RcProvider::new(valobj, true)),
        RustShape::Cell => Box::new(CellProvider::new(valobj)),
        RustShape::Ref | RustShape::RefMut => fail_closed(RefProvider::new(valobj, false)),
        RustShape::RefCell => fail_closed(RefProvider::new(valobj, true)),

        // String/&str get summaries; their children fall back to the host.
        // C-style variants, encoded enums, and plain unions display through
        // the host's generic enumeration too.
        _ => Box::new(DefaultProvider::new(valobj)),
    };
    Ok(provider)
}

/// Wrap a decoded container provider, or fall closed to "no children" when
/// its layout did not decode (the provider has already logged why).
fn fail_closed<P>(result: LensResult<P>) -> Box<dyn SyntheticProvider>
where
    P: SyntheticProvider + 'static,
{
    match result {
        Ok(provider) => Box::new(provider),
        Err(_) => Box::new(EmptyProvider::new()),
    }
}
