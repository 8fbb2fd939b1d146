//! Decoder for the reference-counted boxes, `alloc::rc::Rc<T>` and
//! `alloc::sync::Arc<T>`.

use tracing::{trace, warn};

use crate::error::{LensError, LensResult};
use crate::host::{HostValue, ValueBuilder};
use crate::providers::SyntheticProvider;

/// Synthetic provider for `Rc<T>` and `Arc<T>`.
///
/// ```text
/// struct Rc<T> { ptr: NonNull<RcBox<T>>, ... }
/// struct NonNull<T> { pointer: NonZero<*const T> }
/// struct NonZero<T>(T)
/// struct RcBox<T> { strong: Cell<usize>, weak: Cell<usize>, value: T }
/// struct Cell<T> { value: UnsafeCell<T> }
/// struct UnsafeCell<T> { value: T }
///
/// struct Arc<T> { ptr: NonNull<ArcInner<T>>, ... }
/// struct ArcInner<T> { strong: AtomicUsize, weak: AtomicUsize, data: T }
/// struct AtomicUsize { v: UnsafeCell<usize> }
/// ```
///
/// The counted block sits behind a double indirection (handle, non-null
/// wrapper, raw pointer); both counters sit behind one cell/atomic wrapper
/// each. The only layout difference between the plain and the atomic variant
/// is the payload field name, `value` vs `data`.
///
/// Display policy: three children. The payload is exposed as `value`
/// (uniformly, for both variants), and the two counters are synthesized as
/// plain unsigned integers at display time; they are derived presentation
/// values, not members of the handle the user selected.
pub struct RcProvider
{
    valobj: Box<dyn HostValue>,
    atomic: bool,
    builder: ValueBuilder,
    strong_count: Option<u64>,
    weak_count: Option<u64>,
}

impl RcProvider
{
    pub fn new(valobj: Box<dyn HostValue>, atomic: bool) -> LensResult<Self>
    {
        trace!("rc provider for {} (atomic: {atomic})", valobj.name());
        let builder = ValueBuilder::for_value(&*valobj);
        let mut provider = RcProvider {
            valobj,
            atomic,
            builder,
            strong_count: None,
            weak_count: None,
        };
        provider.refresh()?;
        Ok(provider)
    }

    /// Strong and weak counts from the last refresh.
    pub fn counts(&self) -> Option<(u64, u64)>
    {
        self.strong_count.zip(self.weak_count)
    }

    fn payload_field(&self) -> &'static str
    {
        if self.atomic { "data" } else { "value" }
    }

    /// The counted allocation, reached through the double indirection.
    fn inner_block(&self) -> LensResult<Box<dyn HostValue>>
    {
        self.valobj.field("ptr")?.field("pointer")?.child_at(0)?.dereference()
    }

    /// Unwrap a counter member (cell or atomic wrapper) down to the raw integer.
    fn counter(block: &dyn HostValue, name: &str) -> LensResult<u64>
    {
        block.field(name)?.child_at(0)?.field("value")?.as_unsigned()
    }
}

impl SyntheticProvider for RcProvider
{
    fn child_count(&self) -> usize
    {
        if self.counts().is_some() { 3 } else { 0 }
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let (strong, weak) = self.counts().ok_or(LensError::IndexOutOfRange { index, len: 0 })?;
        match index {
            0 => self.inner_block()?.field(self.payload_field())?.renamed("value"),
            1 => self.builder.from_uint(&*self.valobj, "strong", strong),
            2 => self.builder.from_uint(&*self.valobj, "weak", weak),
            _ => Err(LensError::IndexOutOfRange { index, len: 3 }),
        }
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        match name {
            "value" => Some(0),
            "strong" => Some(1),
            "weak" => Some(2),
            _ => None,
        }
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        self.strong_count = None;
        self.weak_count = None;
        let result = self.inner_block().and_then(|block| {
            let strong = Self::counter(&*block, "strong")?;
            let weak = Self::counter(&*block, "weak")?;
            Ok((strong, weak))
        });
        match result {
            Ok((strong, weak)) => {
                self.strong_count = Some(strong);
                self.weak_count = Some(weak);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "failed to decode {} as a reference-counted box: {err}",
                    self.valobj.type_of().name
                );
                Err(err)
            }
        }
    }

    fn has_children(&self) -> bool
    {
        true
    }
}
