//! Decoder for the growable array, `alloc::vec::Vec<T>`.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{LensError, LensResult};
use crate::host::HostValue;
use crate::providers::{SyntheticProvider, bracketed_index};
use crate::types::{Address, TypeDescriptor};

/// Everything needed to answer count/child queries without re-walking the
/// wrapper chain. Recomputed wholesale on every refresh.
struct VecState
{
    length: usize,
    base: Address,
    elem_ty: Arc<TypeDescriptor>,
    elem_size: u64,
}

/// Synthetic provider for `alloc::vec::Vec<T>`.
///
/// The layout this decoder hard-codes:
///
/// ```text
/// struct Vec<T> { buf: RawVec<T>, len: usize }
/// struct RawVec<T> { ptr: Unique<T>, cap: usize, ... }
/// struct Unique<T: ?Sized> { pointer: NonZero<*const T>, ... }
/// struct NonZero<T>(T)
/// ```
///
/// The data pointer sits three positional unwraps below `buf`: allocation
/// handle, non-null wrapper, raw pointer. The element type and size come from
/// the raw pointer's pointee. Children are addressed as `base + i * size`
/// and named `[i]`.
pub struct VecProvider
{
    valobj: Box<dyn HostValue>,
    state: Option<VecState>,
}

impl VecProvider
{
    pub fn new(valobj: Box<dyn HostValue>) -> LensResult<Self>
    {
        trace!("vec provider for {}", valobj.name());
        let mut provider = VecProvider { valobj, state: None };
        provider.refresh()?;
        Ok(provider)
    }

    /// Logical element count, zero when the last refresh failed.
    pub fn len(&self) -> usize
    {
        self.state.as_ref().map_or(0, |state| state.length)
    }

    /// Whether the vector currently holds no elements.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    fn compute_state(&self) -> LensResult<VecState>
    {
        let length = usize::try_from(self.valobj.field("len")?.as_unsigned()?).unwrap_or(0);
        let buf = self.valobj.field("buf")?;
        let data_ptr = buf.child_at(0)?.child_at(0)?.child_at(0)?;
        let elem_ty = data_ptr.pointee_type()?;
        let elem_size = elem_ty.byte_size;
        let base = Address::new(data_ptr.as_unsigned()?);

        Ok(VecState {
            length,
            base,
            elem_ty,
            elem_size,
        })
    }
}

impl SyntheticProvider for VecProvider
{
    fn child_count(&self) -> usize
    {
        self.len()
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let state = self.state.as_ref().ok_or(LensError::IndexOutOfRange { index, len: 0 })?;
        if index >= state.length {
            return Err(LensError::IndexOutOfRange {
                index,
                len: state.length,
            });
        }

        let address = state.base + (index as u64).wrapping_mul(state.elem_size);
        self.valobj.value_at_address(&format!("[{index}]"), address, &state.elem_ty)
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        bracketed_index(name)
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        self.state = None;
        match self.compute_state() {
            Ok(state) => {
                self.state = Some(state);
                Ok(())
            }
            Err(err) => {
                warn!("failed to decode {} as Vec: {err}", self.valobj.type_of().name);
                Err(err)
            }
        }
    }

    fn has_children(&self) -> bool
    {
        true
    }
}
