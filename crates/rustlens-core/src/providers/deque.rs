//! Decoder for the ring buffer, `alloc::collections::vec_deque::VecDeque<T>`.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{LensError, LensResult};
use crate::host::HostValue;
use crate::providers::{SyntheticProvider, bracketed_index};
use crate::types::{Address, TypeDescriptor};

struct DequeState
{
    head: usize,
    tail: usize,
    cap: usize,
    size: usize,
    base: Address,
    elem_ty: Arc<TypeDescriptor>,
    elem_size: u64,
}

/// Synthetic provider for `alloc::collections::vec_deque::VecDeque<T>`.
///
/// ```text
/// struct VecDeque<T> { tail: usize, head: usize, buf: RawVec<T> }
/// ```
///
/// The backing buffer is circular: elements live at physical slots
/// `tail, tail+1, ... (mod cap)` up to (but not including) `head`. The
/// logical size is `head - tail` when `head >= tail` and `cap + head - tail`
/// after wraparound. Logical child `i` maps to physical slot
/// `(tail + i) % cap`; the modulo must match the producer/consumer invariant
/// exactly or children silently alias unrelated slots.
pub struct VecDequeProvider
{
    valobj: Box<dyn HostValue>,
    state: Option<DequeState>,
}

impl VecDequeProvider
{
    pub fn new(valobj: Box<dyn HostValue>) -> LensResult<Self>
    {
        trace!("deque provider for {}", valobj.name());
        let mut provider = VecDequeProvider { valobj, state: None };
        provider.refresh()?;
        Ok(provider)
    }

    /// Logical element count, zero when the last refresh failed.
    pub fn len(&self) -> usize
    {
        self.state.as_ref().map_or(0, |state| state.size)
    }

    /// Whether the deque currently holds no elements.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    fn compute_state(&self) -> LensResult<DequeState>
    {
        let head = usize::try_from(self.valobj.field("head")?.as_unsigned()?).unwrap_or(0);
        let tail = usize::try_from(self.valobj.field("tail")?.as_unsigned()?).unwrap_or(0);
        let buf = self.valobj.field("buf")?;
        let cap = usize::try_from(buf.field("cap")?.as_unsigned()?).unwrap_or(0);

        // The indices come straight out of inferior memory; a stale or
        // corrupt value must fail closed, not overflow.
        let mismatch = |detail: String| LensError::LayoutMismatch {
            type_name: self.valobj.type_of().name.clone(),
            detail,
        };
        let size = if head >= tail {
            head - tail
        } else {
            cap.checked_add(head)
                .and_then(|total| total.checked_sub(tail))
                .ok_or_else(|| mismatch(format!("head/tail out of range (head={head}, tail={tail}, cap={cap})")))?
        };

        // An unallocated deque has cap == 0 (and nothing stored). Guard the
        // modulo rather than trust head == tail.
        if (cap == 0 && size != 0) || size > cap {
            return Err(mismatch(format!(
                "ring occupancy {size} exceeds capacity {cap} (head={head}, tail={tail})"
            )));
        }

        let data_ptr = buf.field("ptr")?.child_at(0)?.child_at(0)?;
        let elem_ty = data_ptr.pointee_type()?;
        let elem_size = elem_ty.byte_size;
        let base = Address::new(data_ptr.as_unsigned()?);

        Ok(DequeState {
            head,
            tail,
            cap,
            size,
            base,
            elem_ty,
            elem_size,
        })
    }
}

impl SyntheticProvider for VecDequeProvider
{
    fn child_count(&self) -> usize
    {
        self.len()
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let state = self.state.as_ref().ok_or(LensError::IndexOutOfRange { index, len: 0 })?;
        if index >= state.size || state.cap == 0 {
            return Err(LensError::IndexOutOfRange {
                index,
                len: state.size,
            });
        }

        let slot = state.tail.wrapping_add(index) % state.cap;
        let address = state.base + (slot as u64).wrapping_mul(state.elem_size);
        self.valobj.value_at_address(&format!("[{index}]"), address, &state.elem_ty)
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        let state = self.state.as_ref()?;
        let index = bracketed_index(name)?;
        if state.cap == 0 {
            return None;
        }
        // Wraparound-aware validity test: the slot for `index` must lie in the
        // occupied region between tail and head.
        if state.tail <= index && state.tail.wrapping_add(index) % state.cap < state.head {
            Some(index)
        } else {
            None
        }
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
                warn!("failed to decode {} as VecDeque: {err}", self.valobj.type_of().name);
                Err(err)
            }
        }
    }

    fn has_children(&self) -> bool
    {
        true
    }
}
