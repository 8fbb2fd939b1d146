//! Decoders for the interior-mutability wrappers: `core::cell::Cell<T>`,
//! `RefCell<T>`, and the `Ref<T>`/`RefMut<T>` guards.

use tracing::{trace, warn};

use crate::error::{LensError, LensResult};
use crate::host::{HostValue, ValueBuilder};
use crate::providers::SyntheticProvider;

/// Synthetic provider for `core::cell::Cell<T>`.
///
/// ```text
/// struct Cell<T> { value: UnsafeCell<T> }
/// struct UnsafeCell<T> { value: T }
/// ```
///
/// One child: the wrapped value, with the unsafe-cell wrapper peeled off.
pub struct CellProvider
{
    valobj: Box<dyn HostValue>,
}

impl CellProvider
{
    pub fn new(valobj: Box<dyn HostValue>) -> Self
    {
        trace!("cell provider for {}", valobj.name());
        CellProvider { valobj }
    }
}

impl SyntheticProvider for CellProvider
{
    fn child_count(&self) -> usize
    {
        1
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        if index != 0 {
            return Err(LensError::IndexOutOfRange { index, len: 1 });
        }
        self.valobj.field("value")?.child_at(0)
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        (name == "value").then_some(0)
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

/// Synthetic provider for `core::cell::RefCell<T>` and the `Ref<T>`/`RefMut<T>`
/// borrow guards.
///
/// ```text
/// struct RefCell<T> { borrow: Cell<isize>, value: UnsafeCell<T> }
/// struct Ref<T>     { value: &T, borrow: BorrowRef { borrow: &Cell<isize> } }
/// ```
///
/// The borrow flag is a signed count: positive = that many shared borrows,
/// negative = exclusively borrowed. For the guards the flag sits one pointer
/// indirection deeper than for the cell itself, hence the extra unwrap step.
///
/// Display policy: two children, the wrapped `value` and a synthesized signed
/// `borrow` counter.
pub struct RefProvider
{
    valobj: Box<dyn HostValue>,
    is_cell: bool,
    builder: ValueBuilder,
    borrow_count: Option<i64>,
}

impl RefProvider
{
    pub fn new(valobj: Box<dyn HostValue>, is_cell: bool) -> LensResult<Self>
    {
        trace!("ref provider for {} (cell: {is_cell})", valobj.name());
        let builder = ValueBuilder::for_value(&*valobj);
        let mut provider = RefProvider {
            valobj,
            is_cell,
            builder,
            borrow_count: None,
        };
        provider.refresh()?;
        Ok(provider)
    }

    /// Borrow flag from the last refresh.
    pub fn borrow_flag(&self) -> Option<i64>
    {
        self.borrow_count
    }

    fn borrow_value(&self) -> LensResult<Box<dyn HostValue>>
    {
        let borrow = self.valobj.field("borrow")?.child_at(0)?.child_at(0)?;
        if self.is_cell { Ok(borrow) } else { borrow.child_at(0) }
    }
}

impl SyntheticProvider for RefProvider
{
    fn child_count(&self) -> usize
    {
        if self.borrow_count.is_some() { 2 } else { 0 }
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let borrow = self.borrow_count.ok_or(LensError::IndexOutOfRange { index, len: 0 })?;
        match index {
            0 => self.valobj.field("value")?.child_at(0),
            1 => self.builder.from_int(&*self.valobj, "borrow", borrow),
            _ => Err(LensError::IndexOutOfRange { index, len: 2 }),
        }
    }

    fn child_index_of(&self, name: &str) -> Option<usize>
    {
        match name {
            "value" => Some(0),
            "borrow" => Some(1),
            _ => None,
        }
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        self.borrow_count = None;
        match self.borrow_value().and_then(|borrow| borrow.as_signed()) {
            Ok(count) => {
                self.borrow_count = Some(count);
                Ok(())
            }
            Err(err) => {
                warn!("failed to decode {} borrow flag: {err}", self.valobj.type_of().name);
                Err(err)
            }
        }
    }

    fn has_children(&self) -> bool
    {
        true
    }
}
