//! # Host Facade
//!
//! The narrow interface this library consumes from the debugger host.
//!
//! Everything the classifier and the container decoders know about the
//! inferior process arrives through [`HostValue`]: type metadata, raw memory,
//! and derived values. The host (LLDB, GDB, a custom frontend, or the test
//! fixture) implements this trait once; the rest of the library is host-blind.
//!
//! The design intentionally mirrors a debugger's value object: a handle to a
//! located value that can enumerate members, be dereferenced, and mint derived
//! handles at computed addresses. Nothing in here mutates the inferior.

use std::sync::Arc;

use crate::error::{LensError, LensResult};
use crate::types::{Address, ByteOrder, TypeDescriptor};

/// A located value in the inferior process, owned by the host.
///
/// Handles are cheap host-side objects (address + type + optionally cached
/// bytes). This library never keeps one alive past the provider instance that
/// requested it, and never constructs memory itself; derived handles are
/// always minted by the host on request.
pub trait HostValue
{
    /// Display name of this value (variable name, field name, or a synthetic
    /// name like `[3]` chosen at derivation time).
    fn name(&self) -> &str;

    /// Descriptor of this value's type.
    fn type_of(&self) -> Arc<TypeDescriptor>;

    /// Load address of this value in the inferior.
    fn address(&self) -> Address;

    /// Byte order of the inferior process.
    fn byte_order(&self) -> ByteOrder;

    /// Pointer width of the inferior process, in bytes.
    fn pointer_size(&self) -> u8;

    /// This value's contents as an unsigned integer.
    ///
    /// Fails with [`LensError::NotScalar`] for values without integer backing.
    /// For pointer values this is the pointer's numeric address.
    fn as_unsigned(&self) -> LensResult<u64>;

    /// This value's contents as a signed integer.
    fn as_signed(&self) -> LensResult<i64>;

    /// Read raw bytes from the inferior.
    ///
    /// A failed read must surface as [`LensError::MemoryRead`]; the host must
    /// not return truncated or zero-filled buffers.
    fn read_bytes(&self, address: Address, length: usize) -> LensResult<Vec<u8>>;

    /// Member of this value by declared field name.
    fn field(&self, name: &str) -> LensResult<Box<dyn HostValue>>;

    /// Number of children the host's generic enumeration would show.
    ///
    /// For composite values this is the member count; the default provider
    /// defers to it wholesale for types this library does not recognize.
    fn num_children(&self) -> usize;

    /// Child by position, per the host's generic enumeration order.
    fn child_at(&self, index: usize) -> LensResult<Box<dyn HostValue>>;

    /// Position of a named child, `None` if there is no such child.
    fn index_of_child(&self, name: &str) -> Option<usize>;

    /// The value this pointer points at.
    ///
    /// Fails with [`LensError::Unsupported`] on non-pointer values.
    fn dereference(&self) -> LensResult<Box<dyn HostValue>>;

    /// Type of this pointer value's pointee.
    fn pointee_type(&self) -> LensResult<Arc<TypeDescriptor>>;

    /// Element type of this fixed-length array value.
    fn element_type(&self) -> LensResult<Arc<TypeDescriptor>>;

    /// Mint a value of type `ty` at an arbitrary address in the inferior.
    ///
    /// This is how sequence decoders materialize element `i` after computing
    /// `base + i * element_size` themselves.
    fn value_at_address(&self, name: &str, address: Address, ty: &Arc<TypeDescriptor>) -> LensResult<Box<dyn HostValue>>;

    /// Mint a value of type `ty` at a byte offset inside this value.
    fn child_at_offset(&self, name: &str, offset: u64, ty: &Arc<TypeDescriptor>) -> LensResult<Box<dyn HostValue>>;

    /// Reinterpret this pointer as pointing at `pointee` instead.
    ///
    /// Node-type punning for tree containers whose internal nodes share a
    /// common prefix layout with their leaf nodes.
    fn cast_pointer(&self, pointee: &Arc<TypeDescriptor>) -> LensResult<Box<dyn HostValue>>;

    /// Look up a type descriptor by qualified name in the debug info.
    fn type_named(&self, name: &str) -> LensResult<Arc<TypeDescriptor>>;

    /// Mint a presentation-only integer value from raw bytes.
    ///
    /// The bytes are assembled by this library ([`ValueBuilder`]) in the
    /// inferior's byte order; the host wraps them in a basic integer type of
    /// the inferior's address width. Used for derived display values such as
    /// reference counters, which are not raw values in the type system.
    fn synthesize_integer(&self, name: &str, bytes: &[u8], signed: bool) -> LensResult<Box<dyn HostValue>>;

    /// The same value under a different display name.
    ///
    /// Positional tuple children are renamed to their index, sequence elements
    /// to `[i]`; the underlying address and type are untouched.
    fn renamed(&self, name: &str) -> LensResult<Box<dyn HostValue>>;
}

/// Builds presentation-only integer values in the inferior's representation.
///
/// Reference counts and borrow flags are *derived* display values: they exist
/// in the counted allocation, not as members of the handle the user is
/// looking at. To show them as ordinary children we assemble their in-memory
/// representation ourselves, using the inferior's byte order and address
/// width, and ask the host to wrap the bytes as a basic integer value.
#[derive(Debug, Clone, Copy)]
pub struct ValueBuilder
{
    byte_order: ByteOrder,
    pointer_size: u8,
}

impl ValueBuilder
{
    /// Capture byte order and address width from any host value.
    pub fn for_value(value: &dyn HostValue) -> Self
    {
        ValueBuilder {
            byte_order: value.byte_order(),
            pointer_size: value.pointer_size(),
        }
    }

    /// Synthesize an unsigned integer value named `name`.
    pub fn from_uint(&self, host: &dyn HostValue, name: &str, value: u64) -> LensResult<Box<dyn HostValue>>
    {
        host.synthesize_integer(name, &self.encode(value), false)
    }

    /// Synthesize a signed integer value named `name`.
    pub fn from_int(&self, host: &dyn HostValue, name: &str, value: i64) -> LensResult<Box<dyn HostValue>>
    {
        #[allow(clippy::cast_sign_loss)]
        let raw = value as u64;
        host.synthesize_integer(name, &self.encode(raw), true)
    }

    /// Two's-complement bytes of `value`, truncated to the address width.
    fn encode(&self, value: u64) -> Vec<u8>
    {
        let width = usize::from(self.pointer_size).min(8);
        let bytes = match self.byte_order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        match self.byte_order {
            ByteOrder::Little => bytes[..width].to_vec(),
            ByteOrder::Big => bytes[8 - width..].to_vec(),
        }
    }
}

/// Convenience: a [`LensError::FieldNotFound`] for `value`'s type.
///
/// Hosts implementing [`HostValue::field`] can use this to produce the
/// canonical error shape.
pub fn field_not_found(value: &dyn HostValue, field: &str) -> LensError
{
    LensError::FieldNotFound {
        type_name: value.type_of().name.clone(),
        field: field.to_string(),
    }
}
