//! # Types
//!
//! Host-agnostic types used throughout the introspection layer.
//!
//! These types abstract away the concrete debugger host, allowing the
//! classifier and the container decoders to work with concepts like "memory
//! address" and "type descriptor" without knowing whether the metadata came
//! from LLDB, GDB, or a test fixture.

use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;

/// Strongly typed memory address
///
/// This wrapper around `u64` provides type safety when working with memory
/// addresses. It prevents accidentally mixing addresses with other `u64` values
/// (like lengths, capacities, or element sizes), which matters a lot in code
/// whose whole job is pointer arithmetic over a foreign process.
///
/// ## Example
///
/// ```rust
/// use rustlens_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100; // Add offset
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Typically an invalid address; used as a sentinel for "no allocation".
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// This is equivalent to `Address::from(value)` but can be used in const contexts.
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// Returns `Some(new_address)` if the addition doesn't overflow, or `None` if it does.
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Add an offset to this address, saturating at the maximum value
    pub fn saturating_add(self, offset: u64) -> Self
    {
        Address(self.0.saturating_add(offset))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

/// Byte order of the inferior process
///
/// Needed when this layer assembles raw bytes itself, e.g. when synthesizing
/// a reference-count integer for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder
{
    /// Least-significant byte first (x86-64, AArch64 in practice)
    Little,
    /// Most-significant byte first
    Big,
}

/// Structural kind of a type, as exposed by the debug-info reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind
{
    /// A struct (named or tuple-like; the field names tell them apart)
    Struct,
    /// A union; Rust enums lower to tagged unions in debug info
    Union,
    /// A raw or reference pointer
    Pointer,
    /// A fixed-length array
    Array,
    /// A primitive (integer, float, bool, char)
    Base,
    /// Anything else (function types, opaque types, ...)
    Other,
}

/// One member of a struct or union type.
///
/// For Rust enums lowered to unions the variant members may be unnamed, which
/// is load-bearing for classification, so the name is optional here exactly as
/// it is in the debug info.
#[derive(Debug, Clone)]
pub struct FieldDescriptor
{
    /// Declared field name, `None` for unnamed union variants
    pub name: Option<String>,
    /// Name of the field's declared type
    pub type_name: String,
}

impl FieldDescriptor
{
    /// Convenience constructor used by hosts and tests.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self
    {
        FieldDescriptor {
            name: Some(name.into()),
            type_name: type_name.into(),
        }
    }

    /// An unnamed member (enum variant struct inside the lowered union).
    pub fn unnamed(type_name: impl Into<String>) -> Self
    {
        FieldDescriptor {
            name: None,
            type_name: type_name.into(),
        }
    }
}

/// Read-only description of a type, as seen through debugger metadata.
///
/// This is the *entire* type knowledge the classifier is allowed to use: the
/// qualified name, the structural kind, the byte size, and the ordered member
/// list. There is deliberately no compiler-side reflection behind it; shape
/// recovery from exactly this much information is the point of the library.
///
/// Descriptors are shared as `Arc<TypeDescriptor>` because the host usually
/// caches them per type and hands the same descriptor to many values.
#[derive(Debug, Clone)]
pub struct TypeDescriptor
{
    /// Fully qualified type name (e.g. `alloc::vec::Vec<i32>`)
    pub name: String,
    /// Size of one value of this type, in bytes
    pub byte_size: u64,
    /// Structural kind
    pub kind: TypeKind,
    /// Ordered member list; empty for non-composite types
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor
{
    /// Build a struct descriptor.
    pub fn structure(name: impl Into<String>, byte_size: u64, fields: Vec<FieldDescriptor>) -> Arc<Self>
    {
        Arc::new(TypeDescriptor {
            name: name.into(),
            byte_size,
            kind: TypeKind::Struct,
            fields,
        })
    }

    /// Build a union descriptor.
    pub fn union(name: impl Into<String>, byte_size: u64, fields: Vec<FieldDescriptor>) -> Arc<Self>
    {
        Arc::new(TypeDescriptor {
            name: name.into(),
            byte_size,
            kind: TypeKind::Union,
            fields,
        })
    }

    /// Build a primitive descriptor.
    pub fn base(name: impl Into<String>, byte_size: u64) -> Arc<Self>
    {
        Arc::new(TypeDescriptor {
            name: name.into(),
            byte_size,
            kind: TypeKind::Base,
            fields: Vec::new(),
        })
    }

    /// Build a pointer descriptor. The pointee is resolved through the host
    /// (`HostValue::pointee_type`), not stored here, so descriptors stay
    /// acyclic even for self-referential types.
    pub fn pointer(name: impl Into<String>, byte_size: u64) -> Arc<Self>
    {
        Arc::new(TypeDescriptor {
            name: name.into(),
            byte_size,
            kind: TypeKind::Pointer,
            fields: Vec::new(),
        })
    }

    /// Build a fixed-length array descriptor. The element type is resolved
    /// through the host (`HostValue::element_type`).
    pub fn array(name: impl Into<String>, byte_size: u64) -> Arc<Self>
    {
        Arc::new(TypeDescriptor {
            name: name.into(),
            byte_size,
            kind: TypeKind::Array,
            fields: Vec::new(),
        })
    }

    /// Whether this type is a struct.
    pub fn is_struct(&self) -> bool
    {
        self.kind == TypeKind::Struct
    }

    /// Whether this type is a union.
    pub fn is_union(&self) -> bool
    {
        self.kind == TypeKind::Union
    }

    /// Name of the field at `index`, if it exists and is named.
    pub fn field_name(&self, index: usize) -> Option<&str>
    {
        self.fields.get(index).and_then(|field| field.name.as_deref())
    }
}
