//! # Error Types
//!
//! General error handling for the introspection layer.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::types::Address;

/// Main error type for introspection operations
///
/// This enum represents all the ways classifying a type or decoding a value
/// can fail. Nothing here is ever allowed to take the host debugger down:
/// every variant is a value the host receives and renders, not a fault.
///
/// ## Error Categories
///
/// 1. **Host errors**: MemoryRead (the inferior's memory could not be read)
/// 2. **Metadata errors**: FieldNotFound, TypeNotFound (debug info did not
///    contain what was asked for)
/// 3. **Layout errors**: LayoutMismatch (a type's name matched a known
///    standard container but its internals did not have the expected shape,
///    e.g. a compiler version changed a private layout)
/// 4. **Query errors**: IndexOutOfRange (a child index past the logical
///    length), NotScalar (an integer was requested from a non-integer value)
#[derive(Error, Debug)]
pub enum LensError
{
    /// Reading raw bytes from the inferior process failed
    ///
    /// This happens when:
    /// - The address is not mapped in the inferior
    /// - The inferior exited between the layout computation and the read
    /// - The host refused the read for any other reason
    ///
    /// The error is propagated as a visible string in place of the value,
    /// never silently substituted with zeroes or garbage.
    #[error("Failed to read {length} bytes at {address}: {reason}")]
    MemoryRead
    {
        /// Address the read started at
        address: Address,
        /// Number of bytes requested
        length: usize,
        /// Host-supplied description of the failure
        reason: String,
    },

    /// A struct/union member lookup failed
    ///
    /// Raised when a decoder asks for a field (by name or child index) that
    /// the type's debug info does not declare. For recognized containers this
    /// usually means the standard library layout changed underneath us.
    #[error("Type `{type_name}` has no field `{field}`")]
    FieldNotFound
    {
        /// Name of the type the lookup ran against
        type_name: String,
        /// Requested field name or stringified child index
        field: String,
    },

    /// A recognized container did not have the expected internal layout
    ///
    /// The type's *name* matched a known standard-library container, but
    /// walking its internals hit something unexpected. Decoders fail closed
    /// on this error: no children and no summary rather than misread memory.
    #[error("`{type_name}` did not match the expected layout: {detail}")]
    LayoutMismatch
    {
        /// Name of the container type being decoded
        type_name: String,
        /// What was expected and what was found
        detail: String,
    },

    /// A child was requested past the container's logical length
    ///
    /// Well-defined "not found", as opposed to undefined behavior: requesting
    /// `child(5)` of a five-element sequence yields this error.
    #[error("Child index {index} out of range (length {len})")]
    IndexOutOfRange
    {
        /// Requested index
        index: usize,
        /// Logical length at the time of the query
        len: usize,
    },

    /// A type lookup by name found nothing in the debug info
    ///
    /// Used by decoders that reinterpret memory as a related named type
    /// (node-type punning), when that related type is not in the symbol data.
    #[error("No type named `{0}` in the debug info")]
    TypeNotFound(String),

    /// An integer was requested from a value that has no scalar backing
    #[error("Value `{0}` is not an integer-backed value")]
    NotScalar(String),

    /// The host value does not support the requested derivation
    ///
    /// For example dereferencing a non-pointer or asking for the element type
    /// of a non-array.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Convenience type alias for `Result<T, LensError>`
///
/// ```rust
/// use rustlens_core::error::LensResult;
/// fn foo() -> LensResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type LensResult<T> = std::result::Result<T, LensError>;
