//! # rustlens-core
//!
//! Rust type classification and standard-container decoding for debugger hosts.
//!
//! The Rust compiler's debug info describes a `Vec<T>` as an ordinary struct
//! with a `buf` and a `len`, an enum as a tagged union with reserved marker
//! field names, and a `BTreeMap` as a pointer into private node types. This
//! crate recovers the *semantic* shape of such values from nothing but that
//! metadata, then decodes the recognized standard-library containers out of
//! raw inferior memory:
//!
//! - **Classification** ([`classify`]): pure mapping from a type's name and
//!   member list to one of a closed set of shapes (structs, tuples, the enum
//!   variant encodings, and the known std containers).
//! - **Decoding** ([`providers`]): per-container layout walkers that compute
//!   logical lengths and child addresses from hard-coded knowledge of the
//!   standard library's private layouts.
//! - **Dispatch** ([`dispatch`]): the entry points a host calls per value,
//!   with classification cached by type identity.
//!
//! The debugger host stays on the other side of the [`host::HostValue`]
//! facade: it supplies type metadata, raw memory reads, and derived value
//! handles, and receives summaries and navigable children back. This crate
//! never executes code in the inferior and never mutates it.
//!
//! ## Failure discipline
//!
//! Misclassifying a type means misreading memory, so name matching is
//! anchored and layout walks fail closed: a recognized container whose
//! internals do not look exactly as expected reports no children and no
//! summary instead of garbage. No code path is allowed to panic on
//! host-supplied data.

pub mod classify;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod providers;
pub mod summary;
pub mod types;

pub use classify::{RustShape, classify};
pub use dispatch::{ShapeCache, summary_lookup, synthetic_lookup};
// Re-export commonly used types
pub use error::{LensError, LensResult};
pub use host::{HostValue, ValueBuilder};
pub use providers::SyntheticProvider;
pub use types::{Address, ByteOrder, FieldDescriptor, TypeDescriptor, TypeKind};
