//! # Shape Classification
//!
//! Pure structural classification of Rust types from debug-info metadata.
//!
//! The compiler does not expose "this is a `Vec`" or "this is an enum tuple
//! variant" through debug info; all we get is a qualified name and a member
//! list. This module recovers the semantic shape from exactly that, using two
//! kinds of evidence:
//!
//! - **Name patterns** for the recognized standard-library containers. These
//!   are anchored to the full crate-qualified path so a user type that merely
//!   ends in `Vec` (or contains a field named `Vec`) never matches.
//! - **Structural rules** for everything else: reserved field names the
//!   compiler emits for enum discriminants, positional `__N` field names for
//!   tuples, and unnamed union members for lowered enums.
//!
//! Container-name matching runs *before* the structural rules and wins every
//! tie, because container internals themselves look like plain structs or
//! tuples under the structural rules.
//!
//! Classification is pure and deterministic: same name + members, same shape.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{FieldDescriptor, TypeDescriptor, TypeKind};

/// Field name the compiler reserves for an enum variant's discriminant member.
pub const ENUM_DISR_FIELD_NAME: &str = "RUST$ENUM$DISR";

/// Name prefix the compiler reserves for niche-encoded ("compressed") enums,
/// whose discriminant lives in an otherwise-impossible bit pattern of a data
/// field instead of a separate tag.
pub const ENCODED_ENUM_PREFIX: &str = "RUST$ENCODED$ENUM$";

static STD_STRING_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(alloc::([a-zA-Z_]+::)+)String$").unwrap());
static STD_STR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^&str$").unwrap());
static STD_VEC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(alloc::([a-zA-Z_]+::)+)Vec<.+>$").unwrap());
static STD_VEC_DEQUE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(alloc::([a-zA-Z_]+::)+)VecDeque<.+>$").unwrap());
static STD_RC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(alloc::([a-zA-Z]+::)+)Rc<.+>$").unwrap());
static STD_ARC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(alloc::([a-zA-Z]+::)+)Arc<.+>$").unwrap());
static STD_CELL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(core::([a-zA-Z_]+::)+)Cell<.+>$").unwrap());
static STD_REF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(core::([a-zA-Z_]+::)+)Ref<.+>$").unwrap());
static STD_REF_MUT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(core::([a-zA-Z_]+::)+)RefMut<.+>$").unwrap());
static STD_REF_CELL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(core::([a-zA-Z_]+::)+)RefCell<.+>$").unwrap());
static STD_HASH_MAP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(std::collections::([a-zA-Z_]+::)+)HashMap<.+>$").unwrap());
static STD_BTREE_MAP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(alloc::([a-zA-Z_]+::)+)BTreeMap<.+>$").unwrap());

static TUPLE_ITEM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^__\d+$").unwrap());

/// Semantic shape of a Rust type, recovered from its metadata.
///
/// Exactly one shape per type descriptor. The container shapes short-circuit
/// the structural shapes; see the module docs for the tie-break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RustShape
{
    /// Not a struct or union at all, or nothing we recognize
    Other,
    /// Plain struct with named fields
    Struct,
    /// Tuple or tuple struct (all fields positional)
    Tuple,
    /// Enum variant carrying only its discriminant
    CStyleVariant,
    /// Enum variant with positional payload fields
    TupleVariant,
    /// Enum variant with named payload fields
    StructVariant,
    /// Zero-field struct or union; nothing to decode
    Empty,
    /// Union lowering of a single-variant enum; no discriminant at runtime
    SingletonEnum,
    /// Union lowering of a multi-variant enum with an explicit discriminant
    RegularEnum,
    /// Union lowering of a niche-encoded enum (discriminant folded into a
    /// data field's unused bit pattern)
    EncodedEnum,
    /// An actual user-written union
    RegularUnion,
    /// `alloc::vec::Vec<T>`
    Vec,
    /// `alloc::string::String`
    String,
    /// `&str`
    Str,
    /// `alloc::collections::vec_deque::VecDeque<T>`
    VecDeque,
    /// `alloc::rc::Rc<T>`
    Rc,
    /// `alloc::sync::Arc<T>`
    Arc,
    /// `core::cell::Cell<T>`
    Cell,
    /// `core::cell::Ref<T>`
    Ref,
    /// `core::cell::RefMut<T>`
    RefMut,
    /// `core::cell::RefCell<T>`
    RefCell,
    /// `std::collections::HashMap<K, V>`
    HashMap,
    /// `alloc::collections::btree::map::BTreeMap<K, V>`
    BTreeMap,
}

impl RustShape
{
    /// Whether this shape is one of the recognized standard containers.
    pub fn is_std_container(self) -> bool
    {
        matches!(
            self,
            RustShape::Vec
                | RustShape::String
                | RustShape::Str
                | RustShape::VecDeque
                | RustShape::Rc
                | RustShape::Arc
                | RustShape::Cell
                | RustShape::Ref
                | RustShape::RefMut
                | RustShape::RefCell
                | RustShape::HashMap
                | RustShape::BTreeMap
        )
    }
}

/// Classify a type descriptor into its semantic shape.
///
/// Pure function of the descriptor: no I/O, no cached state, deterministic.
pub fn classify(ty: &TypeDescriptor) -> RustShape
{
    match ty.kind {
        TypeKind::Struct => classify_struct(&ty.name, &ty.fields),
        TypeKind::Union => classify_union(&ty.fields),
        _ => RustShape::Other,
    }
}

fn classify_struct(name: &str, fields: &[FieldDescriptor]) -> RustShape
{
    if fields.is_empty() {
        return RustShape::Empty;
    }

    // Known std containers win over the structural rules below; their
    // internals would otherwise classify as plain structs.
    if STD_STRING_REGEX.is_match(name) {
        return RustShape::String;
    }
    if STD_STR_REGEX.is_match(name) {
        return RustShape::Str;
    }
    if STD_VEC_REGEX.is_match(name) {
        return RustShape::Vec;
    }
    if STD_VEC_DEQUE_REGEX.is_match(name) {
        return RustShape::VecDeque;
    }
    if STD_RC_REGEX.is_match(name) {
        return RustShape::Rc;
    }
    if STD_ARC_REGEX.is_match(name) {
        return RustShape::Arc;
    }
    if STD_CELL_REGEX.is_match(name) {
        return RustShape::Cell;
    }
    if STD_REF_REGEX.is_match(name) {
        return RustShape::Ref;
    }
    if STD_REF_MUT_REGEX.is_match(name) {
        return RustShape::RefMut;
    }
    if STD_REF_CELL_REGEX.is_match(name) {
        return RustShape::RefCell;
    }
    if STD_HASH_MAP_REGEX.is_match(name) {
        return RustShape::HashMap;
    }
    if STD_BTREE_MAP_REGEX.is_match(name) {
        return RustShape::BTreeMap;
    }

    if fields[0].name.as_deref() == Some(ENUM_DISR_FIELD_NAME) {
        if fields.len() == 1 {
            return RustShape::CStyleVariant;
        }
        if is_tuple_fields(&fields[1..]) {
            return RustShape::TupleVariant;
        }
        return RustShape::StructVariant;
    }

    if is_tuple_fields(fields) {
        return RustShape::Tuple;
    }

    RustShape::Struct
}

fn classify_union(fields: &[FieldDescriptor]) -> RustShape
{
    if fields.is_empty() {
        return RustShape::Empty;
    }

    match fields[0].name.as_deref() {
        None => {
            if fields.len() == 1 {
                RustShape::SingletonEnum
            } else {
                RustShape::RegularEnum
            }
        }
        Some(first) if first.starts_with(ENCODED_ENUM_PREFIX) => {
            // The compiler emits exactly one member for this lowering. A
            // prefixed name on a multi-member union is not a layout we know,
            // so fall through to the plain-union shape rather than guess.
            if fields.len() == 1 {
                RustShape::EncodedEnum
            } else {
                RustShape::RegularUnion
            }
        }
        Some(_) => RustShape::RegularUnion,
    }
}

/// All field names positional (`__0`, `__1`, ...)? Unnamed fields never count.
fn is_tuple_fields(fields: &[FieldDescriptor]) -> bool
{
    fields
        .iter()
        .all(|field| field.name.as_deref().is_some_and(|name| TUPLE_ITEM_REGEX.is_match(name)))
}
