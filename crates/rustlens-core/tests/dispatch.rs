//! Tests for dispatch: structural providers, mutually recursive enum
//! dispatch, the default fallback, and the refresh contract.

mod common;

use std::rc::Rc;

use common::{MockProcess, register_vec_i32, write_vec_i32};
use rustlens_core::dispatch::{ShapeCache, synthetic_lookup};
use rustlens_core::providers::{SyntheticProvider, VecProvider};
use rustlens_core::{RustShape, TypeDescriptor};

#[test]
fn test_struct_provider_children()
{
    let process = MockProcess::new(0x1000);
    process.add_struct("test::Point", 8, &[("x", "i32", 0), ("y", "i32", 4)]);
    process.write_i32(0x100, 3);
    process.write_i32(0x104, 4);

    let provider = synthetic_lookup(process.value("p", 0x100, "test::Point")).unwrap();
    assert_eq!(provider.child_count(), 2);
    assert!(provider.has_children());
    assert_eq!(provider.child_index_of("y"), Some(1));
    assert_eq!(provider.child_index_of("z"), None);

    let y = provider.child_at_index(1).unwrap();
    assert_eq!(y.name(), "y");
    assert_eq!(y.as_signed().unwrap(), 4);
}

#[test]
fn test_tuple_provider_renames_children()
{
    let process = MockProcess::new(0x1000);
    process.add_struct("(i32, i32)", 8, &[("__0", "i32", 0), ("__1", "i32", 4)]);
    process.write_i32(0x100, 7);
    process.write_i32(0x104, 8);

    let provider = synthetic_lookup(process.value("t", 0x100, "(i32, i32)")).unwrap();
    assert_eq!(provider.child_count(), 2);
    assert_eq!(provider.child_index_of("1"), Some(1));
    assert_eq!(provider.child_index_of("one"), None);

    let first = provider.child_at_index(0).unwrap();
    assert_eq!(first.name(), "0");
    assert_eq!(first.as_signed().unwrap(), 7);
}

#[test]
fn test_empty_struct_has_no_children()
{
    let process = MockProcess::new(0x1000);
    process.add_struct("test::Unit", 0, &[]);

    let provider = synthetic_lookup(process.value("u", 0x100, "test::Unit")).unwrap();
    assert_eq!(provider.child_count(), 0);
    assert!(!provider.has_children());
    assert_eq!(provider.child_index_of("anything"), None);
}

#[test]
fn test_unrecognized_type_falls_back_to_host_enumeration()
{
    let process = MockProcess::new(0x1000);
    process.write_i32(0x100, 5);

    // A bare integer classifies as Other and defers to the host.
    let provider = synthetic_lookup(process.value("n", 0x100, "i32")).unwrap();
    assert_eq!(provider.child_count(), 0);
    assert!(!provider.has_children());
}

/// The classic tagged-union lowering of
/// `enum Message { Move { x: i32, y: i32 }, Write(i32) }`.
fn register_message_enum(process: &Rc<MockProcess>)
{
    process.add_struct(
        "test::Message::Move",
        12,
        &[("RUST$ENUM$DISR", "u32", 0), ("x", "i32", 4), ("y", "i32", 8)],
    );
    process.add_struct(
        "test::Message::Write",
        8,
        &[("RUST$ENUM$DISR", "u32", 0), ("__0", "i32", 4)],
    );
    process.add_enum_union("test::Message", 12, &["test::Message::Move", "test::Message::Write"]);
}

#[test]
fn test_enum_dispatch_selects_struct_variant()
{
    let process = MockProcess::new(0x1000);
    register_message_enum(&process);
    process.write_u32(0x100, 0); // discriminant: Move
    process.write_i32(0x104, -3);
    process.write_i32(0x108, 9);

    let provider = synthetic_lookup(process.value("msg", 0x100, "test::Message")).unwrap();
    // The active variant's own provider answers: a struct variant with the
    // discriminant marker dropped.
    assert_eq!(provider.child_count(), 2);
    assert_eq!(provider.child_index_of("x"), Some(0));
    assert_eq!(provider.child_at_index(0).unwrap().as_signed().unwrap(), -3);
    assert_eq!(provider.child_at_index(1).unwrap().as_signed().unwrap(), 9);
}

#[test]
fn test_enum_dispatch_selects_tuple_variant()
{
    let process = MockProcess::new(0x1000);
    register_message_enum(&process);
    process.write_u32(0x100, 1); // discriminant: Write
    process.write_i32(0x104, 77);

    let provider = synthetic_lookup(process.value("msg", 0x100, "test::Message")).unwrap();
    assert_eq!(provider.child_count(), 1);

    let payload = provider.child_at_index(0).unwrap();
    assert_eq!(payload.name(), "0");
    assert_eq!(payload.as_signed().unwrap(), 77);
}

#[test]
fn test_singleton_enum_dispatches_into_only_variant()
{
    let process = MockProcess::new(0x1000);
    process.add_struct(
        "test::Only::Value",
        8,
        &[("RUST$ENUM$DISR", "u32", 0), ("inner", "i32", 4)],
    );
    process.add_enum_union("test::Only", 8, &["test::Only::Value"]);
    process.write_i32(0x104, 123);

    let provider = synthetic_lookup(process.value("o", 0x100, "test::Only")).unwrap();
    assert_eq!(provider.child_count(), 1);
    assert_eq!(provider.child_index_of("inner"), Some(0));
    assert_eq!(provider.child_at_index(0).unwrap().as_signed().unwrap(), 123);
}

#[test]
fn test_refresh_reflects_mutated_memory()
{
    let process = MockProcess::new(0x10000);
    register_vec_i32(&process);
    write_vec_i32(&process, 0x100, 0x200, &[1, 2, 3, 4, 5]);

    let value = process.value("v", 0x100, "alloc::vec::Vec<i32>");
    let mut provider = VecProvider::new(value).unwrap();
    assert_eq!(provider.child_count(), 5);

    // The inferior ran: the vec was truncated and reallocated elsewhere.
    process.write_u64(0x100 + 16, 3);
    process.write_u64(0x100, 0x600);
    process.write_i32(0x600, 9);

    // Until refresh the provider answers from its cached state; after
    // refresh every cached address must have been recomputed.
    provider.refresh().unwrap();
    assert_eq!(provider.child_count(), 3);
    let first = provider.child_at_index(0).unwrap();
    assert_eq!(first.address().value(), 0x600);
    assert_eq!(first.as_signed().unwrap(), 9);
}

#[test]
fn test_shape_cache_memoizes_by_type_name()
{
    let mut cache = ShapeCache::new();
    let ty = TypeDescriptor::structure(
        "alloc::vec::Vec<i32>",
        24,
        vec![
            rustlens_core::FieldDescriptor::new("buf", "alloc::raw_vec::RawVec<i32>"),
            rustlens_core::FieldDescriptor::new("len", "usize"),
        ],
    );

    assert!(cache.is_empty());
    assert_eq!(cache.classify(&ty), RustShape::Vec);
    assert_eq!(cache.classify(&ty), RustShape::Vec);
    assert_eq!(cache.len(), 1);
}
