//! Shared test fixture: a mock debugger host over simulated inferior memory.
//!
//! `MockProcess` owns a flat little-endian memory image and a registry of
//! type descriptors with per-field offsets (offsets live only here; the
//! library under test never sees them, exactly like a real host keeps layout
//! knowledge on its side of the facade). `MockValue` implements `HostValue`
//! on top of it.

// Each integration-test binary compiles this module separately and uses a
// different slice of it.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use rustlens_core::error::{LensError, LensResult};
use rustlens_core::host::HostValue;
use rustlens_core::types::{Address, ByteOrder, FieldDescriptor, TypeDescriptor, TypeKind};

const POINTER_SIZE: u8 = 8;

/// Everything the mock host knows about one type: the descriptor it hands to
/// the library, plus the layout facts it keeps to itself.
struct MockType
{
    desc: Arc<TypeDescriptor>,
    /// Byte offset of each field, parallel to `desc.fields`
    offsets: Vec<u64>,
    /// Pointee type name for pointer types
    pointee: Option<String>,
    /// Element type name and count for array types
    element: Option<(String, usize)>,
}

/// A simulated inferior process: memory plus debug-info types.
pub struct MockProcess
{
    mem: RefCell<Vec<u8>>,
    types: RefCell<HashMap<String, Rc<MockType>>>,
}

impl MockProcess
{
    pub fn new(mem_size: usize) -> Rc<Self>
    {
        let process = Rc::new(MockProcess {
            mem: RefCell::new(vec![0; mem_size]),
            types: RefCell::new(HashMap::new()),
        });
        // Basic integer types every fixture needs, including the ones
        // synthesized counters are typed as.
        process.add_base("u8", 1);
        process.add_base("u16", 2);
        process.add_base("u32", 4);
        process.add_base("i32", 4);
        process.add_base("usize", 8);
        process.add_base("isize", 8);
        process
    }

    fn insert(&self, name: &str, ty: MockType)
    {
        self.types.borrow_mut().insert(name.to_string(), Rc::new(ty));
    }

    pub fn add_base(&self, name: &str, size: u64)
    {
        self.insert(
            name,
            MockType {
                desc: TypeDescriptor::base(name, size),
                offsets: Vec::new(),
                pointee: None,
                element: None,
            },
        );
    }

    /// Register a struct: `fields` are `(name, type_name, offset)`.
    pub fn add_struct(&self, name: &str, size: u64, fields: &[(&str, &str, u64)])
    {
        let descriptors = fields
            .iter()
            .map(|(fname, ftype, _)| FieldDescriptor::new(*fname, *ftype))
            .collect();
        self.insert(
            name,
            MockType {
                desc: TypeDescriptor::structure(name, size, descriptors),
                offsets: fields.iter().map(|(_, _, offset)| *offset).collect(),
                pointee: None,
                element: None,
            },
        );
    }

    /// Register a union whose members are all unnamed (the lowering of a
    /// multi-variant enum): `variants` are type names.
    pub fn add_enum_union(&self, name: &str, size: u64, variants: &[&str])
    {
        let descriptors = variants.iter().map(|vtype| FieldDescriptor::unnamed(*vtype)).collect();
        self.insert(
            name,
            MockType {
                desc: TypeDescriptor::union(name, size, descriptors),
                offsets: vec![0; variants.len()],
                pointee: None,
                element: None,
            },
        );
    }

    /// Register a union with named members.
    pub fn add_union(&self, name: &str, size: u64, fields: &[(&str, &str)])
    {
        let descriptors = fields
            .iter()
            .map(|(fname, ftype)| FieldDescriptor::new(*fname, *ftype))
            .collect();
        self.insert(
            name,
            MockType {
                desc: TypeDescriptor::union(name, size, descriptors),
                offsets: vec![0; fields.len()],
                pointee: None,
                element: None,
            },
        );
    }

    pub fn add_pointer(&self, name: &str, pointee: &str)
    {
        self.insert(
            name,
            MockType {
                desc: TypeDescriptor::pointer(name, u64::from(POINTER_SIZE)),
                offsets: Vec::new(),
                pointee: Some(pointee.to_string()),
                element: None,
            },
        );
    }

    pub fn add_array(&self, name: &str, element: &str, count: usize)
    {
        let elem_size = self.lookup(element).desc.byte_size;
        self.insert(
            name,
            MockType {
                desc: TypeDescriptor::array(name, elem_size * count as u64),
                offsets: Vec::new(),
                pointee: None,
                element: Some((element.to_string(), count)),
            },
        );
    }

    fn lookup(&self, name: &str) -> Rc<MockType>
    {
        self.types
            .borrow()
            .get(name)
            .unwrap_or_else(|| panic!("mock type not registered: {name}"))
            .clone()
    }

    fn try_lookup(&self, name: &str) -> Option<Rc<MockType>>
    {
        self.types.borrow().get(name).cloned()
    }

    /// Pointer-to-`pointee` type, registered on demand (for pointer punning).
    fn ensure_pointer(&self, pointee: &str) -> String
    {
        let name = format!("*const {pointee}");
        if self.try_lookup(&name).is_none() {
            self.add_pointer(&name, pointee);
        }
        name
    }

    pub fn write_bytes(&self, addr: u64, bytes: &[u8])
    {
        let mut mem = self.mem.borrow_mut();
        let start = usize::try_from(addr).unwrap();
        mem[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn write_u64(&self, addr: u64, value: u64)
    {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_u32(&self, addr: u64, value: u32)
    {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_u16(&self, addr: u64, value: u16)
    {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_i32(&self, addr: u64, value: i32)
    {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    pub fn write_i64(&self, addr: u64, value: i64)
    {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    fn read(&self, addr: u64, length: usize) -> LensResult<Vec<u8>>
    {
        let mem = self.mem.borrow();
        let start = usize::try_from(addr).map_err(|_| read_error(addr, length))?;
        let end = start.checked_add(length).ok_or_else(|| read_error(addr, length))?;
        if end > mem.len() {
            return Err(read_error(addr, length));
        }
        Ok(mem[start..end].to_vec())
    }

    /// Mint a root value handle, the way a host would for a variable.
    pub fn value(self: &Rc<Self>, name: &str, addr: u64, type_name: &str) -> Box<dyn HostValue>
    {
        assert!(self.try_lookup(type_name).is_some(), "mock type not registered: {type_name}");
        Box::new(MockValue {
            process: self.clone(),
            name: name.to_string(),
            addr,
            type_name: type_name.to_string(),
            synthetic: None,
        })
    }
}

fn read_error(addr: u64, length: usize) -> LensError
{
    LensError::MemoryRead {
        address: Address::new(addr),
        length,
        reason: "address not mapped in mock inferior".to_string(),
    }
}

/// A located value in the mock inferior.
#[derive(Clone)]
struct MockValue
{
    process: Rc<MockProcess>,
    name: String,
    addr: u64,
    type_name: String,
    /// Raw bytes + signedness for host-synthesized integers, which have no
    /// backing address.
    synthetic: Option<(Vec<u8>, bool)>,
}

impl MockValue
{
    fn mock_type(&self) -> Rc<MockType>
    {
        self.process.lookup(&self.type_name)
    }

    fn raw_scalar(&self) -> LensResult<u64>
    {
        if let Some((bytes, _)) = &self.synthetic {
            return Ok(decode_le(bytes));
        }
        let ty = self.mock_type();
        let size = usize::try_from(ty.desc.byte_size).unwrap();
        if size == 0 || size > 8 || matches!(ty.desc.kind, TypeKind::Struct | TypeKind::Union | TypeKind::Array) {
            return Err(LensError::NotScalar(self.name.clone()));
        }
        let bytes = self.process.read(self.addr, size)?;
        Ok(decode_le(&bytes))
    }

    fn field_by_position(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let ty = self.mock_type();
        let field = ty.desc.fields.get(index).ok_or_else(|| LensError::FieldNotFound {
            type_name: ty.desc.name.clone(),
            field: index.to_string(),
        })?;
        let name = field.name.clone().unwrap_or_else(|| format!("<variant {index}>"));
        Ok(Box::new(MockValue {
            process: self.process.clone(),
            name,
            addr: self.addr + ty.offsets[index],
            type_name: field.type_name.clone(),
            synthetic: None,
        }))
    }
}

fn decode_le(bytes: &[u8]) -> u64
{
    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    u64::from_le_bytes(buf)
}

impl HostValue for MockValue
{
    fn name(&self) -> &str
    {
        &self.name
    }

    fn type_of(&self) -> Arc<TypeDescriptor>
    {
        self.mock_type().desc.clone()
    }

    fn address(&self) -> Address
    {
        Address::new(self.addr)
    }

    fn byte_order(&self) -> ByteOrder
    {
        ByteOrder::Little
    }

    fn pointer_size(&self) -> u8
    {
        POINTER_SIZE
    }

    fn as_unsigned(&self) -> LensResult<u64>
    {
        self.raw_scalar()
    }

    fn as_signed(&self) -> LensResult<i64>
    {
        let raw = self.raw_scalar()?;
        let size = if let Some((bytes, _)) = &self.synthetic {
            bytes.len()
        } else {
            usize::try_from(self.mock_type().desc.byte_size).unwrap()
        };
        // Sign-extend from the value's width.
        let shift = 64 - (size.min(8) * 8) as u32;
        if shift == 0 {
            Ok(raw as i64)
        } else {
            Ok(((raw << shift) as i64) >> shift)
        }
    }

    fn read_bytes(&self, address: Address, length: usize) -> LensResult<Vec<u8>>
    {
        self.process.read(address.value(), length)
    }

    fn field(&self, name: &str) -> LensResult<Box<dyn HostValue>>
    {
        let ty = self.mock_type();
        let index = ty
            .desc
            .fields
            .iter()
            .position(|field| field.name.as_deref() == Some(name))
            .ok_or_else(|| LensError::FieldNotFound {
                type_name: ty.desc.name.clone(),
                field: name.to_string(),
            })?;
        self.field_by_position(index)
    }

    fn num_children(&self) -> usize
    {
        let ty = self.mock_type();
        if let Some((_, count)) = &ty.element {
            return *count;
        }
        ty.desc.fields.len()
    }

    fn child_at(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        let ty = self.mock_type();
        if let Some((element, count)) = &ty.element {
            if index >= *count {
                return Err(LensError::IndexOutOfRange { index, len: *count });
            }
            let elem_size = self.process.lookup(element).desc.byte_size;
            return Ok(Box::new(MockValue {
                process: self.process.clone(),
                name: format!("[{index}]"),
                addr: self.addr + index as u64 * elem_size,
                type_name: element.clone(),
                synthetic: None,
            }));
        }
        self.field_by_position(index)
    }

    fn index_of_child(&self, name: &str) -> Option<usize>
    {
        self.mock_type()
            .desc
            .fields
            .iter()
            .position(|field| field.name.as_deref() == Some(name))
    }

    fn dereference(&self) -> LensResult<Box<dyn HostValue>>
    {
        let ty = self.mock_type();
        let pointee = ty
            .pointee
            .clone()
            .ok_or_else(|| LensError::Unsupported(format!("dereference of non-pointer `{}`", ty.desc.name)))?;
        let target = self.raw_scalar()?;
        Ok(Box::new(MockValue {
            process: self.process.clone(),
            name: format!("*{}", self.name),
            addr: target,
            type_name: pointee,
            synthetic: None,
        }))
    }

    fn pointee_type(&self) -> LensResult<Arc<TypeDescriptor>>
    {
        let ty = self.mock_type();
        let pointee = ty
            .pointee
            .as_ref()
            .ok_or_else(|| LensError::Unsupported(format!("pointee of non-pointer `{}`", ty.desc.name)))?;
        Ok(self.process.lookup(pointee).desc.clone())
    }

    fn element_type(&self) -> LensResult<Arc<TypeDescriptor>>
    {
        let ty = self.mock_type();
        let (element, _) = ty
            .element
            .as_ref()
            .ok_or_else(|| LensError::Unsupported(format!("element type of non-array `{}`", ty.desc.name)))?;
        Ok(self.process.lookup(element).desc.clone())
    }

    fn value_at_address(&self, name: &str, address: Address, ty: &Arc<TypeDescriptor>) -> LensResult<Box<dyn HostValue>>
    {
        Ok(Box::new(MockValue {
            process: self.process.clone(),
            name: name.to_string(),
            addr: address.value(),
            type_name: ty.name.clone(),
            synthetic: None,
        }))
    }

    fn child_at_offset(&self, name: &str, offset: u64, ty: &Arc<TypeDescriptor>) -> LensResult<Box<dyn HostValue>>
    {
        self.value_at_address(name, Address::new(self.addr + offset), ty)
    }

    fn cast_pointer(&self, pointee: &Arc<TypeDescriptor>) -> LensResult<Box<dyn HostValue>>
    {
        let ty = self.mock_type();
        if ty.pointee.is_none() {
            return Err(LensError::Unsupported(format!("cast of non-pointer `{}`", ty.desc.name)));
        }
        let type_name = self.process.ensure_pointer(&pointee.name);
        Ok(Box::new(MockValue {
            process: self.process.clone(),
            name: self.name.clone(),
            addr: self.addr,
            type_name,
            synthetic: None,
        }))
    }

    fn type_named(&self, name: &str) -> LensResult<Arc<TypeDescriptor>>
    {
        self.process
            .try_lookup(name)
            .map(|ty| ty.desc.clone())
            .ok_or_else(|| LensError::TypeNotFound(name.to_string()))
    }

    fn synthesize_integer(&self, name: &str, bytes: &[u8], signed: bool) -> LensResult<Box<dyn HostValue>>
    {
        Ok(Box::new(MockValue {
            process: self.process.clone(),
            name: name.to_string(),
            addr: 0,
            type_name: if signed { "isize" } else { "usize" }.to_string(),
            synthetic: Some((bytes.to_vec(), signed)),
        }))
    }

    fn renamed(&self, name: &str) -> LensResult<Box<dyn HostValue>>
    {
        let mut clone = self.clone();
        clone.name = name.to_string();
        Ok(Box::new(clone))
    }
}

// ---------------------------------------------------------------------------
// Fixture builders shared by the container tests
// ---------------------------------------------------------------------------

/// Register the `Vec<i32>` wrapper-chain types.
pub fn register_vec_i32(process: &Rc<MockProcess>)
{
    process.add_pointer("*const i32", "i32");
    process.add_struct("core::nonzero::NonZero<*const i32>", 8, &[("__0", "*const i32", 0)]);
    process.add_struct(
        "core::ptr::unique::Unique<i32>",
        8,
        &[("pointer", "core::nonzero::NonZero<*const i32>", 0)],
    );
    process.add_struct(
        "alloc::raw_vec::RawVec<i32>",
        16,
        &[("ptr", "core::ptr::unique::Unique<i32>", 0), ("cap", "usize", 8)],
    );
    process.add_struct(
        "alloc::vec::Vec<i32>",
        24,
        &[("buf", "alloc::raw_vec::RawVec<i32>", 0), ("len", "usize", 16)],
    );
}

/// Lay out a `Vec<i32>` at `vec_addr` whose buffer lives at `data_addr`.
pub fn write_vec_i32(process: &Rc<MockProcess>, vec_addr: u64, data_addr: u64, elements: &[i32])
{
    process.write_u64(vec_addr, data_addr);
    process.write_u64(vec_addr + 8, elements.len() as u64); // cap
    process.write_u64(vec_addr + 16, elements.len() as u64); // len
    for (i, element) in elements.iter().enumerate() {
        process.write_i32(data_addr + i as u64 * 4, *element);
    }
}

/// Register the `String` types (a `Vec<u8>` inside).
pub fn register_string(process: &Rc<MockProcess>)
{
    process.add_pointer("*const u8", "u8");
    process.add_struct("core::nonzero::NonZero<*const u8>", 8, &[("__0", "*const u8", 0)]);
    process.add_struct(
        "core::ptr::unique::Unique<u8>",
        8,
        &[("pointer", "core::nonzero::NonZero<*const u8>", 0)],
    );
    process.add_struct(
        "alloc::raw_vec::RawVec<u8>",
        16,
        &[("ptr", "core::ptr::unique::Unique<u8>", 0), ("cap", "usize", 8)],
    );
    process.add_struct(
        "alloc::vec::Vec<u8>",
        24,
        &[("buf", "alloc::raw_vec::RawVec<u8>", 0), ("len", "usize", 16)],
    );
    process.add_struct("alloc::string::String", 24, &[("vec", "alloc::vec::Vec<u8>", 0)]);
}

/// Lay out a `String` at `string_addr` with its bytes at `data_addr`.
pub fn write_string(process: &Rc<MockProcess>, string_addr: u64, data_addr: u64, text: &str)
{
    process.write_u64(string_addr, data_addr);
    process.write_u64(string_addr + 8, text.len() as u64); // cap
    process.write_u64(string_addr + 16, text.len() as u64); // len
    process.write_bytes(data_addr, text.as_bytes());
}
