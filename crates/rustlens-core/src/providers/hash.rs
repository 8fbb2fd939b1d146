//! Decoder for the hash table, `std::collections::HashMap<K, V>`.

use tracing::{trace, warn};

use crate::error::{LensError, LensResult};
use crate::host::HostValue;
use crate::providers::SyntheticProvider;

/// How many `table` wrappers we are willing to descend through before
/// concluding the layout is not one we know.
const MAX_TABLE_DEPTH: usize = 4;

/// Synthetic provider for `std::collections::HashMap<K, V>`.
///
/// ```text
/// struct HashMap<K, V, S> { base: hashbrown::HashMap<K, V, S> }
/// struct hashbrown::HashMap<K, V, S> { hash_builder: S, table: RawTable<(K, V)> }
/// struct RawTable<T> { table: RawTableInner, ... }
/// struct RawTableInner { bucket_mask: usize, ctrl: ..., growth_left: usize, items: usize }
/// ```
///
/// Only the element count is decoded. The open-addressed bucket metadata (the
/// tagged control-byte group encoding) changes between standard-library
/// versions and misreading it would enumerate garbage entries, so this
/// provider deliberately exposes zero children and fails closed whenever the
/// wrapper chain down to `items` does not look exactly as expected.
pub struct HashMapProvider
{
    valobj: Box<dyn HostValue>,
    length: Option<usize>,
}

impl HashMapProvider
{
    pub fn new(valobj: Box<dyn HostValue>) -> LensResult<Self>
    {
        trace!("hash map provider for {}", valobj.name());
        let mut provider = HashMapProvider { valobj, length: None };
        provider.refresh()?;
        Ok(provider)
    }

    /// Element count from the last refresh.
    pub fn len(&self) -> Option<usize>
    {
        self.length
    }

    fn has_field(value: &dyn HostValue, name: &str) -> bool
    {
        value
            .type_of()
            .fields
            .iter()
            .any(|field| field.name.as_deref() == Some(name))
    }

    fn compute_len(&self) -> LensResult<usize>
    {
        // The std type is a thin wrapper over the hashbrown one; older
        // standard libraries kept the table directly.
        let mut current = if Self::has_field(&*self.valobj, "base") {
            self.valobj.field("base")?
        } else if Self::has_field(&*self.valobj, "table") {
            self.valobj.field("table")?
        } else {
            return Err(LensError::LayoutMismatch {
                type_name: self.valobj.type_of().name.clone(),
                detail: "expected a `base` or `table` member".to_string(),
            });
        };

        // Descend through the raw-table wrappers until the size field shows
        // up. Hashbrown calls it `items`; the pre-hashbrown table used `size`.
        for _ in 0..MAX_TABLE_DEPTH {
            for size_field in ["items", "size"] {
                if Self::has_field(&*current, size_field) {
                    let items = current.field(size_field)?.as_unsigned()?;
                    return Ok(usize::try_from(items).unwrap_or(0));
                }
            }
            if Self::has_field(&*current, "table") {
                current = current.field("table")?;
                continue;
            }
            break;
        }

        Err(LensError::LayoutMismatch {
            type_name: self.valobj.type_of().name.clone(),
            detail: "no size field reachable through the table wrappers".to_string(),
        })
    }
}

impl SyntheticProvider for HashMapProvider
{
    fn child_count(&self) -> usize
    {
        // Bucket enumeration is out of scope; zero children, always.
        0
    }

    fn child_at_index(&self, index: usize) -> LensResult<Box<dyn HostValue>>
    {
        Err(LensError::IndexOutOfRange { index, len: 0 })
    }

    fn child_index_of(&self, _name: &str) -> Option<usize>
    {
        None
    }

    fn refresh(&mut self) -> LensResult<()>
    {
        self.length = None;
        match self.compute_len() {
            Ok(len) => {
                self.length = Some(len);
                Ok(())
            }
            Err(err) => {
                warn!("failed to decode {} as HashMap: {err}", self.valobj.type_of().name);
                Err(err)
            }
        }
    }

    fn has_children(&self) -> bool
    {
        false
    }
}
