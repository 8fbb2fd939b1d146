//! # Summary Formatters
//!
//! One-line textual descriptions of decoded values.
//!
//! The formatting itself is kept separate from the dispatch wiring so each
//! piece stays trivially testable: functions here either format already
//! decoded state (counts, flags) or read string bytes out of the inferior.

use crate::error::LensResult;
use crate::host::HostValue;
use crate::types::Address;

/// Longest string payload we will pull out of the inferior for a summary.
/// A corrupt length field must not turn into a gigabyte-sized read.
const MAX_STRING_BYTES: usize = 4096;

/// `size=N` summary used by every sequence and map container.
pub fn size_summary(len: usize) -> String
{
    format!("size={len}")
}

/// `strong=S, weak=W` summary for the reference-counted boxes.
pub fn rc_summary(strong: u64, weak: u64) -> String
{
    format!("strong={strong}, weak={weak}")
}

/// Borrow-flag summary for the `RefCell` family.
///
/// The flag is a signed count: positive means shared borrows, negative means
/// an exclusive borrow.
pub fn borrow_summary(flag: i64) -> String
{
    if flag >= 0 {
        format!("borrow={flag}")
    } else {
        format!("borrow_mut={}", -flag)
    }
}

/// Summary for `alloc::string::String`: the quoted UTF-8 contents.
///
/// ```text
/// struct String { vec: Vec<u8> }
/// ```
///
/// The byte length and the data pointer come from the inner vector; the bytes
/// themselves are read raw from the inferior. Invalid UTF-8 is rendered
/// lossily rather than suppressed, and a failed memory read becomes a visible
/// `<error: ...>` summary instead of fabricated contents.
pub fn string_summary(valobj: &dyn HostValue) -> LensResult<String>
{
    let vec = valobj.field("vec")?;
    let length = usize::try_from(vec.field("len")?.as_unsigned()?).unwrap_or(0);
    let data_ptr = vec.field("buf")?.child_at(0)?.child_at(0)?.child_at(0)?;
    let start = Address::new(data_ptr.as_unsigned()?);
    Ok(read_quoted(valobj, start, length))
}

/// Summary for `&str`: the quoted UTF-8 contents.
///
/// ```text
/// struct &str { data_ptr: *const u8, length: usize }
/// ```
pub fn str_summary(valobj: &dyn HostValue) -> LensResult<String>
{
    let length = usize::try_from(valobj.field("length")?.as_unsigned()?).unwrap_or(0);
    let data_ptr = valobj.field("data_ptr")?;
    let start = Address::new(data_ptr.as_unsigned()?);
    Ok(read_quoted(valobj, start, length))
}

fn read_quoted(valobj: &dyn HostValue, start: Address, length: usize) -> String
{
    let clamped = length.min(MAX_STRING_BYTES);
    match valobj.read_bytes(start, clamped) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            if clamped < length {
                format!("\"{text}\"...")
            } else {
                format!("\"{text}\"")
            }
        }
        Err(err) => format!("<error: {err}>"),
    }
}
