//! Decoder for the jvmstat performance data a HotSpot JVM publishes in
//! `<tmp>/hsperfdata_<user>/<pid>`.
//!
//! Layout (version 2):
//!
//! ```text
//! prologue  magic:u32 (always big endian) byte_order:u8 major:u8 minor:u8
//!           accessible:u8 used:i32 overflow:i32 mod_time_stamp:i64
//!           entry_offset:i32 num_entries:i32
//! entry     entry_length:i32 name_offset:i32 vector_length:i32 data_type:u8
//!           flags:u8 data_units:u8 data_variability:u8 data_offset:i32
//! ```
//!
//! Offsets inside an entry are relative to the start of that entry.

use bytes::Buf;
use std::collections::BTreeMap;

pub const PERFDATA_MAGIC: u32 = 0xCAFE_C0C0;
pub const PROLOGUE_LENGTH: usize = 32;
pub const ENTRY_HEADER_LENGTH: usize = 20;

const BIG_ENDIAN: u8 = 0;
const LITTLE_ENDIAN: u8 = 1;
const TYPE_BYTE: u8 = b'B';
const TYPE_LONG: u8 = b'J';

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PerfDataError {
    #[error("perfdata is truncated: need {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("bad perfdata magic {0:#010x}")]
    BadMagic(u32),
    #[error("unknown perfdata byte order {0}")]
    BadByteOrder(u8),
    #[error("unsupported perfdata version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("perfdata is not accessible yet")]
    NotAccessible,
    #[error("malformed perfdata entry at offset {0}")]
    MalformedEntry(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerfValue {
    Long(i64),
    Text(String),
}

impl PerfValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PerfValue::Text(text) => Some(text),
            PerfValue::Long(_) => None,
        }
    }
}

/// Counters of one perfdata snapshot, keyed by name.
#[derive(Debug, Default)]
pub struct PerfData {
    pub counters: BTreeMap<String, PerfValue>,
}

impl PerfData {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.counters.get(name).and_then(PerfValue::as_text)
    }
}

#[derive(Clone, Copy)]
struct Reader<'a> {
    data: &'a [u8],
    little_endian: bool,
}

impl<'a> Reader<'a> {
    fn at(&self, offset: usize, needed: usize) -> Result<&'a [u8], PerfDataError> {
        offset
            .checked_add(needed)
            .filter(|end| *end <= self.data.len())
            .map(|end| &self.data[offset..end])
            .ok_or(PerfDataError::Truncated { offset, needed })
    }

    fn i32(&self, buf: &mut &[u8]) -> i32 {
        if self.little_endian {
            buf.get_i32_le()
        } else {
            buf.get_i32()
        }
    }

    fn i64(&self, buf: &mut &[u8]) -> i64 {
        if self.little_endian {
            buf.get_i64_le()
        } else {
            buf.get_i64()
        }
    }

    fn offset(&self, value: i32, base: usize) -> Result<usize, PerfDataError> {
        usize::try_from(value)
            .ok()
            .and_then(|value| base.checked_add(value))
            .ok_or(PerfDataError::MalformedEntry(base))
    }
}

pub fn decode(data: &[u8]) -> Result<PerfData, PerfDataError> {
    let mut prologue = Reader {
        data,
        little_endian: false,
    }
    .at(0, PROLOGUE_LENGTH)?;

    let magic = prologue.get_u32();
    if magic != PERFDATA_MAGIC {
        return Err(PerfDataError::BadMagic(magic));
    }
    let little_endian = match prologue.get_u8() {
        BIG_ENDIAN => false,
        LITTLE_ENDIAN => true,
        other => return Err(PerfDataError::BadByteOrder(other)),
    };
    let major = prologue.get_u8();
    let minor = prologue.get_u8();
    if major != 2 {
        return Err(PerfDataError::UnsupportedVersion { major, minor });
    }
    if prologue.get_u8() == 0 {
        return Err(PerfDataError::NotAccessible);
    }

    let reader = Reader { data, little_endian };
    let _used = reader.i32(&mut prologue);
    let _overflow = reader.i32(&mut prologue);
    let _mod_time_stamp = reader.i64(&mut prologue);
    let entry_offset = reader.i32(&mut prologue);
    let num_entries = reader.i32(&mut prologue);

    let mut counters = BTreeMap::new();
    let mut start = reader.offset(entry_offset, 0)?;
    for _ in 0..num_entries.max(0) {
        let (name, value, length) = decode_entry(reader, start)?;
        if let Some(value) = value {
            counters.insert(name, value);
        }
        start = start
            .checked_add(length)
            .ok_or(PerfDataError::MalformedEntry(start))?;
    }

    Ok(PerfData { counters })
}

fn decode_entry(
    reader: Reader<'_>,
    start: usize,
) -> Result<(String, Option<PerfValue>, usize), PerfDataError> {
    let mut header = reader.at(start, ENTRY_HEADER_LENGTH)?;
    let entry_length = reader.i32(&mut header);
    let name_offset = reader.i32(&mut header);
    let vector_length = reader.i32(&mut header);
    let data_type = header.get_u8();
    let _flags = header.get_u8();
    let _units = header.get_u8();
    let _variability = header.get_u8();
    let data_offset = reader.i32(&mut header);

    let length = usize::try_from(entry_length)
        .ok()
        .filter(|length| *length >= ENTRY_HEADER_LENGTH)
        .ok_or(PerfDataError::MalformedEntry(start))?;
    let entry = reader.at(start, length)?;

    let name_start = reader.offset(name_offset, 0)?;
    let name = entry
        .get(name_start..)
        .map(until_nul)
        .ok_or(PerfDataError::MalformedEntry(start))?;

    let data_start = reader.offset(data_offset, 0)?;
    let value = match (data_type, vector_length) {
        (TYPE_LONG, 0) => {
            let mut data = entry
                .get(data_start..data_start + 8)
                .ok_or(PerfDataError::MalformedEntry(start))?;
            Some(PerfValue::Long(reader.i64(&mut data)))
        }
        (TYPE_BYTE, n) if n > 0 => {
            let data = entry
                .get(data_start..data_start + n as usize)
                .ok_or(PerfDataError::MalformedEntry(start))?;
            Some(PerfValue::Text(until_nul(data)))
        }
        // other counter kinds are of no interest here
        _ => None,
    };

    Ok((name, value, length))
}

fn until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
