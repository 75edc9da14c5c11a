//! Binary image codec.
//!
//! On-disk and in-memory layouts are identical: a packed header, the code
//! segment, a sequence of `(addr: i16, len: i16, bytes)` data records, and an
//! optional debug segment of `(label NUL, addr: i32)` records. All integers
//! are little-endian two's-complement.

use crate::consts::{IMAGE_HEADER_SIZE, IMAGE_MAGIC, IMAGE_VERSION};
use crate::error::ImageError;

use std::collections::BTreeMap;

use tracing::{debug, warn};

/// A data segment record, applied to RAM at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    pub addr: i16,
    pub bytes: Vec<u8>,
}

/// In-memory form of a MASM binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub version: u16,
    pub entry_point: u32,
    pub code: Vec<u8>,
    pub data: Vec<DataRecord>,
    /// Debug labels: code offset to label name, last declaration wins.
    pub labels: BTreeMap<u32, String>,
}

impl Image {
    pub fn new(code: Vec<u8>) -> Self {
        Self {
            version: IMAGE_VERSION,
            code,
            ..Self::default()
        }
    }

    pub fn with_entry_point(mut self, entry_point: u32) -> Self {
        self.entry_point = entry_point;
        self
    }

    pub fn push_data(&mut self, addr: i16, bytes: &[u8]) {
        self.data.push(DataRecord {
            addr,
            bytes: bytes.to_vec(),
        });
    }

    pub fn push_label(&mut self, label: &str, addr: u32) {
        self.labels.insert(addr, label.to_string());
    }

    /// Parse an image, validating magic, version and segment sizes. Trailing
    /// bytes after the declared segments are a warning, not an error.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < IMAGE_HEADER_SIZE {
            return Err(ImageError::TruncatedSegment {
                segment: "header",
                expected: IMAGE_HEADER_SIZE,
                found: bytes.len(),
            });
        }

        let magic = read_u32(bytes, 0);
        if magic != IMAGE_MAGIC {
            return Err(ImageError::BadMagic(magic));
        }
        let version = read_u16(bytes, 4);
        if version > IMAGE_VERSION {
            return Err(ImageError::UnsupportedVersion(version));
        }
        let code_size = read_u32(bytes, 6) as usize;
        let data_size = read_u32(bytes, 10) as usize;
        let dbg_size = read_u32(bytes, 14) as usize;
        let entry_point = read_u32(bytes, 18);

        let code_at = IMAGE_HEADER_SIZE;
        let data_at = code_at + code_size;
        let dbg_at = data_at + data_size;
        let total = dbg_at + dbg_size;

        for (segment, end, expected) in [
            ("code", data_at, code_size),
            ("data", dbg_at, data_size),
            ("debug", total, dbg_size),
        ] {
            if bytes.len() < end {
                return Err(ImageError::TruncatedSegment {
                    segment,
                    expected,
                    found: expected - (end - bytes.len()),
                });
            }
        }

        if entry_point as usize >= code_size && code_size > 0 {
            return Err(ImageError::EntryPointOutOfRange {
                entry: entry_point,
                code_size,
            });
        }

        let code = bytes[code_at..data_at].to_vec();
        let data = decode_data_records(&bytes[data_at..dbg_at])?;
        let labels = decode_debug_records(&bytes[dbg_at..total])?;

        if bytes.len() > total {
            warn!(
                extra = bytes.len() - total,
                "extra bytes after the declared image segments"
            );
        }

        debug!(
            version,
            code_size, data_size, dbg_size, entry_point, "decoded image"
        );

        Ok(Self {
            version,
            entry_point,
            code,
            data,
            labels,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let data: Vec<u8> = self
            .data
            .iter()
            .flat_map(|record| {
                let mut r = Vec::with_capacity(4 + record.bytes.len());
                r.extend_from_slice(&record.addr.to_le_bytes());
                r.extend_from_slice(&(record.bytes.len() as i16).to_le_bytes());
                r.extend_from_slice(&record.bytes);
                r
            })
            .collect();
        let dbg: Vec<u8> = self
            .labels
            .iter()
            .flat_map(|(addr, label)| {
                let mut r = Vec::with_capacity(label.len() + 5);
                r.extend_from_slice(label.as_bytes());
                r.push(0);
                r.extend_from_slice(&(*addr as i32).to_le_bytes());
                r
            })
            .collect();

        let mut out = Vec::with_capacity(IMAGE_HEADER_SIZE + self.code.len() + data.len() + dbg.len());
        out.extend_from_slice(&IMAGE_MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(self.code.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(dbg.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.entry_point.to_le_bytes());
        out.extend_from_slice(&self.code);
        out.extend_from_slice(&data);
        out.extend_from_slice(&dbg);
        out
    }
}

fn decode_data_records(segment: &[u8]) -> Result<Vec<DataRecord>, ImageError> {
    let mut records = Vec::new();
    let mut cur = 0;
    while cur < segment.len() {
        if cur + 4 > segment.len() {
            return Err(ImageError::MalformedDataRecord(cur));
        }
        let addr = i16::from_le_bytes([segment[cur], segment[cur + 1]]);
        let len = i16::from_le_bytes([segment[cur + 2], segment[cur + 3]]);
        cur += 4;
        if len < 0 || cur + len as usize > segment.len() {
            return Err(ImageError::MalformedDataRecord(cur - 4));
        }
        records.push(DataRecord {
            addr,
            bytes: segment[cur..cur + len as usize].to_vec(),
        });
        cur += len as usize;
    }
    Ok(records)
}

fn decode_debug_records(segment: &[u8]) -> Result<BTreeMap<u32, String>, ImageError> {
    let mut labels = BTreeMap::new();
    let mut cur = 0;
    while cur < segment.len() {
        let Some(nul) = segment[cur..].iter().position(|b| *b == 0) else {
            return Err(ImageError::MalformedDebugRecord(cur));
        };
        let label = String::from_utf8_lossy(&segment[cur..cur + nul]).into_owned();
        let addr_at = cur + nul + 1;
        if addr_at + 4 > segment.len() {
            return Err(ImageError::MalformedDebugRecord(cur));
        }
        let addr = i32::from_le_bytes([
            segment[addr_at],
            segment[addr_at + 1],
            segment[addr_at + 2],
            segment[addr_at + 3],
        ]);
        labels.insert(addr as u32, label);
        cur = addr_at + 4;
    }
    Ok(labels)
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
