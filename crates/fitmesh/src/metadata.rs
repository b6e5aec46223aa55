// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/response metadata blocks sent alongside the payload.
//!
//! Both blocks are little-endian with length-prefixed strings and a
//! trailing tag-length-value section:
//!
//! ```text
//! request:  version:u16 format:i32 major:u16 minor:u16 revision:u16
//!           generic_id:str fitable_id:str tlv
//! response: version:u16 format:i32 code:i32 message:str tlv
//! str:      len:u32 bytes
//! tlv:      count:u16 { tag:u8 len:u32 bytes }*
//! ```

use crate::error::{ErrorCode, FitError, FitResult};
use std::collections::BTreeMap;

/// Metadata layout version written by this crate.
pub const METADATA_VERSION: u16 = 2;

/// TLV tag: serialized global context
pub const TAG_GLOBAL_CONTEXT: u8 = 0x01;
/// TLV tag: serialized exception context
pub const TAG_EXCEPTION_CONTEXT: u8 = 0x02;

/// Generic version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionTriple {
    pub major: u16,
    pub minor: u16,
    pub revision: u16,
}

impl VersionTriple {
    /// Parse "M.m.r" (missing parts are 0).
    pub fn parse(version: &str) -> FitResult<Self> {
        let mut parts = [0u16; 3];
        if !version.is_empty() {
            for (i, part) in version.splitn(3, '.').enumerate() {
                parts[i] = part.parse().map_err(|_| {
                    FitError::serialize(format!("invalid generic version '{}'", version))
                })?;
            }
        }
        Ok(Self {
            major: parts[0],
            minor: parts[1],
            revision: parts[2],
        })
    }
}

/// Metadata preceding a request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub version: u16,
    pub format: i32,
    pub generic_version: VersionTriple,
    pub generic_id: String,
    pub fitable_id: String,
    pub tlv: BTreeMap<u8, Vec<u8>>,
}

impl RequestMetadata {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u16(self.version);
        w.i32(self.format);
        w.u16(self.generic_version.major);
        w.u16(self.generic_version.minor);
        w.u16(self.generic_version.revision);
        w.str(&self.generic_id);
        w.str(&self.fitable_id);
        w.tlv(&self.tlv);
        w.buf
    }

    pub fn decode(buf: &[u8]) -> FitResult<Self> {
        let mut r = Reader::new(buf);
        let meta = Self {
            version: r.u16()?,
            format: r.i32()?,
            generic_version: VersionTriple {
                major: r.u16()?,
                minor: r.u16()?,
                revision: r.u16()?,
            },
            generic_id: r.str()?,
            fitable_id: r.str()?,
            tlv: r.tlv()?,
        };
        Ok(meta)
    }
}

/// Metadata preceding a response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub version: u16,
    pub format: i32,
    pub code: ErrorCode,
    pub message: String,
    pub tlv: BTreeMap<u8, Vec<u8>>,
}

impl ResponseMetadata {
    /// Successful response header.
    pub fn ok(format: i32) -> Self {
        Self {
            version: METADATA_VERSION,
            format,
            code: ErrorCode::OK,
            message: String::new(),
            tlv: BTreeMap::new(),
        }
    }

    /// Failed response header.
    pub fn error(format: i32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            ..Self::ok(format)
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u16(self.version);
        w.i32(self.format);
        w.i32(self.code.as_i32());
        w.str(&self.message);
        w.tlv(&self.tlv);
        w.buf
    }

    pub fn decode(buf: &[u8]) -> FitResult<Self> {
        let mut r = Reader::new(buf);
        Ok(Self {
            version: r.u16()?,
            format: r.i32()?,
            code: ErrorCode::from_i32(r.i32()?),
            message: r.str()?,
            tlv: r.tlv()?,
        })
    }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn bytes(&mut self, v: &[u8]) {
        // Lengths above u32::MAX never reach the wire (context maps are small)
        self.buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(v);
    }

    fn str(&mut self, v: &str) {
        self.bytes(v.as_bytes());
    }

    fn tlv(&mut self, entries: &BTreeMap<u8, Vec<u8>>) {
        self.u16(entries.len() as u16);
        for (tag, value) in entries {
            self.buf.push(*tag);
            self.bytes(value);
        }
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, n: usize) -> FitResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                FitError::new(
                    ErrorCode::INVALID_RESPONSE_METADATA,
                    format!("metadata truncated at offset {}", self.offset),
                )
            })?;
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self) -> FitResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> FitResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> FitResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> FitResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn bytes(&mut self) -> FitResult<Vec<u8>> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn str(&mut self) -> FitResult<String> {
        String::from_utf8(self.bytes()?).map_err(|e| {
            FitError::new(
                ErrorCode::INVALID_RESPONSE_METADATA,
                format!("metadata string is not UTF-8: {}", e),
            )
        })
    }

    fn tlv(&mut self) -> FitResult<BTreeMap<u8, Vec<u8>>> {
        let count = self.u16()?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let tag = self.u8()?;
            entries.insert(tag, self.bytes()?);
        }
        Ok(entries)
    }
}
