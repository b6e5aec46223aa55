// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serialization codec selection.
//!
//! Codecs themselves live outside this crate; the invocation core only
//! picks one per call (by generic id, the target endpoint's formats and
//! the fitable type) and routes arguments through it.

use crate::context::{Arg, OutArg};
use crate::coordinate::FitableType;
use crate::error::{FitError, FitResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// What a codec must handle for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationDescriptor {
    pub generic_id: String,
    /// Formats accepted by the target endpoint
    pub formats: Vec<i32>,
    pub fitable_type: FitableType,
}

/// One wire format codec.
pub trait Formatter: Send + Sync {
    /// Format id written into request metadata.
    fn format(&self) -> i32;

    fn serialize_request(&self, args: &[Arg]) -> FitResult<Vec<u8>>;
    fn deserialize_request(&self, bytes: &[u8]) -> FitResult<Vec<Arg>>;
    fn serialize_response(&self, outputs: &[OutArg]) -> FitResult<Vec<u8>>;

    /// Fill `outputs` from a response payload.
    fn deserialize_response(&self, bytes: &[u8], outputs: &mut [OutArg]) -> FitResult<()>;
}

/// Formatter lookup and argument (de)serialization.
pub trait FormatterService: Send + Sync {
    /// Formats available for a generic service.
    fn get_formats(&self, generic_id: &str) -> Vec<i32>;

    fn get_formatter(&self, descriptor: &SerializationDescriptor) -> Option<Arc<dyn Formatter>>;

    fn serialize_request(&self, formatter: &dyn Formatter, args: &[Arg]) -> FitResult<Vec<u8>> {
        formatter.serialize_request(args)
    }

    fn deserialize_request(&self, formatter: &dyn Formatter, bytes: &[u8]) -> FitResult<Vec<Arg>> {
        formatter.deserialize_request(bytes)
    }

    fn serialize_response(
        &self,
        formatter: &dyn Formatter,
        outputs: &[OutArg],
    ) -> FitResult<Vec<u8>> {
        formatter.serialize_response(outputs)
    }

    fn deserialize_response(
        &self,
        formatter: &dyn Formatter,
        bytes: &[u8],
        outputs: &mut [OutArg],
    ) -> FitResult<()> {
        formatter.deserialize_response(bytes, outputs)
    }
}

/// Formatters registered per generic id.
///
/// Registration order is the preference order when an endpoint accepts
/// several formats.
#[derive(Default)]
pub struct FormatterRegistry {
    formatters: RwLock<HashMap<String, Vec<Arc<dyn Formatter>>>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, generic_id: impl Into<String>, formatter: Arc<dyn Formatter>) {
        let generic_id = generic_id.into();
        log::debug!(
            "[formatter] registered format {} for '{}'",
            formatter.format(),
            generic_id
        );
        let mut map = self.formatters.write();
        let list = map.entry(generic_id).or_default();
        list.retain(|f| f.format() != formatter.format());
        list.push(formatter);
    }
}

impl FormatterService for FormatterRegistry {
    fn get_formats(&self, generic_id: &str) -> Vec<i32> {
        self.formatters
            .read()
            .get(generic_id)
            .map(|list| list.iter().map(|f| f.format()).collect())
            .unwrap_or_default()
    }

    fn get_formatter(&self, descriptor: &SerializationDescriptor) -> Option<Arc<dyn Formatter>> {
        self.formatters
            .read()
            .get(&descriptor.generic_id)?
            .iter()
            .find(|f| descriptor.formats.contains(&f.format()))
            .cloned()
    }
}

/// Downcast helper for codec implementations.
pub fn downcast_arg<'a, T: 'static>(arg: &'a Arg, position: usize) -> FitResult<&'a T> {
    arg.downcast_ref::<T>().ok_or_else(|| {
        FitError::serialize(format!(
            "argument {} is not a {}",
            position,
            std::any::type_name::<T>()
        ))
    })
}
