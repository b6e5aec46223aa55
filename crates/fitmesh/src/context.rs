// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call context and argument slots.

use crate::endpoint::Endpoint;
use crate::error::{FitError, FitResult};
use std::any::Any;
use std::collections::BTreeMap;

/// One positional argument. Codecs downcast to the concrete type.
pub type Arg = Box<dyn Any + Send + Sync>;

/// Output argument slot, filled by the callee.
pub type OutArg = Option<Arg>;

/// Box a value as an argument.
pub fn arg<T: Any + Send + Sync>(value: T) -> Arg {
    Box::new(value)
}

/// Positional slot handed to a local fitable function.
///
/// A local call receives `[context] ++ inputs ++ outputs`.
pub enum Slot<'a> {
    Context(&'a mut CallContext),
    In(&'a Arg),
    Out(&'a mut OutArg),
}

/// Caller-controlled settings and propagated context maps for one call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Maximum number of retries on network-class errors
    pub retry: Option<u32>,
    /// Wire call timeout in milliseconds
    pub timeout_ms: Option<u32>,
    /// Pin the call to this worker id
    pub target_worker: Option<String>,
    /// Direct address override (bypasses discovery)
    pub target_address: Option<Endpoint>,
    /// Context propagated to every hop
    pub global_context: BTreeMap<String, String>,
    /// Exception details propagated alongside failures
    pub exception_context: BTreeMap<String, String>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max retry count.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set timeout (milliseconds).
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Pin to a worker id.
    pub fn with_target_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.target_worker = Some(worker_id.into());
        self
    }

    /// Override the target address.
    pub fn with_target_address(mut self, endpoint: Endpoint) -> Self {
        self.target_address = Some(endpoint);
        self
    }

    /// Max retry count, 0 when unset.
    pub fn retry(&self) -> u32 {
        self.retry.unwrap_or(0)
    }

    /// Timeout in milliseconds, 0 when unset.
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms.unwrap_or(0)
    }

    pub fn put_global(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.global_context.insert(key.into(), value.into());
    }

    pub fn serialize_global_context(&self) -> FitResult<Vec<u8>> {
        serde_json::to_vec(&self.global_context)
            .map_err(|e| FitError::serialize(format!("global context: {}", e)))
    }

    pub fn serialize_exception_context(&self) -> FitResult<Vec<u8>> {
        serde_json::to_vec(&self.exception_context)
            .map_err(|e| FitError::serialize(format!("exception context: {}", e)))
    }

    /// Merge a serialized global context received from a peer.
    pub fn merge_global_context(&mut self, bytes: &[u8]) -> FitResult<()> {
        let received: BTreeMap<String, String> = serde_json::from_slice(bytes)
            .map_err(|e| FitError::deserialize(format!("global context: {}", e)))?;
        self.global_context.extend(received);
        Ok(())
    }

    /// Replace the exception context with one received from a peer.
    pub fn replace_exception_context(&mut self, bytes: &[u8]) -> FitResult<()> {
        self.exception_context = serde_json::from_slice(bytes)
            .map_err(|e| FitError::deserialize(format!("exception context: {}", e)))?;
        Ok(())
    }
}
