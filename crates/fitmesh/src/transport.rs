// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Remote-procedure collaborator contract.
//!
//! The wire protocol and connection management live behind
//! [`RemoteTransport`]; the remote invoker hands it opaque metadata and
//! payload bytes and gets back a response envelope or a classified code.

use crate::coordinate::Fitable;
use crate::endpoint::Endpoint;
use crate::error::FitResult;
use std::fmt;

/// Where a wire call goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAddress {
    pub host: String,
    pub port: u16,
    pub worker_id: String,
    pub protocol: i32,
}

impl From<&Endpoint> for TargetAddress {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            worker_id: endpoint.worker_id.clone(),
            protocol: endpoint.protocol,
        }
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.worker_id)
    }
}

/// Caller-side request attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    pub timeout_ms: u32,
    pub caller_application: String,
    pub caller_worker: String,
}

/// Raw response from a remote worker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseEnvelope {
    pub metadata: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Wire transport used by the remote invoker.
pub trait RemoteTransport: Send + Sync {
    /// Blocking call, bounded by `context.timeout_ms`.
    ///
    /// `Ok(None)` means the call completed without a response envelope.
    fn call(
        &self,
        target: &TargetAddress,
        metadata: &[u8],
        payload: &[u8],
        context: &RequestContext,
    ) -> FitResult<Option<ResponseEnvelope>>;

    /// Report a worker address as (in)valid for a fitable. Best-effort.
    fn mark_address_invalid(
        &self,
        fitable: &Fitable,
        worker_id: &str,
        valid: bool,
    ) -> FitResult<()>;
}
