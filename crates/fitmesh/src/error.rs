// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Result codes and error types for fitable invocation.
//!
//! Every layer of the invocation chain reports failure as a [`FitError`]
//! carrying an [`ErrorCode`]. Codes coming from outside this crate (a trust
//! VALIDATE fitable, a remote worker's response status) are opaque and are
//! propagated unchanged.

use std::fmt;
use thiserror::Error;

/// Result type for invocation operations
pub type FitResult<T> = Result<T, FitError>;

/// Numeric result code of one invocation.
///
/// `ErrorCode::OK` only appears on the wire (response metadata status);
/// inside the crate success is `Ok(())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct ErrorCode(i32);

impl ErrorCode {
    /// Success
    pub const OK: Self = Self(0);
    /// Generic failure
    pub const FAIL: Self = Self(0x7F00_0001);
    /// No config, endpoint or formatter found
    pub const NOT_FOUND: Self = Self(0x7F00_0002);
    /// No target fitable id resolved
    pub const ROUTE: Self = Self(0x7F00_0003);
    /// Load-balance selection was handed no candidate.
    ///
    /// Only a [`LoadBalancer::select`] call on an empty set reports this; an
    /// empty filter result ends endpoint resolution with no endpoint, which
    /// callers see as `NOT_FOUND`.
    ///
    /// [`LoadBalancer::select`]: crate::endpoint::LoadBalancer::select
    pub const FILTER_TARGET: Self = Self(0x7F00_0004);
    /// A required collaborator is absent
    pub const NOT_READY: Self = Self(0x7F00_0005);
    /// Operation not supported
    pub const NOT_SUPPORT: Self = Self(0x7F00_0006);
    /// Request or context serialization failed
    pub const SERIALIZE: Self = Self(0x7F00_0010);
    /// Response or context deserialization failed
    pub const DESERIALIZE: Self = Self(0x7F00_0011);
    /// Wire call completed without a response envelope
    pub const NO_RESPONSE: Self = Self(0x7F00_0012);
    /// Response metadata could not be decoded
    pub const INVALID_RESPONSE_METADATA: Self = Self(0x7F00_0013);

    // Network class (retryable under the default classifier)
    /// Peer refused the connection
    pub const NET_CONNECT_REFUSED: Self = Self(0x7F00_0100);
    /// Wire call timed out
    pub const NET_TIMEOUT: Self = Self(0x7F00_0101);
    /// No route to the target host
    pub const NET_NO_ROUTE: Self = Self(0x7F00_0102);
    /// Connection closed mid-call
    pub const NET_CLOSED: Self = Self(0x7F00_0103);

    /// Wrap a raw code.
    pub const fn from_i32(value: i32) -> Self {
        Self(value)
    }

    /// Raw numeric value.
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Check if this code means success.
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::OK => "OK",
            Self::FAIL => "FAIL",
            Self::NOT_FOUND => "NOT_FOUND",
            Self::ROUTE => "ROUTE",
            Self::FILTER_TARGET => "FILTER_TARGET",
            Self::NOT_READY => "NOT_READY",
            Self::NOT_SUPPORT => "NOT_SUPPORT",
            Self::SERIALIZE => "SERIALIZE",
            Self::DESERIALIZE => "DESERIALIZE",
            Self::NO_RESPONSE => "NO_RESPONSE",
            Self::INVALID_RESPONSE_METADATA => "INVALID_RESPONSE_METADATA",
            Self::NET_CONNECT_REFUSED => "NET_CONNECT_REFUSED",
            Self::NET_TIMEOUT => "NET_TIMEOUT",
            Self::NET_NO_ROUTE => "NET_NO_ROUTE",
            Self::NET_CLOSED => "NET_CLOSED",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Failure of one invocation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct FitError {
    /// Result code seen by the caller
    pub code: ErrorCode,
    /// Human readable detail
    pub message: String,
}

impl FitError {
    /// Create an error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an error from a bare code (remote status, trust verdict).
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FAIL, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NOT_FOUND, message)
    }

    pub fn route(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ROUTE, message)
    }

    pub fn filter_target(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FILTER_TARGET, message)
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NOT_READY, message)
    }

    pub fn serialize(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SERIALIZE, message)
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DESERIALIZE, message)
    }
}

impl From<ErrorCode> for FitError {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code)
    }
}

/// Decides which codes are network-class (and therefore retryable).
///
/// Injected into the retry decorator and the remote invoker so neither
/// hardcodes transport-specific failures.
pub trait NetworkClassifier: Send + Sync {
    fn is_network_error(&self, code: ErrorCode) -> bool;
}

/// Classifier recognising the `NET_*` codes of this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNetworkClassifier;

impl NetworkClassifier for DefaultNetworkClassifier {
    fn is_network_error(&self, code: ErrorCode) -> bool {
        matches!(
            code,
            ErrorCode::NET_CONNECT_REFUSED
                | ErrorCode::NET_TIMEOUT
                | ErrorCode::NET_NO_ROUTE
                | ErrorCode::NET_CLOSED
        )
    }
}

impl<F> NetworkClassifier for F
where
    F: Fn(ErrorCode) -> bool + Send + Sync,
{
    fn is_network_error(&self, code: ErrorCode) -> bool {
        self(code)
    }
}
