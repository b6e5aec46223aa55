// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Invokers and the resilience decorator chain.
//!
//! # Chain
//!
//! ```text
//! Trust            VALIDATE (abort on failure), BEFORE, MAIN..., AFTER | ERROR
//! +-- Degradation  on failure walk config.degradation() (cycle-guarded)
//!     +-- Retry    re-invoke immediately on network-class errors
//!         +-- Shell  local-only? supplier -> Local | Remote
//!             +-- Trace  (innermost, wraps the chosen Local/Remote)
//! ```
//!
//! Every invoker lives for exactly one call. Trust stages and degradation
//! fallbacks go through [`InvokerFactory::build_raw`], which returns a bare
//! Shell (no Trust/Degradation/Retry).

mod degradation;
mod factory;
mod local;
mod remote;
mod retry;
mod shell;
mod trace;
mod trust;

pub use degradation::DegradationDecorator;
pub use factory::InvokerFactory;
pub use local::LocalInvoker;
pub use remote::RemoteInvoker;
pub use retry::RetryDecorator;
pub use shell::ShellInvoker;
pub use trace::{CallType, LogTraceSink, TraceDecorator, TraceRecord, TraceSink};
pub use trust::TrustDecorator;

use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::error::FitResult;
use std::sync::Arc;

/// One executable step of a call.
pub trait Invoker: Send {
    fn coordinate(&self) -> &Arc<Coordinate>;

    fn config(&self) -> &Arc<dyn GenericableConfig>;

    fn fitable_type(&self) -> FitableType;

    /// Run the call synchronously on the caller's thread.
    fn invoke(&self, ctx: &mut CallContext, input: &[Arg], output: &mut [OutArg]) -> FitResult<()>;
}

/// Fresh, empty output buffer of `len` slots.
pub(crate) fn scratch_outputs(len: usize) -> Vec<OutArg> {
    (0..len).map(|_| None).collect()
}

#[cfg(test)]
pub(crate) mod tests;
