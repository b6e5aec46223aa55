// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fitmesh - client-side fitable invocation
//!
//! Resolves a call on a generic service to one concrete implementation
//! (a *fitable*), picks where it runs (this process or a remote worker) and
//! executes it through a fixed resilience chain.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fitmesh::{
//!     arg, Broker, CallContext, FormatterRegistry, GenericableSettings, InMemoryDiscovery,
//!     InvokerFactory, Route, StaticConfigProvider, WorkerSettings,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> fitmesh::FitResult<()> {
//!     let worker = WorkerSettings { worker_id: "worker-1".into(), ..Default::default() };
//!     let discovery = Arc::new(InMemoryDiscovery::new());
//!     let factory = InvokerFactory::new(worker, discovery, Arc::new(FormatterRegistry::new()));
//!     let configs = StaticConfigProvider::new(vec![
//!         GenericableSettings::new("orderSvc").with_default("impl-A"),
//!     ]);
//!     let broker = Broker::new(Arc::new(factory), Arc::new(configs));
//!
//!     let mut output = vec![None];
//!     broker.invoke(
//!         "orderSvc",
//!         "1.0.0",
//!         &Route::Default,
//!         &mut CallContext::new().with_retry(2),
//!         &[arg("order-7".to_string())],
//!         &mut output,
//!     )
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  Broker         route -> Coordinate, context -> EndpointSupplier      |
//! +---------------------------------------------------------------------+
//! |  Trust > Degradation > Retry > Shell   (invoker chain, per call)      |
//! +---------------------------------------------------------------------+
//! |  Shell          supplier -> Endpoint -> Local | Remote (+ Trace)      |
//! +---------------------------------------------------------------------+
//! |  Collaborators  Discovery | FormatterService | RemoteTransport        |
//! |                 GenericableConfig | LoadBalancer                      |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Coordinate`] | Identity of one call target (generic + fitable, both versioned) |
//! | [`Endpoint`] | Where a fitable instance runs |
//! | [`Invoker`] | One executable step of a call |
//! | [`InvokerFactory`] | Process-scoped builder of invoker chains |
//! | [`Broker`] | Caller-facing entry points |

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

/// Caller-facing entry points (route resolution, target pinning).
pub mod broker;
/// Per-generic-service policy and runtime configuration file.
pub mod config;
/// Call context and argument slots.
pub mod context;
/// Call identity.
pub mod coordinate;
/// Discovery contract and in-memory implementation.
pub mod discovery;
/// Endpoint model, suppliers, predicates and load balancing.
pub mod endpoint;
/// Error codes and network-error classification.
pub mod error;
/// Serialization codec selection.
pub mod formatter;
/// Invoker chain (Trust, Degradation, Retry, Shell, Trace, Local, Remote).
pub mod invoker;
/// Wire metadata blocks.
pub mod metadata;
/// Remote transport contract.
pub mod transport;

pub use broker::{Broker, Route};
pub use config::{
    ConfigError, ConfigProvider, GenericableConfig, GenericableSettings, RuntimeFile,
    StaticConfigProvider, WorkerSettings,
};
pub use context::{arg, Arg, CallContext, OutArg, Slot};
pub use coordinate::{Coordinate, Fitable, FitableType};
pub use discovery::{Discovery, InMemoryDiscovery, LocalFitable};
pub use endpoint::{Endpoint, EndpointSupplier, LoadBalancer};
pub use error::{ErrorCode, FitError, FitResult, NetworkClassifier};
pub use formatter::{Formatter, FormatterRegistry, FormatterService};
pub use invoker::{Invoker, InvokerFactory, TraceSink};
pub use transport::RemoteTransport;
