// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint resolution.
//!
//! An [`Endpoint`] is where one call goes. Suppliers yield at most one
//! endpoint per call:
//!
//! ```text
//! EndpointSupplier
//! +-- DirectSupplier       (fixed endpoint, caller-pinned address)
//! +-- LocalSupplier        (local endpoint if the fitable is hosted here)
//! +-- LoadBalanceSupplier  (discovery -> aggregate -> filter -> prune -> select)
//! +-- CompositeSupplier    (first, then second)
//! ```

pub mod balancer;
pub mod load_balance;
pub mod predicate;
pub mod supplier;
pub mod tree;

pub use balancer::{DefaultLoadBalancer, LoadBalancer};
pub use load_balance::LoadBalanceSupplier;
pub use predicate::{AndPredicate, EndpointPredicate, FnPredicate};
pub use supplier::{CompositeSupplier, DirectSupplier, EndpointSupplier, LocalSupplier};
pub use tree::{AddressNode, ApplicationInstance, PortEndpoint, WorkerNode};

use crate::config::WorkerSettings;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Application owning a worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ApplicationInfo {
    pub name: String,
    pub version: String,
}

/// Identity details carried alongside an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointContext {
    /// Free-form worker attributes
    pub worker_info: BTreeMap<String, String>,
    pub application_info: ApplicationInfo,
}

/// One reachable fitable instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoint {
    pub worker_id: String,
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Transport protocol id
    pub protocol: i32,
    /// Serialization formats accepted by the worker
    pub formats: Vec<i32>,
    pub context: EndpointContext,
}

impl Endpoint {
    /// Create an endpoint with empty context.
    pub fn new(worker_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            worker_id: worker_id.into(),
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_protocol(mut self, protocol: i32) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_formats(mut self, formats: Vec<i32>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Check if this endpoint is hosted by the given local endpoint's worker.
    pub fn is_local_to(&self, local: &Endpoint) -> bool {
        self.worker_id == local.worker_id
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{} (protocol {})",
            self.worker_id, self.host, self.port, self.protocol
        )
    }
}

/// Process-wide local endpoint, computed once on first use.
#[derive(Debug)]
pub struct LocalEndpoint {
    settings: WorkerSettings,
    cell: OnceLock<Endpoint>,
}

impl LocalEndpoint {
    pub fn new(settings: WorkerSettings) -> Self {
        Self {
            settings,
            cell: OnceLock::new(),
        }
    }

    /// Local endpoint (first call resolves the host address).
    pub fn get(&self) -> &Endpoint {
        self.cell.get_or_init(|| {
            let endpoint = self.settings.to_endpoint();
            log::debug!("[endpoint] local endpoint resolved: {}", endpoint);
            endpoint
        })
    }

    pub fn worker_id(&self) -> &str {
        &self.settings.worker_id
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Check if an endpoint belongs to this process.
    pub fn is_local(&self, endpoint: &Endpoint) -> bool {
        endpoint.is_local_to(self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> WorkerSettings {
        WorkerSettings {
            worker_id: "worker-local".into(),
            host: Some("10.0.0.1".into()),
            port: 8001,
            ..Default::default()
        }
    }

    #[test]
    fn test_local_endpoint_memoized() {
        let local = LocalEndpoint::new(settings());
        let first = local.get() as *const Endpoint;
        let second = local.get() as *const Endpoint;
        assert_eq!(first, second);
        assert_eq!(local.get().host, "10.0.0.1");
    }

    #[test]
    fn test_is_local_compares_worker_id() {
        let local = LocalEndpoint::new(settings());
        assert!(local.is_local(&Endpoint::new("worker-local", "192.168.0.9", 1)));
        assert!(!local.is_local(&Endpoint::new("worker-remote", "10.0.0.1", 8001)));
    }

    #[test]
    fn test_concurrent_first_use() {
        let local = std::sync::Arc::new(LocalEndpoint::new(settings()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let local = local.clone();
                std::thread::spawn(move || local.get().clone())
            })
            .collect();
        for handle in handles {
            let endpoint = handle.join().expect("thread");
            assert_eq!(&endpoint, local.get());
        }
    }
}
