// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-generic-service policy and runtime configuration.
//!
//! # Architecture
//!
//! - **Consumed contract**: [`GenericableConfig`] is the read-only policy
//!   projection the invocation chain reads (trust, degradation, routing).
//! - **Providers**: [`ConfigProvider`] maps a generic id to its policy;
//!   [`StaticConfigProvider`] serves settings loaded from a file and can be
//!   swapped atomically at runtime.
//! - **Runtime file**: [`RuntimeFile`] is the TOML document describing this
//!   worker, trace switches, invoke defaults, policies and an optional
//!   static address table.
//!
//! # Example
//!
//! ```toml
//! [worker]
//! worker_id = "worker-1"
//! application = "orders"
//! port = 8001
//!
//! [[genericables]]
//! generic_id = "orderSvc"
//! default = "impl-A"
//!
//! [genericables.degradation]
//! impl-A = "impl-B"
//! ```

mod file;
mod settings;

pub use file::{
    AddressEntry, ConfigError, InvokeSettings, RuntimeFile, TraceSettings, WorkerSettings,
};
pub use settings::{GenericableSettings, TrustSettings};

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only policy of one generic service.
///
/// Empty strings mean "not configured" (no degradation, skip the stage).
pub trait GenericableConfig: Send + Sync {
    fn generic_id(&self) -> &str;

    /// Run the VALIDATE/BEFORE/AFTER/ERROR stages around MAIN.
    fn enable_trust(&self) -> bool;

    /// Never leave the process for this service.
    fn local_only(&self) -> bool;

    /// Suppress trace events for this service.
    fn trace_ignore(&self) -> bool;

    /// Routing fitable id; preferred over [`default_fitable`](Self::default_fitable).
    fn routine(&self) -> String;

    fn default_fitable(&self) -> String;

    /// Fallback for a failed fitable id.
    fn degradation(&self, fitable_id: &str) -> String;

    fn validate(&self) -> String;
    fn before(&self) -> String;
    fn after(&self) -> String;
    fn error(&self) -> String;

    /// Service is one of the registry's own fitables.
    fn is_registry_fitable(&self) -> bool;

    fn fitable_id_by_alias(&self, alias: &str) -> String;

    /// Routing tags attached to the parameter at `idx`.
    fn param_tags(&self, idx: usize) -> Vec<String>;

    /// One of the configured fitable ids, picked at random.
    fn random_fitable(&self) -> String;
}

/// Maps a generic id to its policy.
pub trait ConfigProvider: Send + Sync {
    fn config(&self, generic_id: &str) -> Option<Arc<dyn GenericableConfig>>;
}

/// Provider over a fixed set of settings, swappable as a whole.
pub struct StaticConfigProvider {
    configs: ArcSwap<HashMap<String, Arc<GenericableSettings>>>,
}

impl StaticConfigProvider {
    pub fn new(settings: Vec<GenericableSettings>) -> Self {
        Self {
            configs: ArcSwap::from_pointee(Self::index(settings)),
        }
    }

    /// Build from a runtime file's `[[genericables]]`.
    pub fn from_runtime(file: &RuntimeFile) -> Self {
        Self::new(file.genericables.clone())
    }

    /// Replace every policy at once; in-flight calls keep their snapshot.
    pub fn reload(&self, settings: Vec<GenericableSettings>) {
        let count = settings.len();
        self.configs.store(Arc::new(Self::index(settings)));
        log::info!("[config] reloaded {} genericable policies", count);
    }

    pub fn len(&self) -> usize {
        self.configs.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(settings: Vec<GenericableSettings>) -> HashMap<String, Arc<GenericableSettings>> {
        settings
            .into_iter()
            .map(|s| (s.generic_id.clone(), Arc::new(s)))
            .collect()
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn config(&self, generic_id: &str) -> Option<Arc<dyn GenericableConfig>> {
        self.configs
            .load()
            .get(generic_id)
            .map(|s| s.clone() as Arc<dyn GenericableConfig>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider_lookup() {
        let provider = StaticConfigProvider::new(vec![GenericableSettings::new("orderSvc")]);
        assert!(provider.config("orderSvc").is_some());
        assert!(provider.config("missing").is_none());
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_static_provider_reload() {
        let provider = StaticConfigProvider::new(vec![GenericableSettings::new("a")]);
        let held = provider.config("a").expect("config");

        provider.reload(vec![GenericableSettings::new("b")]);
        assert!(provider.config("a").is_none());
        assert!(provider.config("b").is_some());
        // Snapshot taken before the reload stays usable
        assert_eq!(held.generic_id(), "a");
    }
}
