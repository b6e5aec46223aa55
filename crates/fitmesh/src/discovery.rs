// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery contract and an in-memory implementation.
//!
//! Discovery answers two questions for the invocation core:
//! - is a fitable hosted in this process (and with which function)?
//! - which workers across the mesh serve a fitable?

use crate::config::GenericableConfig;
use crate::context::Slot;
use crate::coordinate::{Coordinate, Fitable};
use crate::endpoint::{ApplicationInfo, PortEndpoint};
use crate::error::FitResult;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Function registered for a locally hosted fitable.
///
/// Receives `[context] ++ inputs ++ outputs` as positional slots.
pub type LocalFn = Arc<dyn Fn(&mut [Slot<'_>]) -> FitResult<()> + Send + Sync>;

/// A locally hosted fitable implementation.
#[derive(Clone)]
pub struct LocalFitable {
    pub coordinate: Coordinate,
    /// `None` when the registry knows the fitable but holds no callable.
    pub function: Option<LocalFn>,
}

impl LocalFitable {
    pub fn new<F>(coordinate: Coordinate, f: F) -> Self
    where
        F: Fn(&mut [Slot<'_>]) -> FitResult<()> + Send + Sync + 'static,
    {
        Self {
            coordinate,
            function: Some(Arc::new(f)),
        }
    }
}

impl fmt::Debug for LocalFitable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFitable")
            .field("coordinate", &self.coordinate)
            .field("callable", &self.function.is_some())
            .finish()
    }
}

/// Worker identity as published by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkerRecord {
    pub worker_id: String,
    pub environment: String,
    pub extensions: BTreeMap<String, String>,
}

/// One (application, worker, host, endpoint, formats) tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatAddress {
    pub application: ApplicationInfo,
    pub worker: WorkerRecord,
    pub host: String,
    pub endpoint: PortEndpoint,
    pub formats: Vec<i32>,
}

/// Discovery collaborator consumed by suppliers and the local invoker.
pub trait Discovery: Send + Sync {
    /// Local implementations of `coordinate` hosted by this process.
    fn get_local_fitable(&self, coordinate: &Coordinate) -> Vec<LocalFitable>;

    /// Addresses of every worker serving `fitable`.
    fn get_fitable_addresses(
        &self,
        config: &dyn GenericableConfig,
        fitable: &Fitable,
    ) -> FitResult<Vec<FlatAddress>>;

    /// Batch variant for fan-out callers.
    fn get_fitables_addresses(
        &self,
        config: &dyn GenericableConfig,
        fitables: &[Fitable],
    ) -> FitResult<Vec<(Fitable, Vec<FlatAddress>)>> {
        fitables
            .iter()
            .map(|f| Ok((f.clone(), self.get_fitable_addresses(config, f)?)))
            .collect()
    }
}

type FitableKey = (String, String, String);

/// Discovery backed by process memory.
///
/// Local registrations and a static address table; registry fitables
/// resolve to the configured registry workers instead of the table.
#[derive(Default)]
pub struct InMemoryDiscovery {
    local: DashMap<FitableKey, Vec<LocalFitable>>,
    addresses: DashMap<FitableKey, Vec<FlatAddress>>,
    registry: RwLock<Vec<FlatAddress>>,
}

impl InMemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a local implementation.
    pub fn register_local(&self, fitable: LocalFitable) {
        let key = fitable.coordinate.fitable().address_key();
        log::debug!("[discovery] local fitable registered: {}", fitable.coordinate);
        let mut entry = self.local.entry(key).or_default();
        entry.retain(|f| f.coordinate != fitable.coordinate);
        entry.push(fitable);
    }

    /// Remove a local implementation.
    pub fn unregister_local(&self, coordinate: &Coordinate) {
        let key = coordinate.fitable().address_key();
        if let Some(mut entry) = self.local.get_mut(&key) {
            entry.retain(|f| &f.coordinate != coordinate);
        }
        self.local.remove_if(&key, |_, v| v.is_empty());
    }

    /// Publish an address for a fitable.
    pub fn add_address(&self, fitable: &Fitable, address: FlatAddress) {
        self.addresses
            .entry(fitable.address_key())
            .or_default()
            .push(address);
    }

    /// Drop every address of a worker for a fitable.
    pub fn remove_worker(&self, fitable: &Fitable, worker_id: &str) {
        if let Some(mut entry) = self.addresses.get_mut(&fitable.address_key()) {
            entry.retain(|a| a.worker.worker_id != worker_id);
        }
    }

    /// Workers hosting the registry's own fitables.
    pub fn set_registry_addresses(&self, addresses: Vec<FlatAddress>) {
        *self.registry.write() = addresses;
    }
}

impl Discovery for InMemoryDiscovery {
    fn get_local_fitable(&self, coordinate: &Coordinate) -> Vec<LocalFitable> {
        self.local
            .get(&coordinate.fitable().address_key())
            .map(|entry| {
                entry
                    .iter()
                    .filter(|f| {
                        coordinate.fitable_version.is_empty()
                            || f.coordinate.fitable_version == coordinate.fitable_version
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get_fitable_addresses(
        &self,
        config: &dyn GenericableConfig,
        fitable: &Fitable,
    ) -> FitResult<Vec<FlatAddress>> {
        if config.is_registry_fitable() {
            return Ok(self.registry.read().clone());
        }
        Ok(self
            .addresses
            .get(&fitable.address_key())
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}
