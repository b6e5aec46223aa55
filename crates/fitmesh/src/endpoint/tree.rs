// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hierarchical candidate tree handed to load-balance plugins.
//!
//! ```text
//! ApplicationInstance (application, formats)
//! +-- WorkerNode       (worker id, environment)   sorted by (id, environment)
//!     +-- AddressNode  (host)                     sorted by host
//!         +-- PortEndpoint (port, protocol)       sorted by (port, protocol)
//! ```

use super::{ApplicationInfo, Endpoint, EndpointContext, EndpointPredicate};
use crate::discovery::FlatAddress;
use std::collections::BTreeMap;

/// Port + protocol of one listening endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortEndpoint {
    pub port: u16,
    pub protocol: i32,
}

/// One host of a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressNode {
    pub host: String,
    pub endpoints: Vec<PortEndpoint>,
}

/// One worker of an application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerNode {
    pub worker_id: String,
    pub environment: String,
    pub worker_info: BTreeMap<String, String>,
    pub addresses: Vec<AddressNode>,
}

impl WorkerNode {
    fn key(&self) -> (&str, &str) {
        (&self.worker_id, &self.environment)
    }
}

/// Application with the workers able to serve a fitable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInstance {
    pub application: ApplicationInfo,
    pub formats: Vec<i32>,
    pub workers: Vec<WorkerNode>,
}

impl ApplicationInstance {
    /// Total number of concrete endpoints below this instance.
    pub fn endpoint_count(&self) -> usize {
        self.workers
            .iter()
            .flat_map(|w| w.addresses.iter())
            .map(|a| a.endpoints.len())
            .sum()
    }

    /// Flatten the first worker/address/endpoint into a concrete endpoint.
    pub fn first_endpoint(&self) -> Option<Endpoint> {
        let worker = self.workers.first()?;
        let address = worker.addresses.first()?;
        let port = address.endpoints.first()?;
        Some(self.to_endpoint(worker, address, port))
    }

    fn to_endpoint(
        &self,
        worker: &WorkerNode,
        address: &AddressNode,
        port: &PortEndpoint,
    ) -> Endpoint {
        Endpoint {
            worker_id: worker.worker_id.clone(),
            environment: worker.environment.clone(),
            host: address.host.clone(),
            port: port.port,
            protocol: port.protocol,
            formats: self.formats.clone(),
            context: EndpointContext {
                worker_info: worker.worker_info.clone(),
                application_info: self.application.clone(),
            },
        }
    }
}

/// Aggregate discovery's flat list into a deduplicated tree.
///
/// Instances are keyed by (application, formats); duplicates at every level
/// are merged in place.
pub fn aggregate(addresses: &[FlatAddress]) -> Vec<ApplicationInstance> {
    let mut instances: Vec<ApplicationInstance> = Vec::new();

    for flat in addresses {
        let mut formats = flat.formats.clone();
        formats.sort_unstable();
        formats.dedup();

        let instance = match instances
            .iter()
            .position(|i| i.application == flat.application && i.formats == formats)
        {
            Some(idx) => &mut instances[idx],
            None => {
                instances.push(ApplicationInstance {
                    application: flat.application.clone(),
                    formats,
                    workers: Vec::new(),
                });
                let last = instances.len() - 1;
                &mut instances[last]
            }
        };

        let worker_key = (flat.worker.worker_id.as_str(), flat.worker.environment.as_str());
        let worker_idx = match instance
            .workers
            .binary_search_by(|w| w.key().cmp(&worker_key))
        {
            Ok(idx) => idx,
            Err(idx) => {
                instance.workers.insert(
                    idx,
                    WorkerNode {
                        worker_id: flat.worker.worker_id.clone(),
                        environment: flat.worker.environment.clone(),
                        worker_info: flat.worker.extensions.clone(),
                        addresses: Vec::new(),
                    },
                );
                idx
            }
        };
        let worker = &mut instance.workers[worker_idx];

        let address_idx = match worker
            .addresses
            .binary_search_by(|a| a.host.as_str().cmp(flat.host.as_str()))
        {
            Ok(idx) => idx,
            Err(idx) => {
                worker.addresses.insert(
                    idx,
                    AddressNode {
                        host: flat.host.clone(),
                        endpoints: Vec::new(),
                    },
                );
                idx
            }
        };
        let address = &mut worker.addresses[address_idx];

        if let Err(idx) = address.endpoints.binary_search(&flat.endpoint) {
            address.endpoints.insert(idx, flat.endpoint);
        }
    }

    instances
}

/// Drop endpoints rejected by `predicate`, removing containers left empty.
pub fn prune(
    instances: Vec<ApplicationInstance>,
    predicate: &dyn EndpointPredicate,
) -> Vec<ApplicationInstance> {
    instances
        .into_iter()
        .filter_map(|mut instance| {
            let snapshot = ApplicationInstance {
                application: instance.application.clone(),
                formats: instance.formats.clone(),
                workers: Vec::new(),
            };
            instance.workers.retain_mut(|worker| {
                let worker_view = WorkerNode {
                    addresses: Vec::new(),
                    ..worker.clone()
                };
                worker.addresses.retain_mut(|address| {
                    let address_view = AddressNode {
                        host: address.host.clone(),
                        endpoints: Vec::new(),
                    };
                    address.endpoints.retain(|port| {
                        predicate.test(&snapshot.to_endpoint(&worker_view, &address_view, port))
                    });
                    !address.endpoints.is_empty()
                });
                !worker.addresses.is_empty()
            });
            (!instance.workers.is_empty()).then_some(instance)
        })
        .collect()
}
