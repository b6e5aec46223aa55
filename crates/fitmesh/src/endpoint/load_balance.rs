// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery-backed supplier.
//!
//! Pipeline per call:
//! 1. discovery returns flat (application, worker, host, endpoint, formats) tuples
//! 2. tuples are aggregated into a deduplicated tree
//! 3. the load-balance filter narrows the tree
//! 4. the optional predicate prunes endpoints (cascading upward)
//! 5. the load-balance selection picks one instance
//! 6. the instance's first worker/address/endpoint becomes the result
//!
//! An empty set after steps 2, 3 or 4 yields no endpoint.

use super::balancer::LoadBalancer;
use super::predicate::EndpointPredicate;
use super::supplier::EndpointSupplier;
use super::tree;
use super::Endpoint;
use crate::config::GenericableConfig;
use crate::coordinate::Coordinate;
use crate::discovery::Discovery;
use crate::error::FitResult;
use std::sync::Arc;

pub struct LoadBalanceSupplier {
    discovery: Arc<dyn Discovery>,
    balancer: Arc<dyn LoadBalancer>,
    predicate: Option<Box<dyn EndpointPredicate>>,
}

impl LoadBalanceSupplier {
    pub fn new(discovery: Arc<dyn Discovery>, balancer: Arc<dyn LoadBalancer>) -> Self {
        Self {
            discovery,
            balancer,
            predicate: None,
        }
    }

    /// Keep only endpoints accepted by `predicate`.
    pub fn with_predicate(mut self, predicate: Box<dyn EndpointPredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

impl EndpointSupplier for LoadBalanceSupplier {
    fn get(
        &self,
        coordinate: &Coordinate,
        config: &dyn GenericableConfig,
    ) -> FitResult<Option<Endpoint>> {
        let fitable = coordinate.fitable();

        let addresses = self.discovery.get_fitable_addresses(config, &fitable)?;
        let candidates = tree::aggregate(&addresses);
        if candidates.is_empty() {
            log::debug!("[load-balance] no address registered for {}", coordinate);
            return Ok(None);
        }

        let mut filtered = self.balancer.filter(&fitable, candidates)?;
        if filtered.is_empty() {
            log::debug!("[load-balance] filter rejected every candidate for {}", coordinate);
            return Ok(None);
        }

        if let Some(predicate) = &self.predicate {
            filtered = tree::prune(filtered, predicate.as_ref());
            if filtered.is_empty() {
                log::debug!("[load-balance] predicate rejected every candidate for {}", coordinate);
                return Ok(None);
            }
        }

        let chosen = self.balancer.select(&fitable, filtered)?;
        let endpoint = chosen.first_endpoint();
        if let Some(endpoint) = &endpoint {
            log::debug!("[load-balance] {} -> {}", coordinate, endpoint);
        }
        Ok(endpoint)
    }
}
