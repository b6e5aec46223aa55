// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint suppliers.

use super::{Endpoint, LocalEndpoint};
use crate::config::GenericableConfig;
use crate::coordinate::Coordinate;
use crate::discovery::Discovery;
use crate::error::FitResult;
use std::sync::Arc;

/// Yields at most one endpoint for a call.
pub trait EndpointSupplier: Send {
    fn get(
        &self,
        coordinate: &Coordinate,
        config: &dyn GenericableConfig,
    ) -> FitResult<Option<Endpoint>>;
}

/// Always returns the endpoint it was built with.
#[derive(Debug, Clone)]
pub struct DirectSupplier {
    endpoint: Endpoint,
}

impl DirectSupplier {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl EndpointSupplier for DirectSupplier {
    fn get(&self, _: &Coordinate, _: &dyn GenericableConfig) -> FitResult<Option<Endpoint>> {
        Ok(Some(self.endpoint.clone()))
    }
}

/// Returns the local endpoint when the fitable is hosted in this process.
pub struct LocalSupplier {
    discovery: Arc<dyn Discovery>,
    local: Arc<LocalEndpoint>,
}

impl LocalSupplier {
    pub fn new(discovery: Arc<dyn Discovery>, local: Arc<LocalEndpoint>) -> Self {
        Self { discovery, local }
    }
}

impl EndpointSupplier for LocalSupplier {
    fn get(
        &self,
        coordinate: &Coordinate,
        _: &dyn GenericableConfig,
    ) -> FitResult<Option<Endpoint>> {
        if self.discovery.get_local_fitable(coordinate).is_empty() {
            return Ok(None);
        }
        Ok(Some(self.local.get().clone()))
    }
}

/// `first`, falling back to `second` when the first yields nothing.
pub struct CompositeSupplier {
    first: Option<Box<dyn EndpointSupplier>>,
    second: Option<Box<dyn EndpointSupplier>>,
}

impl CompositeSupplier {
    pub fn new(
        first: Option<Box<dyn EndpointSupplier>>,
        second: Option<Box<dyn EndpointSupplier>>,
    ) -> Self {
        Self { first, second }
    }
}

impl EndpointSupplier for CompositeSupplier {
    fn get(
        &self,
        coordinate: &Coordinate,
        config: &dyn GenericableConfig,
    ) -> FitResult<Option<Endpoint>> {
        if let Some(first) = &self.first {
            if let Some(endpoint) = first.get(coordinate, config)? {
                return Ok(Some(endpoint));
            }
        }
        match &self.second {
            Some(second) => second.get(coordinate, config),
            None => Ok(None),
        }
    }
}
