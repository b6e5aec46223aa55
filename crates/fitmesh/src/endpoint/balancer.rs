// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Load-balance plugins: narrow candidates, then choose one.

use super::tree::ApplicationInstance;
use crate::coordinate::Fitable;
use crate::error::{FitError, FitResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pluggable filter + selection pair.
pub trait LoadBalancer: Send + Sync {
    /// Narrow the candidate tree. An empty result means no usable target.
    fn filter(
        &self,
        fitable: &Fitable,
        candidates: Vec<ApplicationInstance>,
    ) -> FitResult<Vec<ApplicationInstance>>;

    /// Choose exactly one instance; its first worker/address/endpoint is used.
    fn select(
        &self,
        fitable: &Fitable,
        candidates: Vec<ApplicationInstance>,
    ) -> FitResult<ApplicationInstance>;
}

/// Environment/format filter with round-robin selection across workers.
#[derive(Debug, Default)]
pub struct DefaultLoadBalancer {
    /// Keep only workers of this environment (empty = any)
    environment: String,
    /// Keep only instances sharing one of these formats (empty = any)
    formats: Vec<i32>,
    cursor: AtomicUsize,
}

impl DefaultLoadBalancer {
    pub fn new(environment: impl Into<String>, formats: Vec<i32>) -> Self {
        Self {
            environment: environment.into(),
            formats,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl LoadBalancer for DefaultLoadBalancer {
    fn filter(
        &self,
        _fitable: &Fitable,
        candidates: Vec<ApplicationInstance>,
    ) -> FitResult<Vec<ApplicationInstance>> {
        Ok(candidates
            .into_iter()
            .filter(|i| {
                self.formats.is_empty() || i.formats.iter().any(|f| self.formats.contains(f))
            })
            .filter_map(|mut instance| {
                if !self.environment.is_empty() {
                    instance.workers.retain(|w| w.environment == self.environment);
                }
                (!instance.workers.is_empty()).then_some(instance)
            })
            .collect())
    }

    fn select(
        &self,
        fitable: &Fitable,
        candidates: Vec<ApplicationInstance>,
    ) -> FitResult<ApplicationInstance> {
        let total: usize = candidates.iter().map(|i| i.workers.len()).sum();
        if total == 0 {
            return Err(FitError::filter_target(format!(
                "no worker to select for {}",
                fitable.fitable_id
            )));
        }

        let mut pick = self.cursor.fetch_add(1, Ordering::Relaxed) % total;
        for mut instance in candidates {
            if pick < instance.workers.len() {
                let worker = instance.workers.swap_remove(pick);
                instance.workers = vec![worker];
                return Ok(instance);
            }
            pick -= instance.workers.len();
        }
        Err(FitError::fail("round-robin cursor out of range"))
    }
}
