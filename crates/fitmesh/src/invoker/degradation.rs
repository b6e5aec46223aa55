// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Degradation decorator.
//!
//! On failure, follows `config.degradation(id)` from the failed fitable id,
//! invoking each fallback through a raw invoker until one succeeds, the
//! chain ends, or an id repeats.

use super::{Invoker, InvokerFactory};
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::error::FitResult;
use std::sync::Arc;

pub struct DegradationDecorator {
    inner: Box<dyn Invoker>,
    factory: Arc<InvokerFactory>,
}

impl DegradationDecorator {
    pub fn new(inner: Box<dyn Invoker>, factory: Arc<InvokerFactory>) -> Self {
        Self { inner, factory }
    }
}

impl Invoker for DegradationDecorator {
    fn coordinate(&self) -> &Arc<Coordinate> {
        self.inner.coordinate()
    }

    fn config(&self) -> &Arc<dyn GenericableConfig> {
        self.inner.config()
    }

    fn fitable_type(&self) -> FitableType {
        self.inner.fitable_type()
    }

    fn invoke(&self, ctx: &mut CallContext, input: &[Arg], output: &mut [OutArg]) -> FitResult<()> {
        let Err(mut last) = self.inner.invoke(ctx, input, output) else {
            return Ok(());
        };

        let coordinate = self.inner.coordinate();
        let config = self.inner.config();
        let mut visited = vec![coordinate.fitable_id.clone()];
        let mut current = coordinate.fitable_id.clone();

        loop {
            let next = config.degradation(&current);
            if next.is_empty() {
                return Err(last);
            }
            if visited.contains(&next) {
                log::warn!(
                    "[degradation] cycle detected for '{}': {} -> {}",
                    coordinate.generic_id,
                    visited.join(" -> "),
                    next
                );
                return Err(last);
            }

            log::info!(
                "[degradation] {} failed with {}, falling back to '{}'",
                current,
                last.code,
                next
            );
            visited.push(next.clone());

            let fallback = self.factory.build_raw(
                Arc::new(coordinate.with_fitable(next.as_str())),
                config.clone(),
                self.inner.fitable_type(),
            );
            match fallback.invoke(ctx, input, output) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last = e;
                    current = next;
                }
            }
        }
    }
}
