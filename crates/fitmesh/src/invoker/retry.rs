// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Retry decorator.
//!
//! Re-invokes immediately (no backoff) while the failure is network-class
//! and the caller's retry budget is not exhausted.

use super::Invoker;
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::error::{FitResult, NetworkClassifier};
use std::sync::Arc;

pub struct RetryDecorator {
    inner: Box<dyn Invoker>,
    classifier: Arc<dyn NetworkClassifier>,
}

impl RetryDecorator {
    pub fn new(inner: Box<dyn Invoker>, classifier: Arc<dyn NetworkClassifier>) -> Self {
        Self { inner, classifier }
    }
}

impl Invoker for RetryDecorator {
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
        let max_retry = ctx.retry();
        let mut retried = 0u32;
        loop {
            match self.inner.invoke(ctx, input, output) {
                Err(e) if retried < max_retry && self.classifier.is_network_error(e.code) => {
                    retried += 1;
                    log::debug!(
                        "[retry] {} failed with {}, retry {}/{}",
                        self.inner.coordinate(),
                        e.code,
                        retried,
                        max_retry
                    );
                }
                result => return result,
            }
        }
    }
}
