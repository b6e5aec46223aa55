// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Trust decorator (outermost).
//!
//! Stage order when trust is enabled:
//!
//! ```text
//! VALIDATE  failure aborts, MAIN never runs
//! BEFORE    best-effort
//! MAIN      inner chain
//! AFTER     best-effort, MAIN succeeded
//! ERROR     best-effort, MAIN failed
//! ```
//!
//! Stages with an empty fitable id are skipped. Each stage runs through a
//! raw invoker with its own scratch outputs.

use super::{scratch_outputs, Invoker, InvokerFactory};
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::error::FitResult;
use std::sync::Arc;

pub struct TrustDecorator {
    inner: Box<dyn Invoker>,
    factory: Arc<InvokerFactory>,
}

impl TrustDecorator {
    pub fn new(inner: Box<dyn Invoker>, factory: Arc<InvokerFactory>) -> Self {
        Self { inner, factory }
    }

    fn run_stage(
        &self,
        stage: FitableType,
        fitable_id: &str,
        ctx: &mut CallContext,
        input: &[Arg],
        output_len: usize,
    ) -> FitResult<()> {
        let invoker = self.factory.build_raw(
            Arc::new(self.inner.coordinate().with_fitable(fitable_id)),
            self.inner.config().clone(),
            stage,
        );
        let mut scratch = scratch_outputs(output_len);
        invoker.invoke(ctx, input, &mut scratch)
    }

    fn best_effort(
        &self,
        stage: FitableType,
        fitable_id: &str,
        ctx: &mut CallContext,
        input: &[Arg],
        output_len: usize,
    ) {
        if fitable_id.is_empty() {
            return;
        }
        if let Err(e) = self.run_stage(stage, fitable_id, ctx, input, output_len) {
            log::warn!(
                "[trust] {} stage '{}' of {} failed: {}",
                stage,
                fitable_id,
                self.inner.coordinate(),
                e
            );
        }
    }
}

impl Invoker for TrustDecorator {
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
        let config = self.inner.config().clone();
        if !config.enable_trust() {
            return self.inner.invoke(ctx, input, output);
        }

        let out_len = output.len();
        let validate = config.validate();
        if !validate.is_empty() {
            if let Err(e) = self.run_stage(FitableType::Validate, &validate, ctx, input, out_len) {
                log::debug!(
                    "[trust] validation '{}' rejected {}: {}",
                    validate,
                    self.inner.coordinate(),
                    e
                );
                return Err(e);
            }
        }

        self.best_effort(FitableType::Before, &config.before(), ctx, input, out_len);

        let result = self.inner.invoke(ctx, input, output);
        match &result {
            Ok(()) => self.best_effort(FitableType::After, &config.after(), ctx, input, out_len),
            Err(_) => self.best_effort(FitableType::Error, &config.error(), ctx, input, out_len),
        }
        result
    }
}
