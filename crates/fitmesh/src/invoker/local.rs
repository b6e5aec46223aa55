// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process invocation.

use super::Invoker;
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg, Slot};
use crate::coordinate::{Coordinate, FitableType};
use crate::discovery::Discovery;
use crate::error::{FitError, FitResult};
use std::sync::Arc;

/// Calls the function registered for the coordinate in this process.
pub struct LocalInvoker {
    coordinate: Arc<Coordinate>,
    config: Arc<dyn GenericableConfig>,
    fitable_type: FitableType,
    discovery: Arc<dyn Discovery>,
}

impl LocalInvoker {
    pub fn new(
        coordinate: Arc<Coordinate>,
        config: Arc<dyn GenericableConfig>,
        fitable_type: FitableType,
        discovery: Arc<dyn Discovery>,
    ) -> Self {
        Self {
            coordinate,
            config,
            fitable_type,
            discovery,
        }
    }
}

impl Invoker for LocalInvoker {
    fn coordinate(&self) -> &Arc<Coordinate> {
        &self.coordinate
    }

    fn config(&self) -> &Arc<dyn GenericableConfig> {
        &self.config
    }

    fn fitable_type(&self) -> FitableType {
        self.fitable_type
    }

    fn invoke(&self, ctx: &mut CallContext, input: &[Arg], output: &mut [OutArg]) -> FitResult<()> {
        let fitables = self.discovery.get_local_fitable(&self.coordinate);
        let Some(first) = fitables.first() else {
            return Err(FitError::fail(format!(
                "no local implementation of {}",
                self.coordinate
            )));
        };
        let Some(function) = first.function.clone() else {
            return Err(FitError::fail(format!(
                "local implementation of {} has no callable",
                self.coordinate
            )));
        };

        let mut slots: Vec<Slot<'_>> = Vec::with_capacity(1 + input.len() + output.len());
        slots.push(Slot::Context(ctx));
        slots.extend(input.iter().map(Slot::In));
        slots.extend(output.iter_mut().map(Slot::Out));

        function(slots.as_mut_slice())
    }
}
