// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Trace decorator: "invoking"/"invoked" events around the chosen call.

use super::Invoker;
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::error::FitResult;
use std::fmt;
use std::sync::Arc;

/// Where the traced call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Local,
    Remote,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "LOCAL",
            Self::Remote => "REMOTE",
        })
    }
}

/// One traced call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub coordinate: Coordinate,
    pub call_type: CallType,
    pub trust_stage: FitableType,
    /// Host and port, REMOTE calls only
    pub target: Option<(String, u16)>,
}

/// Receiver of trace events.
pub trait TraceSink: Send + Sync {
    fn invoking(&self, record: &TraceRecord);

    /// `result` is `"OK"` or the numeric code.
    fn invoked(&self, record: &TraceRecord, result: &str);
}

/// Writes trace events through the `log` facade (target `fitmesh::trace`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn invoking(&self, record: &TraceRecord) {
        match &record.target {
            Some((host, port)) => log::info!(
                target: "fitmesh::trace",
                "invoking {} {} [{}] -> {}:{}",
                record.call_type, record.coordinate, record.trust_stage, host, port
            ),
            None => log::info!(
                target: "fitmesh::trace",
                "invoking {} {} [{}]",
                record.call_type, record.coordinate, record.trust_stage
            ),
        }
    }

    fn invoked(&self, record: &TraceRecord, result: &str) {
        log::info!(
            target: "fitmesh::trace",
            "invoked {} {} [{}] = {}",
            record.call_type,
            record.coordinate,
            record.trust_stage,
            result
        );
    }
}

pub struct TraceDecorator {
    inner: Box<dyn Invoker>,
    sink: Arc<dyn TraceSink>,
    enabled: bool,
    call_type: CallType,
    target: Option<(String, u16)>,
}

impl TraceDecorator {
    pub fn new(
        inner: Box<dyn Invoker>,
        sink: Arc<dyn TraceSink>,
        enabled: bool,
        call_type: CallType,
        target: Option<(String, u16)>,
    ) -> Self {
        Self {
            inner,
            sink,
            enabled,
            call_type,
            target,
        }
    }
}

impl Invoker for TraceDecorator {
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
        if !self.enabled {
            return self.inner.invoke(ctx, input, output);
        }

        let record = TraceRecord {
            coordinate: Coordinate::clone(self.inner.coordinate()),
            call_type: self.call_type,
            trust_stage: self.inner.fitable_type(),
            target: self.target.clone(),
        };
        self.sink.invoking(&record);
        let result = self.inner.invoke(ctx, input, output);
        match &result {
            Ok(()) => self.sink.invoked(&record, "OK"),
            Err(e) => self.sink.invoked(&record, &e.code.as_i32().to_string()),
        }
        result
    }
}
