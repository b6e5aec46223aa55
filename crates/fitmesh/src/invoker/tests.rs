// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared test doubles for the invoker chain.

use super::{Invoker, InvokerFactory, TraceRecord, TraceSink};
use crate::config::{GenericableConfig, GenericableSettings, TraceSettings, WorkerSettings};
use crate::context::{Arg, CallContext, OutArg, Slot};
use crate::coordinate::{Coordinate, Fitable, FitableType};
use crate::discovery::{FlatAddress, InMemoryDiscovery, LocalFitable, WorkerRecord};
use crate::endpoint::{ApplicationInfo, PortEndpoint};
use crate::error::{ErrorCode, FitError, FitResult};
use crate::formatter::tests::LineFormatter;
use crate::formatter::FormatterRegistry;
use crate::metadata::ResponseMetadata;
use crate::transport::{RemoteTransport, RequestContext, ResponseEnvelope, TargetAddress};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) const LOCAL_WORKER: &str = "worker-local";
const LOCAL_PORT: u16 = 8001;

pub(crate) fn coord() -> Coordinate {
    Coordinate::new("orderSvc", "1.0.0", "impl-A", "1.0.0")
}

/// Invoker returning scripted results, then `Ok(())` once exhausted.
pub(crate) struct ScriptedInvoker {
    coordinate: Arc<Coordinate>,
    config: Arc<dyn GenericableConfig>,
    script: Mutex<VecDeque<FitResult<()>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedInvoker {
    pub(crate) fn new(coordinate: Coordinate, results: Vec<FitResult<()>>) -> Self {
        let config = Arc::new(GenericableSettings::new(coordinate.generic_id.clone()));
        Self::with_config(coordinate, config, results)
    }

    pub(crate) fn with_config(
        coordinate: Coordinate,
        config: Arc<dyn GenericableConfig>,
        results: Vec<FitResult<()>>,
    ) -> Self {
        Self {
            coordinate: Arc::new(coordinate),
            config,
            script: Mutex::new(results.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Invoker for ScriptedInvoker {
    fn coordinate(&self) -> &Arc<Coordinate> {
        &self.coordinate
    }

    fn config(&self) -> &Arc<dyn GenericableConfig> {
        &self.config
    }

    fn fitable_type(&self) -> FitableType {
        FitableType::Main
    }

    fn invoke(&self, _: &mut CallContext, _: &[Arg], _: &mut [OutArg]) -> FitResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or(Ok(()))
    }
}

/// Trace sink keeping `(event, record, result)` tuples.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) events: Mutex<Vec<(String, TraceRecord, String)>>,
}

impl TraceSink for RecordingSink {
    fn invoking(&self, record: &TraceRecord) {
        self.events
            .lock()
            .push(("invoking".into(), record.clone(), String::new()));
    }

    fn invoked(&self, record: &TraceRecord, result: &str) {
        self.events
            .lock()
            .push(("invoked".into(), record.clone(), result.to_string()));
    }
}

pub(crate) struct RecordedCall {
    pub(crate) target: TargetAddress,
    pub(crate) metadata: Vec<u8>,
    pub(crate) payload: Vec<u8>,
    pub(crate) context: RequestContext,
}

/// Transport replaying queued responses (OK with empty payload once drained).
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<FitResult<Option<ResponseEnvelope>>>>,
    failing_marks: AtomicBool,
    pub(crate) calls: Mutex<Vec<RecordedCall>>,
    pub(crate) marks: Mutex<Vec<(Fitable, String, bool)>>,
}

impl FakeTransport {
    pub(crate) fn respond(&self, response: FitResult<Option<ResponseEnvelope>>) {
        self.responses.lock().push_back(response);
    }

    pub(crate) fn respond_ok(&self, payload: &[u8]) {
        self.respond(Ok(Some(ResponseEnvelope {
            metadata: ResponseMetadata::ok(0).encode(),
            payload: payload.to_vec(),
        })));
    }

    /// Make `mark_address_invalid` fail from now on.
    pub(crate) fn fail_marks(&self) {
        self.failing_marks.store(true, Ordering::SeqCst);
    }
}

impl RemoteTransport for FakeTransport {
    fn call(
        &self,
        target: &TargetAddress,
        metadata: &[u8],
        payload: &[u8],
        context: &RequestContext,
    ) -> FitResult<Option<ResponseEnvelope>> {
        self.calls.lock().push(RecordedCall {
            target: target.clone(),
            metadata: metadata.to_vec(),
            payload: payload.to_vec(),
            context: context.clone(),
        });
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Ok(Some(ResponseEnvelope {
                metadata: ResponseMetadata::ok(0).encode(),
                payload: Vec::new(),
            }))
        })
    }

    fn mark_address_invalid(
        &self,
        fitable: &Fitable,
        worker_id: &str,
        valid: bool,
    ) -> FitResult<()> {
        self.marks
            .lock()
            .push((fitable.clone(), worker_id.to_string(), valid));
        if self.failing_marks.load(Ordering::SeqCst) {
            return Err(FitError::from_code(ErrorCode::NET_CLOSED));
        }
        Ok(())
    }
}

/// Factory wired to in-memory collaborators, a fake transport and a
/// recording trace sink (trace enabled).
pub(crate) struct Fixture {
    pub(crate) discovery: Arc<InMemoryDiscovery>,
    pub(crate) transport: Arc<FakeTransport>,
    pub(crate) sink: Arc<RecordingSink>,
    pub(crate) factory: Arc<InvokerFactory>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::build(true)
    }

    pub(crate) fn without_transport() -> Self {
        Self::build(false)
    }

    fn build(with_transport: bool) -> Self {
        let discovery = Arc::new(InMemoryDiscovery::new());
        let formatters = Arc::new(FormatterRegistry::new());
        formatters.register("orderSvc", Arc::new(LineFormatter(0)));
        let transport = Arc::new(FakeTransport::default());
        let sink = Arc::new(RecordingSink::default());

        let worker = WorkerSettings {
            worker_id: LOCAL_WORKER.into(),
            application: "orders".into(),
            host: Some("127.0.0.1".into()),
            port: LOCAL_PORT,
            ..Default::default()
        };
        let mut factory = InvokerFactory::new(worker, discovery.clone(), formatters)
            .with_trace_sink(sink.clone())
            .with_trace(TraceSettings {
                local: true,
                global: false,
            });
        if with_transport {
            factory = factory.with_transport(transport.clone());
        }

        Self {
            discovery,
            transport,
            sink,
            factory: Arc::new(factory),
        }
    }

    pub(crate) fn coordinate(&self, fitable_id: &str) -> Coordinate {
        Coordinate::new("orderSvc", "1.0.0", fitable_id, "1.0.0")
    }

    /// Host `fitable_id` in this process and publish the local worker's address.
    ///
    /// Returns the function's call counter.
    pub(crate) fn register_local<F>(&self, fitable_id: &str, f: F) -> Arc<AtomicUsize>
    where
        F: Fn(&mut [Slot<'_>]) -> FitResult<()> + Send + Sync + 'static,
    {
        self.register_local_at(fitable_id, "1.0.0", f)
    }

    /// Same as [`Fixture::register_local`] with an explicit fitable version.
    pub(crate) fn register_local_at<F>(
        &self,
        fitable_id: &str,
        fitable_version: &str,
        f: F,
    ) -> Arc<AtomicUsize>
    where
        F: Fn(&mut [Slot<'_>]) -> FitResult<()> + Send + Sync + 'static,
    {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let coordinate = Coordinate::new("orderSvc", "1.0.0", fitable_id, fitable_version);
        self.discovery
            .register_local(LocalFitable::new(coordinate.clone(), move |slots| {
                counter.fetch_add(1, Ordering::SeqCst);
                f(slots)
            }));
        self.discovery.add_address(
            &coordinate.fitable(),
            address(LOCAL_WORKER, "127.0.0.1", LOCAL_PORT),
        );
        calls
    }

    /// Publish a remote worker's address for `fitable_id`.
    pub(crate) fn add_remote(&self, fitable_id: &str, worker_id: &str, port: u16) {
        self.discovery.add_address(
            &self.coordinate(fitable_id).fitable(),
            address(worker_id, "10.0.0.2", port),
        );
    }
}

fn address(worker_id: &str, host: &str, port: u16) -> FlatAddress {
    FlatAddress {
        application: ApplicationInfo {
            name: "orders".into(),
            version: "1.0.0".into(),
        },
        worker: WorkerRecord {
            worker_id: worker_id.into(),
            ..Default::default()
        },
        host: host.into(),
        endpoint: PortEndpoint { port, protocol: 0 },
        formats: vec![0],
    }
}

// Chain-level behavior through `InvokerFactory::build`.

#[test]
fn test_chain_retries_remote_then_degrades() {
    let fixture = Fixture::new();
    fixture.add_remote("impl-A", "worker-remote", 8002);
    let fallback = fixture.register_local("impl-B", |_| Ok(()));
    for _ in 0..3 {
        fixture
            .transport
            .respond(Err(FitError::from_code(ErrorCode::NET_TIMEOUT)));
    }

    let config = GenericableSettings::new("orderSvc").with_degradation("impl-A", "impl-B");
    let invoker = fixture
        .factory
        .build(fixture.coordinate("impl-A"), Arc::new(config), None);
    let mut ctx = CallContext::new().with_retry(2);
    invoker.invoke(&mut ctx, &[], &mut []).expect("degraded call");

    assert_eq!(fixture.transport.calls.lock().len(), 3);
    assert_eq!(fixture.transport.marks.lock().len(), 3);
    assert_eq!(fallback.load(Ordering::SeqCst), 1);
}

#[test]
fn test_chain_trace_records_remote_target() {
    let fixture = Fixture::new();
    fixture.add_remote("impl-A", "worker-remote", 8002);

    let invoker = fixture.factory.build(
        fixture.coordinate("impl-A"),
        Arc::new(GenericableSettings::new("orderSvc")),
        None,
    );
    invoker
        .invoke(&mut CallContext::new(), &[], &mut [])
        .expect("invoke");

    let events = fixture.sink.events.lock();
    assert_eq!(events.len(), 2);
    let record = &events[0].1;
    assert_eq!(record.call_type, super::CallType::Remote);
    assert_eq!(record.trust_stage, FitableType::Main);
    assert_eq!(record.target, Some(("10.0.0.2".to_string(), 8002)));
    assert_eq!(events[1].2, "OK");
}
