// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-scoped invoker factory.
//!
//! Owns the shared collaborators (discovery, formatters, transport,
//! load balancer, classifier, trace sink) and the memoized local endpoint,
//! and assembles per-call invoker chains from them.

use super::{
    CallType, DegradationDecorator, Invoker, LocalInvoker, LogTraceSink, RemoteInvoker,
    RetryDecorator, ShellInvoker, TraceDecorator, TraceSink, TrustDecorator,
};
use crate::config::{GenericableConfig, TraceSettings, WorkerSettings};
use crate::coordinate::{Coordinate, FitableType};
use crate::discovery::Discovery;
use crate::endpoint::{
    DefaultLoadBalancer, Endpoint, EndpointPredicate, EndpointSupplier, LoadBalanceSupplier,
    LoadBalancer, LocalEndpoint, LocalSupplier,
};
use crate::error::{DefaultNetworkClassifier, NetworkClassifier};
use crate::formatter::FormatterService;
use crate::transport::RemoteTransport;
use std::sync::Arc;

pub struct InvokerFactory {
    local: Arc<LocalEndpoint>,
    discovery: Arc<dyn Discovery>,
    formatters: Arc<dyn FormatterService>,
    transport: Option<Arc<dyn RemoteTransport>>,
    balancer: Arc<dyn LoadBalancer>,
    classifier: Arc<dyn NetworkClassifier>,
    trace_sink: Arc<dyn TraceSink>,
    trace: TraceSettings,
}

impl InvokerFactory {
    /// Create a factory without a transport (remote calls fail `NOT_READY`).
    ///
    /// The default load balancer filters on the worker's environment and formats.
    pub fn new(
        worker: WorkerSettings,
        discovery: Arc<dyn Discovery>,
        formatters: Arc<dyn FormatterService>,
    ) -> Self {
        let balancer = Arc::new(DefaultLoadBalancer::new(
            worker.environment.clone(),
            worker.formats.clone(),
        ));
        Self {
            local: Arc::new(LocalEndpoint::new(worker)),
            discovery,
            formatters,
            transport: None,
            balancer,
            classifier: Arc::new(DefaultNetworkClassifier),
            trace_sink: Arc::new(LogTraceSink),
            trace: TraceSettings::default(),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn RemoteTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_balancer(mut self, balancer: Arc<dyn LoadBalancer>) -> Self {
        self.balancer = balancer;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn NetworkClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = sink;
        self
    }

    pub fn with_trace(mut self, trace: TraceSettings) -> Self {
        self.trace = trace;
        self
    }

    /// Full MAIN chain: Trust(Degradation(Retry(Shell))).
    pub fn build(
        self: &Arc<Self>,
        coordinate: Coordinate,
        config: Arc<dyn GenericableConfig>,
        supplier: Option<Box<dyn EndpointSupplier>>,
    ) -> Box<dyn Invoker> {
        let shell = ShellInvoker::new(
            Arc::new(coordinate),
            config,
            FitableType::Main,
            supplier,
            self.clone(),
        );
        let retry = RetryDecorator::new(Box::new(shell), self.classifier.clone());
        let degradation = DegradationDecorator::new(Box::new(retry), self.clone());
        Box::new(TrustDecorator::new(Box::new(degradation), self.clone()))
    }

    /// Undecorated invoker: a Shell on the default load-balance supplier.
    pub fn build_raw(
        self: &Arc<Self>,
        coordinate: Arc<Coordinate>,
        config: Arc<dyn GenericableConfig>,
        fitable_type: FitableType,
    ) -> Box<dyn Invoker> {
        Box::new(ShellInvoker::new(
            coordinate,
            config,
            fitable_type,
            None,
            self.clone(),
        ))
    }

    pub(crate) fn local_invoker(
        &self,
        coordinate: Arc<Coordinate>,
        config: Arc<dyn GenericableConfig>,
        fitable_type: FitableType,
    ) -> Box<dyn Invoker> {
        let enabled = self.trace_enabled(config.as_ref());
        let local = LocalInvoker::new(coordinate, config, fitable_type, self.discovery.clone());
        Box::new(TraceDecorator::new(
            Box::new(local),
            self.trace_sink.clone(),
            enabled,
            CallType::Local,
            None,
        ))
    }

    pub(crate) fn remote_invoker(
        self: &Arc<Self>,
        coordinate: Arc<Coordinate>,
        config: Arc<dyn GenericableConfig>,
        fitable_type: FitableType,
        endpoint: Endpoint,
    ) -> Box<dyn Invoker> {
        let enabled = self.trace_enabled(config.as_ref());
        let target = Some((endpoint.host.clone(), endpoint.port));
        let remote = RemoteInvoker::new(coordinate, config, fitable_type, endpoint, self.clone());
        Box::new(TraceDecorator::new(
            Box::new(remote),
            self.trace_sink.clone(),
            enabled,
            CallType::Remote,
            target,
        ))
    }

    fn trace_enabled(&self, config: &dyn GenericableConfig) -> bool {
        self.trace.enabled() && !config.trace_ignore()
    }

    /// Supplier yielding the local endpoint for locally hosted fitables.
    pub fn local_supplier(&self) -> Box<dyn EndpointSupplier> {
        Box::new(LocalSupplier::new(self.discovery.clone(), self.local.clone()))
    }

    /// Discovery-backed supplier, optionally pruned by `predicate`.
    pub fn load_balance_supplier(
        &self,
        predicate: Option<Box<dyn EndpointPredicate>>,
    ) -> Box<dyn EndpointSupplier> {
        let supplier = LoadBalanceSupplier::new(self.discovery.clone(), self.balancer.clone());
        match predicate {
            Some(predicate) => Box::new(supplier.with_predicate(predicate)),
            None => Box::new(supplier),
        }
    }

    pub fn local_endpoint(&self) -> &Arc<LocalEndpoint> {
        &self.local
    }

    pub fn discovery(&self) -> &Arc<dyn Discovery> {
        &self.discovery
    }

    pub fn formatters(&self) -> &Arc<dyn FormatterService> {
        &self.formatters
    }

    pub fn transport(&self) -> Option<&Arc<dyn RemoteTransport>> {
        self.transport.as_ref()
    }

    pub fn classifier(&self) -> &Arc<dyn NetworkClassifier> {
        &self.classifier
    }
}
