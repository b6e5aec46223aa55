// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entry invoker: picks Local or Remote on every call.

use super::{Invoker, InvokerFactory};
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::endpoint::EndpointSupplier;
use crate::error::{FitError, FitResult};
use std::sync::Arc;

pub struct ShellInvoker {
    coordinate: Arc<Coordinate>,
    config: Arc<dyn GenericableConfig>,
    fitable_type: FitableType,
    /// Caller-supplied; the default load-balance supplier is used when absent
    supplier: Option<Box<dyn EndpointSupplier>>,
    factory: Arc<InvokerFactory>,
}

impl ShellInvoker {
    pub fn new(
        coordinate: Arc<Coordinate>,
        config: Arc<dyn GenericableConfig>,
        fitable_type: FitableType,
        supplier: Option<Box<dyn EndpointSupplier>>,
        factory: Arc<InvokerFactory>,
    ) -> Self {
        Self {
            coordinate,
            config,
            fitable_type,
            supplier,
            factory,
        }
    }

    fn select(&self) -> FitResult<Box<dyn Invoker>> {
        if self.config.local_only() {
            return Ok(self.factory.local_invoker(
                self.coordinate.clone(),
                self.config.clone(),
                self.fitable_type,
            ));
        }

        let endpoint = match &self.supplier {
            Some(supplier) => supplier.get(&self.coordinate, self.config.as_ref())?,
            None => self
                .factory
                .load_balance_supplier(None)
                .get(&self.coordinate, self.config.as_ref())?,
        };
        let Some(endpoint) = endpoint else {
            return Err(FitError::not_found(format!(
                "no endpoint for {} [{}]",
                self.coordinate, self.fitable_type
            )));
        };

        if self.factory.local_endpoint().is_local(&endpoint) {
            Ok(self.factory.local_invoker(
                self.coordinate.clone(),
                self.config.clone(),
                self.fitable_type,
            ))
        } else {
            Ok(self.factory.remote_invoker(
                self.coordinate.clone(),
                self.config.clone(),
                self.fitable_type,
                endpoint,
            ))
        }
    }
}

impl Invoker for ShellInvoker {
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
        self.select()?.invoke(ctx, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenericableSettings, WorkerSettings};
    use crate::coordinate::Fitable;
    use crate::endpoint::{ApplicationInstance, DirectSupplier, Endpoint, LoadBalancer};
    use crate::error::ErrorCode;
    use crate::formatter::FormatterRegistry;
    use crate::invoker::tests::{Fixture, LOCAL_WORKER};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSupplier {
        endpoint: Option<Endpoint>,
        calls: Arc<AtomicUsize>,
    }

    impl EndpointSupplier for CountingSupplier {
        fn get(&self, _: &Coordinate, _: &dyn GenericableConfig) -> FitResult<Option<Endpoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.endpoint.clone())
        }
    }

    fn shell(
        fixture: &Fixture,
        config: GenericableSettings,
        supplier: Option<Box<dyn EndpointSupplier>>,
    ) -> ShellInvoker {
        ShellInvoker::new(
            Arc::new(fixture.coordinate("impl-A")),
            Arc::new(config),
            FitableType::Main,
            supplier,
            fixture.factory.clone(),
        )
    }

    #[test]
    fn test_local_only_ignores_supplier() {
        let fixture = Fixture::new();
        let local_calls = fixture.register_local("impl-A", |_| Ok(()));
        let supplier_calls = Arc::new(AtomicUsize::new(0));
        let supplier = CountingSupplier {
            endpoint: Some(Endpoint::new("worker-remote", "10.0.0.2", 8002)),
            calls: supplier_calls.clone(),
        };

        let config = GenericableSettings::new("orderSvc").with_local_only(true);
        shell(&fixture, config, Some(Box::new(supplier)))
            .invoke(&mut CallContext::new(), &[], &mut [])
            .expect("invoke");

        assert_eq!(supplier_calls.load(Ordering::SeqCst), 0);
        assert_eq!(local_calls.load(Ordering::SeqCst), 1);
        assert!(fixture.transport.calls.lock().is_empty());
    }

    #[test]
    fn test_no_endpoint_is_not_found() {
        let fixture = Fixture::new();
        let supplier = CountingSupplier {
            endpoint: None,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let err = shell(&fixture, GenericableSettings::new("orderSvc"), Some(Box::new(supplier)))
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);

        // default supplier with an empty address table
        let err = shell(&fixture, GenericableSettings::new("orderSvc"), None)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);
    }

    struct RejectAll;

    impl LoadBalancer for RejectAll {
        fn filter(
            &self,
            _: &Fitable,
            _: Vec<ApplicationInstance>,
        ) -> FitResult<Vec<ApplicationInstance>> {
            Ok(Vec::new())
        }

        fn select(
            &self,
            _: &Fitable,
            _: Vec<ApplicationInstance>,
        ) -> FitResult<ApplicationInstance> {
            Err(FitError::filter_target("empty candidate set"))
        }
    }

    #[test]
    fn test_empty_filter_is_not_found() {
        let fixture = Fixture::new();
        fixture.add_remote("impl-A", "worker-remote", 8002);
        let worker = WorkerSettings {
            worker_id: LOCAL_WORKER.into(),
            ..Default::default()
        };
        let factory = InvokerFactory::new(
            worker,
            fixture.discovery.clone(),
            Arc::new(FormatterRegistry::new()),
        )
        .with_balancer(Arc::new(RejectAll));

        let err = ShellInvoker::new(
            Arc::new(fixture.coordinate("impl-A")),
            Arc::new(GenericableSettings::new("orderSvc")),
            FitableType::Main,
            None,
            Arc::new(factory),
        )
        .invoke(&mut CallContext::new(), &[], &mut [])
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);
    }

    #[test]
    fn test_local_worker_selects_local() {
        let fixture = Fixture::new();
        let local_calls = fixture.register_local("impl-A", |_| Ok(()));
        let supplier = DirectSupplier::new(Endpoint::new(LOCAL_WORKER, "192.168.1.1", 1));

        shell(&fixture, GenericableSettings::new("orderSvc"), Some(Box::new(supplier)))
            .invoke(&mut CallContext::new(), &[], &mut [])
            .expect("invoke");
        assert_eq!(local_calls.load(Ordering::SeqCst), 1);
        assert!(fixture.transport.calls.lock().is_empty());
    }

    #[test]
    fn test_other_worker_selects_remote() {
        let fixture = Fixture::new();
        fixture.transport.respond_ok(b"");
        let endpoint = Endpoint::new("worker-remote", "10.0.0.2", 8002).with_formats(vec![0]);
        let supplier = DirectSupplier::new(endpoint);

        shell(&fixture, GenericableSettings::new("orderSvc"), Some(Box::new(supplier)))
            .invoke(&mut CallContext::new(), &[], &mut [])
            .expect("invoke");

        let calls = fixture.transport.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target.worker_id, "worker-remote");
        assert_eq!(calls[0].target.port, 8002);
    }
}
