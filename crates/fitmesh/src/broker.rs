// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Caller-facing entry points.
//!
//! The [`Broker`] turns a generic id plus a [`Route`] into a coordinate,
//! picks the endpoint supplier from the call context and runs the full
//! invoker chain:
//!
//! | Context                | Supplier                                  |
//! |------------------------|-------------------------------------------|
//! | `target_address` set   | Direct                                    |
//! | `target_worker` set    | LoadBalance pruned to that worker         |
//! | neither                | Local, then LoadBalance                   |

use crate::config::{ConfigProvider, GenericableConfig, InvokeSettings};
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::Coordinate;
use crate::endpoint::predicate::worker_predicate;
use crate::endpoint::{CompositeSupplier, DirectSupplier, Endpoint, EndpointSupplier};
use crate::error::{FitError, FitResult};
use crate::invoker::InvokerFactory;
use std::fmt;
use std::sync::Arc;

/// How the fitable id of a call is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    /// The configured routine, else the configured default
    #[default]
    Default,
    /// An explicit fitable id
    Fitable(String),
    /// A configured alias
    Alias(String),
    /// A random pick among the configured fitables
    Random,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Fitable(id) => write!(f, "fitable '{}'", id),
            Self::Alias(alias) => write!(f, "alias '{}'", alias),
            Self::Random => f.write_str("random"),
        }
    }
}

impl Route {
    /// Resolve the fitable id; empty when nothing is configured.
    pub fn resolve(&self, config: &dyn GenericableConfig) -> String {
        match self {
            Self::Default => {
                let routine = config.routine();
                if routine.is_empty() {
                    config.default_fitable()
                } else {
                    routine
                }
            }
            Self::Fitable(id) => id.clone(),
            Self::Alias(alias) => config.fitable_id_by_alias(alias),
            Self::Random => config.random_fitable(),
        }
    }
}

pub struct Broker {
    factory: Arc<InvokerFactory>,
    configs: Arc<dyn ConfigProvider>,
    defaults: InvokeSettings,
}

impl Broker {
    pub fn new(factory: Arc<InvokerFactory>, configs: Arc<dyn ConfigProvider>) -> Self {
        Self {
            factory,
            configs,
            defaults: InvokeSettings::default(),
        }
    }

    /// Retry/timeout used when the caller leaves them unset.
    pub fn with_defaults(mut self, defaults: InvokeSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn factory(&self) -> &Arc<InvokerFactory> {
        &self.factory
    }

    /// Invoke a generic service, routed by `route` and pinned by `ctx`.
    pub fn invoke(
        &self,
        generic_id: &str,
        generic_version: &str,
        route: &Route,
        ctx: &mut CallContext,
        input: &[Arg],
        output: &mut [OutArg],
    ) -> FitResult<()> {
        let config = self.config(generic_id)?;
        let coordinate = Self::coordinate(generic_id, generic_version, route, config.as_ref())?;
        let supplier = self.supplier_for(ctx);
        self.run(coordinate, config, supplier, ctx, input, output)
    }

    /// Invoke a fitable on a known endpoint.
    #[allow(clippy::too_many_arguments)]
    pub fn invoke_at(
        &self,
        generic_id: &str,
        generic_version: &str,
        fitable_id: &str,
        endpoint: Endpoint,
        ctx: &mut CallContext,
        input: &[Arg],
        output: &mut [OutArg],
    ) -> FitResult<()> {
        let config = self.config(generic_id)?;
        let coordinate = Coordinate::new(generic_id, generic_version, fitable_id, "");
        let supplier = Box::new(DirectSupplier::new(endpoint));
        self.run(coordinate, config, supplier, ctx, input, output)
    }

    /// Invoke a fitable hosted by this process; `NOT_FOUND` when it is not.
    pub fn invoke_local(
        &self,
        generic_id: &str,
        generic_version: &str,
        fitable_id: &str,
        ctx: &mut CallContext,
        input: &[Arg],
        output: &mut [OutArg],
    ) -> FitResult<()> {
        let config = self.config(generic_id)?;
        let coordinate = Coordinate::new(generic_id, generic_version, fitable_id, "");
        let supplier = self.factory.local_supplier();
        self.run(coordinate, config, supplier, ctx, input, output)
    }

    /// Dry run: the coordinate and endpoint a call would use, without invoking.
    pub fn resolve(
        &self,
        generic_id: &str,
        generic_version: &str,
        route: &Route,
        ctx: &CallContext,
    ) -> FitResult<(Coordinate, Option<Endpoint>)> {
        let config = self.config(generic_id)?;
        let coordinate = Self::coordinate(generic_id, generic_version, route, config.as_ref())?;
        let endpoint = self.supplier_for(ctx).get(&coordinate, config.as_ref())?;
        Ok((coordinate, endpoint))
    }

    fn config(&self, generic_id: &str) -> FitResult<Arc<dyn GenericableConfig>> {
        self.configs
            .config(generic_id)
            .ok_or_else(|| {
                FitError::not_found(format!("no config for genericable '{}'", generic_id))
            })
    }

    fn coordinate(
        generic_id: &str,
        generic_version: &str,
        route: &Route,
        config: &dyn GenericableConfig,
    ) -> FitResult<Coordinate> {
        let fitable_id = route.resolve(config);
        if fitable_id.is_empty() {
            return Err(FitError::route(format!(
                "no fitable for '{}' by {}",
                generic_id, route
            )));
        }
        Ok(Coordinate::new(generic_id, generic_version, fitable_id, ""))
    }

    fn supplier_for(&self, ctx: &CallContext) -> Box<dyn EndpointSupplier> {
        if let Some(endpoint) = &ctx.target_address {
            return Box::new(DirectSupplier::new(endpoint.clone()));
        }
        if let Some(worker) = &ctx.target_worker {
            return self
                .factory
                .load_balance_supplier(Some(worker_predicate(worker.as_str())));
        }
        Box::new(CompositeSupplier::new(
            Some(self.factory.local_supplier()),
            Some(self.factory.load_balance_supplier(None)),
        ))
    }

    fn run(
        &self,
        coordinate: Coordinate,
        config: Arc<dyn GenericableConfig>,
        supplier: Box<dyn EndpointSupplier>,
        ctx: &mut CallContext,
        input: &[Arg],
        output: &mut [OutArg],
    ) -> FitResult<()> {
        ctx.retry.get_or_insert(self.defaults.retry);
        ctx.timeout_ms.get_or_insert(self.defaults.timeout_ms);
        log::debug!("[broker] invoking {}", coordinate);
        self.factory
            .build(coordinate, config, Some(supplier))
            .invoke(ctx, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenericableSettings, StaticConfigProvider};
    use crate::error::ErrorCode;
    use crate::invoker::tests::{Fixture, LOCAL_WORKER};
    use std::sync::atomic::Ordering;

    fn broker(fixture: &Fixture, settings: GenericableSettings) -> Broker {
        Broker::new(
            fixture.factory.clone(),
            Arc::new(StaticConfigProvider::new(vec![settings])),
        )
    }

    #[test]
    fn test_route_resolution() {
        let mut settings = GenericableSettings::new("orderSvc")
            .with_default("impl-A")
            .with_alias("fast", "impl-C");
        assert_eq!(Route::Default.resolve(&settings), "impl-A");
        settings.routine = "impl-R".into();
        assert_eq!(Route::Default.resolve(&settings), "impl-R");
        assert_eq!(Route::Alias("fast".into()).resolve(&settings), "impl-C");
        assert_eq!(Route::Alias("slow".into()).resolve(&settings), "");
        assert_eq!(Route::Fitable("x".into()).resolve(&settings), "x");
        settings.fitables = vec!["only".into()];
        assert_eq!(Route::Random.resolve(&settings), "only");
    }

    #[test]
    fn test_unknown_generic_or_route() {
        let fixture = Fixture::new();
        let broker = broker(&fixture, GenericableSettings::new("orderSvc"));

        let err = broker
            .invoke("missing", "1.0.0", &Route::Default, &mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);

        let err = broker
            .invoke("orderSvc", "1.0.0", &Route::Default, &mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ROUTE);
    }

    #[test]
    fn test_prefers_local_implementation() {
        let fixture = Fixture::new();
        fixture.add_remote("impl-A", "worker-remote", 8002);
        let calls = fixture.register_local("impl-A", |_| Ok(()));
        let broker = broker(&fixture, GenericableSettings::new("orderSvc").with_default("impl-A"));

        broker
            .invoke("orderSvc", "1.0.0", &Route::Default, &mut CallContext::new(), &[], &mut [])
            .expect("invoke");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(fixture.transport.calls.lock().is_empty());
    }

    #[test]
    fn test_target_worker_pins_remote() {
        let fixture = Fixture::new();
        fixture.register_local("impl-A", |_| Ok(()));
        fixture.add_remote("impl-A", "worker-remote", 8002);
        let broker = broker(&fixture, GenericableSettings::new("orderSvc"));

        let mut ctx = CallContext::new().with_target_worker("worker-remote");
        broker
            .invoke("orderSvc", "1.0.0", &Route::Fitable("impl-A".into()), &mut ctx, &[], &mut [])
            .expect("invoke");
        assert_eq!(fixture.transport.calls.lock()[0].target.worker_id, "worker-remote");

        let mut ctx = CallContext::new().with_target_worker("worker-gone");
        let err = broker
            .invoke("orderSvc", "1.0.0", &Route::Fitable("impl-A".into()), &mut ctx, &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);
    }

    #[test]
    fn test_target_address_and_invoke_at() {
        let fixture = Fixture::new();
        let broker = broker(&fixture, GenericableSettings::new("orderSvc"));
        let endpoint = Endpoint::new("worker-x", "10.9.9.9", 9100).with_formats(vec![0]);

        let mut ctx = CallContext::new().with_target_address(endpoint.clone());
        broker
            .invoke("orderSvc", "1.0.0", &Route::Fitable("impl-A".into()), &mut ctx, &[], &mut [])
            .expect("invoke");
        let mut ctx = CallContext::new();
        broker
            .invoke_at("orderSvc", "1.0.0", "impl-A", endpoint, &mut ctx, &[], &mut [])
            .expect("invoke_at");

        let calls = fixture.transport.calls.lock();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.target.host == "10.9.9.9"));
    }

    #[test]
    fn test_invoke_local() {
        let fixture = Fixture::new();
        fixture.add_remote("impl-A", "worker-remote", 8002);
        let broker = broker(&fixture, GenericableSettings::new("orderSvc"));

        let err = broker
            .invoke_local("orderSvc", "1.0.0", "impl-A", &mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);

        let calls = fixture.register_local("impl-A", |_| Ok(()));
        broker
            .invoke_local("orderSvc", "1.0.0", "impl-A", &mut CallContext::new(), &[], &mut [])
            .expect("invoke_local");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(fixture.transport.calls.lock().is_empty());
    }

    #[test]
    fn test_defaults_fill_unset_context() {
        let fixture = Fixture::new();
        fixture.add_remote("impl-A", "worker-remote", 8002);
        let broker = broker(&fixture, GenericableSettings::new("orderSvc")).with_defaults(
            InvokeSettings {
                timeout_ms: 750,
                retry: 1,
            },
        );
        fixture
            .transport
            .respond(Err(FitError::from_code(ErrorCode::NET_TIMEOUT)));

        let mut ctx = CallContext::new();
        broker
            .invoke("orderSvc", "1.0.0", &Route::Fitable("impl-A".into()), &mut ctx, &[], &mut [])
            .expect("retried call");
        assert_eq!(ctx.retry, Some(1));
        let calls = fixture.transport.calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].context.timeout_ms, 750);

        let mut pinned = CallContext::new().with_timeout_ms(20);
        drop(calls);
        let route = Route::Fitable("impl-A".into());
        broker
            .invoke("orderSvc", "1.0.0", &route, &mut pinned, &[], &mut [])
            .expect("invoke");
        assert_eq!(fixture.transport.calls.lock()[2].context.timeout_ms, 20);
    }

    #[test]
    fn test_resolve_dry_run() {
        let fixture = Fixture::new();
        fixture.register_local("impl-A", |_| Ok(()));
        let broker = broker(&fixture, GenericableSettings::new("orderSvc").with_default("impl-A"));

        let (coordinate, endpoint) = broker
            .resolve("orderSvc", "1.0.0", &Route::Default, &CallContext::new())
            .expect("resolve");
        assert_eq!(coordinate.fitable_id, "impl-A");
        assert_eq!(endpoint.map(|e| e.worker_id), Some(LOCAL_WORKER.to_string()));
    }
}
