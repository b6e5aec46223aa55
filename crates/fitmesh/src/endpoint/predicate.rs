// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint predicates used to prune load-balance candidates.

use super::Endpoint;

/// Test applied to every candidate endpoint.
pub trait EndpointPredicate: Send + Sync {
    fn test(&self, endpoint: &Endpoint) -> bool;
}

/// Predicate backed by a closure.
pub struct FnPredicate<F> {
    f: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&Endpoint) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EndpointPredicate for FnPredicate<F>
where
    F: Fn(&Endpoint) -> bool + Send + Sync,
{
    fn test(&self, endpoint: &Endpoint) -> bool {
        (self.f)(endpoint)
    }
}

/// Both predicates must accept.
pub struct AndPredicate {
    left: Box<dyn EndpointPredicate>,
    right: Box<dyn EndpointPredicate>,
}

impl AndPredicate {
    pub fn new(left: Box<dyn EndpointPredicate>, right: Box<dyn EndpointPredicate>) -> Self {
        Self { left, right }
    }
}

impl EndpointPredicate for AndPredicate {
    fn test(&self, endpoint: &Endpoint) -> bool {
        self.left.test(endpoint) && self.right.test(endpoint)
    }
}

/// Pin a call to one worker id.
pub fn worker_predicate(worker_id: impl Into<String>) -> Box<dyn EndpointPredicate> {
    let worker_id = worker_id.into();
    Box::new(FnPredicate::new(move |endpoint: &Endpoint| {
        endpoint.worker_id == worker_id
    }))
}
