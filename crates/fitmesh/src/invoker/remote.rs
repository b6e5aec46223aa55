// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Remote invocation over the injected [`RemoteTransport`].
//!
//! [`RemoteTransport`]: crate::transport::RemoteTransport

use super::{Invoker, InvokerFactory};
use crate::config::GenericableConfig;
use crate::context::{Arg, CallContext, OutArg};
use crate::coordinate::{Coordinate, FitableType};
use crate::endpoint::Endpoint;
use crate::error::{ErrorCode, FitError, FitResult};
use crate::formatter::SerializationDescriptor;
use crate::metadata::{
    RequestMetadata, ResponseMetadata, VersionTriple, METADATA_VERSION, TAG_EXCEPTION_CONTEXT,
    TAG_GLOBAL_CONTEXT,
};
use crate::transport::{RequestContext, TargetAddress};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Calls one fitable on a remote worker.
pub struct RemoteInvoker {
    coordinate: Arc<Coordinate>,
    config: Arc<dyn GenericableConfig>,
    fitable_type: FitableType,
    endpoint: Endpoint,
    factory: Arc<InvokerFactory>,
}

impl RemoteInvoker {
    pub fn new(
        coordinate: Arc<Coordinate>,
        config: Arc<dyn GenericableConfig>,
        fitable_type: FitableType,
        endpoint: Endpoint,
        factory: Arc<InvokerFactory>,
    ) -> Self {
        Self {
            coordinate,
            config,
            fitable_type,
            endpoint,
            factory,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn request_metadata(&self, ctx: &CallContext, format: i32) -> FitResult<Vec<u8>> {
        let mut tlv = BTreeMap::new();
        tlv.insert(TAG_GLOBAL_CONTEXT, ctx.serialize_global_context()?);
        tlv.insert(TAG_EXCEPTION_CONTEXT, ctx.serialize_exception_context()?);
        let metadata = RequestMetadata {
            version: METADATA_VERSION,
            format,
            generic_version: VersionTriple::parse(&self.coordinate.generic_version)?,
            generic_id: self.coordinate.generic_id.clone(),
            fitable_id: self.coordinate.fitable_id.clone(),
            tlv,
        };
        Ok(metadata.encode())
    }

    fn merge_response_context(ctx: &mut CallContext, header: &ResponseMetadata) -> FitResult<()> {
        if let Some(bytes) = header.tlv.get(&TAG_GLOBAL_CONTEXT) {
            ctx.merge_global_context(bytes)?;
        }
        if let Some(bytes) = header.tlv.get(&TAG_EXCEPTION_CONTEXT) {
            ctx.replace_exception_context(bytes)?;
        }
        Ok(())
    }

    fn request_context(&self, ctx: &CallContext) -> RequestContext {
        let worker = self.factory.local_endpoint().settings();
        RequestContext {
            timeout_ms: ctx.timeout_ms(),
            caller_application: worker.application.clone(),
            caller_worker: worker.worker_id.clone(),
        }
    }
}

impl Invoker for RemoteInvoker {
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
        let Some(transport) = self.factory.transport() else {
            return Err(FitError::not_ready("remote transport not configured"));
        };

        let formatters = self.factory.formatters();
        let descriptor = SerializationDescriptor {
            generic_id: self.coordinate.generic_id.clone(),
            formats: self.endpoint.formats.clone(),
            fitable_type: self.fitable_type,
        };
        let formatter = formatters.get_formatter(&descriptor).ok_or_else(|| {
            FitError::not_found(format!(
                "no formatter for '{}' among formats {:?}",
                descriptor.generic_id, descriptor.formats
            ))
        })?;

        let metadata = self.request_metadata(ctx, formatter.format())?;
        let payload = formatters.serialize_request(formatter.as_ref(), input)?;
        let target = TargetAddress::from(&self.endpoint);

        let request = self.request_context(ctx);
        let response = match transport.call(&target, &metadata, &payload, &request) {
            Ok(response) => response,
            Err(e) if self.factory.classifier().is_network_error(e.code) => {
                log::debug!("[remote] {} -> {} failed: {}", self.coordinate, target, e);
                let fitable = self.coordinate.fitable();
                let marked = transport.mark_address_invalid(&fitable, &target.worker_id, false);
                if let Err(mark) = marked {
                    log::warn!(
                        "[remote] failed to mark {} invalid for {}: {}",
                        target,
                        self.coordinate,
                        mark
                    );
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let Some(response) = response else {
            return Err(FitError::new(
                ErrorCode::NO_RESPONSE,
                format!("no response from {}", target),
            ));
        };
        let header = ResponseMetadata::decode(&response.metadata).map_err(|e| {
            FitError::new(ErrorCode::INVALID_RESPONSE_METADATA, e.message)
        })?;

        // A failed status wins over an unreadable response context.
        if !header.code.is_ok() {
            if let Err(e) = Self::merge_response_context(ctx, &header) {
                log::warn!("[remote] {} dropped response context: {}", self.coordinate, e);
            }
            return Err(FitError::new(header.code, header.message));
        }
        Self::merge_response_context(ctx, &header)?;
        if self.fitable_type == FitableType::Main {
            formatters.deserialize_response(formatter.as_ref(), &response.payload, output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenericableSettings;
    use crate::context::arg;
    use crate::invoker::tests::{Fixture, LOCAL_WORKER};
    use crate::transport::ResponseEnvelope;

    fn remote(fixture: &Fixture, fitable_type: FitableType) -> RemoteInvoker {
        RemoteInvoker::new(
            Arc::new(fixture.coordinate("impl-A")),
            Arc::new(GenericableSettings::new("orderSvc")),
            fitable_type,
            Endpoint::new("worker-remote", "10.0.0.2", 8002).with_formats(vec![0]),
            fixture.factory.clone(),
        )
    }

    fn out_string(output: &[OutArg], idx: usize) -> Option<&str> {
        output[idx]
            .as_ref()
            .and_then(|a| a.downcast_ref::<String>())
            .map(String::as_str)
    }

    #[test]
    fn test_ok_response_fills_outputs() {
        let fixture = Fixture::new();
        fixture.transport.respond_ok(b"accepted");

        let mut ctx = CallContext::new().with_timeout_ms(1500);
        ctx.put_global("trace-id", "t-1");
        let mut output = vec![None];
        remote(&fixture, FitableType::Main)
            .invoke(&mut ctx, &[arg("order-7".to_string())], &mut output)
            .expect("invoke");
        assert_eq!(out_string(&output, 0), Some("accepted"));

        let calls = fixture.transport.calls.lock();
        let call = &calls[0];
        assert_eq!(call.payload, b"order-7");
        assert_eq!(call.context.timeout_ms, 1500);
        assert_eq!(call.context.caller_worker, LOCAL_WORKER);

        let meta = RequestMetadata::decode(&call.metadata).expect("metadata");
        assert_eq!(meta.generic_id, "orderSvc");
        assert_eq!(meta.fitable_id, "impl-A");
        assert_eq!(meta.format, 0);
        assert_eq!(meta.generic_version, VersionTriple { major: 1, minor: 0, revision: 0 });
        let global: BTreeMap<String, String> =
            serde_json::from_slice(&meta.tlv[&TAG_GLOBAL_CONTEXT]).expect("json");
        assert_eq!(global["trace-id"], "t-1");
    }

    #[test]
    fn test_network_error_marks_address_and_keeps_code() {
        let fixture = Fixture::new();
        fixture.transport.fail_marks();
        fixture
            .transport
            .respond(Err(FitError::from_code(ErrorCode::NET_CONNECT_REFUSED)));

        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NET_CONNECT_REFUSED);

        let marks = fixture.transport.marks.lock();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].0.fitable_id, "impl-A");
        assert_eq!(marks[0].1, "worker-remote");
        assert!(!marks[0].2);
    }

    #[test]
    fn test_non_network_error_not_marked() {
        let fixture = Fixture::new();
        fixture.transport.respond(Err(FitError::fail("codec")));
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FAIL);
        assert!(fixture.transport.marks.lock().is_empty());
    }

    #[test]
    fn test_response_failures() {
        let fixture = Fixture::new();

        fixture.transport.respond(Ok(None));
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NO_RESPONSE);

        fixture.transport.respond(Ok(Some(ResponseEnvelope {
            metadata: vec![1, 2],
            payload: Vec::new(),
        })));
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_RESPONSE_METADATA);

        let status = ResponseMetadata::error(0, ErrorCode::from_i32(0x0A00_0001), "rejected");
        fixture.transport.respond(Ok(Some(ResponseEnvelope {
            metadata: status.encode(),
            payload: Vec::new(),
        })));
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code.as_i32(), 0x0A00_0001);
        assert_eq!(err.message, "rejected");
    }

    #[test]
    fn test_response_context_merged() {
        let fixture = Fixture::new();
        let mut header = ResponseMetadata::ok(0);
        header
            .tlv
            .insert(TAG_GLOBAL_CONTEXT, br#"{"hop":"worker-remote"}"#.to_vec());
        header
            .tlv
            .insert(TAG_EXCEPTION_CONTEXT, br#"{"cause":"none"}"#.to_vec());
        fixture.transport.respond(Ok(Some(ResponseEnvelope {
            metadata: header.encode(),
            payload: Vec::new(),
        })));

        let mut ctx = CallContext::new();
        ctx.put_global("trace-id", "t-1");
        remote(&fixture, FitableType::Main)
            .invoke(&mut ctx, &[], &mut [])
            .expect("invoke");
        assert_eq!(ctx.global_context["trace-id"], "t-1");
        assert_eq!(ctx.global_context["hop"], "worker-remote");
        assert_eq!(ctx.exception_context["cause"], "none");
    }

    #[test]
    fn test_failed_status_survives_bad_response_context() {
        let fixture = Fixture::new();
        let mut header =
            ResponseMetadata::error(0, ErrorCode::from_i32(0x0A00_0009), "remote rejected");
        header.tlv.insert(TAG_GLOBAL_CONTEXT, b"garbage".to_vec());
        fixture.transport.respond(Ok(Some(ResponseEnvelope {
            metadata: header.encode(),
            payload: Vec::new(),
        })));

        let mut ctx = CallContext::new();
        ctx.put_global("trace-id", "t-1");
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut ctx, &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code.as_i32(), 0x0A00_0009);
        assert_eq!(err.message, "remote rejected");
        assert_eq!(ctx.global_context.len(), 1);
    }

    #[test]
    fn test_bad_response_context_on_success_fails_decoding() {
        let fixture = Fixture::new();
        let mut header = ResponseMetadata::ok(0);
        header.tlv.insert(TAG_EXCEPTION_CONTEXT, b"garbage".to_vec());
        fixture.transport.respond(Ok(Some(ResponseEnvelope {
            metadata: header.encode(),
            payload: b"accepted".to_vec(),
        })));

        let mut output = vec![None];
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut output)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DESERIALIZE);
        assert!(output[0].is_none());
    }

    #[test]
    fn test_undecodable_payload_fails_main_only() {
        let fixture = Fixture::new();
        let bad_payload = || {
            Ok(Some(ResponseEnvelope {
                metadata: ResponseMetadata::ok(0).encode(),
                payload: vec![0xFF, 0xFE, 0xFD],
            }))
        };

        fixture.transport.respond(bad_payload());
        let mut output = vec![None];
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut output)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DESERIALIZE);
        assert!(output[0].is_none());

        fixture.transport.respond(bad_payload());
        let mut output = vec![None];
        remote(&fixture, FitableType::After)
            .invoke(&mut CallContext::new(), &[], &mut output)
            .expect("stage result ignores payload");
        assert!(output[0].is_none());
    }

    #[test]
    fn test_stage_calls_skip_output_decoding() {
        let fixture = Fixture::new();
        fixture.transport.respond_ok(b"ignored");
        let mut output = vec![None];
        remote(&fixture, FitableType::After)
            .invoke(&mut CallContext::new(), &[], &mut output)
            .expect("invoke");
        assert!(output[0].is_none());
    }

    #[test]
    fn test_missing_formatter_or_transport() {
        let fixture = Fixture::new();
        let invoker = RemoteInvoker::new(
            Arc::new(fixture.coordinate("impl-A")),
            Arc::new(GenericableSettings::new("orderSvc")),
            FitableType::Main,
            Endpoint::new("worker-remote", "10.0.0.2", 8002).with_formats(vec![9]),
            fixture.factory.clone(),
        );
        let err = invoker.invoke(&mut CallContext::new(), &[], &mut []).unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_FOUND);
        assert!(fixture.transport.calls.lock().is_empty());

        let fixture = Fixture::without_transport();
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NOT_READY);
    }

    #[test]
    fn test_serialization_failure_aborts_before_wire() {
        let fixture = Fixture::new();
        let err = remote(&fixture, FitableType::Main)
            .invoke(&mut CallContext::new(), &[arg(5u8)], &mut [])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SERIALIZE);
        assert!(fixture.transport.calls.lock().is_empty());
    }
}
