//! # Remote Failure Side Channel
//!
//! Failures that cannot travel back through a call's return path: one-way calls
//! that failed on the serving side, and `STUB_NOT_FOUND` answers to this side's own
//! requests.

use objwire_proto::ExceptionInfo;

use crate::proxy::Proxy;

/// Where a reported failure happened.
#[derive(Debug, Clone)]
pub enum FailureSource {
    /// A call this side made through `proxy`.
    Proxy(Proxy),
    /// A request this side received and could not serve.
    Inbound { interface: String, instance_id: i64 },
}

/// Receives failures that have no caller to surface at.
pub trait FailureListener: Send + Sync + 'static {
    fn on_rpc_failed(&self, source: &FailureSource, method_id: u32, exception: &ExceptionInfo);
}

impl<F> FailureListener for F
where
    F: Fn(&FailureSource, u32, &ExceptionInfo) + Send + Sync + 'static,
{
    fn on_rpc_failed(&self, source: &FailureSource, method_id: u32, exception: &ExceptionInfo) {
        self(source, method_id, exception)
    }
}
