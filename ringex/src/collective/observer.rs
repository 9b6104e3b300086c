//! Instrumentation hooks invoked by the exchange between rounds.
//!
//! Observers run outside the timed send/receive window, so slow observers
//! (console output, logging) do not inflate the reported transfer time.

use crate::types::{Rank, Tag, Value};

/// One message, as seen by one end of a ring edge.
#[derive(Debug, Clone, Copy)]
pub struct TransferEvent<'a> {
    /// Rank of the observing peer.
    pub rank: Rank,
    /// The other end: destination of a send, source of a receive.
    pub peer: Rank,
    /// 1-indexed round number.
    pub round: u32,
    pub tag: Tag,
    pub values: &'a [Value],
}

/// What one round resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub rank: Rank,
    pub round: u32,
    /// Rank that authored the extracted value.
    pub origin: Rank,
    /// Slot of the received buffer the value was taken from.
    pub data_index: usize,
    pub value: Value,
    /// Values left in the transfer buffer after compaction.
    pub remaining: usize,
}

/// Hook into the progress of a ring exchange. Every method defaults to a
/// no-op.
pub trait ExchangeObserver: Send + Sync {
    fn on_send(&self, _event: &TransferEvent<'_>) {}

    fn on_receive(&self, _event: &TransferEvent<'_>) {}

    fn on_round(&self, _report: &RoundReport) {}
}

impl<O: ExchangeObserver + ?Sized> ExchangeObserver for std::sync::Arc<O> {
    fn on_send(&self, event: &TransferEvent<'_>) {
        (**self).on_send(event)
    }

    fn on_receive(&self, event: &TransferEvent<'_>) {
        (**self).on_receive(event)
    }

    fn on_round(&self, report: &RoundReport) {
        (**self).on_round(report)
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExchangeObserver for NoopObserver {}

/// Logs every transfer at `INFO` and every round at `DEBUG` through
/// `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExchangeObserver for TracingObserver {
    fn on_send(&self, event: &TransferEvent<'_>) {
        tracing::info!(
            round = event.round,
            "Process {} sent {} to process {}",
            event.rank,
            format_values(event.values),
            event.peer
        );
    }

    fn on_receive(&self, event: &TransferEvent<'_>) {
        tracing::info!(
            round = event.round,
            "Process {} received {} from process {}",
            event.rank,
            format_values(event.values),
            event.peer
        );
    }

    fn on_round(&self, report: &RoundReport) {
        tracing::debug!(
            rank = report.rank,
            round = report.round,
            origin = report.origin,
            data_index = report.data_index,
            remaining = report.remaining,
            "round resolved"
        );
    }
}

/// `[ 1, 2, 3, ]`
pub fn format_values(values: &[Value]) -> String {
    let mut out = String::from("[ ");
    for v in values {
        out.push_str(&v.to_string());
        out.push_str(", ");
    }
    out.push(']');
    out
}
