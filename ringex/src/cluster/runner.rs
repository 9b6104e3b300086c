use crate::collective::{ExchangeObserver, ExchangeOutcome, RingExchangeEngine};
use crate::error::{RingError, Result};
use crate::transport::RingChannel;
use crate::types::{RingPosition, Value};
use std::sync::Arc;
use std::time::Duration;

/// Results of a ring hosted in one process, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingReport {
    pub outcomes: Vec<ExchangeOutcome>,
}

impl RingReport {
    /// Result rows in rank order.
    pub fn results(&self) -> Vec<Vec<Value>> {
        self.outcomes.iter().map(|o| o.result.clone()).collect()
    }

    /// Slowest peer's transfer time: the exchange is done when the last
    /// peer is.
    pub fn max_elapsed(&self) -> Duration {
        self.outcomes
            .iter()
            .map(|o| o.elapsed)
            .max()
            .unwrap_or_default()
    }
}

/// Run the exchange on every endpoint of a ring concurrently, one tokio task
/// per peer. `rows[r]` is rank `r`'s input row.
///
/// When peers fail, the returned error is the first one (in rank order) that
/// is not merely a neighbour disconnecting as a consequence.
pub async fn run_ring<C>(
    channels: Vec<C>,
    rows: Vec<Vec<Value>>,
    observer: Arc<dyn ExchangeObserver>,
) -> Result<RingReport>
where
    C: RingChannel + 'static,
{
    if rows.len() != channels.len() {
        return Err(RingError::RowLengthMismatch {
            expected: channels.len(),
            actual: rows.len(),
        });
    }

    let mut handles = Vec::with_capacity(channels.len());
    for (channel, row) in channels.into_iter().zip(rows) {
        let observer = Arc::clone(&observer);
        let rank = channel.rank();
        handles.push((
            rank,
            tokio::spawn(async move {
                let position = RingPosition::new(channel.rank(), channel.world_size())?;
                let engine =
                    RingExchangeEngine::new(&channel, position)?.with_observer(observer.as_ref());
                engine.run(&row).await
            }),
        ));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    let mut errors = Vec::new();
    for (rank, handle) in handles {
        match handle.await {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(e)) => {
                tracing::error!(rank, "ring exchange failed: {e}");
                errors.push(e);
            }
            Err(e) => {
                tracing::error!(rank, "ring peer task failed: {e}");
                errors.push(RingError::PeerTaskFailed {
                    rank,
                    reason: e.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        return Ok(RingReport { outcomes });
    }
    let primary = errors
        .iter()
        .position(|e| !matches!(e.root_cause(), RingError::PeerDisconnected { .. }))
        .unwrap_or(0);
    Err(errors.swap_remove(primary))
}
