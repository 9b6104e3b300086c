use crate::collective::observer::{ExchangeObserver, NoopObserver, RoundReport, TransferEvent};
use crate::error::{RingError, Result};
use crate::transport::RingChannel;
use crate::types::{Rank, RingPosition, Value};
use std::time::{Duration, Instant};

static NOOP: NoopObserver = NoopObserver;

/// Output of one peer's exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// `result[j]` is the value rank `j` prepared for this peer.
    pub result: Vec<Value>,
    /// Time spent inside send/receive, summed over rounds.
    pub elapsed: Duration,
    /// Send/receive rounds performed: `world_size - 1`.
    pub rounds: u32,
}

/// All-to-all personalized exchange over a ring, for one peer.
///
/// Every round each peer forwards its shrinking transfer buffer to its
/// successor and takes from the predecessor's buffer the single value meant
/// for it. Slots stay sorted by destination rank, which is what makes the
/// extraction index a function of `(rank, round)` alone.
pub struct RingExchangeEngine<'a, C: RingChannel + ?Sized> {
    channel: &'a C,
    position: RingPosition,
    observer: &'a dyn ExchangeObserver,
}

impl<'a, C: RingChannel + ?Sized> RingExchangeEngine<'a, C> {
    /// Bind an engine to `channel`, which must be the endpoint for
    /// `position`.
    pub fn new(channel: &'a C, position: RingPosition) -> Result<Self> {
        if channel.rank() != position.rank() || channel.world_size() != position.world_size() {
            return Err(RingError::ChannelMismatch {
                position,
                channel_rank: channel.rank(),
                channel_world_size: channel.world_size(),
            });
        }
        Ok(Self {
            channel,
            position,
            observer: &NOOP,
        })
    }

    pub fn with_observer(mut self, observer: &'a dyn ExchangeObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn position(&self) -> RingPosition {
        self.position
    }

    /// Run the exchange. `row[i]` is the value destined for rank `i`.
    ///
    /// Any error aborts the exchange; the partially filled result is
    /// dropped. Errors raised by the channel come back as `RoundFailed`.
    pub async fn run(&self, row: &[Value]) -> Result<ExchangeOutcome> {
        let n = self.position.world_size() as usize;
        if row.len() != n {
            return Err(RingError::RowLengthMismatch {
                expected: n,
                actual: row.len(),
            });
        }

        let rank = self.position.rank();
        let me = rank as usize;
        let next = self.position.next();
        let prev = self.position.prev();

        let mut result = vec![0; n];
        result[me] = row[me];

        // Slot k targets rank k below us and rank k+1 above us.
        let mut buf: Vec<Value> = row
            .iter()
            .enumerate()
            .filter(|&(dest, _)| dest != me)
            .map(|(_, &v)| v)
            .collect();
        // Receives land here and are swapped into `buf`.
        let mut inbox: Vec<Value> = vec![0; buf.len()];
        let mut elapsed = Duration::ZERO;

        for round in 1..=self.position.rounds() {
            let msg_size = self.position.message_size(round);

            let started = Instant::now();
            tokio::try_join!(
                self.channel.send(&buf[..msg_size], next, rank),
                self.channel.recv(&mut inbox[..msg_size], prev, prev),
            )
            .map_err(|e| e.in_round(rank, round))?;
            elapsed += started.elapsed();

            std::mem::swap(&mut buf, &mut inbox);
            self.observer.on_send(&TransferEvent {
                rank,
                peer: next,
                round,
                tag: rank,
                values: &inbox[..msg_size],
            });
            self.observer.on_receive(&TransferEvent {
                rank,
                peer: prev,
                round,
                tag: prev,
                values: &buf[..msg_size],
            });

            let origin = self.position.origin_at(round);
            let data_index = self.position.extraction_index(round);
            let value = buf[data_index];
            result[origin as usize] = value;
            compact(&mut buf[..msg_size], data_index);

            self.observer.on_round(&RoundReport {
                rank,
                round,
                origin,
                data_index,
                value,
                remaining: msg_size - 1,
            });
        }

        Ok(ExchangeOutcome {
            result,
            elapsed,
            rounds: self.position.rounds(),
        })
    }
}

/// Remove `buf[idx]` by shifting the tail left one slot. The last slot is
/// left stale; callers shrink their logical length.
fn compact(buf: &mut [Value], idx: usize) {
    buf.copy_within(idx + 1.., idx);
}

/// Run the ring all-to-all personalized exchange for `rank` of `world_size`.
///
/// Rejects `world_size < 1`, `rank >= world_size` and rows whose length is
/// not `world_size` before touching the channel.
pub async fn ring_alltoall<C: RingChannel + ?Sized>(
    channel: &C,
    row: &[Value],
    rank: Rank,
    world_size: u32,
) -> Result<ExchangeOutcome> {
    let position = RingPosition::new(rank, world_size)?;
    RingExchangeEngine::new(channel, position)?.run(row).await
}
