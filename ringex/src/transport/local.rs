use crate::error::{RingError, Result};
use crate::transport::{RingChannel, deliver};
use crate::types::{Rank, Tag, Value};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};

struct Envelope {
    tag: Tag,
    values: Vec<Value>,
}

/// In-memory transport: every ordered pair of ranks gets its own unbounded
/// FIFO queue, so sends never block and per-pair order is preserved.
///
/// Intended for tests and for hosting a whole ring inside one process.
pub struct LocalChannel {
    rank: Rank,
    world_size: u32,
    /// Indexed by destination rank.
    outboxes: Vec<mpsc::UnboundedSender<Envelope>>,
    /// Indexed by source rank, each independently lockable.
    inboxes: Vec<Mutex<mpsc::UnboundedReceiver<Envelope>>>,
    sends: AtomicU64,
    recvs: AtomicU64,
}

impl LocalChannel {
    /// Create one connected endpoint per rank, returned in rank order.
    pub fn ring(world_size: u32) -> Result<Vec<LocalChannel>> {
        if world_size < 1 {
            return Err(RingError::InvalidWorldSize {
                world_size: i64::from(world_size),
            });
        }
        let n = world_size as usize;

        let mut outboxes: Vec<Vec<mpsc::UnboundedSender<Envelope>>> =
            (0..n).map(|_| Vec::with_capacity(n)).collect();
        let mut inboxes: Vec<Vec<Mutex<mpsc::UnboundedReceiver<Envelope>>>> =
            (0..n).map(|_| Vec::with_capacity(n)).collect();

        // outboxes[src][dest] feeds inboxes[dest][src]; pushing in nested
        // src-major order keeps both vectors indexed by peer rank.
        for src in 0..n {
            for dest in 0..n {
                let (tx, rx) = mpsc::unbounded_channel();
                outboxes[src].push(tx);
                inboxes[dest].push(Mutex::new(rx));
            }
        }

        Ok(outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalChannel {
                rank: rank as Rank,
                world_size,
                outboxes,
                inboxes,
                sends: AtomicU64::new(0),
                recvs: AtomicU64::new(0),
            })
            .collect())
    }

    /// Number of `send` calls attempted on this endpoint.
    pub fn sends_attempted(&self) -> u64 {
        self.sends.load(Ordering::Relaxed)
    }

    /// Number of `recv` calls attempted on this endpoint.
    pub fn recvs_attempted(&self) -> u64 {
        self.recvs.load(Ordering::Relaxed)
    }

    fn outbox(&self, dest: Rank) -> Result<&mpsc::UnboundedSender<Envelope>> {
        self.outboxes
            .get(dest as usize)
            .ok_or(RingError::UnknownPeer { rank: dest })
    }

    fn inbox(&self, src: Rank) -> Result<&Mutex<mpsc::UnboundedReceiver<Envelope>>> {
        self.inboxes
            .get(src as usize)
            .ok_or(RingError::UnknownPeer { rank: src })
    }
}

impl RingChannel for LocalChannel {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn send<'a>(&'a self, values: &'a [Value], dest: Rank, tag: Tag) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.sends.fetch_add(1, Ordering::Relaxed);
            self.outbox(dest)?
                .send(Envelope {
                    tag,
                    values: values.to_vec(),
                })
                .map_err(|_| RingError::PeerDisconnected { rank: dest })
        })
    }

    fn recv<'a>(
        &'a self,
        into: &'a mut [Value],
        src: Rank,
        tag: Tag,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.recvs.fetch_add(1, Ordering::Relaxed);
            let envelope = self
                .inbox(src)?
                .lock()
                .await
                .recv()
                .await
                .ok_or(RingError::PeerDisconnected { rank: src })?;
            deliver(into, tag, envelope.tag, &envelope.values)
        })
    }
}
