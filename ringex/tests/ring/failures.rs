use futures::future::BoxFuture;
use ringex::{
    LocalChannel, NoopObserver, Rank, RingChannel, RingError, Tag, Value, ring_alltoall, run_ring,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::helpers::indexed_rows;

#[derive(Clone, Copy)]
enum Fault {
    None,
    /// Drop the last value of the message sent in this round.
    Truncate(u32),
    /// Send this round's message under a different tag.
    Retag(u32),
}

/// Wraps a `LocalChannel` and corrupts one outgoing message.
struct FaultyChannel {
    inner: LocalChannel,
    fault: Fault,
    sends: AtomicU32,
}

impl FaultyChannel {
    fn ring(world_size: u32, faulty_rank: Rank, fault: Fault) -> Vec<FaultyChannel> {
        LocalChannel::ring(world_size)
            .unwrap()
            .into_iter()
            .map(|inner| {
                let fault = if inner.rank() == faulty_rank {
                    fault
                } else {
                    Fault::None
                };
                FaultyChannel {
                    inner,
                    fault,
                    sends: AtomicU32::new(0),
                }
            })
            .collect()
    }
}

impl RingChannel for FaultyChannel {
    fn rank(&self) -> Rank {
        self.inner.rank()
    }

    fn world_size(&self) -> u32 {
        self.inner.world_size()
    }

    fn send<'a>(
        &'a self,
        values: &'a [Value],
        dest: Rank,
        tag: Tag,
    ) -> BoxFuture<'a, ringex::Result<()>> {
        let round = self.sends.fetch_add(1, Ordering::Relaxed) + 1;
        match self.fault {
            Fault::Truncate(r) if r == round => {
                self.inner.send(&values[..values.len() - 1], dest, tag)
            }
            Fault::Retag(r) if r == round => self.inner.send(values, dest, tag + 100),
            _ => self.inner.send(values, dest, tag),
        }
    }

    fn recv<'a>(
        &'a self,
        into: &'a mut [Value],
        src: Rank,
        tag: Tag,
    ) -> BoxFuture<'a, ringex::Result<()>> {
        self.inner.recv(into, src, tag)
    }
}

#[tokio::test]
async fn test_size_mismatch_aborts_receiver() {
    // Rank 1 sends 3 values instead of 4 in round 2 of a 6-peer ring.
    let chans = FaultyChannel::ring(6, 1, Fault::Truncate(2));
    let err = run_ring(chans, indexed_rows(6), Arc::new(NoopObserver))
        .await
        .unwrap_err();

    assert_eq!(err.round_context(), Some((2, 2)));
    assert!(matches!(
        err.root_cause(),
        RingError::SizeMismatch {
            expected: 4,
            actual: 3
        }
    ));
}

#[tokio::test]
async fn test_tag_mismatch_aborts_receiver() {
    let chans = FaultyChannel::ring(4, 3, Fault::Retag(1));
    let err = run_ring(chans, indexed_rows(4), Arc::new(NoopObserver))
        .await
        .unwrap_err();

    assert_eq!(err.round_context(), Some((0, 1)));
    assert!(matches!(
        err.root_cause(),
        RingError::TagMismatch {
            expected: 3,
            actual: 103
        }
    ));
}

#[tokio::test]
async fn test_missing_peer_fails_neighbours() {
    let mut chans = LocalChannel::ring(3).unwrap();
    drop(chans.pop());
    let rows = indexed_rows(3);

    let (r0, r1) = tokio::join!(
        ring_alltoall(&chans[0], &rows[0], 0, 3),
        ring_alltoall(&chans[1], &rows[1], 1, 3),
    );

    // Rank 0 waits on rank 2; rank 1 sends to rank 2.
    let e0 = r0.unwrap_err();
    assert!(matches!(
        e0.root_cause(),
        RingError::PeerDisconnected { rank: 2 }
    ));
    assert_eq!(e0.round_context(), Some((0, 1)));

    let e1 = r1.unwrap_err();
    assert!(matches!(
        e1.root_cause(),
        RingError::PeerDisconnected { rank: 2 }
    ));
    assert_eq!(e1.round_context(), Some((1, 1)));
}

#[tokio::test]
async fn test_run_ring_rejects_row_count_mismatch() {
    let chans = LocalChannel::ring(3).unwrap();
    let err = run_ring(chans, indexed_rows(2), Arc::new(NoopObserver))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RingError::RowLengthMismatch {
            expected: 3,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn test_run_ring_rejects_short_row() {
    let chans = LocalChannel::ring(3).unwrap();
    let mut rows = indexed_rows(3);
    rows[1].pop();
    let err = run_ring(chans, rows, Arc::new(NoopObserver))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
}
