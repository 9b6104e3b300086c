use ringex::{
    ExchangeObserver, LocalChannel, NoopObserver, RingReport, RoundReport, TransferEvent, Value,
    run_ring,
};
use std::sync::{Arc, Mutex};

/// Row `r`, column `c` is what rank `r` prepares for rank `c`.
pub fn scenario_rows() -> Vec<Vec<Value>> {
    vec![
        vec![10, 20, 30, 40],
        vec![11, 21, 31, 41],
        vec![12, 22, 32, 42],
        vec![13, 23, 33, 43],
    ]
}

/// `rows[r][c] = 1000 * r + c`, so every value names its route.
pub fn indexed_rows(world_size: u32) -> Vec<Vec<Value>> {
    (0..world_size as Value)
        .map(|r| (0..world_size as Value).map(|c| 1000 * r + c).collect())
        .collect()
}

/// Helper: run the exchange for every row over an in-memory ring.
pub async fn run_local(rows: Vec<Vec<Value>>) -> RingReport {
    let channels = LocalChannel::ring(rows.len() as u32).unwrap();
    run_ring(channels, rows, Arc::new(NoopObserver)).await.unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub rank: u32,
    pub peer: u32,
    pub round: u32,
    pub tag: u32,
    pub values: Vec<Value>,
}

impl From<&TransferEvent<'_>> for Transfer {
    fn from(e: &TransferEvent<'_>) -> Self {
        Self {
            rank: e.rank,
            peer: e.peer,
            round: e.round,
            tag: e.tag,
            values: e.values.to_vec(),
        }
    }
}

/// Observer that keeps everything it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub sends: Mutex<Vec<Transfer>>,
    pub receives: Mutex<Vec<Transfer>>,
    pub rounds: Mutex<Vec<RoundReport>>,
}

impl RecordingObserver {
    pub fn rounds_for(&self, rank: u32) -> Vec<RoundReport> {
        let mut rounds: Vec<RoundReport> = self
            .rounds
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.rank == rank)
            .copied()
            .collect();
        rounds.sort_by_key(|r| r.round);
        rounds
    }
}

impl ExchangeObserver for RecordingObserver {
    fn on_send(&self, event: &TransferEvent<'_>) {
        self.sends.lock().unwrap().push(event.into());
    }

    fn on_receive(&self, event: &TransferEvent<'_>) {
        self.receives.lock().unwrap().push(event.into());
    }

    fn on_round(&self, report: &RoundReport) {
        self.rounds.lock().unwrap().push(*report);
    }
}
