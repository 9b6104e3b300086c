use ringex::cluster::{random_row, verify_exchange};
use ringex::{NoopObserver, RingConfig, TcpChannel, run_ring};
use std::sync::Arc;

use super::helpers::{RecordingObserver, scenario_rows};

#[tokio::test]
async fn test_tcp_alltoall_4x4_scenario() {
    let chans = TcpChannel::bootstrap_local(4, &RingConfig::default())
        .await
        .unwrap();
    let report = run_ring(chans, scenario_rows(), Arc::new(NoopObserver))
        .await
        .unwrap();
    assert_eq!(
        report.results(),
        vec![
            vec![10, 11, 12, 13],
            vec![20, 21, 22, 23],
            vec![30, 31, 32, 33],
            vec![40, 41, 42, 43],
        ]
    );
}

#[tokio::test]
async fn test_tcp_alltoall_conservation() {
    for n in 1..=6u32 {
        let chans = TcpChannel::bootstrap_local(n, &RingConfig::default())
            .await
            .unwrap();
        let rows: Vec<_> = (0..n).map(|r| random_row(r, n, 31)).collect();
        let report = run_ring(chans, rows.clone(), Arc::new(NoopObserver))
            .await
            .unwrap();
        if let Err(m) = verify_exchange(&rows, &report.results()) {
            panic!("n={n}: {m}");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tcp_alltoall_multi_thread() {
    let n = 9u32;
    let chans = TcpChannel::bootstrap_local(n, &RingConfig::default())
        .await
        .unwrap();
    let rows: Vec<_> = (0..n).map(|r| random_row(r, n, 5)).collect();
    let observer = Arc::new(RecordingObserver::default());
    let report = run_ring(chans, rows.clone(), observer.clone())
        .await
        .unwrap();

    assert_eq!(verify_exchange(&rows, &report.results()), Ok(()));
    let rounds = observer.rounds.lock().unwrap().len();
    assert_eq!(rounds, (n * (n - 1)) as usize);
}
