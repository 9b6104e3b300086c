mod alltoall;
pub mod observer;

pub use alltoall::{ExchangeOutcome, RingExchangeEngine, ring_alltoall};
pub use observer::{ExchangeObserver, NoopObserver, RoundReport, TracingObserver, TransferEvent};
