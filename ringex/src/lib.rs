//! All-to-all personalized exchange over a logical ring.
//!
//! Every peer starts with one value for each peer and ends with the value
//! each peer prepared for it, using only transfers between ring neighbours.
//! The payload shrinks by one value per round, so a ring of `N` peers needs
//! `N - 1` rounds.

pub mod cluster;
pub mod collective;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use cluster::{RingReport, run_ring};
pub use collective::{
    ExchangeObserver, ExchangeOutcome, NoopObserver, RingExchangeEngine, RoundReport,
    TracingObserver, TransferEvent, ring_alltoall,
};
pub use config::{RingConfig, TransportKind};
pub use error::{Result, RingError};
pub use protocol::RingMessage;
pub use transport::{LocalChannel, RingChannel, TcpChannel};
pub use types::{PROTOCOL_VERSION, Rank, RingPosition, Tag, Value};
