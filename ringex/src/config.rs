//! Runtime-configurable parameters for ringex.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `RINGEX_`) or by constructing a custom `RingConfig`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Which transport connects the peers of a locally hosted ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// In-memory queues between tasks of one process.
    Local,
    /// Loopback TCP sockets, one connection per ring edge.
    Tcp,
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "tcp" => Ok(Self::Tcp),
            other => Err(format!("unknown transport {other:?}")),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Local => f.write_str("local"),
            TransportKind::Tcp => f.write_str("tcp"),
        }
    }
}

/// Parameters for running a ring exchange.
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Number of peers on the ring.
    pub world_size: u32,

    /// Seed for initial row generation. `None` derives one from the clock.
    pub seed: Option<u64>,

    /// Transport used when the ring is hosted in one process.
    pub transport: TransportKind,

    /// Log every send and receive through `tracing`.
    pub trace_transfers: bool,

    /// Largest frame the TCP transport accepts from a peer.
    pub max_frame_bytes: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            world_size: 4,
            seed: None,
            transport: TransportKind::Local,
            trace_transfers: false,
            max_frame_bytes: 64 * 1024 * 1024, // 64 MiB
        }
    }
}

impl RingConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `RINGEX_WORLD_SIZE`
    /// - `RINGEX_SEED`
    /// - `RINGEX_TRANSPORT` (`local` or `tcp`)
    /// - `RINGEX_TRACE_TRANSFERS` (`1`, `true`, `yes`, `on`)
    /// - `RINGEX_MAX_FRAME_BYTES`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("RINGEX_WORLD_SIZE")
            && let Ok(n) = v.trim().parse::<u32>()
        {
            cfg.world_size = n;
        }
        if let Some(v) = lookup("RINGEX_SEED")
            && let Ok(s) = v.trim().parse::<u64>()
        {
            cfg.seed = Some(s);
        }
        if let Some(v) = lookup("RINGEX_TRANSPORT") {
            match v.parse::<TransportKind>() {
                Ok(kind) => cfg.transport = kind,
                Err(e) => tracing::warn!("ignoring RINGEX_TRANSPORT: {e}"),
            }
        }
        if let Some(v) = lookup("RINGEX_TRACE_TRANSFERS") {
            cfg.trace_transfers = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(v) = lookup("RINGEX_MAX_FRAME_BYTES")
            && let Ok(n) = v.trim().parse::<usize>()
        {
            cfg.max_frame_bytes = n;
        }

        cfg
    }

    /// The configured seed, or one taken from the wall clock.
    pub fn seed_or_clock(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(1)
        })
    }
}
