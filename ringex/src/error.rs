use crate::types::{Rank, RingPosition, Tag};

pub type Result<T> = std::result::Result<T, RingError>;

#[derive(Debug, thiserror::Error)]
pub enum RingError {
    #[error("invalid world size {world_size}: at least one peer is required")]
    InvalidWorldSize { world_size: i64 },

    #[error("invalid rank {rank}: world size is {world_size}")]
    InvalidRank { rank: i64, world_size: i64 },

    #[error(
        "engine bound to {position} but the channel is rank {channel_rank} of {channel_world_size}"
    )]
    ChannelMismatch {
        position: RingPosition,
        channel_rank: Rank,
        channel_world_size: u32,
    },

    #[error("row length mismatch: expected {expected} values, got {actual}")]
    RowLengthMismatch { expected: usize, actual: usize },

    #[error("message size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("message tag mismatch: expected {expected}, got {actual}")]
    TagMismatch { expected: Tag, actual: Tag },

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("rank {rank} is not reachable from this endpoint")]
    UnknownPeer { rank: Rank },

    #[error("protocol version mismatch: local={local}, remote={remote}")]
    ProtocolMismatch { local: u16, remote: u16 },

    #[error("ring handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("message decode failed: {0}")]
    DecodeFailed(String),

    #[error("message encode failed: {0}")]
    EncodeFailed(String),

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("exchange failed at rank {rank} in round {round}: {source}")]
    RoundFailed {
        rank: Rank,
        round: u32,
        #[source]
        source: Box<RingError>,
    },

    #[error("peer task for rank {rank} failed: {reason}")]
    PeerTaskFailed { rank: Rank, reason: String },
}

impl RingError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Attach the failing rank and round to an error raised mid-exchange.
    pub(crate) fn in_round(self, rank: Rank, round: u32) -> Self {
        Self::RoundFailed {
            rank,
            round,
            source: Box::new(self),
        }
    }

    /// Errors raised while validating arguments, before any round runs.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::InvalidWorldSize { .. }
                | Self::InvalidRank { .. }
                | Self::ChannelMismatch { .. }
                | Self::RowLengthMismatch { .. }
        )
    }

    /// The error with any `RoundFailed` wrapping removed.
    pub fn root_cause(&self) -> &RingError {
        match self {
            Self::RoundFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// `(rank, round)` of the failure, when it happened inside a round.
    pub fn round_context(&self) -> Option<(Rank, u32)> {
        match self {
            Self::RoundFailed { rank, round, .. } => Some((*rank, *round)),
            _ => None,
        }
    }
}
