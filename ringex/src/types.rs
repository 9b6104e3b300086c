use crate::error::{RingError, Result};

/// Rank of a peer on the ring (0-indexed).
pub type Rank = u32;

/// Message tag. The ring exchange tags every message with the sender's rank.
pub type Tag = u32;

/// Element type carried by the exchange.
pub type Value = i32;

/// Current wire protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// A validated `(rank, world_size)` pair and the ring geometry derived from it.
///
/// Construction guarantees `world_size >= 1` and `rank < world_size`, so
/// every accessor is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingPosition {
    rank: Rank,
    world_size: u32,
}

impl RingPosition {
    pub fn new(rank: Rank, world_size: u32) -> Result<Self> {
        if world_size < 1 {
            return Err(RingError::InvalidWorldSize {
                world_size: i64::from(world_size),
            });
        }
        if rank >= world_size {
            return Err(RingError::InvalidRank {
                rank: i64::from(rank),
                world_size: i64::from(world_size),
            });
        }
        Ok(Self { rank, world_size })
    }

    /// Validate signed input (environment variables, command lines, FFI).
    pub fn from_raw(rank: i64, world_size: i64) -> Result<Self> {
        if world_size < 1 || world_size > i64::from(u32::MAX) {
            return Err(RingError::InvalidWorldSize { world_size });
        }
        if rank < 0 || rank >= world_size {
            return Err(RingError::InvalidRank { rank, world_size });
        }
        Self::new(rank as Rank, world_size as u32)
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn world_size(&self) -> u32 {
        self.world_size
    }

    /// Ring successor: every round's message goes here.
    pub fn next(&self) -> Rank {
        (self.rank + 1) % self.world_size
    }

    /// Ring predecessor: every round's message comes from here.
    pub fn prev(&self) -> Rank {
        self.rank.checked_sub(1).unwrap_or(self.world_size - 1)
    }

    /// Number of send/receive rounds: `world_size - 1`.
    pub fn rounds(&self) -> u32 {
        self.world_size - 1
    }

    /// Values on the wire in `round` (1-indexed): `world_size - round`.
    pub fn message_size(&self, round: u32) -> usize {
        (self.world_size - round) as usize
    }

    /// Rank that authored the value this peer extracts in `round`.
    ///
    /// Data that travelled `round` hops from its author arrives at
    /// `(author + round) mod N`; this inverts that.
    pub fn origin_at(&self, round: u32) -> Rank {
        // Widened so that rank + world_size cannot overflow near u32::MAX.
        let n = u64::from(self.world_size);
        let back = u64::from(round) % n;
        ((u64::from(self.rank) + n - back) % n) as Rank
    }

    /// Buffer slot holding this peer's value in `round`.
    ///
    /// Every hop between the origin and this peer removed its own slot. When
    /// the origin ranks above us, one of those hops ranked below us and its
    /// removal collapses our slot to the front of the buffer. Otherwise our
    /// slot sits at `origin`.
    pub fn extraction_index(&self, round: u32) -> usize {
        let origin = self.origin_at(round);
        if origin <= self.rank {
            origin as usize
        } else {
            0
        }
    }
}

impl std::fmt::Display for RingPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rank {} of {}", self.rank, self.world_size)
    }
}
