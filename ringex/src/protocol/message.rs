use crate::types::{Rank, Value};

/// Messages exchanged between ring neighbours over a byte stream.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize, Debug, Clone, PartialEq)]
pub enum RingMessage {
    /// First frame on every ring edge: identifies the connecting peer.
    Hello {
        protocol_version: u16,
        rank: Rank,
        world_size: u32,
    },

    /// One round's payload.
    Data {
        // Spelled out: the Archive derive defines its own `Tag`.
        tag: crate::types::Tag,
        src_rank: Rank,
        values: Vec<Value>,
    },
}
