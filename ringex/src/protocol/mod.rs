pub mod codec;
pub mod message;

pub use codec::{FRAME_HEADER_SIZE, decode_message, encode_message, read_message, write_message};
pub use message::RingMessage;
