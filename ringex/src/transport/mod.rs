mod local;
mod tcp;

pub use local::LocalChannel;
pub use tcp::TcpChannel;

use crate::error::{RingError, Result};
use crate::types::{Rank, Tag, Value};
use futures::future::BoxFuture;

/// Point-to-point channel between the peers of one ring.
///
/// Delivery between a fixed `(src, dest)` pair must be reliable and
/// order-preserving. A peer may have one `send` and one `recv` in flight at
/// the same time.
pub trait RingChannel: Send + Sync {
    /// This endpoint's rank.
    fn rank(&self) -> Rank;

    /// Number of peers on the ring.
    fn world_size(&self) -> u32;

    /// Send `values` to `dest`. The message size is `values.len()`.
    fn send<'a>(&'a self, values: &'a [Value], dest: Rank, tag: Tag) -> BoxFuture<'a, Result<()>>;

    /// Receive exactly `into.len()` values tagged `tag` from `src`.
    ///
    /// Fails with `SizeMismatch` when the next message from `src` has a
    /// different length and with `TagMismatch` when it carries another tag.
    fn recv<'a>(
        &'a self,
        into: &'a mut [Value],
        src: Rank,
        tag: Tag,
    ) -> BoxFuture<'a, Result<()>>;
}

impl<C: RingChannel + ?Sized> RingChannel for std::sync::Arc<C> {
    fn rank(&self) -> Rank {
        (**self).rank()
    }

    fn world_size(&self) -> u32 {
        (**self).world_size()
    }

    fn send<'a>(&'a self, values: &'a [Value], dest: Rank, tag: Tag) -> BoxFuture<'a, Result<()>> {
        (**self).send(values, dest, tag)
    }

    fn recv<'a>(
        &'a self,
        into: &'a mut [Value],
        src: Rank,
        tag: Tag,
    ) -> BoxFuture<'a, Result<()>> {
        (**self).recv(into, src, tag)
    }
}

/// Check a received message against the receiver's expectations and copy it
/// into place.
pub(crate) fn deliver(
    into: &mut [Value],
    expected_tag: Tag,
    tag: Tag,
    values: &[Value],
) -> Result<()> {
    if tag != expected_tag {
        return Err(RingError::TagMismatch {
            expected: expected_tag,
            actual: tag,
        });
    }
    if values.len() != into.len() {
        return Err(RingError::SizeMismatch {
            expected: into.len(),
            actual: values.len(),
        });
    }
    into.copy_from_slice(values);
    Ok(())
}
