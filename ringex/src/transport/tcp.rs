use crate::config::RingConfig;
use crate::error::{RingError, Result};
use crate::protocol::{RingMessage, read_message, write_message};
use crate::transport::{RingChannel, deliver};
use crate::types::{PROTOCOL_VERSION, Rank, RingPosition, Tag, Value};
use futures::future::BoxFuture;
use std::net::SocketAddr;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Ring transport over TCP.
///
/// Each peer holds exactly two streams: an outbound connection to its ring
/// successor (used by `send`) and an inbound connection accepted from its
/// predecessor (used by `recv`). Frames are `[len: u64 LE][rkyv RingMessage]`.
pub struct TcpChannel {
    position: RingPosition,
    /// `None` for a single-peer ring, which never touches the network.
    outbound: Option<Mutex<OwnedWriteHalf>>,
    inbound: Option<Mutex<OwnedReadHalf>>,
    max_frame_bytes: usize,
}

impl TcpChannel {
    /// Bind one loopback listener per rank and connect them into a ring.
    ///
    /// Convenience for tests and single-host runs: every peer lives in this
    /// process and joins concurrently.
    pub async fn bootstrap_local(world_size: u32, config: &RingConfig) -> Result<Vec<TcpChannel>> {
        if world_size < 1 {
            return Err(RingError::InvalidWorldSize {
                world_size: i64::from(world_size),
            });
        }
        if world_size == 1 {
            let position = RingPosition::new(0, 1)?;
            return Ok(vec![TcpChannel {
                position,
                outbound: None,
                inbound: None,
                max_frame_bytes: config.max_frame_bytes,
            }]);
        }

        let bind_addr: SocketAddr = SocketAddr::from(([127, 0, 0, 1], 0));
        let mut listeners = Vec::with_capacity(world_size as usize);
        let mut addrs = Vec::with_capacity(world_size as usize);
        for _ in 0..world_size {
            let listener = TcpListener::bind(bind_addr)
                .await
                .map_err(|e| RingError::transport_with_source("tcp listen", e))?;
            let addr = listener
                .local_addr()
                .map_err(|e| RingError::transport_with_source("tcp local_addr", e))?;
            listeners.push(listener);
            addrs.push(addr);
        }

        let joins = listeners.into_iter().enumerate().map(|(rank, listener)| {
            let next_addr = addrs[(rank + 1) % addrs.len()];
            Self::join_ring(
                rank as Rank,
                world_size,
                listener,
                next_addr,
                config.max_frame_bytes,
            )
        });
        futures::future::try_join_all(joins).await
    }

    /// Join a ring as `rank`: connect to the successor listening on
    /// `next_addr` and accept the predecessor on `listener`.
    ///
    /// Both directions open with a `Hello`. The accepted peer must announce
    /// the predecessor's rank, this ring's size and our protocol version.
    pub async fn join_ring(
        rank: Rank,
        world_size: u32,
        listener: TcpListener,
        next_addr: SocketAddr,
        max_frame_bytes: usize,
    ) -> Result<TcpChannel> {
        let position = RingPosition::new(rank, world_size)?;
        if world_size == 1 {
            return Ok(TcpChannel {
                position,
                outbound: None,
                inbound: None,
                max_frame_bytes,
            });
        }

        let (outbound, inbound) = tokio::try_join!(
            connect_successor(position, next_addr),
            accept_predecessor(position, &listener, max_frame_bytes),
        )?;
        tracing::debug!(
            rank,
            next = position.next(),
            prev = position.prev(),
            "tcp ring edges established"
        );

        Ok(TcpChannel {
            position,
            outbound: Some(Mutex::new(outbound)),
            inbound: Some(Mutex::new(inbound)),
            max_frame_bytes,
        })
    }
}

async fn connect_successor(
    position: RingPosition,
    next_addr: SocketAddr,
) -> Result<OwnedWriteHalf> {
    let stream = TcpStream::connect(next_addr)
        .await
        .map_err(|e| RingError::transport_with_source(format!("tcp connect {next_addr}"), e))?;
    stream
        .set_nodelay(true)
        .map_err(|e| RingError::transport_with_source("tcp set_nodelay", e))?;

    // The successor never writes to us on this stream.
    let (_read, mut write) = stream.into_split();
    let hello = RingMessage::Hello {
        protocol_version: PROTOCOL_VERSION,
        rank: position.rank(),
        world_size: position.world_size(),
    };
    write_message(&mut write, &hello).await?;
    Ok(write)
}

async fn accept_predecessor(
    position: RingPosition,
    listener: &TcpListener,
    max_frame_bytes: usize,
) -> Result<OwnedReadHalf> {
    let (stream, addr) = listener
        .accept()
        .await
        .map_err(|e| RingError::transport_with_source("tcp accept", e))?;
    stream
        .set_nodelay(true)
        .map_err(|e| RingError::transport_with_source("tcp set_nodelay", e))?;

    let (mut read, _write) = stream.into_split();
    let hello = read_message(&mut read, max_frame_bytes)
        .await?
        .ok_or_else(|| RingError::HandshakeFailed(format!("{addr} closed before hello")))?;
    validate_hello(position, &hello)?;
    Ok(read)
}

fn validate_hello(position: RingPosition, hello: &RingMessage) -> Result<()> {
    match *hello {
        RingMessage::Hello {
            protocol_version,
            rank,
            world_size,
        } => {
            if protocol_version != PROTOCOL_VERSION {
                return Err(RingError::ProtocolMismatch {
                    local: PROTOCOL_VERSION,
                    remote: protocol_version,
                });
            }
            if world_size != position.world_size() {
                return Err(RingError::HandshakeFailed(format!(
                    "peer reports world size {world_size}, expected {}",
                    position.world_size()
                )));
            }
            if rank != position.prev() {
                return Err(RingError::HandshakeFailed(format!(
                    "rank {rank} connected, expected predecessor {}",
                    position.prev()
                )));
            }
            Ok(())
        }
        RingMessage::Data { .. } => Err(RingError::HandshakeFailed(
            "data frame received before hello".into(),
        )),
    }
}

impl RingChannel for TcpChannel {
    fn rank(&self) -> Rank {
        self.position.rank()
    }

    fn world_size(&self) -> u32 {
        self.position.world_size()
    }

    fn send<'a>(&'a self, values: &'a [Value], dest: Rank, tag: Tag) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let outbound = match &self.outbound {
                Some(w) if dest == self.position.next() => w,
                _ => return Err(RingError::UnknownPeer { rank: dest }),
            };
            let msg = RingMessage::Data {
                tag,
                src_rank: self.position.rank(),
                values: values.to_vec(),
            };
            let mut writer = outbound.lock().await;
            write_message(&mut *writer, &msg).await
        })
    }

    fn recv<'a>(
        &'a self,
        into: &'a mut [Value],
        src: Rank,
        tag: Tag,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let inbound = match &self.inbound {
                Some(r) if src == self.position.prev() => r,
                _ => return Err(RingError::UnknownPeer { rank: src }),
            };
            let msg = {
                let mut reader = inbound.lock().await;
                read_message(&mut *reader, self.max_frame_bytes).await?
            };
            match msg {
                None => Err(RingError::PeerDisconnected { rank: src }),
                Some(RingMessage::Data {
                    tag: got,
                    src_rank,
                    values,
                }) => {
                    if src_rank != src {
                        tracing::warn!(
                            rank = self.position.rank(),
                            src,
                            src_rank,
                            "tcp ring: frame claims a different sender"
                        );
                        return Err(RingError::DecodeFailed(format!(
                            "frame from rank {src_rank} on the edge from rank {src}"
                        )));
                    }
                    deliver(into, tag, got, &values)
                }
                Some(RingMessage::Hello { .. }) => Err(RingError::DecodeFailed(
                    "unexpected hello after handshake".into(),
                )),
            }
        })
    }
}
