//! Capabilities the autonat protocols consume from the surrounding node.
//!
//! Connection establishment, stream multiplexing and protocol registration are
//! owned by the host. The protocols only need to open connections and streams,
//! ask whether an address may be dialed, and receive inbound streams for the
//! protocols they registered.

use std::io;

use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite, stream::BoxStream};
use libp2p::{Multiaddr, StreamProtocol};

use crate::AutoNatError;

/// A negotiated, bidirectional protocol stream.
///
/// Dropping a stream without closing it aborts it.
pub trait ProtocolStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> ProtocolStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Options for [`ConnectionManager::open_connection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Dial a new connection even if one to the address already exists.
    pub force: bool,
}

impl OpenOptions {
    /// Options that bypass the connection pool.
    pub const fn forced() -> Self {
        Self { force: true }
    }
}

/// Concurrent stream limits requested when registering a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    pub max_inbound_streams: usize,
    pub max_outbound_streams: usize,
}

/// An open connection to a remote peer.
#[async_trait]
pub trait Connection: Send + 'static {
    type Stream: ProtocolStream;

    /// The address the connection is established on.
    fn remote_addr(&self) -> &Multiaddr;

    /// Open a stream negotiated for `protocol`.
    async fn new_stream(&mut self, protocol: StreamProtocol) -> io::Result<Self::Stream>;

    /// Close the connection gracefully.
    async fn close(self) -> io::Result<()>;

    /// Tear the connection down immediately.
    fn abort(self, reason: &AutoNatError);
}

/// Outbound dialing and dial policy.
#[async_trait]
pub trait ConnectionManager: Send + Sync + 'static {
    type Connection: Connection;

    /// Whether local policy (deny lists, transports, connection limits) allows dialing `addr`.
    async fn is_dialable(&self, addr: &Multiaddr) -> bool;

    /// Open a connection to `addr`.
    async fn open_connection(
        &self,
        addr: &Multiaddr,
        options: OpenOptions,
    ) -> io::Result<Self::Connection>;
}

/// An inbound stream together with the address of the connection it arrived on.
#[derive(Debug)]
pub struct IncomingStream<S> {
    pub stream: S,
    pub remote_addr: Multiaddr,
}

/// Inbound streams delivered for a registered protocol.
pub type IncomingStreams<S> = BoxStream<'static, IncomingStream<S>>;

/// Error from protocol registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("protocol {0} already has a handler")]
    AlreadyRegistered(StreamProtocol),
    #[error("{0}")]
    Other(String),
}

/// Protocol registration on the host's stream multiplexer.
pub trait Registrar: Send + Sync + 'static {
    type Stream: ProtocolStream;

    /// Start accepting inbound streams for `protocol`.
    fn handle(
        &self,
        protocol: StreamProtocol,
        limits: StreamLimits,
    ) -> Result<IncomingStreams<Self::Stream>, RegistrarError>;

    /// Stop accepting inbound streams for `protocol`.
    fn unhandle(&self, protocol: &StreamProtocol);
}
