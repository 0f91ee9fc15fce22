#![allow(dead_code, unreachable_pub)]

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::Arc,
};

use async_trait::async_trait;
use asynchronous_codec::{FramedRead, FramedWrite};
use futures::{AsyncWriteExt, SinkExt, StreamExt, channel::mpsc};
use libp2p::{Multiaddr, StreamProtocol};
use parking_lot::Mutex;
use tokio::{io::DuplexStream, task::JoinHandle};
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use vertex_net_autonat::{
    AutoNatError, CandidateOutcome, Client, Connection, ConnectionManager, DialBackCodec,
    DialBackResponse, DialBackResponseCodec, DialBackStatus, IncomingStream, IncomingStreams, Nonce,
    OpenOptions, Registrar, RegistrarError, Server, StreamLimits,
};

pub type TestStream = Compat<DuplexStream>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn stream_pair() -> (TestStream, TestStream) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    (a.compat(), b.compat())
}

pub fn addr(s: &str) -> Multiaddr {
    s.parse().unwrap()
}

/// Where the verifier's dial-back streams end up.
#[derive(Clone)]
pub enum DialBackTarget {
    /// Handled directly by a requester's client.
    Client(Arc<Client>),
    /// Delivered to a requester's registrar.
    Registrar(Arc<MockRegistrar>),
    /// Answered OK whatever the nonce; received nonces are recorded.
    Acknowledge(Arc<Mutex<Vec<Nonce>>>),
    /// Answered with the given status whatever the nonce.
    Answer(DialBackStatus),
    /// Accepted and dropped without answering.
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Closed(Multiaddr),
    Aborted(Multiaddr),
}

/// Verifier-side connection manager with scripted dial policy.
pub struct MockNetwork {
    target: Mutex<DialBackTarget>,
    refused: Mutex<HashSet<Multiaddr>>,
    unreachable: Mutex<HashSet<Multiaddr>>,
    opened: Mutex<Vec<(Multiaddr, OpenOptions)>>,
    events: Arc<Mutex<Vec<ConnectionEvent>>>,
}

impl MockNetwork {
    pub fn new(target: DialBackTarget) -> Arc<Self> {
        Arc::new(Self {
            target: Mutex::new(target),
            refused: Mutex::default(),
            unreachable: Mutex::default(),
            opened: Mutex::default(),
            events: Arc::default(),
        })
    }

    pub fn set_target(&self, target: DialBackTarget) {
        *self.target.lock() = target;
    }

    /// `is_dialable` answers false for `addr`.
    pub fn refuse(&self, addr: &Multiaddr) {
        self.refused.lock().insert(addr.clone());
    }

    /// `open_connection` fails for `addr`.
    pub fn make_unreachable(&self, addr: &Multiaddr) {
        self.unreachable.lock().insert(addr.clone());
    }

    pub fn opened(&self) -> Vec<(Multiaddr, OpenOptions)> {
        self.opened.lock().clone()
    }

    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl ConnectionManager for MockNetwork {
    type Connection = DialBackConnection;

    async fn is_dialable(&self, addr: &Multiaddr) -> bool {
        !self.refused.lock().contains(addr)
    }

    async fn open_connection(
        &self,
        addr: &Multiaddr,
        options: OpenOptions,
    ) -> io::Result<Self::Connection> {
        self.opened.lock().push((addr.clone(), options));
        if self.unreachable.lock().contains(addr) {
            return Err(io::ErrorKind::ConnectionRefused.into());
        }
        Ok(DialBackConnection {
            addr: addr.clone(),
            target: self.target.lock().clone(),
            events: self.events.clone(),
        })
    }
}

/// Connection the verifier opened towards a candidate address.
pub struct DialBackConnection {
    addr: Multiaddr,
    target: DialBackTarget,
    events: Arc<Mutex<Vec<ConnectionEvent>>>,
}

#[async_trait]
impl Connection for DialBackConnection {
    type Stream = TestStream;

    fn remote_addr(&self) -> &Multiaddr {
        &self.addr
    }

    async fn new_stream(&mut self, protocol: StreamProtocol) -> io::Result<Self::Stream> {
        let (local, remote) = stream_pair();
        match &self.target {
            DialBackTarget::Client(client) => {
                let client = client.clone();
                tokio::spawn(async move {
                    let _ = client.handle_dial_back(remote).await;
                });
            }
            DialBackTarget::Registrar(registrar) => {
                // The requester sees the dial-back arrive from the verifier.
                let incoming = IncomingStream {
                    stream: remote,
                    remote_addr: addr("/ip4/9.9.9.9/tcp/4001"),
                };
                if !registrar.deliver(&protocol, incoming) {
                    return Err(io::ErrorKind::Unsupported.into());
                }
            }
            DialBackTarget::Acknowledge(nonces) => {
                tokio::spawn(acknowledge(remote, DialBackStatus::Ok, nonces.clone()));
            }
            DialBackTarget::Answer(status) => {
                tokio::spawn(acknowledge(remote, *status, Arc::default()));
            }
            DialBackTarget::Silent => drop(remote),
        }
        Ok(local)
    }

    async fn close(self) -> io::Result<()> {
        self.events.lock().push(ConnectionEvent::Closed(self.addr));
        Ok(())
    }

    fn abort(self, _reason: &AutoNatError) {
        self.events.lock().push(ConnectionEvent::Aborted(self.addr));
    }
}

async fn acknowledge(stream: TestStream, status: DialBackStatus, nonces: Arc<Mutex<Vec<Nonce>>>) {
    let mut reader = FramedRead::new(stream, DialBackCodec::new(1024));
    let Some(Ok(dial_back)) = reader.next().await else {
        return;
    };
    nonces.lock().push(dial_back.nonce);

    let mut writer = FramedWrite::new(reader.into_inner(), DialBackResponseCodec::new(1024));
    let _ = writer.send(DialBackResponse { status }).await;
    let _ = writer.into_inner().close().await;
}

/// Requester-side connection to a verifier. Each dial-request stream it opens
/// is served by `server` as if it arrived from `observed_addr`.
pub struct VerifierConnection {
    remote_addr: Multiaddr,
    observed_addr: Multiaddr,
    server: Arc<Server<MockNetwork>>,
    exchanges: Vec<JoinHandle<Result<Vec<CandidateOutcome>, AutoNatError>>>,
}

impl VerifierConnection {
    pub fn new(observed_addr: Multiaddr, server: Arc<Server<MockNetwork>>) -> Self {
        Self {
            remote_addr: addr("/ip4/9.9.9.9/tcp/4001"),
            observed_addr,
            server,
            exchanges: Vec::new(),
        }
    }

    /// Result of the verifier's most recent exchange.
    pub async fn server_result(&mut self) -> Result<Vec<CandidateOutcome>, AutoNatError> {
        let exchange = self.exchanges.pop().unwrap();
        exchange.await.unwrap()
    }
}

#[async_trait]
impl Connection for VerifierConnection {
    type Stream = TestStream;

    fn remote_addr(&self) -> &Multiaddr {
        &self.remote_addr
    }

    async fn new_stream(&mut self, _protocol: StreamProtocol) -> io::Result<Self::Stream> {
        let (local, remote) = stream_pair();
        let server = self.server.clone();
        let observed_addr = self.observed_addr.clone();
        self.exchanges.push(tokio::spawn(async move {
            server.handle_dial_request(remote, &observed_addr).await
        }));
        Ok(local)
    }

    async fn close(self) -> io::Result<()> {
        Ok(())
    }

    fn abort(self, _reason: &AutoNatError) {}
}

/// Registrar backed by channels; streams are injected with [`MockRegistrar::deliver`].
#[derive(Default)]
pub struct MockRegistrar {
    handlers: Mutex<HashMap<StreamProtocol, mpsc::UnboundedSender<IncomingStream<TestStream>>>>,
    limits: Mutex<Vec<(StreamProtocol, StreamLimits)>>,
    fail: Mutex<Option<StreamProtocol>>,
}

impl MockRegistrar {
    /// Make `handle` fail for `protocol`.
    pub fn fail_on(&self, protocol: StreamProtocol) {
        *self.fail.lock() = Some(protocol);
    }

    pub fn is_handled(&self, protocol: &StreamProtocol) -> bool {
        self.handlers.lock().contains_key(protocol)
    }

    pub fn limits(&self) -> Vec<(StreamProtocol, StreamLimits)> {
        self.limits.lock().clone()
    }

    /// Hand an inbound stream to the handler of `protocol`.
    pub fn deliver(&self, protocol: &StreamProtocol, incoming: IncomingStream<TestStream>) -> bool {
        match self.handlers.lock().get(protocol) {
            Some(sender) => sender.unbounded_send(incoming).is_ok(),
            None => false,
        }
    }
}

impl Registrar for MockRegistrar {
    type Stream = TestStream;

    fn handle(
        &self,
        protocol: StreamProtocol,
        limits: StreamLimits,
    ) -> Result<IncomingStreams<Self::Stream>, RegistrarError> {
        if self.fail.lock().as_ref() == Some(&protocol) {
            return Err(RegistrarError::Other(format!("cannot handle {protocol}")));
        }

        let mut handlers = self.handlers.lock();
        if handlers.contains_key(&protocol) {
            return Err(RegistrarError::AlreadyRegistered(protocol));
        }
        let (sender, receiver) = mpsc::unbounded();
        handlers.insert(protocol.clone(), sender);
        self.limits.lock().push((protocol, limits));
        Ok(receiver.boxed())
    }

    fn unhandle(&self, protocol: &StreamProtocol) {
        self.handlers.lock().remove(protocol);
    }
}
