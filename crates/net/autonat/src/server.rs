//! Verifier side of the dial-request protocol.

use std::{net::IpAddr, sync::Arc};

use asynchronous_codec::{Framed, FramedRead, FramedWrite};
use futures::{AsyncWriteExt, SinkExt, StreamExt};
use libp2p::Multiaddr;
use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, warn};
use vertex_net_local::{extract_ip, is_public_ip};

use crate::{
    AutoNatError, Nonce,
    amplification::{dial_data_len, require_dial_data},
    codec::{
        DialBack, DialBackCodec, DialBackResponseCodec, DialResponse, DialStatus, Message,
        MessageCodec,
    },
    config::Config,
    metrics::ServerMetrics,
    traits::{Connection, ConnectionManager, IncomingStream, OpenOptions, ProtocolStream},
};

/// What happened to one candidate address of a dial request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// A `DialResponse` was written for the candidate.
    Responded(DialResponse),
    /// The candidate bytes were not a multiaddr; nothing was written for it.
    Skipped { index: u32, reason: String },
}

impl CandidateOutcome {
    pub fn response(&self) -> Option<&DialResponse> {
        match self {
            Self::Responded(response) => Some(response),
            Self::Skipped { .. } => None,
        }
    }
}

/// Answers dial requests by dialing candidates back.
///
/// One `Server` serves every inbound dial-request stream; exchanges share
/// nothing but the configuration, the connection manager and the RNG used to
/// size amplification challenges.
pub struct Server<M> {
    connections: Arc<M>,
    config: Arc<Config>,
    rng: Mutex<StdRng>,
    metrics: ServerMetrics,
}

impl<M: ConnectionManager> Server<M> {
    pub fn new(connections: Arc<M>, config: Arc<Config>) -> Self {
        Self {
            connections,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
            metrics: ServerMetrics::default(),
        }
    }

    /// Replace the RNG that sizes amplification challenges.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serve an inbound stream, logging the result.
    pub async fn handle_incoming<S: ProtocolStream>(&self, incoming: IncomingStream<S>) {
        let IncomingStream {
            stream,
            remote_addr,
        } = incoming;

        match self.handle_dial_request(stream, &remote_addr).await {
            Ok(outcomes) => {
                debug!(%remote_addr, candidates = outcomes.len(), "Dial request completed");
            }
            Err(e) => {
                warn!(%remote_addr, error = %e, "Dial request aborted");
            }
        }
    }

    /// Run a dial-request exchange on `stream`, which arrived on a connection
    /// from `remote_addr`.
    ///
    /// The whole exchange, dial-backs included, runs under the configured
    /// timeout. On error the stream is dropped without closing it.
    pub async fn handle_dial_request<S: ProtocolStream>(
        &self,
        stream: S,
        remote_addr: &Multiaddr,
    ) -> Result<Vec<CandidateOutcome>, AutoNatError> {
        self.metrics.inc_requests();

        let result = match tokio::time::timeout(
            self.config.timeout,
            self.process_request(stream, remote_addr),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AutoNatError::Timeout(self.config.timeout)),
        };

        if result.is_err() {
            self.metrics.inc_aborted();
        }
        result
    }

    async fn process_request<S: ProtocolStream>(
        &self,
        stream: S,
        remote_addr: &Multiaddr,
    ) -> Result<Vec<CandidateOutcome>, AutoNatError> {
        let observed_ip = extract_ip(remote_addr)
            .ok_or_else(|| AutoNatError::MissingObservedIp(remote_addr.clone()))?
            .to_canonical();

        let mut framed = Framed::new(stream, MessageCodec::new(self.config.max_message_size));

        let request = match framed.next().await {
            Some(Ok(Message::DialRequest(request))) => request,
            Some(Ok(other)) => {
                return Err(AutoNatError::UnexpectedMessage {
                    expected: "DialRequest",
                    received: other.kind(),
                });
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Err(AutoNatError::StreamClosed("DialRequest")),
        };

        if request.addrs.is_empty() {
            return Err(AutoNatError::NoAddresses);
        }

        debug!(
            %remote_addr,
            candidates = request.addrs.len(),
            nonce = request.nonce,
            "Received dial request"
        );

        let mut outcomes = Vec::with_capacity(request.addrs.len());
        for (index, bytes) in request.addrs.into_iter().enumerate() {
            let index = index as u32;
            let addr = match Multiaddr::try_from(bytes) {
                Ok(addr) => addr,
                Err(e) => {
                    debug!(%remote_addr, index, error = %e, "Skipping malformed candidate");
                    outcomes.push(CandidateOutcome::Skipped {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let response = self
                .evaluate_candidate(&mut framed, index, &addr, observed_ip, request.nonce)
                .await?;
            framed.send(Message::DialResponse(response)).await?;
            outcomes.push(CandidateOutcome::Responded(response));
        }

        framed.close().await?;
        Ok(outcomes)
    }

    async fn evaluate_candidate<S: ProtocolStream>(
        &self,
        framed: &mut Framed<S, MessageCodec>,
        index: u32,
        addr: &Multiaddr,
        observed_ip: IpAddr,
        nonce: Nonce,
    ) -> Result<DialResponse, AutoNatError> {
        if !self.connections.is_dialable(addr).await {
            debug!(%addr, index, "Candidate refused by dial policy");
            self.metrics.inc_refused();
            return Ok(DialResponse::refused(index));
        }

        let ip = extract_ip(addr)
            .ok_or_else(|| AutoNatError::MissingCandidateIp(addr.clone()))?
            .to_canonical();
        if !is_public_ip(ip) {
            return Err(AutoNatError::NonPublicCandidate(addr.clone()));
        }

        if ip != observed_ip {
            let num_bytes = dial_data_len(&mut *self.rng.lock(), &self.config.dial_data_range);
            debug!(%addr, index, %observed_ip, num_bytes, "Requesting dial data");
            let received =
                require_dial_data(framed, index, num_bytes, self.config.max_dial_data_chunks)
                    .await?;
            self.metrics.record_challenge(received);
        }

        let dial_status = self.dial_back(addr, nonce).await;
        self.metrics.record_dial_back(dial_status);
        debug!(%addr, index, status = dial_status.as_str(), "Dial-back finished");

        Ok(DialResponse::dialed(index, dial_status))
    }

    /// Dial `addr` on a fresh connection and prove the nonce to the requester.
    async fn dial_back(&self, addr: &Multiaddr, nonce: Nonce) -> DialStatus {
        let mut connection = match self
            .connections
            .open_connection(addr, OpenOptions::forced())
            .await
        {
            Ok(connection) => connection,
            Err(e) => {
                debug!(%addr, error = %e, "Dial-back connection failed");
                return DialStatus::DialError;
            }
        };

        match self.exchange_dial_back(&mut connection, nonce).await {
            Ok(()) => match connection.close().await {
                Ok(()) => DialStatus::Ok,
                Err(e) => {
                    warn!(%addr, error = %e, "Closing dial-back connection failed");
                    DialStatus::DialBackError
                }
            },
            Err(e) => {
                warn!(%addr, error = %e, "Dial-back failed");
                connection.abort(&e);
                DialStatus::DialBackError
            }
        }
    }

    async fn exchange_dial_back(
        &self,
        connection: &mut M::Connection,
        nonce: Nonce,
    ) -> Result<(), AutoNatError> {
        let max_message_size = self.config.max_message_size;
        let stream = connection
            .new_stream(self.config.dial_back_protocol.clone())
            .await?;

        let mut writer = FramedWrite::new(stream, DialBackCodec::new(max_message_size));
        writer.send(DialBack { nonce }).await?;

        let mut reader = FramedRead::new(
            writer.into_inner(),
            DialBackResponseCodec::new(max_message_size),
        );
        match reader.next().await {
            Some(Ok(response)) if response.is_ok() => {}
            Some(Ok(response)) => return Err(AutoNatError::DialBackRejected(response.status)),
            Some(Err(e)) => return Err(e.into()),
            None => return Err(AutoNatError::StreamClosed("DialBackResponse")),
        }

        reader.into_inner().close().await?;
        Ok(())
    }
}
