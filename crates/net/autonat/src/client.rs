//! Requester side: asking a verifier to dial us back.

use std::{collections::HashMap, sync::Arc};

use asynchronous_codec::{Framed, FramedRead, FramedWrite};
use futures::{AsyncWriteExt, SinkExt, StreamExt};
use libp2p::Multiaddr;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    AutoNatError, Nonce,
    amplification::send_dial_data,
    codec::{
        DialBackCodec, DialBackResponse, DialBackResponseCodec, DialDataRequest, DialRequest,
        DialResponse, DialStatus, Message, MessageCodec, ResponseStatus,
    },
    config::Config,
    metrics::ClientMetrics,
    traits::{Connection, IncomingStream, ProtocolStream},
};

/// The verifier's verdict on one requested address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressOutcome {
    pub addr: Multiaddr,
    /// `None` when the verifier wrote nothing for this address.
    pub response: Option<DialResponse>,
    /// Bytes of dial data paid before the verifier dialed this address.
    pub dial_data_sent: u64,
}

impl AddressOutcome {
    /// Whether the verifier dialed the address back successfully.
    pub fn is_reachable(&self) -> bool {
        self.response.is_some_and(|response| {
            response.status() == ResponseStatus::Ok && response.dial_status() == DialStatus::Ok
        })
    }
}

/// Result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub nonce: Nonce,
    /// One entry per requested address, in request order.
    pub outcomes: Vec<AddressOutcome>,
    /// Whether a dial-back carrying `nonce` reached us.
    pub dial_back_confirmed: bool,
}

impl VerificationReport {
    /// Addresses the verifier reached.
    pub fn reachable(&self) -> impl Iterator<Item = &Multiaddr> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_reachable())
            .map(|outcome| &outcome.addr)
    }
}

type PendingNonces = Arc<Mutex<HashMap<Nonce, bool>>>;

/// Removes a nonce from the pending set when the verification ends.
struct PendingGuard {
    pending: PendingNonces,
    nonce: Nonce,
}

impl PendingGuard {
    fn register(pending: &PendingNonces) -> Self {
        let mut map = pending.lock();
        let nonce = loop {
            let nonce: Nonce = rand::random();
            if !map.contains_key(&nonce) {
                break nonce;
            }
        };
        map.insert(nonce, false);
        drop(map);

        Self {
            pending: pending.clone(),
            nonce,
        }
    }

    fn confirmed(&self) -> bool {
        self.pending.lock().get(&self.nonce).copied().unwrap_or(false)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.nonce);
    }
}

/// Requests verification of our addresses and answers dial-backs.
pub struct Client {
    config: Arc<Config>,
    pending: PendingNonces,
    metrics: ClientMetrics,
}

impl Client {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            pending: Arc::default(),
            metrics: ClientMetrics::default(),
        }
    }

    /// Number of verifications waiting for their dial-back.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Ask the verifier on `connection` to dial back each of `addrs`.
    ///
    /// Dial-backs arrive on a separate inbound stream and must be routed to
    /// [`Client::handle_dial_back`] while this call is running.
    pub async fn verify<C: Connection>(
        &self,
        connection: &mut C,
        addrs: Vec<Multiaddr>,
    ) -> Result<VerificationReport, AutoNatError> {
        if addrs.is_empty() {
            return Err(AutoNatError::NoAddresses);
        }

        self.metrics.inc_verifications();
        let guard = PendingGuard::register(&self.pending);
        let nonce = guard.nonce;

        let result = match tokio::time::timeout(
            self.config.timeout,
            self.request_verification(connection, &addrs, nonce),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AutoNatError::Timeout(self.config.timeout)),
        };

        let (responses, dial_data_sent) = match result {
            Ok(collected) => collected,
            Err(e) => {
                self.metrics.inc_failed();
                warn!(remote_addr = %connection.remote_addr(), nonce, error = %e, "Verification failed");
                return Err(e);
            }
        };

        let outcomes = addrs
            .into_iter()
            .zip(responses)
            .zip(dial_data_sent)
            .map(|((addr, response), dial_data_sent)| AddressOutcome {
                addr,
                response,
                dial_data_sent,
            })
            .collect();

        Ok(VerificationReport {
            nonce,
            outcomes,
            dial_back_confirmed: guard.confirmed(),
        })
    }

    async fn request_verification<C: Connection>(
        &self,
        connection: &mut C,
        addrs: &[Multiaddr],
        nonce: Nonce,
    ) -> Result<(Vec<Option<DialResponse>>, Vec<u64>), AutoNatError> {
        let stream = connection
            .new_stream(self.config.dial_request_protocol.clone())
            .await?;
        let mut framed = Framed::new(stream, MessageCodec::new(self.config.max_message_size));

        framed
            .send(Message::DialRequest(DialRequest::new(addrs, nonce)))
            .await?;
        debug!(remote_addr = %connection.remote_addr(), candidates = addrs.len(), nonce, "Sent dial request");

        let mut responses: Vec<Option<DialResponse>> = vec![None; addrs.len()];
        let mut dial_data_sent = vec![0u64; addrs.len()];

        while let Some(message) = framed.next().await {
            match message? {
                Message::DialDataRequest(request) => {
                    let index = self.check_dial_data_request(request, addrs.len())?;
                    send_dial_data(
                        &mut framed,
                        request.num_bytes,
                        self.config.dial_data_chunk_size,
                    )
                    .await?;
                    self.metrics.add_dial_data_bytes(request.num_bytes);
                    if let Some(sent) = dial_data_sent.get_mut(index) {
                        *sent += request.num_bytes;
                    }
                    debug!(addr_idx = request.addr_idx, num_bytes = request.num_bytes, "Sent dial data");
                }
                Message::DialResponse(response) => {
                    let index = addr_index(response.addr_idx(), addrs.len())?;
                    let slot = responses
                        .get_mut(index)
                        .ok_or(AutoNatError::AddrIdxOutOfRange {
                            index: response.addr_idx(),
                            len: addrs.len(),
                        })?;
                    if slot.is_some() {
                        return Err(AutoNatError::DuplicateResponse(response.addr_idx()));
                    }
                    debug!(
                        addr_idx = response.addr_idx(),
                        status = ?response.status(),
                        dial_status = response.dial_status().as_str(),
                        "Received dial response"
                    );
                    *slot = Some(response);
                }
                other => {
                    return Err(AutoNatError::UnexpectedMessage {
                        expected: "DialResponse",
                        received: other.kind(),
                    });
                }
            }
        }

        if let Err(e) = framed.close().await {
            debug!(error = %e, "Closing dial request stream failed");
        }

        let missing = unanswered(&responses);
        if !missing.is_empty() {
            debug!(unanswered = ?missing, candidates = addrs.len(), "Verifier left addresses unanswered");
        }

        Ok((responses, dial_data_sent))
    }

    fn check_dial_data_request(
        &self,
        request: DialDataRequest,
        len: usize,
    ) -> Result<usize, AutoNatError> {
        let index = addr_index(request.addr_idx, len)?;
        if request.num_bytes > self.config.max_dial_data_request {
            return Err(AutoNatError::DialDataRequestTooLarge {
                requested: request.num_bytes,
                limit: self.config.max_dial_data_request,
            });
        }
        Ok(index)
    }

    /// Serve an inbound dial-back stream, logging the result.
    pub async fn handle_incoming<S: ProtocolStream>(&self, incoming: IncomingStream<S>) {
        let remote_addr = incoming.remote_addr;
        match self.handle_dial_back(incoming.stream).await {
            Ok(nonce) => debug!(%remote_addr, nonce, "Dial-back confirmed"),
            Err(e) => warn!(%remote_addr, error = %e, "Dial-back rejected"),
        }
    }

    /// Answer a verifier's dial-back.
    ///
    /// Only nonces issued by a running [`Client::verify`] are acknowledged;
    /// anything else is dropped without a response.
    pub async fn handle_dial_back<S: ProtocolStream>(
        &self,
        stream: S,
    ) -> Result<Nonce, AutoNatError> {
        let result = match tokio::time::timeout(self.config.timeout, self.answer_dial_back(stream))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AutoNatError::Timeout(self.config.timeout)),
        };

        match &result {
            Ok(_) => self.metrics.inc_dial_backs_confirmed(),
            Err(_) => self.metrics.inc_dial_backs_rejected(),
        }
        result
    }

    async fn answer_dial_back<S: ProtocolStream>(&self, stream: S) -> Result<Nonce, AutoNatError> {
        let max_message_size = self.config.max_message_size;
        let mut reader = FramedRead::new(stream, DialBackCodec::new(max_message_size));

        let nonce = match reader.next().await {
            Some(Ok(dial_back)) => dial_back.nonce,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(AutoNatError::StreamClosed("DialBack")),
        };

        match self.pending.lock().get_mut(&nonce) {
            Some(confirmed) => *confirmed = true,
            None => return Err(AutoNatError::UnexpectedNonce(nonce)),
        }

        let mut writer = FramedWrite::new(
            reader.into_inner(),
            DialBackResponseCodec::new(max_message_size),
        );
        writer.send(DialBackResponse::ok()).await?;
        writer.into_inner().close().await?;

        Ok(nonce)
    }
}

fn addr_index(addr_idx: u32, len: usize) -> Result<usize, AutoNatError> {
    let index = addr_idx as usize;
    if index < len {
        Ok(index)
    } else {
        Err(AutoNatError::AddrIdxOutOfRange {
            index: addr_idx,
            len,
        })
    }
}

/// Indices of the addresses the verifier sent no response for.
fn unanswered(responses: &[Option<DialResponse>]) -> Vec<usize> {
    responses
        .iter()
        .enumerate()
        .filter_map(|(index, response)| response.is_none().then_some(index))
        .collect()
}
