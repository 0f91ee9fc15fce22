//! Error types for the autonat protocols.

use std::time::Duration;

use libp2p::Multiaddr;

use crate::{
    Nonce,
    codec::{AutoNatCodecError, DialBackStatus},
    traits::RegistrarError,
};

/// Failure of a dial-request or dial-back exchange.
///
/// Any of these aborts the stream it occurred on. Per-address failures that
/// should not abort the exchange are reported through `DialResponse` instead.
#[derive(Debug, thiserror::Error)]
pub enum AutoNatError {
    #[error("codec error: {0}")]
    Codec(#[from] AutoNatCodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The exchange did not finish within the configured deadline.
    #[error("exchange timed out after {0:?}")]
    Timeout(Duration),

    /// The remote closed the stream while we were waiting for a message.
    #[error("stream closed while waiting for {0}")]
    StreamClosed(&'static str),

    #[error("expected {expected}, received {received}")]
    UnexpectedMessage {
        expected: &'static str,
        received: &'static str,
    },

    /// The connection's remote address has no IP to compare candidates against.
    #[error("no IP address in connection address {0}")]
    MissingObservedIp(Multiaddr),

    #[error("dial request contains no addresses")]
    NoAddresses,

    #[error("no IP address in requested address {0}")]
    MissingCandidateIp(Multiaddr),

    #[error("requested address {0} is not publicly routable")]
    NonPublicCandidate(Multiaddr),

    #[error("dial data not complete after {0} chunks")]
    TooManyDialDataChunks(usize),

    #[error("dial-back response status was not OK: {0:?}")]
    DialBackRejected(DialBackStatus),

    /// A dial-back carried a nonce that no pending request issued.
    #[error("dial-back nonce {0} does not match a pending request")]
    UnexpectedNonce(Nonce),

    #[error("address index {index} out of range for {len} addresses")]
    AddrIdxOutOfRange { index: u32, len: usize },

    #[error("duplicate response for address index {0}")]
    DuplicateResponse(u32),

    #[error("dial data request for {requested} bytes exceeds limit of {limit}")]
    DialDataRequestTooLarge { requested: u64, limit: u64 },

    #[error("registrar error: {0}")]
    Registrar(#[from] RegistrarError),
}

impl AutoNatError {
    /// Whether the remote broke the protocol (malformed, unexpected or abusive input).
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Codec(AutoNatCodecError::Io(_)) => false,
            Self::Codec(_) => true,
            Self::StreamClosed(_)
            | Self::UnexpectedMessage { .. }
            | Self::MissingObservedIp(_)
            | Self::NoAddresses
            | Self::MissingCandidateIp(_)
            | Self::NonPublicCandidate(_)
            | Self::TooManyDialDataChunks(_)
            | Self::DialBackRejected(_)
            | Self::UnexpectedNonce(_)
            | Self::AddrIdxOutOfRange { .. }
            | Self::DuplicateResponse(_)
            | Self::DialDataRequestTooLarge { .. } => true,
            Self::Io(_) | Self::Timeout(_) | Self::Registrar(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
