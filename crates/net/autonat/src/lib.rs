//! AutoNAT v2 reachability verification.
//!
//! A peer that wants to know whether one of its addresses is publicly
//! reachable asks another peer to dial it back on that address and report
//! whether the dial worked. This crate implements both roles of that exchange.
//!
//! # Protocols
//!
//! - Dial request: `/libp2p/autonat/2/dial-request`
//! - Dial back: `/libp2p/autonat/2/dial-back`
//!
//! # Flow
//!
//! 1. **Requester** opens a dial-request stream and sends `DialRequest` with
//!    its candidate addresses and a fresh nonce.
//! 2. **Verifier** evaluates each candidate in order. When the candidate IP
//!    differs from the IP the request arrived from, it first sends a
//!    `DialDataRequest` and waits until the requester has pushed back the
//!    demanded number of bytes (amplification defence).
//! 3. **Verifier** opens a fresh connection to the candidate, opens a dial-back
//!    stream and sends `DialBack` with the nonce; the requester checks the nonce
//!    and answers `DialBackResponse`.
//! 4. **Verifier** writes one `DialResponse` per candidate and closes the stream.
//!
//! The verifier is [`Server`], the requester is [`Client`], and
//! [`AutoNatService`] registers both with a [`Registrar`].

mod amplification;
mod args;
mod client;
mod codec;
mod config;
mod error;
mod metrics;
mod server;
mod service;
mod traits;

#[allow(unreachable_pub)]
mod generated;

pub use args::AutoNatArgs;
pub use client::{AddressOutcome, Client, VerificationReport};
pub use codec::{
    AutoNatCodecDomainError, AutoNatCodecError, DialBack, DialBackCodec, DialBackResponse,
    DialBackResponseCodec, DialBackStatus, DialDataRequest, DialDataResponse, DialRequest,
    DialResponse, DialStatus, Message, MessageCodec, ResponseStatus,
};
pub use config::{AutoNatConfig, Config, ConfigError};
pub use error::AutoNatError;
pub use server::{CandidateOutcome, Server};
pub use service::AutoNatService;
pub use traits::{
    Connection, ConnectionManager, IncomingStream, IncomingStreams, OpenOptions, ProtocolStream,
    Registrar, RegistrarError, StreamLimits,
};

use libp2p::StreamProtocol;

/// Protocol on which requesters send dial requests.
pub const DIAL_REQUEST_PROTOCOL: StreamProtocol =
    StreamProtocol::new("/libp2p/autonat/2/dial-request");

/// Protocol on which verifiers dial requesters back.
pub const DIAL_BACK_PROTOCOL: StreamProtocol = StreamProtocol::new("/libp2p/autonat/2/dial-back");

/// Correlates a dial-back with the dial request that caused it.
pub type Nonce = u64;
