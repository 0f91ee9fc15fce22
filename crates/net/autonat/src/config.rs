//! Configuration for the autonat protocols.

use std::{ops::RangeInclusive, time::Duration};

use libp2p::StreamProtocol;
use quick_protobuf::sizeofs::sizeof_len;
use serde::{Deserialize, Serialize};

use crate::{DIAL_BACK_PROTOCOL, DIAL_REQUEST_PROTOCOL, traits::StreamLimits};

/// Default deadline for a whole dial-request or dial-back exchange.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default concurrent inbound streams per protocol and connection.
pub(crate) const DEFAULT_MAX_INBOUND_STREAMS: usize = 2;

/// Default concurrent outbound streams per protocol and connection.
pub(crate) const DEFAULT_MAX_OUTBOUND_STREAMS: usize = 1;

/// Default maximum length of a single protocol message.
pub(crate) const DEFAULT_MAX_MESSAGE_SIZE: usize = 8192;

/// Bounds of the amount of dial data a verifier demands.
pub(crate) const DIAL_DATA_LEN_LOWER_BOUND: u64 = 30_000;
pub(crate) const DIAL_DATA_LEN_UPPER_BOUND: u64 = 100_000;

/// Default ceiling on DialDataResponse messages accepted per challenge.
pub(crate) const DEFAULT_MAX_DIAL_DATA_CHUNKS: usize = 1_000;

/// Default payload size of each DialDataResponse a requester sends.
pub(crate) const DEFAULT_DIAL_DATA_CHUNK_SIZE: usize = 4096;

/// Runtime configuration shared by the verifier and requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Protocol the verifier accepts dial requests on.
    pub dial_request_protocol: StreamProtocol,
    /// Protocol the verifier dials back on.
    pub dial_back_protocol: StreamProtocol,
    /// Deadline for each exchange, covering every read and the dial-back.
    pub timeout: Duration,
    pub max_inbound_streams: usize,
    pub max_outbound_streams: usize,
    /// Longest accepted frame on either protocol.
    pub max_message_size: usize,
    /// Range the verifier draws the amplification challenge size from.
    pub dial_data_range: RangeInclusive<u64>,
    /// Most DialDataResponse messages the verifier reads for one challenge.
    pub max_dial_data_chunks: usize,
    /// Payload size of the DialDataResponse messages the requester sends.
    pub dial_data_chunk_size: usize,
    /// Largest challenge the requester agrees to pay.
    pub max_dial_data_request: u64,
}

impl Config {
    /// Limits passed to the registrar for both protocols.
    pub fn stream_limits(&self) -> StreamLimits {
        StreamLimits {
            max_inbound_streams: self.max_inbound_streams,
            max_outbound_streams: self.max_outbound_streams,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dial_request_protocol: DIAL_REQUEST_PROTOCOL,
            dial_back_protocol: DIAL_BACK_PROTOCOL,
            timeout: DEFAULT_TIMEOUT,
            max_inbound_streams: DEFAULT_MAX_INBOUND_STREAMS,
            max_outbound_streams: DEFAULT_MAX_OUTBOUND_STREAMS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            dial_data_range: DIAL_DATA_LEN_LOWER_BOUND..=DIAL_DATA_LEN_UPPER_BOUND,
            max_dial_data_chunks: DEFAULT_MAX_DIAL_DATA_CHUNKS,
            dial_data_chunk_size: DEFAULT_DIAL_DATA_CHUNK_SIZE,
            max_dial_data_request: DIAL_DATA_LEN_UPPER_BOUND,
        }
    }
}

/// Errors turning an [`AutoNatConfig`] into a [`Config`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid protocol id {0:?}: must start with '/'")]
    InvalidProtocol(String),
    #[error("dial request and dial back protocols must differ")]
    SameProtocols,
    #[error("dial data range {min}..={max} is empty")]
    EmptyDialDataRange { min: u64, max: u64 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("dial data chunk of {chunk} bytes encodes to {frame} bytes, above max_message_size {max}")]
    ChunkExceedsMessageSize { chunk: usize, frame: usize, max: usize },
}

/// Autonat configuration (TOML-serializable).
///
/// Converted to [`Config`] with [`AutoNatConfig::to_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoNatConfig {
    #[serde(default = "default_dial_request_protocol")]
    pub dial_request_protocol: String,

    #[serde(default = "default_dial_back_protocol")]
    pub dial_back_protocol: String,

    /// Exchange deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_inbound_streams")]
    pub max_inbound_streams: usize,

    #[serde(default = "default_max_outbound_streams")]
    pub max_outbound_streams: usize,

    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    #[serde(default = "default_dial_data_min")]
    pub dial_data_min: u64,

    #[serde(default = "default_dial_data_max")]
    pub dial_data_max: u64,

    #[serde(default = "default_max_dial_data_chunks")]
    pub max_dial_data_chunks: usize,

    #[serde(default = "default_dial_data_chunk_size")]
    pub dial_data_chunk_size: usize,

    #[serde(default = "default_dial_data_max")]
    pub max_dial_data_request: u64,
}

impl Default for AutoNatConfig {
    fn default() -> Self {
        Self {
            dial_request_protocol: default_dial_request_protocol(),
            dial_back_protocol: default_dial_back_protocol(),
            timeout_ms: default_timeout_ms(),
            max_inbound_streams: default_max_inbound_streams(),
            max_outbound_streams: default_max_outbound_streams(),
            max_message_size: default_max_message_size(),
            dial_data_min: default_dial_data_min(),
            dial_data_max: default_dial_data_max(),
            max_dial_data_chunks: default_max_dial_data_chunks(),
            dial_data_chunk_size: default_dial_data_chunk_size(),
            max_dial_data_request: default_dial_data_max(),
        }
    }
}

impl AutoNatConfig {
    /// Validate and convert into the runtime [`Config`].
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let dial_request_protocol = parse_protocol(&self.dial_request_protocol)?;
        let dial_back_protocol = parse_protocol(&self.dial_back_protocol)?;
        if dial_request_protocol == dial_back_protocol {
            return Err(ConfigError::SameProtocols);
        }
        if self.dial_data_min > self.dial_data_max {
            return Err(ConfigError::EmptyDialDataRange {
                min: self.dial_data_min,
                max: self.dial_data_max,
            });
        }

        for (name, value) in [
            ("timeout_ms", self.timeout_ms as usize),
            ("max_message_size", self.max_message_size),
            ("max_dial_data_chunks", self.max_dial_data_chunks),
            ("dial_data_chunk_size", self.dial_data_chunk_size),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        let frame = dial_data_frame_len(self.dial_data_chunk_size);
        if frame > self.max_message_size {
            return Err(ConfigError::ChunkExceedsMessageSize {
                chunk: self.dial_data_chunk_size,
                frame,
                max: self.max_message_size,
            });
        }

        Ok(Config {
            dial_request_protocol,
            dial_back_protocol,
            timeout: Duration::from_millis(self.timeout_ms),
            max_inbound_streams: self.max_inbound_streams,
            max_outbound_streams: self.max_outbound_streams,
            max_message_size: self.max_message_size,
            dial_data_range: self.dial_data_min..=self.dial_data_max,
            max_dial_data_chunks: self.max_dial_data_chunks,
            dial_data_chunk_size: self.dial_data_chunk_size,
            max_dial_data_request: self.max_dial_data_request,
        })
    }
}

/// Encoded length of a `Message` carrying a `DialDataResponse` of `chunk`
/// bytes, excluding the frame's length prefix.
pub(crate) fn dial_data_frame_len(chunk: usize) -> usize {
    // Envelope tag around the DialDataResponse, which has its own data tag.
    1 + sizeof_len(1 + sizeof_len(chunk))
}

fn parse_protocol(protocol: &str) -> Result<StreamProtocol, ConfigError> {
    StreamProtocol::try_from_owned(protocol.to_string())
        .map_err(|_| ConfigError::InvalidProtocol(protocol.to_string()))
}

fn default_dial_request_protocol() -> String {
    DIAL_REQUEST_PROTOCOL.to_string()
}

fn default_dial_back_protocol() -> String {
    DIAL_BACK_PROTOCOL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_max_inbound_streams() -> usize {
    DEFAULT_MAX_INBOUND_STREAMS
}

fn default_max_outbound_streams() -> usize {
    DEFAULT_MAX_OUTBOUND_STREAMS
}

fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

fn default_dial_data_min() -> u64 {
    DIAL_DATA_LEN_LOWER_BOUND
}

fn default_dial_data_max() -> u64 {
    DIAL_DATA_LEN_UPPER_BOUND
}

fn default_max_dial_data_chunks() -> usize {
    DEFAULT_MAX_DIAL_DATA_CHUNKS
}

fn default_dial_data_chunk_size() -> usize {
    DEFAULT_DIAL_DATA_CHUNK_SIZE
}
