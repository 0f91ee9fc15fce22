use clap::Args;

use crate::config::{
    AutoNatConfig, DEFAULT_DIAL_DATA_CHUNK_SIZE, DEFAULT_MAX_DIAL_DATA_CHUNKS,
    DEFAULT_MAX_INBOUND_STREAMS, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MAX_OUTBOUND_STREAMS,
    DEFAULT_TIMEOUT, DIAL_DATA_LEN_LOWER_BOUND, DIAL_DATA_LEN_UPPER_BOUND,
};

/// Parameters for configuring reachability verification
#[derive(Debug, Clone, Args, PartialEq, Eq)]
#[command(next_help_heading = "AutoNAT")]
pub struct AutoNatArgs {
    /// Deadline in milliseconds for a dial request or dial back exchange
    #[arg(long = "autonat.timeout", value_name = "MS", default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Concurrent inbound autonat streams per connection
    #[arg(long = "autonat.max-inbound-streams", default_value_t = DEFAULT_MAX_INBOUND_STREAMS)]
    pub max_inbound_streams: usize,

    /// Concurrent outbound autonat streams per connection
    #[arg(long = "autonat.max-outbound-streams", default_value_t = DEFAULT_MAX_OUTBOUND_STREAMS)]
    pub max_outbound_streams: usize,

    /// Largest accepted autonat message in bytes
    #[arg(long = "autonat.max-message-size", value_name = "BYTES", default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,

    /// Fewest bytes of dial data demanded from a requester on another IP
    #[arg(long = "autonat.dial-data-min", value_name = "BYTES", default_value_t = DIAL_DATA_LEN_LOWER_BOUND)]
    pub dial_data_min: u64,

    /// Most bytes of dial data demanded from a requester on another IP
    #[arg(long = "autonat.dial-data-max", value_name = "BYTES", default_value_t = DIAL_DATA_LEN_UPPER_BOUND)]
    pub dial_data_max: u64,

    /// Most dial data messages read for a single challenge
    #[arg(long = "autonat.max-dial-data-chunks", default_value_t = DEFAULT_MAX_DIAL_DATA_CHUNKS)]
    pub max_dial_data_chunks: usize,

    /// Payload size of each dial data message sent to a verifier
    #[arg(long = "autonat.dial-data-chunk-size", value_name = "BYTES", default_value_t = DEFAULT_DIAL_DATA_CHUNK_SIZE)]
    pub dial_data_chunk_size: usize,

    /// Largest dial data challenge this node agrees to pay
    #[arg(long = "autonat.max-dial-data-request", value_name = "BYTES", default_value_t = DIAL_DATA_LEN_UPPER_BOUND)]
    pub max_dial_data_request: u64,
}

impl Default for AutoNatArgs {
    fn default() -> Self {
        AutoNatConfig::default().into()
    }
}

impl From<AutoNatArgs> for AutoNatConfig {
    fn from(args: AutoNatArgs) -> Self {
        Self {
            timeout_ms: args.timeout_ms,
            max_inbound_streams: args.max_inbound_streams,
            max_outbound_streams: args.max_outbound_streams,
            max_message_size: args.max_message_size,
            dial_data_min: args.dial_data_min,
            dial_data_max: args.dial_data_max,
            max_dial_data_chunks: args.max_dial_data_chunks,
            dial_data_chunk_size: args.dial_data_chunk_size,
            max_dial_data_request: args.max_dial_data_request,
            ..Default::default()
        }
    }
}

impl From<AutoNatConfig> for AutoNatArgs {
    fn from(config: AutoNatConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            max_inbound_streams: config.max_inbound_streams,
            max_outbound_streams: config.max_outbound_streams,
            max_message_size: config.max_message_size,
            dial_data_min: config.dial_data_min,
            dial_data_max: config.dial_data_max,
            max_dial_data_chunks: config.max_dial_data_chunks,
            dial_data_chunk_size: config.dial_data_chunk_size,
            max_dial_data_request: config.max_dial_data_request,
        }
    }
}
