//! Amplification defence.
//!
//! A verifier asked to dial an IP other than the one the request came from
//! makes the requester pay first: it demands a random amount of filler data
//! and only dials once that many bytes have arrived.

use std::ops::RangeInclusive;

use asynchronous_codec::Framed;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rand::Rng;
use tracing::trace;

use crate::{
    AutoNatError,
    codec::{DialDataRequest, DialDataResponse, Message, MessageCodec},
    traits::ProtocolStream,
};

/// Draw the number of bytes to demand, uniformly from `range`.
pub(crate) fn dial_data_len<R: Rng + ?Sized>(rng: &mut R, range: &RangeInclusive<u64>) -> u64 {
    if range.is_empty() {
        return *range.start();
    }
    rng.random_range(range.clone())
}

/// Demand `num_bytes` for `addr_idx` and read dial data until that many have
/// arrived. Returns the number of bytes received, which may exceed the demand
/// by at most one chunk.
pub(crate) async fn require_dial_data<S: ProtocolStream>(
    framed: &mut Framed<S, MessageCodec>,
    addr_idx: u32,
    num_bytes: u64,
    max_chunks: usize,
) -> Result<u64, AutoNatError> {
    framed
        .send(Message::DialDataRequest(DialDataRequest {
            addr_idx,
            num_bytes,
        }))
        .await?;

    let mut received = 0u64;
    let mut chunks = 0usize;
    while received < num_bytes {
        if chunks == max_chunks {
            return Err(AutoNatError::TooManyDialDataChunks(chunks));
        }
        match framed.next().await {
            Some(Ok(Message::DialDataResponse(response))) => {
                chunks += 1;
                received += response.data.len() as u64;
                trace!(addr_idx, received, num_bytes, "Dial data chunk");
            }
            Some(Ok(other)) => {
                return Err(AutoNatError::UnexpectedMessage {
                    expected: "DialDataResponse",
                    received: other.kind(),
                });
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Err(AutoNatError::StreamClosed("DialDataResponse")),
        }
    }

    Ok(received)
}

/// Answer a dial data request with `num_bytes` of zeros in chunks of `chunk_size`.
pub(crate) async fn send_dial_data<S: ProtocolStream>(
    framed: &mut Framed<S, MessageCodec>,
    num_bytes: u64,
    chunk_size: usize,
) -> Result<(), AutoNatError> {
    let chunk = Bytes::from(vec![0u8; chunk_size.max(1)]);
    let mut remaining = num_bytes;
    while remaining > 0 {
        let len = remaining.min(chunk.len() as u64) as usize;
        framed
            .feed(Message::DialDataResponse(DialDataResponse {
                data: chunk.slice(..len),
            }))
            .await?;
        remaining -= len as u64;
    }
    framed.flush().await?;
    Ok(())
}
