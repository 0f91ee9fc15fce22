//! Length-prefixed protobuf framing for vertex network protocols.
//!
//! Each protocol defines domain types and implements [`ProtoMessage`] to map them
//! onto the quick-protobuf structs of its schema. [`Codec`] then frames those
//! types on a stream with an unsigned-varint length prefix, rejecting frames
//! larger than the configured maximum.
//!
//! ```ignore
//! pub type PingCodec = Codec<Ping, ProtocolCodecError<PingError>>;
//!
//! let mut framed = Framed::new(stream, PingCodec::new(MAX_MESSAGE_SIZE));
//! framed.send(Ping::new("hello")).await?;
//! ```

use std::{convert::Infallible, fmt, marker::PhantomData};

use bytes::BytesMut;

/// Conversion between a protocol's domain type and its wire struct.
pub trait ProtoMessage: Sized {
    /// The generated protobuf struct.
    type Proto: quick_protobuf::MessageWrite + for<'a> quick_protobuf::MessageRead<'a>;
    /// Error returned when a decoded struct is not a valid domain value.
    type DecodeError;

    fn into_proto(self) -> Self::Proto;

    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError>;
}

/// Error type shared by protocol codecs.
///
/// `D` carries protocol-specific validation failures. Protocols without any use
/// the default [`Infallible`].
#[derive(Debug, thiserror::Error)]
pub enum ProtocolCodecError<D = Infallible> {
    /// Framing or protobuf decoding failed (includes oversized frames).
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The message decoded but is not valid for the protocol.
    #[error("{0}")]
    Domain(D),
    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl<D> ProtocolCodecError<D> {
    /// Wrap a protocol-specific error.
    pub fn domain(error: D) -> Self {
        Self::Domain(error)
    }

    /// Returns the protocol-specific error, if this is one.
    pub fn as_domain(&self) -> Option<&D> {
        match self {
            Self::Domain(d) => Some(d),
            _ => None,
        }
    }
}

impl<D> From<quick_protobuf_codec::Error> for ProtocolCodecError<D> {
    fn from(error: quick_protobuf_codec::Error) -> Self {
        Self::Protocol(error.to_string())
    }
}

/// Framed codec for a single domain message type `T`.
pub struct Codec<T: ProtoMessage, E> {
    inner: quick_protobuf_codec::Codec<T::Proto>,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T: ProtoMessage, E> Codec<T, E> {
    /// Create a codec rejecting frames longer than `max_message_size` bytes.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            inner: quick_protobuf_codec::Codec::new(max_message_size),
            _marker: PhantomData,
        }
    }
}

impl<T: ProtoMessage, E> fmt::Debug for Codec<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("message", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T, E> asynchronous_codec::Encoder for Codec<T, E>
where
    T: ProtoMessage,
    quick_protobuf_codec::Error: Into<E>,
    E: From<std::io::Error>,
{
    type Item<'a> = T;
    type Error = E;

    fn encode(&mut self, item: Self::Item<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode(item.into_proto(), dst).map_err(Into::into)
    }
}

impl<T, E> asynchronous_codec::Decoder for Codec<T, E>
where
    T: ProtoMessage,
    T::DecodeError: Into<E>,
    quick_protobuf_codec::Error: Into<E>,
    E: From<std::io::Error>,
{
    type Item = T;
    type Error = E;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src).map_err(Into::into)? {
            Some(proto) => T::from_proto(proto).map(Some).map_err(Into::into),
            None => Ok(None),
        }
    }
}
