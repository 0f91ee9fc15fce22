//! Domain messages for the dial-request and dial-back protocols.
//!
//! Everything on the dial-request stream travels inside one envelope,
//! [`Message`], with exactly one variant per frame. The dial-back stream
//! carries a single [`DialBack`] one way and a [`DialBackResponse`] the other.

use bytes::Bytes;
use libp2p::Multiaddr;
use vertex_net_codec::{Codec, ProtoMessage, ProtocolCodecError};

use crate::{
    Nonce,
    generated::autonat::{self as proto, mod_DialBackResponse, mod_DialResponse, mod_Message},
};

/// Domain-specific errors for the autonat protocols.
#[derive(Debug, thiserror::Error)]
pub enum AutoNatCodecDomainError {
    /// The envelope had no message set.
    #[error("message envelope is empty")]
    EmptyMessage,

    /// A rejected address claimed a dial outcome.
    #[error("dial status {dial_status:?} is invalid for response status {status:?}")]
    InvalidStatusPair {
        status: ResponseStatus,
        dial_status: DialStatus,
    },
}

/// Error type for autonat codec operations.
pub type AutoNatCodecError = ProtocolCodecError<AutoNatCodecDomainError>;

/// Codec for the dial-request stream.
pub type MessageCodec = Codec<Message, AutoNatCodecError>;

/// Codec for dial-back messages.
pub type DialBackCodec = Codec<DialBack, AutoNatCodecError>;

/// Codec for dial-back responses.
pub type DialBackResponseCodec = Codec<DialBackResponse, AutoNatCodecError>;

/// Whether the verifier attempted the dial at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    InternalError,
    RequestRejected,
    DialRefused,
    Ok,
}

impl From<mod_DialResponse::ResponseStatus> for ResponseStatus {
    fn from(value: mod_DialResponse::ResponseStatus) -> Self {
        match value {
            mod_DialResponse::ResponseStatus::E_INTERNAL_ERROR => Self::InternalError,
            mod_DialResponse::ResponseStatus::E_REQUEST_REJECTED => Self::RequestRejected,
            mod_DialResponse::ResponseStatus::E_DIAL_REFUSED => Self::DialRefused,
            mod_DialResponse::ResponseStatus::OK => Self::Ok,
        }
    }
}

impl From<ResponseStatus> for mod_DialResponse::ResponseStatus {
    fn from(value: ResponseStatus) -> Self {
        match value {
            ResponseStatus::InternalError => Self::E_INTERNAL_ERROR,
            ResponseStatus::RequestRejected => Self::E_REQUEST_REJECTED,
            ResponseStatus::DialRefused => Self::E_DIAL_REFUSED,
            ResponseStatus::Ok => Self::OK,
        }
    }
}

/// Outcome of the dial-back attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialStatus {
    /// No dial was attempted.
    Unused,
    /// The connection to the address could not be opened.
    DialError,
    /// The connection opened but the dial-back exchange failed.
    DialBackError,
    Ok,
}

impl DialStatus {
    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::DialError => "dial_error",
            Self::DialBackError => "dial_back_error",
            Self::Ok => "ok",
        }
    }
}

impl From<proto::DialStatus> for DialStatus {
    fn from(value: proto::DialStatus) -> Self {
        match value {
            proto::DialStatus::UNUSED => Self::Unused,
            proto::DialStatus::E_DIAL_ERROR => Self::DialError,
            proto::DialStatus::E_DIAL_BACK_ERROR => Self::DialBackError,
            proto::DialStatus::OK => Self::Ok,
        }
    }
}

impl From<DialStatus> for proto::DialStatus {
    fn from(value: DialStatus) -> Self {
        match value {
            DialStatus::Unused => Self::UNUSED,
            DialStatus::DialError => Self::E_DIAL_ERROR,
            DialStatus::DialBackError => Self::E_DIAL_BACK_ERROR,
            DialStatus::Ok => Self::OK,
        }
    }
}

/// Request to verify a list of candidate addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialRequest {
    /// Candidate multiaddrs in their binary encoding. Kept raw so that one
    /// malformed entry does not invalidate the others.
    pub addrs: Vec<Vec<u8>>,
    pub nonce: Nonce,
}

impl DialRequest {
    /// Create a request for the given addresses.
    pub fn new(addrs: &[Multiaddr], nonce: Nonce) -> Self {
        Self {
            addrs: addrs.iter().map(Multiaddr::to_vec).collect(),
            nonce,
        }
    }
}

/// Verifier's verdict on a single candidate address.
///
/// A response whose status is not [`ResponseStatus::Ok`] always carries
/// [`DialStatus::Unused`]; the constructors keep it that way and decoding
/// rejects frames that break it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialResponse {
    addr_idx: u32,
    status: ResponseStatus,
    dial_status: DialStatus,
}

impl DialResponse {
    /// The verifier dialed the address; `dial_status` is the result.
    pub fn dialed(addr_idx: u32, dial_status: DialStatus) -> Self {
        Self {
            addr_idx,
            status: ResponseStatus::Ok,
            dial_status,
        }
    }

    /// The verifier refused to dial the address.
    pub fn refused(addr_idx: u32) -> Self {
        Self::rejected(addr_idx, ResponseStatus::DialRefused)
    }

    /// The verifier did not dial the address for the given reason.
    pub fn rejected(addr_idx: u32, status: ResponseStatus) -> Self {
        Self {
            addr_idx,
            status,
            dial_status: DialStatus::Unused,
        }
    }

    /// Index into the original request's address list.
    pub fn addr_idx(&self) -> u32 {
        self.addr_idx
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn dial_status(&self) -> DialStatus {
        self.dial_status
    }

    fn into_proto(self) -> proto::DialResponse {
        proto::DialResponse {
            status: self.status.into(),
            addr_idx: self.addr_idx,
            dial_status: self.dial_status.into(),
        }
    }

    fn from_proto(proto: proto::DialResponse) -> Result<Self, AutoNatCodecError> {
        let status = ResponseStatus::from(proto.status);
        let dial_status = DialStatus::from(proto.dial_status);
        if status != ResponseStatus::Ok && dial_status != DialStatus::Unused {
            return Err(AutoNatCodecError::domain(
                AutoNatCodecDomainError::InvalidStatusPair {
                    status,
                    dial_status,
                },
            ));
        }
        Ok(Self {
            addr_idx: proto.addr_idx,
            status,
            dial_status,
        })
    }
}

/// Amplification challenge: push back `num_bytes` before address `addr_idx` is dialed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialDataRequest {
    pub addr_idx: u32,
    pub num_bytes: u64,
}

/// One chunk of filler data answering a [`DialDataRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialDataResponse {
    pub data: Bytes,
}

/// Envelope for everything sent on the dial-request stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    DialRequest(DialRequest),
    DialResponse(DialResponse),
    DialDataRequest(DialDataRequest),
    DialDataResponse(DialDataResponse),
}

impl Message {
    /// Name of the carried message, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DialRequest(_) => "DialRequest",
            Self::DialResponse(_) => "DialResponse",
            Self::DialDataRequest(_) => "DialDataRequest",
            Self::DialDataResponse(_) => "DialDataResponse",
        }
    }
}

impl ProtoMessage for Message {
    type Proto = proto::Message;
    type DecodeError = AutoNatCodecError;

    fn into_proto(self) -> Self::Proto {
        let msg = match self {
            Self::DialRequest(request) => {
                mod_Message::OneOfmsg::dial_request(proto::DialRequest {
                    addrs: request.addrs,
                    nonce: request.nonce,
                })
            }
            Self::DialResponse(response) => {
                mod_Message::OneOfmsg::dial_response(response.into_proto())
            }
            Self::DialDataRequest(request) => {
                mod_Message::OneOfmsg::dial_data_request(proto::DialDataRequest {
                    addr_idx: request.addr_idx,
                    num_bytes: request.num_bytes,
                })
            }
            Self::DialDataResponse(response) => {
                mod_Message::OneOfmsg::dial_data_response(proto::DialDataResponse {
                    data: response.data.to_vec(),
                })
            }
        };
        proto::Message { msg }
    }

    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError> {
        match proto.msg {
            mod_Message::OneOfmsg::dial_request(request) => Ok(Self::DialRequest(DialRequest {
                addrs: request.addrs,
                nonce: request.nonce,
            })),
            mod_Message::OneOfmsg::dial_response(response) => {
                DialResponse::from_proto(response).map(Self::DialResponse)
            }
            mod_Message::OneOfmsg::dial_data_request(request) => {
                Ok(Self::DialDataRequest(DialDataRequest {
                    addr_idx: request.addr_idx,
                    num_bytes: request.num_bytes,
                }))
            }
            mod_Message::OneOfmsg::dial_data_response(response) => {
                Ok(Self::DialDataResponse(DialDataResponse {
                    data: Bytes::from(response.data),
                }))
            }
            mod_Message::OneOfmsg::None => Err(AutoNatCodecError::domain(
                AutoNatCodecDomainError::EmptyMessage,
            )),
        }
    }
}

/// Sent by the verifier on the dial-back stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialBack {
    pub nonce: Nonce,
}

impl ProtoMessage for DialBack {
    type Proto = proto::DialBack;
    type DecodeError = AutoNatCodecError;

    fn into_proto(self) -> Self::Proto {
        proto::DialBack { nonce: self.nonce }
    }

    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError> {
        Ok(Self { nonce: proto.nonce })
    }
}

/// Status of a dial-back acknowledgement. `Ok` is the only value defined on
/// the wire; anything else is kept as received and never counts as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialBackStatus {
    Ok,
    Unknown(i32),
}

/// Requester's acknowledgement of a [`DialBack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialBackResponse {
    pub status: DialBackStatus,
}

impl DialBackResponse {
    pub fn ok() -> Self {
        Self {
            status: DialBackStatus::Ok,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == DialBackStatus::Ok
    }
}

impl ProtoMessage for DialBackResponse {
    type Proto = proto::DialBackResponse;
    type DecodeError = AutoNatCodecError;

    fn into_proto(self) -> Self::Proto {
        let status = match self.status {
            DialBackStatus::Ok => mod_DialBackResponse::DialBackStatus::OK as i32,
            DialBackStatus::Unknown(value) => value,
        };
        proto::DialBackResponse { status }
    }

    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError> {
        let status = if proto.status == mod_DialBackResponse::DialBackStatus::OK as i32 {
            DialBackStatus::Ok
        } else {
            DialBackStatus::Unknown(proto.status)
        };
        Ok(Self { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asynchronous_codec::{Decoder, Encoder};
    use bytes::BytesMut;
    use quick_protobuf::{MessageWrite, Writer};

    fn encode_proto(message: &proto::Message) -> BytesMut {
        let mut body = Vec::new();
        message
            .write_message(&mut Writer::new(&mut body))
            .unwrap();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[body.len() as u8]);
        buf.extend_from_slice(&body);
        buf
    }

    #[test]
    fn test_dial_request_keeps_address_order() {
        let addrs: Vec<Multiaddr> = vec![
            "/ip4/1.2.3.4/tcp/4001".parse().unwrap(),
            "/ip6/2001:4860::8888/udp/4001/quic-v1".parse().unwrap(),
        ];
        let mut codec = MessageCodec::new(1024);
        let mut buf = BytesMut::new();
        codec
            .encode(Message::DialRequest(DialRequest::new(&addrs, 7)), &mut buf)
            .unwrap();

        let Some(Message::DialRequest(request)) = codec.decode(&mut buf).unwrap() else {
            panic!("expected DialRequest");
        };
        assert_eq!(request.nonce, 7);
        let decoded: Vec<Multiaddr> = request
            .addrs
            .into_iter()
            .map(|bytes| Multiaddr::try_from(bytes).unwrap())
            .collect();
        assert_eq!(decoded, addrs);
    }

    #[test]
    fn test_dial_response_wire_values() {
        let proto = DialResponse::dialed(3, DialStatus::DialBackError).into_proto();
        assert_eq!(proto.status as i32, 200);
        assert_eq!(proto.dial_status as i32, 101);
        assert_eq!(proto.addr_idx, 3);

        let proto = DialResponse::refused(0).into_proto();
        assert_eq!(proto.status as i32, 101);
        assert_eq!(proto.dial_status as i32, 0);
    }

    #[test]
    fn test_rejected_response_with_dial_status_is_invalid() {
        let buf = &mut encode_proto(&proto::Message {
            msg: mod_Message::OneOfmsg::dial_response(proto::DialResponse {
                status: mod_DialResponse::ResponseStatus::E_DIAL_REFUSED,
                addr_idx: 1,
                dial_status: proto::DialStatus::OK,
            }),
        });

        let err = MessageCodec::new(1024).decode(buf).unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(AutoNatCodecDomainError::InvalidStatusPair { .. })
        ));
    }

    #[test]
    fn test_empty_envelope_is_invalid() {
        let buf = &mut encode_proto(&proto::Message::default());
        let err = MessageCodec::new(1024).decode(buf).unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(AutoNatCodecDomainError::EmptyMessage)
        ));
    }

    #[test]
    fn test_oversized_dial_data_rejected() {
        let mut encoder = MessageCodec::new(64 * 1024);
        let mut buf = BytesMut::new();
        encoder
            .encode(
                Message::DialDataResponse(DialDataResponse {
                    data: Bytes::from(vec![0u8; 8192]),
                }),
                &mut buf,
            )
            .unwrap();

        let mut decoder = MessageCodec::new(4096);
        assert!(matches!(
            decoder.decode(&mut buf),
            Err(ProtocolCodecError::Protocol(_))
        ));
    }

    #[test]
    fn test_dial_back_zero_nonce() {
        // proto3 omits zero values; the nonce must still come back as zero.
        let mut codec = DialBackCodec::new(64);
        let mut buf = BytesMut::new();
        codec.encode(DialBack { nonce: 0 }, &mut buf).unwrap();
        assert_eq!(&buf[..], &[0u8]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(DialBack { nonce: 0 }));
    }

    #[test]
    fn test_dial_back_response_ok() {
        let mut codec = DialBackResponseCodec::new(64);
        let mut buf = BytesMut::new();
        codec.encode(DialBackResponse::ok(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert!(decoded.is_ok());
    }

    #[test]
    fn test_dial_back_response_undefined_status_is_not_ok() {
        // Length 2, then field 1 as varint 7.
        let mut buf = BytesMut::from(&[0x02, 0x08, 0x07][..]);
        let decoded = DialBackResponseCodec::new(64)
            .decode(&mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.status, DialBackStatus::Unknown(7));
        assert!(!decoded.is_ok());
    }

    #[test]
    fn test_dial_back_response_keeps_unknown_status_on_encode() {
        let mut codec = DialBackResponseCodec::new(64);
        let mut buf = BytesMut::new();
        codec
            .encode(
                DialBackResponse {
                    status: DialBackStatus::Unknown(7),
                },
                &mut buf,
            )
            .unwrap();
        assert_eq!(&buf[..], &[0x02, 0x08, 0x07]);
    }
}
