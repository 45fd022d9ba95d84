// SMPP v3.4 codec: wire layout of the header, field helpers and the frame
// registry. PDU structs implement Encodable/Decodable; this module only knows
// how to find the right decoder and how common field types are laid out.

use crate::datatypes::{
    BindTransceiver, BindTransceiverResponse, CommandId, CommandStatus, DataSm, DataSmResponse,
    DeliverSm, DeliverSmResponse, EnquireLink, EnquireLinkResponse, GenericNack, SubmitSm,
    SubmitSmResponse, Unbind, UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

/// Header fields exactly as they appear on the wire, before the command id is
/// resolved. Used to frame unknown PDUs and to answer malformed ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawHeader {
    pub command_length: u32,
    pub command_id: u32,
    pub command_status: u32,
    pub sequence_number: u32,
}

impl RawHeader {
    pub fn peek(buf: &[u8]) -> Option<Self> {
        if buf.len() < PduHeader::SIZE {
            return None;
        }
        let mut cursor = Cursor::new(buf);
        Some(RawHeader {
            command_length: cursor.get_u32(),
            command_id: cursor.get_u32(),
            command_status: cursor.get_u32(),
            sequence_number: cursor.get_u32(),
        })
    }
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::InvalidCommandId(command_id_raw))?;
        let command_status = CommandStatus::from_raw(buf.get_u32());
        let sequence_number = buf.get_u32();

        if !(Self::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        // Requests must have command_status = 0
        if !command_id.is_response() && command_status != CommandStatus::Ok {
            return Err(CodecError::InvalidRequestStatus {
                command_id,
                command_status,
            });
        }

        // 0 stays legal: generic_nack uses it when the offending sequence is unknown
        if sequence_number == 0xFFFF_FFFF {
            return Err(CodecError::ReservedSequenceNumber(sequence_number));
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status as u32);
        buf.put_u32(self.sequence_number);
        Ok(())
    }

    /// Header with a zero length placeholder; `Encodable::to_bytes` patches it.
    pub fn for_body(command_id: CommandId, command_status: CommandStatus, sequence_number: u32) -> Self {
        PduHeader {
            command_length: 0,
            command_id,
            command_status,
            sequence_number,
        }
    }
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode this PDU to the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size without actually encoding
    fn encoded_size(&self) -> usize {
        let mut buf = BytesMut::new();
        self.encode(&mut buf).map(|_| buf.len()).unwrap_or(0)
    }

    /// Encode into a fresh buffer and fix up command_length (first 4 bytes).
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(PduHeader::SIZE + 64);
        self.encode(&mut buf)?;

        if buf.len() > MAX_PDU_SIZE as usize {
            return Err(CodecError::InvalidPduLength {
                length: buf.len() as u32,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }
        if buf.len() >= 4 {
            let length = buf.len() as u32;
            buf[0..4].copy_from_slice(&length.to_be_bytes());
        }

        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Sized {
    /// Decode this PDU from the buffer after header
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// Return the expected command_id for this PDU type
    fn command_id() -> CommandId;

    /// Validate the header is appropriate for this PDU type
    fn validate_header(header: &PduHeader) -> Result<(), CodecError> {
        if header.command_id != Self::command_id() {
            return Err(CodecError::UnexpectedCommandId {
                expected: Self::command_id(),
                actual: header.command_id,
            });
        }
        Ok(())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid command_id: {0:#x}")]
    InvalidCommandId(u32),

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Request PDU {command_id:?} has non-zero status: {command_status:?}")]
    InvalidRequestStatus {
        command_id: CommandId,
        command_status: CommandStatus,
    },

    #[error("Reserved sequence number: {0:#x}")]
    ReservedSequenceNumber(u32),

    #[error("Unexpected command_id: expected {expected:?}, got {actual:?}")]
    UnexpectedCommandId {
        expected: CommandId,
        actual: CommandId,
    },

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Convert codec errors to appropriate SMPP command_status codes
impl CodecError {
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::InvalidPduLength { .. } => CommandStatus::InvalidCommandLength,
            CodecError::InvalidCommandId(_) => CommandStatus::InvalidCommandId,
            CodecError::FieldValidation { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" => CommandStatus::InvalidMsgLength,
                _ => CommandStatus::SystemError,
            },
            CodecError::TlvError(_) => CommandStatus::ErrorInOptionalPartofPduBody,
            _ => CommandStatus::SystemError,
        }
    }
}

/// Decode a NUL terminated C-octet string of at most `max_len` octets
/// including the terminator.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field_name: &'static str,
) -> Result<String, CodecError> {
    let window = &buf.chunk()[..buf.remaining().min(max_len)];
    let Some(end) = window.iter().position(|&b| b == 0) else {
        return Err(if buf.remaining() < max_len {
            CodecError::Incomplete
        } else {
            CodecError::FieldValidation {
                field: field_name,
                reason: format!("missing NUL terminator within {max_len} octets"),
            }
        });
    };

    let value = window[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|e| CodecError::Utf8Error {
        field: field_name,
        source: e,
    })
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Decode a 32-bit big-endian integer
pub fn decode_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Take exactly `len` raw octets
pub fn decode_octets(buf: &mut Cursor<&[u8]>, len: usize) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.copy_to_bytes(len))
}

/// Encode a C-octet string; `max_len` includes the NUL terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    let bytes = value.as_bytes();
    if bytes.len() >= max_len {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {}", bytes.len(), max_len - 1),
        });
    }
    if bytes.contains(&0) {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: "embedded NUL".to_string(),
        });
    }
    buf.put_slice(bytes);
    buf.put_u8(0);
    Ok(())
}

/// Encode a single byte
pub fn encode_u8(buf: &mut BytesMut, value: u8) {
    buf.put_u8(value);
}

/// Encode a 16-bit big-endian integer
pub fn encode_u16(buf: &mut BytesMut, value: u16) {
    buf.put_u16(value);
}

/// Encode a 32-bit big-endian integer
pub fn encode_u32(buf: &mut BytesMut, value: u32) {
    buf.put_u32(value);
}

/// Any PDU a transceiver session sends or receives
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    BindTransceiver(BindTransceiver),
    BindTransceiverResp(BindTransceiverResponse),

    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),
    DataSm(Box<DataSm>),
    DataSmResp(DataSmResponse),

    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),
    Unbind(Unbind),
    UnbindResp(UnbindResponse),
    GenericNack(GenericNack),

    /// A well-framed PDU whose command_id this client does not implement
    Unknown {
        command_id: u32,
        command_status: CommandStatus,
        sequence_number: u32,
        body: Bytes,
    },
}

/// Registry of PDU decoders for extensible parsing
type DecoderFn =
    Box<dyn Fn(PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

impl PduRegistry {
    /// Create a registry with every PDU a transceiver handles
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        registry.register_pdu::<BindTransceiver, _>(Frame::BindTransceiver);
        registry.register_pdu::<BindTransceiverResponse, _>(Frame::BindTransceiverResp);

        registry.register_pdu::<SubmitSm, _>(|pdu| Frame::SubmitSm(Box::new(pdu)));
        registry.register_pdu::<SubmitSmResponse, _>(Frame::SubmitSmResp);
        registry.register_pdu::<DeliverSm, _>(|pdu| Frame::DeliverSm(Box::new(pdu)));
        registry.register_pdu::<DeliverSmResponse, _>(Frame::DeliverSmResp);
        registry.register_pdu::<DataSm, _>(|pdu| Frame::DataSm(Box::new(pdu)));
        registry.register_pdu::<DataSmResponse, _>(Frame::DataSmResp);

        registry.register_pdu::<EnquireLink, _>(Frame::EnquireLink);
        registry.register_pdu::<EnquireLinkResponse, _>(Frame::EnquireLinkResp);
        registry.register_pdu::<Unbind, _>(Frame::Unbind);
        registry.register_pdu::<UnbindResponse, _>(Frame::UnbindResp);
        registry.register_pdu::<GenericNack, _>(Frame::GenericNack);

        registry
    }

    fn register_pdu<T, F>(&mut self, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Send + Sync + 'static,
    {
        let command_id = T::command_id();
        let decoder = Box::new(move |header: PduHeader, buf: &mut Cursor<&[u8]>| {
            let pdu = T::decode(header, buf)?;
            Ok(frame_constructor(pdu))
        });
        self.decoders.insert(command_id, decoder);
    }

    /// Decode a PDU given its header and body
    pub fn decode_pdu(
        &self,
        header: PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Frame, CodecError> {
        match self.decoders.get(&header.command_id) {
            Some(decoder) => decoder(header, buf),
            None => {
                let body_size = header.command_length as usize - PduHeader::SIZE;
                let body = decode_octets(buf, body_size)?;
                Ok(Frame::Unknown {
                    command_id: header.command_id as u32,
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    body,
                })
            }
        }
    }

    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Raw command_id of this frame
    pub fn command_id(&self) -> u32 {
        let id = match self {
            Frame::BindTransceiver(_) => CommandId::BindTransceiver,
            Frame::BindTransceiverResp(_) => CommandId::BindTransceiverResp,
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::DataSm(_) => CommandId::DataSm,
            Frame::DataSmResp(_) => CommandId::DataSmResp,
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
            Frame::Unknown { command_id, .. } => return *command_id,
        };
        id as u32
    }

    /// Get the sequence number for this frame
    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::BindTransceiver(pdu) => pdu.sequence_number,
            Frame::BindTransceiverResp(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::DataSm(pdu) => pdu.sequence_number,
            Frame::DataSmResp(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
            Frame::Unknown { sequence_number, .. } => *sequence_number,
        }
    }

    pub fn is_response(&self) -> bool {
        CommandId::is_response_id(self.command_id())
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Frame::BindTransceiver(_) => "bind_transceiver",
            Frame::BindTransceiverResp(_) => "bind_transceiver_resp",
            Frame::SubmitSm(_) => "submit_sm",
            Frame::SubmitSmResp(_) => "submit_sm_resp",
            Frame::DeliverSm(_) => "deliver_sm",
            Frame::DeliverSmResp(_) => "deliver_sm_resp",
            Frame::DataSm(_) => "data_sm",
            Frame::DataSmResp(_) => "data_sm_resp",
            Frame::EnquireLink(_) => "enquire_link",
            Frame::EnquireLinkResp(_) => "enquire_link_resp",
            Frame::Unbind(_) => "unbind",
            Frame::UnbindResp(_) => "unbind_resp",
            Frame::GenericNack(_) => "generic_nack",
            Frame::Unknown { .. } => "unknown",
        }
    }

    /// Checks whether a whole PDU is buffered. Returns its length when it is.
    pub fn check(buf: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
        if buf.remaining() < PduHeader::SIZE {
            return Err(CodecError::Incomplete);
        }

        let pos = buf.position();
        let command_length = buf.get_u32();
        buf.set_position(pos);

        if !(PduHeader::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        if buf.remaining() < command_length as usize {
            return Err(CodecError::Incomplete);
        }

        Ok(command_length as usize)
    }

    /// Parse exactly one PDU. `pdu` must hold the complete PDU and nothing else.
    pub fn parse(pdu: &[u8], registry: &PduRegistry) -> Result<Frame, CodecError> {
        let raw = RawHeader::peek(pdu).ok_or(CodecError::Incomplete)?;

        if CommandId::try_from(raw.command_id).is_err() {
            return Ok(Frame::Unknown {
                command_id: raw.command_id,
                command_status: CommandStatus::from_raw(raw.command_status),
                sequence_number: raw.sequence_number,
                body: Bytes::copy_from_slice(&pdu[PduHeader::SIZE..]),
            });
        }

        let mut cursor = Cursor::new(pdu);
        let header = PduHeader::decode(&mut cursor)?;
        let frame = registry.decode_pdu(header, &mut cursor)?;

        if cursor.has_remaining() {
            return Err(CodecError::FieldValidation {
                field: "command_length",
                reason: format!("{} trailing octets after body", cursor.remaining()),
            });
        }

        Ok(frame)
    }
}

impl Encodable for Frame {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Frame::BindTransceiver(pdu) => pdu.encode(buf),
            Frame::BindTransceiverResp(pdu) => pdu.encode(buf),
            Frame::SubmitSm(pdu) => pdu.encode(buf),
            Frame::SubmitSmResp(pdu) => pdu.encode(buf),
            Frame::DeliverSm(pdu) => pdu.encode(buf),
            Frame::DeliverSmResp(pdu) => pdu.encode(buf),
            Frame::DataSm(pdu) => pdu.encode(buf),
            Frame::DataSmResp(pdu) => pdu.encode(buf),
            Frame::EnquireLink(pdu) => pdu.encode(buf),
            Frame::EnquireLinkResp(pdu) => pdu.encode(buf),
            Frame::Unbind(pdu) => pdu.encode(buf),
            Frame::UnbindResp(pdu) => pdu.encode(buf),
            Frame::GenericNack(pdu) => pdu.encode(buf),
            Frame::Unknown {
                command_id,
                command_status,
                sequence_number,
                body,
            } => {
                buf.put_u32((PduHeader::SIZE + body.len()) as u32);
                buf.put_u32(*command_id);
                buf.put_u32(*command_status as u32);
                buf.put_u32(*sequence_number);
                buf.put_slice(body);
                Ok(())
            }
        }
    }
}
