use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, encode_cstring,
};
use crate::datatypes::{Address, CommandId, CommandStatus, EsmClass, MessageBody};
use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;

const MESSAGE_ID_LEN: usize = 65;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME).
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: MessageBody,
}

impl SubmitSm {
    /// Submission with every optional field at its SMPP default. The sequence
    /// number is assigned by the session at send time.
    pub fn new(source: Address, destination: Address, data_coding: u8, payload: Bytes) -> Self {
        let mut body = MessageBody {
            source,
            destination,
            data_coding,
            ..Default::default()
        };
        body.set_payload(payload);

        Self {
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            body,
        }
    }

    pub fn with_validity_period(mut self, validity_period: impl Into<String>) -> Self {
        self.body.validity_period = validity_period.into();
        self
    }

    pub fn with_esm_class(mut self, esm_class: EsmClass) -> Self {
        self.body.esm_class = esm_class;
        self
    }

    pub fn with_registered_delivery(mut self, registered_delivery: u8) -> Self {
        self.body.registered_delivery = registered_delivery;
        self
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.body.service_type = service_type.into();
        self
    }
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::SubmitSm, self.command_status, self.sequence_number)
            .encode(buf)?;
        self.body.encode(buf)
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + self.body.encoded_size()
    }
}

impl Decodable for SubmitSm {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(SubmitSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            body: MessageBody::decode(buf)?,
        })
    }

    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }
}

/// Acknowledges a submit_sm. `message_id` is the SMSC's handle for the
/// message and is empty when the submission was rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
        }
    }

    pub fn error(sequence_number: u32, command_status: CommandStatus) -> Self {
        Self {
            command_status,
            sequence_number,
            message_id: String::new(),
        }
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::SubmitSmResp, self.command_status, self.sequence_number)
            .encode(buf)?;
        // Error responses may omit the body entirely
        if self.command_status.is_ok() || !self.message_id.is_empty() {
            encode_cstring(buf, &self.message_id, MESSAGE_ID_LEN, "message_id")?;
        }
        Ok(())
    }
}

impl Decodable for SubmitSmResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let message_id = if buf.has_remaining() {
            decode_cstring(buf, MESSAGE_ID_LEN, "message_id")?
        } else {
            String::new()
        };
        Ok(SubmitSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }

    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::tlv::tags;

    fn sample() -> SubmitSm {
        let mut pdu = SubmitSm::new(
            Address::unknown("test").unwrap(),
            Address::unknown("4479").unwrap(),
            0x08,
            Bytes::from_static(&[0x00, 0x48, 0x00, 0x69]),
        )
        .with_validity_period("250102030405000+")
        .with_registered_delivery(1);
        pdu.sequence_number = 7;
        pdu
    }

    #[test]
    fn submit_sm_wire_layout() {
        let bytes = sample().to_bytes().unwrap();
        let expected_len = 16 + 1 + (2 + 5) + (2 + 5) + 3 + 1 + 17 + 5 + 4;
        assert_eq!(bytes.len(), expected_len);
        assert_eq!(&bytes[0..4], &(expected_len as u32).to_be_bytes());
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x04]);
        assert_eq!(&bytes[12..16], &[0x00, 0x00, 0x00, 0x07]);
        // short_message is the last thing on the wire
        assert_eq!(&bytes[expected_len - 5..], &[0x04, 0x00, 0x48, 0x00, 0x69]);
        assert_eq!(sample().encoded_size(), expected_len);
    }

    #[test]
    fn submit_sm_roundtrip() {
        let original = sample();
        let bytes = original.to_bytes().unwrap();

        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSm::decode(header, &mut cursor).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn submit_sm_with_message_payload() {
        let pdu = SubmitSm::new(
            Address::unknown("a").unwrap(),
            Address::unknown("b").unwrap(),
            0x04,
            Bytes::from(vec![0xAB; 400]),
        );
        assert!(pdu.body.short_message.is_empty());
        assert_eq!(pdu.body.tlv(tags::MESSAGE_PAYLOAD).unwrap().value.len(), 400);
        assert!(pdu.to_bytes().is_ok());
    }

    #[test]
    fn submit_sm_resp_without_body() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, 0x80, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x58, 0x00, 0x00,
            0x00, 0x02,
        ];
        let mut cursor = Cursor::new(data);
        let header = PduHeader::decode(&mut cursor).unwrap();
        let resp = SubmitSmResponse::decode(header, &mut cursor).unwrap();
        assert_eq!(resp.command_status, CommandStatus::ThrottlingError);
        assert!(resp.message_id.is_empty());
    }

    #[test]
    fn submit_sm_resp_roundtrip() {
        let original = SubmitSmResponse::new(12, "msg-0001");
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert_eq!(SubmitSmResponse::decode(header, &mut cursor).unwrap(), original);
    }
}
