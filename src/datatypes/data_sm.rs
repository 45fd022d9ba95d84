// ABOUTME: Implements SMPP v3.4 data_sm and data_sm_resp PDUs, user data travels in TLVs
// ABOUTME: An SMSC may push data_sm to a transceiver instead of deliver_sm

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
    encode_u8,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, find_tlv, tags};
use crate::datatypes::{Address, CommandId, CommandStatus, EsmClass};
use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;

#[derive(Clone, Debug, PartialEq)]
pub struct DataSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub service_type: String,
    pub source: Address,
    pub destination: Address,
    pub esm_class: EsmClass,
    pub registered_delivery: u8,
    pub data_coding: u8,
    pub tlvs: Vec<Tlv>,
}

impl DataSm {
    pub fn new(sequence_number: u32, source: Address, destination: Address, data_coding: u8) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            service_type: String::new(),
            source,
            destination,
            esm_class: EsmClass::none(),
            registered_delivery: 0,
            data_coding,
            tlvs: Vec::new(),
        }
    }

    pub fn with_message_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.tlvs.retain(|tlv| tlv.tag != tags::MESSAGE_PAYLOAD);
        self.tlvs.push(Tlv::new(tags::MESSAGE_PAYLOAD, payload));
        self
    }

    pub fn message_payload(&self) -> Option<&Bytes> {
        find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD).map(|tlv| &tlv.value)
    }
}

impl Encodable for DataSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::DataSm, self.command_status, self.sequence_number)
            .encode(buf)?;
        encode_cstring(buf, &self.service_type, 6, "service_type")?;
        self.source.encode(buf, "source_addr")?;
        self.destination.encode(buf, "destination_addr")?;
        encode_u8(buf, self.esm_class.to_byte());
        encode_u8(buf, self.registered_delivery);
        encode_u8(buf, self.data_coding);
        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for DataSm {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let service_type = decode_cstring(buf, 6, "service_type")?;
        let source = Address::decode(buf, "source_addr")?;
        let destination = Address::decode(buf, "destination_addr")?;
        let esm_class = EsmClass::from_byte(decode_u8(buf)?);
        let registered_delivery = decode_u8(buf)?;
        let data_coding = decode_u8(buf)?;
        let tlvs = decode_tlvs(buf)?;

        Ok(DataSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type,
            source,
            destination,
            esm_class,
            registered_delivery,
            data_coding,
            tlvs,
        })
    }

    fn command_id() -> CommandId {
        CommandId::DataSm
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
    pub tlvs: Vec<Tlv>,
}

impl DataSmResponse {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: String::new(),
            tlvs: Vec::new(),
        }
    }
}

impl Encodable for DataSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::DataSmResp, self.command_status, self.sequence_number)
            .encode(buf)?;
        encode_cstring(buf, &self.message_id, 65, "message_id")?;
        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for DataSmResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let message_id = if buf.has_remaining() {
            decode_cstring(buf, 65, "message_id")?
        } else {
            String::new()
        };
        Ok(DataSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            tlvs: decode_tlvs(buf)?,
        })
    }

    fn command_id() -> CommandId {
        CommandId::DataSmResp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_sm_encoding_decoding() {
        let original = DataSm::new(
            3,
            Address::unknown("4479").unwrap(),
            Address::unknown("test").unwrap(),
            0x00,
        )
        .with_message_payload(&b"ping"[..]);

        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = DataSm::decode(header, &mut cursor).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.message_payload().unwrap().as_ref(), b"ping");
    }

    #[test]
    fn test_data_sm_response_encoding_decoding() {
        let original = DataSmResponse::new(3);
        let bytes = original.to_bytes().unwrap();
        assert_eq!(bytes.len(), 17);

        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert_eq!(DataSmResponse::decode(header, &mut cursor).unwrap(), original);
    }
}
