use crate::codec::{CodecError, Decodable, Encodable, PduHeader, decode_cstring, encode_cstring};
use crate::datatypes::{CommandId, CommandStatus, MessageBody};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// Message pushed by the SMSC: a mobile originated message or, when the
/// esm_class says so, a delivery receipt for an earlier submission.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: MessageBody,
}

impl DeliverSm {
    pub fn is_delivery_receipt(&self) -> bool {
        self.body.esm_class.is_delivery_receipt()
    }
}

impl Encodable for DeliverSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::DeliverSm, self.command_status, self.sequence_number)
            .encode(buf)?;
        self.body.encode(buf)
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + self.body.encoded_size()
    }
}

impl Decodable for DeliverSm {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(DeliverSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            body: MessageBody::decode(buf)?,
        })
    }

    fn command_id() -> CommandId {
        CommandId::DeliverSm
    }
}

/// deliver_sm_resp; message_id is unused and always sent as NULL.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl DeliverSmResponse {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

impl Encodable for DeliverSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::DeliverSmResp, self.command_status, self.sequence_number)
            .encode(buf)?;
        encode_cstring(buf, "", 1, "message_id")
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + 1
    }
}

impl Decodable for DeliverSmResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        if buf.has_remaining() {
            decode_cstring(buf, 65, "message_id")?;
        }
        Ok(DeliverSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
        })
    }

    fn command_id() -> CommandId {
        CommandId::DeliverSmResp
    }
}
