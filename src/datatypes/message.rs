// ABOUTME: Mandatory body shared by submit_sm and deliver_sm plus their optional TLVs
// ABOUTME: Chooses between short_message and the message_payload TLV by payload size

use crate::codec::{
    CodecError, decode_cstring, decode_octets, decode_u8, encode_cstring, encode_u8,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, find_tlv, tags};
use crate::datatypes::{Address, EsmClass};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Largest user data that fits in the short_message field
pub const MAX_SHORT_MESSAGE_LEN: usize = 254;

const SERVICE_TYPE_LEN: usize = 6;
const TIME_LEN: usize = 17;

/// Fields common to submit_sm and deliver_sm, in wire order.
///
/// `schedule_delivery_time` and `validity_period` are absolute or relative
/// SMPP time strings; an empty string asks the SMSC for its default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageBody {
    pub service_type: String,
    pub source: Address,
    pub destination: Address,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,
    pub tlvs: Vec<Tlv>,
}

impl MessageBody {
    /// Store user data in short_message, or in message_payload when it is too
    /// long for the mandatory field.
    pub fn set_payload(&mut self, payload: Bytes) {
        self.tlvs.retain(|tlv| tlv.tag != tags::MESSAGE_PAYLOAD);
        if payload.len() > MAX_SHORT_MESSAGE_LEN {
            self.short_message = Bytes::new();
            self.tlvs.push(Tlv::new(tags::MESSAGE_PAYLOAD, payload));
        } else {
            self.short_message = payload;
        }
    }

    /// User data from whichever field carries it
    pub fn payload(&self) -> &Bytes {
        if self.short_message.is_empty() {
            if let Some(tlv) = find_tlv(&self.tlvs, tags::MESSAGE_PAYLOAD) {
                return &tlv.value;
            }
        }
        &self.short_message
    }

    pub fn tlv(&self, tag: u16) -> Option<&Tlv> {
        find_tlv(&self.tlvs, tag)
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.short_message.len() > MAX_SHORT_MESSAGE_LEN {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!(
                    "{} octets exceeds {MAX_SHORT_MESSAGE_LEN}, use message_payload",
                    self.short_message.len()
                ),
            });
        }

        encode_cstring(buf, &self.service_type, SERVICE_TYPE_LEN, "service_type")?;
        self.source.encode(buf, "source_addr")?;
        self.destination.encode(buf, "destination_addr")?;
        encode_u8(buf, self.esm_class.to_byte());
        encode_u8(buf, self.protocol_id);
        encode_u8(buf, self.priority_flag);
        encode_cstring(buf, &self.schedule_delivery_time, TIME_LEN, "schedule_delivery_time")?;
        encode_cstring(buf, &self.validity_period, TIME_LEN, "validity_period")?;
        encode_u8(buf, self.registered_delivery);
        encode_u8(buf, self.replace_if_present_flag);
        encode_u8(buf, self.data_coding);
        encode_u8(buf, self.sm_default_msg_id);
        encode_u8(buf, self.short_message.len() as u8);
        buf.put_slice(&self.short_message);

        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }

    pub(crate) fn encoded_size(&self) -> usize {
        self.service_type.len()
            + 1
            + self.source.encoded_size()
            + self.destination.encoded_size()
            + 3
            + self.schedule_delivery_time.len()
            + 1
            + self.validity_period.len()
            + 1
            + 5
            + self.short_message.len()
            + self.tlvs.iter().map(Tlv::encoded_size).sum::<usize>()
    }

    pub(crate) fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let service_type = decode_cstring(buf, SERVICE_TYPE_LEN, "service_type")?;
        let source = Address::decode(buf, "source_addr")?;
        let destination = Address::decode(buf, "destination_addr")?;
        let esm_class = EsmClass::from_byte(decode_u8(buf)?);
        let protocol_id = decode_u8(buf)?;
        let priority_flag = decode_u8(buf)?;
        let schedule_delivery_time = decode_cstring(buf, TIME_LEN, "schedule_delivery_time")?;
        let validity_period = decode_cstring(buf, TIME_LEN, "validity_period")?;
        let registered_delivery = decode_u8(buf)?;
        let replace_if_present_flag = decode_u8(buf)?;
        let data_coding = decode_u8(buf)?;
        let sm_default_msg_id = decode_u8(buf)?;
        let sm_length = decode_u8(buf)? as usize;
        let short_message = decode_octets(buf, sm_length).map_err(|_| CodecError::FieldValidation {
            field: "short_message",
            reason: format!("sm_length {sm_length} runs past end of PDU"),
        })?;
        let tlvs = decode_tlvs(buf)?;

        Ok(MessageBody {
            service_type,
            source,
            destination,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}
