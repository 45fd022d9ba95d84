use crate::codec::{CodecError, decode_octets, decode_u16};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Optional parameter tags used by this client
pub mod tags {
    pub const DEST_ADDR_SUBUNIT: u16 = 0x0005;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const SOURCE_PORT: u16 = 0x020A;
    pub const DESTINATION_PORT: u16 = 0x020B;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const NETWORK_ERROR_CODE: u16 = 0x0423;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const DELIVERY_FAILURE_REASON: u16 = 0x0425;
    pub const MESSAGE_STATE: u16 = 0x0427;
}

/// Tag-length-value optional parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn from_u8(tag: u16, value: u8) -> Self {
        Self::new(tag, vec![value])
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len())
            .map_err(|_| CodecError::TlvError(format!("value too long for tag {:#06x}", self.tag)))?;
        buf.put_u16(self.tag);
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    pub fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let tag = decode_u16(buf)?;
        let length = decode_u16(buf)
            .map_err(|_| CodecError::TlvError(format!("truncated length for tag {tag:#06x}")))?;
        let value = decode_octets(buf, length as usize).map_err(|_| {
            CodecError::TlvError(format!("tag {tag:#06x} declares {length} octets past end of PDU"))
        })?;
        Ok(Tlv { tag, value })
    }

    /// Single octet value, as used by message_state and sc_interface_version.
    pub fn as_u8(&self) -> Option<u8> {
        match self.value.as_ref() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// C-octet string value with its terminator stripped.
    pub fn as_cstring(&self) -> Option<String> {
        let raw = self.value.as_ref();
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8(raw[..end].to_vec()).ok()
    }
}

/// Decode TLVs until the PDU body is exhausted.
pub fn decode_tlvs(buf: &mut Cursor<&[u8]>) -> Result<Vec<Tlv>, CodecError> {
    use bytes::Buf;

    let mut tlvs = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < 4 {
            return Err(CodecError::TlvError(format!(
                "{} stray octets after last TLV",
                buf.remaining()
            )));
        }
        tlvs.push(Tlv::decode(buf)?);
    }
    Ok(tlvs)
}

pub fn find_tlv(tlvs: &[Tlv], tag: u16) -> Option<&Tlv> {
    tlvs.iter().find(|tlv| tlv.tag == tag)
}
