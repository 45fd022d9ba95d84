use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
    encode_u8,
};
use crate::datatypes::tlv::{Tlv, decode_tlvs, find_tlv, tags};
use crate::datatypes::{CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, TypeOfNumber};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

const SYSTEM_ID_LEN: usize = 16;
const PASSWORD_LEN: usize = 9;
const SYSTEM_TYPE_LEN: usize = 13;
const ADDRESS_RANGE_LEN: usize = 41;

/// Opens a session in which the ESME both submits and receives messages.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiver {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
}

impl BindTransceiver {
    pub fn builder() -> BindTransceiverBuilder {
        BindTransceiverBuilder::default()
    }
}

#[derive(Default)]
pub struct BindTransceiverBuilder {
    sequence_number: u32,
    system_id: String,
    password: String,
    system_type: String,
    interface_version: InterfaceVersion,
    address_range: String,
}

impl BindTransceiverBuilder {
    pub fn sequence_number(mut self, seq: u32) -> Self {
        self.sequence_number = seq;
        self
    }

    pub fn system_id(mut self, system_id: &str) -> Self {
        self.system_id = system_id.to_string();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn system_type(mut self, system_type: &str) -> Self {
        self.system_type = system_type.to_string();
        self
    }

    pub fn interface_version(mut self, version: InterfaceVersion) -> Self {
        self.interface_version = version;
        self
    }

    pub fn address_range(mut self, range: &str) -> Self {
        self.address_range = range.to_string();
        self
    }

    pub fn build(self) -> BindTransceiver {
        BindTransceiver {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            system_id: self.system_id,
            password: self.password,
            system_type: self.system_type,
            interface_version: self.interface_version,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: self.address_range,
        }
    }
}

impl Encodable for BindTransceiver {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(CommandId::BindTransceiver, self.command_status, self.sequence_number)
            .encode(buf)?;
        encode_cstring(buf, &self.system_id, SYSTEM_ID_LEN, "system_id")?;
        encode_cstring(buf, &self.password, PASSWORD_LEN, "password")?;
        encode_cstring(buf, &self.system_type, SYSTEM_TYPE_LEN, "system_type")?;
        encode_u8(buf, self.interface_version as u8);
        encode_u8(buf, self.addr_ton as u8);
        encode_u8(buf, self.addr_npi as u8);
        encode_cstring(buf, &self.address_range, ADDRESS_RANGE_LEN, "address_range")
    }
}

impl Decodable for BindTransceiver {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let system_id = decode_cstring(buf, SYSTEM_ID_LEN, "system_id")?;
        let password = decode_cstring(buf, PASSWORD_LEN, "password")?;
        let system_type = decode_cstring(buf, SYSTEM_TYPE_LEN, "system_type")?;
        let interface_version = InterfaceVersion::try_from(decode_u8(buf)?).map_err(|e| {
            CodecError::FieldValidation {
                field: "interface_version",
                reason: e.to_string(),
            }
        })?;
        let addr_ton = TypeOfNumber::try_from(decode_u8(buf)?).unwrap_or_default();
        let addr_npi = NumericPlanIndicator::try_from(decode_u8(buf)?).unwrap_or_default();
        let address_range = decode_cstring(buf, ADDRESS_RANGE_LEN, "address_range")?;

        Ok(BindTransceiver {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }

    fn command_id() -> CommandId {
        CommandId::BindTransceiver
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindTransceiverResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub tlvs: Vec<Tlv>,
}

impl BindTransceiverResponse {
    pub fn new(sequence_number: u32, system_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            tlvs: Vec::new(),
        }
    }

    pub fn error(sequence_number: u32, command_status: CommandStatus) -> Self {
        Self {
            command_status,
            sequence_number,
            system_id: String::new(),
            tlvs: Vec::new(),
        }
    }

    /// SMPP version the SMSC reports, if it sent one
    pub fn sc_interface_version(&self) -> Option<u8> {
        find_tlv(&self.tlvs, tags::SC_INTERFACE_VERSION).and_then(Tlv::as_u8)
    }
}

impl Encodable for BindTransceiverResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_body(
            CommandId::BindTransceiverResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf)?;
        encode_cstring(buf, &self.system_id, SYSTEM_ID_LEN, "system_id")?;
        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for BindTransceiverResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        // A failed bind may come back with no body at all
        let system_id = if buf.has_remaining() {
            decode_cstring(buf, SYSTEM_ID_LEN, "system_id")?
        } else {
            String::new()
        };
        Ok(BindTransceiverResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            tlvs: decode_tlvs(buf)?,
        })
    }

    fn command_id() -> CommandId {
        CommandId::BindTransceiverResp
    }
}
