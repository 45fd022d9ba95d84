use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// Link check sent by either peer. The session's keep-alive task sends one on
/// every interval; the dispatcher answers the SMSC's with `EnquireLinkResponse`.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decodable, Encodable, PduHeader};
    use std::io::Cursor;

    #[test]
    fn enquire_link_wire_layout() {
        let bytes = EnquireLink::new(0x0102_0304).to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x00, 0x00, 0x00, 0x10, // command_length
                0x00, 0x00, 0x00, 0x15, // command_id
                0x00, 0x00, 0x00, 0x00, // command_status
                0x01, 0x02, 0x03, 0x04, // sequence_number
            ]
        );
    }

    #[test]
    fn enquire_link_response_error_roundtrip() {
        let original = EnquireLinkResponse::error(123, CommandStatus::SystemError);
        let bytes = original.to_bytes().unwrap();

        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = EnquireLinkResponse::decode(header, &mut cursor).unwrap();

        assert_eq!(original, decoded);
    }
}
