use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// Session logoff. Sent by this client on close, or received from the SMSC,
/// in which case an `UnbindResponse` is returned and the session ends.
#[derive(Clone, Debug, PartialEq)]
pub struct Unbind {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnbindResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(Unbind, CommandId::Unbind);
impl_complete_header_only_pdu!(UnbindResponse, CommandId::UnbindResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decodable, Encodable, PduHeader};
    use std::io::Cursor;

    #[test]
    fn unbind_roundtrip_new_codec() {
        let original = Unbind::new(123);
        let bytes = original.to_bytes().unwrap();

        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = Unbind::decode(header, &mut cursor).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn unbind_response_rejects_body() {
        let mut bytes = UnbindResponse::new(9).to_bytes().unwrap().to_vec();
        bytes.extend_from_slice(&[0, 0]);
        bytes[3] = 18;

        let mut cursor = Cursor::new(bytes.as_slice());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert!(UnbindResponse::decode(header, &mut cursor).is_err());
    }
}
