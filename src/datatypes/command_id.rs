use num_enum::TryFromPrimitive;

/// Command identifiers for the PDUs a transceiver exchanges with an SMSC.
///
/// Only the operations this client sends or expects to receive are listed.
/// Any other identifier on the wire is surfaced as an unknown frame by the
/// codec rather than rejected.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    DataSm = 0x0000_0103,
    DataSmResp = 0x8000_0103,
}

impl CommandId {
    /// Check if this command_id represents a response PDU
    pub fn is_response(&self) -> bool {
        (*self as u32) & 0x8000_0000 != 0
    }

    /// Response bit check on a raw identifier, used for ids outside the enum.
    pub fn is_response_id(raw: u32) -> bool {
        raw & 0x8000_0000 != 0
    }
}
