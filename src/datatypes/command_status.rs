use num_enum::TryFromPrimitive;

/// Outcome carried in the command_status header field. Requests always carry
/// `Ok`; responses and generic_nack report the SMSC's verdict.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Ok = 0x0000_0000,
    InvalidMsgLength = 0x0000_0001,
    InvalidCommandLength = 0x0000_0002,
    InvalidCommandId = 0x0000_0003,
    IncorrectBindStatus = 0x0000_0004,
    AlreadyBoundState = 0x0000_0005,
    InvalidPriorityFlag = 0x0000_0006,
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    SystemError = 0x0000_0008,
    InvalidSourceAddress = 0x0000_000A,
    InvalidDestinationAddress = 0x0000_000B,
    InvalidMessageId = 0x0000_000C,
    BindFailed = 0x0000_000D,
    InvalidPassword = 0x0000_000E,
    InvalidSystemId = 0x0000_000F,
    MessageQueueFull = 0x0000_0014,
    InvalidServiceType = 0x0000_0015,
    InvalidEsmClassFieldData = 0x0000_0043,
    SubmitFailed = 0x0000_0045,
    InvalidSourceAddressTon = 0x0000_0048,
    InvalidSourceAddressNpi = 0x0000_0049,
    InvalidDestinationAddressTon = 0x0000_0050,
    InvalidDestinationAddressNpi = 0x0000_0051,
    InvalidSystemTypeField = 0x0000_0053,
    ThrottlingError = 0x0000_0058,
    InvalidScheduledDeliveryTime = 0x0000_0061,
    InvalidExpiryTime = 0x0000_0062,
    ReceiverTemporaryAppError = 0x0000_0064,
    ReceiverPermanentAppError = 0x0000_0065,
    ReceiverRejectMessageError = 0x0000_0066,
    ErrorInOptionalPartofPduBody = 0x0000_00C0,
    InvalidParameterLength = 0x0000_00C2,
    InvalidOptionalParameterValue = 0x0000_00C4,
    DeliveryFailed = 0x0000_00FE,
    UnknownError = 0x0000_00FF,
}

impl CommandStatus {
    /// Map a raw status to a known variant. Vendor specific and reserved codes
    /// collapse to `UnknownError` so a response is never dropped for its status.
    pub fn from_raw(raw: u32) -> Self {
        Self::try_from(raw).unwrap_or(CommandStatus::UnknownError)
    }

    pub fn is_ok(&self) -> bool {
        *self == CommandStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_status_maps_to_unknown_error() {
        assert_eq!(CommandStatus::from_raw(0x0000_0400), CommandStatus::UnknownError);
        assert_eq!(CommandStatus::from_raw(0x58), CommandStatus::ThrottlingError);
        assert!(CommandStatus::from_raw(0).is_ok());
    }
}
