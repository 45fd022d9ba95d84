// ABOUTME: SMPP esm_class bitfield carried on submit_sm, deliver_sm and data_sm
// ABOUTME: Exposes the UDHI flag and the delivery receipt message type used by this client

use std::fmt;

/// esm_class octet.
///
/// Bits 1-0 select the messaging mode, bits 5-2 the message type and bits 7-6
/// the GSM network features. Every octet value is accepted so that inbound PDUs
/// from any SMSC can be decoded; the accessors interpret only what a load
/// generator needs.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EsmClass(u8);

impl EsmClass {
    const MODE_MASK: u8 = 0b0000_0011;
    const TYPE_MASK: u8 = 0b0011_1100;
    const UDHI: u8 = 0b0100_0000;
    const REPLY_PATH: u8 = 0b1000_0000;

    const TYPE_DELIVERY_RECEIPT: u8 = 0b0000_0100;
    const TYPE_INTERMEDIATE_NOTIFICATION: u8 = 0b0010_0000;

    pub const fn from_byte(value: u8) -> Self {
        Self(value)
    }

    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Default mode, default type, no features.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Marks the short message as beginning with a user data header.
    pub const fn with_udhi(self) -> Self {
        Self(self.0 | Self::UDHI)
    }

    pub const fn has_udhi(self) -> bool {
        self.0 & Self::UDHI != 0
    }

    pub const fn has_reply_path(self) -> bool {
        self.0 & Self::REPLY_PATH != 0
    }

    pub const fn messaging_mode(self) -> u8 {
        self.0 & Self::MODE_MASK
    }

    /// True for SMSC delivery receipts and intermediate notifications, which
    /// arrive on deliver_sm alongside mobile originated traffic.
    pub const fn is_delivery_receipt(self) -> bool {
        let kind = self.0 & Self::TYPE_MASK;
        kind == Self::TYPE_DELIVERY_RECEIPT || kind == Self::TYPE_INTERMEDIATE_NOTIFICATION
    }
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EsmClass({:#04x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udhi_flag() {
        let esm = EsmClass::none().with_udhi();
        assert_eq!(esm.to_byte(), 0x40);
        assert!(esm.has_udhi());
        assert!(!EsmClass::none().has_udhi());
    }

    #[test]
    fn delivery_receipt_type() {
        assert!(EsmClass::from_byte(0x04).is_delivery_receipt());
        assert!(EsmClass::from_byte(0x20).is_delivery_receipt());
        assert!(!EsmClass::from_byte(0x40).is_delivery_receipt());
        assert!(!EsmClass::from_byte(0x00).is_delivery_receipt());
    }
}
