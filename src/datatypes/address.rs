// ABOUTME: SMPP address triple (type of number, numbering plan, digits) for source and destination
// ABOUTME: Validates the 20 octet limit once at construction so PDU encoding never truncates

use crate::codec::{CodecError, decode_cstring, decode_u8, encode_cstring, encode_u8};
use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use bytes::BytesMut;
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Longest address in octets, excluding the NUL terminator
pub const MAX_ADDRESS_LEN: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    #[error("address '{addr}' is {len} octets, maximum is {MAX_ADDRESS_LEN}")]
    TooLong { addr: String, len: usize },

    #[error("address '{0}' contains a NUL octet")]
    EmbeddedNul(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
    digits: String,
}

impl Address {
    pub fn new(
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
        digits: impl Into<String>,
    ) -> Result<Self, AddressError> {
        let digits = digits.into();
        if digits.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::TooLong {
                len: digits.len(),
                addr: digits,
            });
        }
        if digits.contains('\0') {
            return Err(AddressError::EmbeddedNul(digits));
        }
        Ok(Self { ton, npi, digits })
    }

    /// Address with unknown TON and NPI, which lets the SMSC infer both.
    pub fn unknown(digits: impl Into<String>) -> Result<Self, AddressError> {
        Self::new(TypeOfNumber::Unknown, NumericPlanIndicator::Unknown, digits)
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut, field: &'static str) -> Result<(), CodecError> {
        encode_u8(buf, self.ton as u8);
        encode_u8(buf, self.npi as u8);
        encode_cstring(buf, &self.digits, MAX_ADDRESS_LEN + 1, field)
    }

    pub(crate) fn encoded_size(&self) -> usize {
        2 + self.digits.len() + 1
    }

    /// Unrecognised TON/NPI octets decode as Unknown so inbound traffic is
    /// never refused over addressing metadata.
    pub(crate) fn decode(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<Self, CodecError> {
        let ton = TypeOfNumber::try_from(decode_u8(buf)?).unwrap_or_default();
        let npi = NumericPlanIndicator::try_from(decode_u8(buf)?).unwrap_or_default();
        let digits = decode_cstring(buf, MAX_ADDRESS_LEN + 1, field)?;
        Ok(Self { ton, npi, digits })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_length_limit() {
        assert!(Address::unknown("1".repeat(20)).is_ok());
        assert!(matches!(
            Address::unknown("1".repeat(21)),
            Err(AddressError::TooLong { len: 21, .. })
        ));
    }

    #[test]
    fn address_wire_layout() {
        let addr = Address::new(TypeOfNumber::International, NumericPlanIndicator::Isdn, "4477")
            .unwrap();
        let mut buf = BytesMut::new();
        addr.encode(&mut buf, "source_addr").unwrap();
        assert_eq!(buf.as_ref(), &[0x01, 0x01, b'4', b'4', b'7', b'7', 0x00]);
        assert_eq!(addr.encoded_size(), buf.len());

        let mut cursor = Cursor::new(buf.as_ref());
        assert_eq!(Address::decode(&mut cursor, "source_addr").unwrap(), addr);
    }

    #[test]
    fn unknown_ton_decodes_leniently() {
        let data = [0x09, 0x77, b'x', 0x00];
        let mut cursor = Cursor::new(&data[..]);
        let addr = Address::decode(&mut cursor, "source_addr").unwrap();
        assert_eq!(addr.ton, TypeOfNumber::Unknown);
        assert_eq!(addr.npi, NumericPlanIndicator::Unknown);
        assert_eq!(addr.digits(), "x");
    }
}
