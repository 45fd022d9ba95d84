// ABOUTME: Encoding selection by name and the text codecs behind each SMPP data_coding
// ABOUTME: Reports per-encoding single message and per-segment capacity used by the segmenter

pub mod gsm7;

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    #[error("character {ch:?} at position {position} cannot be represented in {encoding}")]
    Unrepresentable {
        ch: char,
        position: usize,
        encoding: &'static str,
    },

    #[error("message needs {needed} segments, the concatenation header allows at most 255")]
    TooManySegments { needed: usize },
}

/// Capacity in encoding units: septets for the GSM alphabets, octets for
/// everything else (UCS-2 code units count as two octets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Longest text sent without a concatenation header
    pub single: usize,
    /// User data per segment once the 6 octet header is present
    pub segment: usize,
}

const GSM_LIMITS: Limits = Limits {
    single: 160,
    segment: 153,
};

const OCTET_LIMITS: Limits = Limits {
    single: 140,
    segment: 134,
};

/// Text encoding scheme used for short message user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Gsm7Bit,
    Gsm7BitPacked,
    Latin1,
    Ascii,
    Cyrillic,
    Binary8Bit1,
    Binary8Bit2,
    Hebrew,
    Ucs2,
}

/// Unpacked user data with the end offset of every source character, so
/// splitting can stay on character boundaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedText {
    pub units: Vec<u8>,
    pub boundaries: Vec<usize>,
}

impl Encoding {
    pub const ALL: [Encoding; 9] = [
        Encoding::Gsm7Bit,
        Encoding::Gsm7BitPacked,
        Encoding::Latin1,
        Encoding::Ascii,
        Encoding::Cyrillic,
        Encoding::Binary8Bit1,
        Encoding::Binary8Bit2,
        Encoding::Hebrew,
        Encoding::Ucs2,
    ];

    /// Pick an encoding by name, ignoring case.
    ///
    /// Unrecognised or empty names select UCS-2, which can carry any text
    /// this tool will be given. Callers that want to flag typos should
    /// compare [`Encoding::name`] with what they passed in.
    pub fn select(name: &str) -> Encoding {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|enc| enc.name().eq_ignore_ascii_case(name))
            .unwrap_or(Encoding::Ucs2)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Gsm7Bit => "gsm7bit",
            Encoding::Gsm7BitPacked => "gsm7bit_packed",
            Encoding::Latin1 => "latin1",
            Encoding::Ascii => "ascii",
            Encoding::Cyrillic => "cyrillic",
            Encoding::Binary8Bit1 => "binary8bit1",
            Encoding::Binary8Bit2 => "binary8bit2",
            Encoding::Hebrew => "hebrew",
            Encoding::Ucs2 => "ucs2",
        }
    }

    pub fn data_coding(&self) -> u8 {
        match self {
            Encoding::Gsm7Bit | Encoding::Gsm7BitPacked => 0x00,
            Encoding::Ascii => 0x01,
            Encoding::Binary8Bit1 => 0x02,
            Encoding::Latin1 => 0x03,
            Encoding::Binary8Bit2 => 0x04,
            Encoding::Cyrillic => 0x06,
            Encoding::Hebrew => 0x07,
            Encoding::Ucs2 => 0x08,
        }
    }

    /// Encoding to use when reading inbound user data. The SMSC default
    /// alphabet is assumed to arrive unpacked.
    pub fn from_data_coding(data_coding: u8) -> Option<Encoding> {
        match data_coding {
            0x00 => Some(Encoding::Gsm7Bit),
            0x01 => Some(Encoding::Ascii),
            0x02 => Some(Encoding::Binary8Bit1),
            0x03 => Some(Encoding::Latin1),
            0x04 => Some(Encoding::Binary8Bit2),
            0x06 => Some(Encoding::Cyrillic),
            0x07 => Some(Encoding::Hebrew),
            0x08 => Some(Encoding::Ucs2),
            _ => None,
        }
    }

    pub fn limits(&self) -> Limits {
        match self {
            Encoding::Gsm7Bit | Encoding::Gsm7BitPacked => GSM_LIMITS,
            _ => OCTET_LIMITS,
        }
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, Encoding::Gsm7BitPacked)
    }

    /// Encode `text` to user data ready for short_message.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
        let encoded = self.encode_units(text)?;
        Ok(self.finish(&encoded.units, 0))
    }

    /// Decode user data that starts on an octet boundary.
    pub fn decode(&self, data: &[u8]) -> String {
        self.decode_user_data(data, 0)
    }

    /// Decode user data that follows `fill_bits` padding bits. Only packed
    /// GSM uses the fill; the other encodings are octet aligned anyway.
    pub fn decode_user_data(&self, data: &[u8], fill_bits: usize) -> String {
        match self {
            Encoding::Gsm7Bit => gsm7::decode_septets(data),
            Encoding::Gsm7BitPacked => gsm7::decode_septets(&gsm7::unpack(data, fill_bits)),
            Encoding::Latin1 => data.iter().map(|&b| char::from(b)).collect(),
            Encoding::Ascii => data
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
                .collect(),
            Encoding::Cyrillic => decode_single_byte(encoding_rs::ISO_8859_5, data),
            Encoding::Hebrew => decode_single_byte(encoding_rs::ISO_8859_8, data),
            Encoding::Binary8Bit1 | Encoding::Binary8Bit2 => {
                String::from_utf8_lossy(data).into_owned()
            }
            Encoding::Ucs2 => {
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }

    /// Encode to unpacked units, recording where each character ends.
    pub fn encode_units(&self, text: &str) -> Result<EncodedText, EncodingError> {
        let mut encoded = EncodedText {
            units: Vec::with_capacity(text.len() * 2),
            boundaries: Vec::with_capacity(text.len()),
        };

        for (position, ch) in text.chars().enumerate() {
            self.encode_char(ch, position, &mut encoded.units)?;
            encoded.boundaries.push(encoded.units.len());
        }
        Ok(encoded)
    }

    /// Turn unpacked units into wire user data, packing if needed.
    pub fn finish(&self, units: &[u8], fill_bits: usize) -> Vec<u8> {
        if self.is_packed() {
            gsm7::pack(units, fill_bits)
        } else {
            units.to_vec()
        }
    }

    fn encode_char(&self, ch: char, position: usize, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        let unrepresentable = || EncodingError::Unrepresentable {
            ch,
            position,
            encoding: self.name(),
        };

        match self {
            Encoding::Gsm7Bit | Encoding::Gsm7BitPacked => {
                gsm7::encode_char(ch, position, out).map_err(|_| unrepresentable())?
            }
            Encoding::Latin1 => out.push(u8::try_from(u32::from(ch)).map_err(|_| unrepresentable())?),
            Encoding::Ascii => {
                if !ch.is_ascii() {
                    return Err(unrepresentable());
                }
                out.push(ch as u8);
            }
            Encoding::Cyrillic => {
                out.push(encode_single_byte(encoding_rs::ISO_8859_5, ch).ok_or_else(unrepresentable)?)
            }
            Encoding::Hebrew => {
                out.push(encode_single_byte(encoding_rs::ISO_8859_8, ch).ok_or_else(unrepresentable)?)
            }
            Encoding::Binary8Bit1 | Encoding::Binary8Bit2 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            Encoding::Ucs2 => {
                let mut buf = [0u16; 2];
                for unit in ch.encode_utf16(&mut buf) {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn encode_single_byte(table: &'static encoding_rs::Encoding, ch: char) -> Option<u8> {
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = table.encode(ch.encode_utf8(&mut buf));
    match (had_errors, bytes.as_ref()) {
        (false, [byte]) => Some(*byte),
        _ => None,
    }
}

fn decode_single_byte(table: &'static encoding_rs::Encoding, data: &[u8]) -> String {
    table.decode_without_bom_handling(data).0.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_case_insensitive() {
        assert_eq!(Encoding::select("GSM7BIT"), Encoding::Gsm7Bit);
        assert_eq!(Encoding::select("gsm7bit_packed"), Encoding::Gsm7BitPacked);
        assert_eq!(Encoding::select("Latin1"), Encoding::Latin1);
        assert_eq!(Encoding::select("hebrew"), Encoding::Hebrew);
        assert_eq!(Encoding::select("Binary8Bit2"), Encoding::Binary8Bit2);
    }

    #[test]
    fn select_defaults_to_ucs2() {
        assert_eq!(Encoding::select(""), Encoding::Ucs2);
        assert_eq!(Encoding::select("utf8"), Encoding::Ucs2);
        assert_eq!(Encoding::select("gsm-7"), Encoding::Ucs2);
    }

    #[test]
    fn every_name_selects_itself() {
        for enc in Encoding::ALL {
            assert_eq!(Encoding::select(enc.name()), enc);
        }
    }

    #[test]
    fn data_coding_values() {
        let codes: Vec<u8> = Encoding::ALL.iter().map(Encoding::data_coding).collect();
        assert_eq!(codes, vec![0x00, 0x00, 0x03, 0x01, 0x06, 0x02, 0x04, 0x07, 0x08]);
        assert_eq!(Encoding::from_data_coding(0x08), Some(Encoding::Ucs2));
        assert_eq!(Encoding::from_data_coding(0xF0), None);
    }

    #[test]
    fn encode_decode_each_scheme() {
        let cases = [
            (Encoding::Gsm7Bit, "Hello {world} €5"),
            (Encoding::Gsm7BitPacked, "Hello {world} €5"),
            (Encoding::Latin1, "Grüße, señor"),
            (Encoding::Ascii, "plain text"),
            (Encoding::Cyrillic, "Привет мир"),
            (Encoding::Hebrew, "שלום עולם"),
            (Encoding::Binary8Bit1, "any ✓ text"),
            (Encoding::Binary8Bit2, "any ✓ text"),
            (Encoding::Ucs2, "emoji 😀 and 中文"),
        ];
        for (enc, text) in cases {
            let data = enc.encode(text).unwrap();
            assert_eq!(enc.decode(&data), text, "{enc}");
        }
    }

    #[test]
    fn single_byte_schemes_use_one_octet_per_char() {
        assert_eq!(Encoding::Cyrillic.encode("Привет").unwrap().len(), 6);
        assert_eq!(Encoding::Hebrew.encode("שלום").unwrap().len(), 4);
        assert_eq!(Encoding::Latin1.encode("ü").unwrap(), vec![0xFC]);
    }

    #[test]
    fn unrepresentable_characters() {
        assert_eq!(
            Encoding::Ascii.encode("abc é").unwrap_err(),
            EncodingError::Unrepresentable {
                ch: 'é',
                position: 4,
                encoding: "ascii"
            }
        );
        assert!(Encoding::Latin1.encode("€").is_err());
        assert!(Encoding::Cyrillic.encode("שלום").is_err());
        assert!(Encoding::Gsm7Bit.encode("Привет").is_err());
    }

    #[test]
    fn ucs2_surrogate_pair_is_one_boundary() {
        let encoded = Encoding::Ucs2.encode_units("a😀").unwrap();
        assert_eq!(encoded.units.len(), 6);
        assert_eq!(encoded.boundaries, vec![2, 6]);
    }

    #[test]
    fn gsm_escape_is_one_boundary() {
        let encoded = Encoding::Gsm7Bit.encode_units("a€b").unwrap();
        assert_eq!(encoded.units, vec![0x61, gsm7::ESC, 0x65, 0x62]);
        assert_eq!(encoded.boundaries, vec![1, 3, 4]);
    }

    #[test]
    fn limits_per_family() {
        assert_eq!(Encoding::Gsm7BitPacked.limits(), Limits { single: 160, segment: 153 });
        assert_eq!(Encoding::Ucs2.limits(), Limits { single: 140, segment: 134 });
        assert_eq!(Encoding::Latin1.limits().single, 140);
    }
}
