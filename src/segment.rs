// ABOUTME: Splits encoded text into short message units, adding the 8-bit concatenation UDH
// ABOUTME: Segments end on character boundaries so escapes and surrogate pairs stay whole

use crate::datatypes::EsmClass;
use crate::encoding::{EncodedText, Encoding, EncodingError};
use bytes::{BufMut, Bytes, BytesMut};

/// Length of the concatenation user data header, length octet included
pub const UDH_LEN: usize = 6;

const IEI_CONCAT_8BIT: u8 = 0x00;
const MAX_SEGMENTS: usize = 255;

/// Position of a unit within a concatenated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatInfo {
    pub reference: u8,
    pub total: u8,
    /// 1-based
    pub sequence: u8,
}

impl ConcatInfo {
    fn header(&self) -> [u8; UDH_LEN] {
        [
            0x05,
            IEI_CONCAT_8BIT,
            0x03,
            self.reference,
            self.total,
            self.sequence,
        ]
    }
}

/// One submittable short message payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageUnit {
    /// short_message contents, concatenation header first when present
    pub payload: Bytes,
    pub encoding: Encoding,
    pub concat: Option<ConcatInfo>,
}

impl MessageUnit {
    pub fn data_coding(&self) -> u8 {
        self.encoding.data_coding()
    }

    pub fn esm_class(&self) -> EsmClass {
        match self.concat {
            Some(_) => EsmClass::none().with_udhi(),
            None => EsmClass::none(),
        }
    }

    /// Payload without the concatenation header
    pub fn user_data(&self) -> &[u8] {
        match self.concat {
            Some(_) => &self.payload[UDH_LEN..],
            None => &self.payload,
        }
    }

    /// Text carried by this unit alone
    pub fn decode_text(&self) -> String {
        let fill_bits = match self.concat {
            Some(_) if self.encoding.is_packed() => 1,
            _ => 0,
        };
        self.encoding.decode_user_data(self.user_data(), fill_bits)
    }
}

/// Split `text` into units for submission, using a random concatenation
/// reference shared by all segments.
///
/// Without `multi_segment` the whole text goes out as one unit whatever its
/// length. With it, text over the single message limit is split into at most
/// 255 segments returned in sequence order.
pub fn segment(
    text: &str,
    encoding: Encoding,
    multi_segment: bool,
) -> Result<Vec<MessageUnit>, EncodingError> {
    segment_with_reference(text, encoding, multi_segment, rand::random::<u8>())
}

pub fn segment_with_reference(
    text: &str,
    encoding: Encoding,
    multi_segment: bool,
    reference: u8,
) -> Result<Vec<MessageUnit>, EncodingError> {
    let encoded = encoding.encode_units(text)?;
    let limits = encoding.limits();

    if !multi_segment || encoded.units.len() <= limits.single {
        return Ok(vec![MessageUnit {
            payload: Bytes::from(encoding.finish(&encoded.units, 0)),
            encoding,
            concat: None,
        }]);
    }

    let ranges = split_ranges(&encoded, limits.segment);
    if ranges.len() > MAX_SEGMENTS {
        return Err(EncodingError::TooManySegments {
            needed: ranges.len(),
        });
    }

    let total = ranges.len() as u8;
    let fill_bits = if encoding.is_packed() { 1 } else { 0 };

    let units = ranges
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| {
            let concat = ConcatInfo {
                reference,
                total,
                sequence: (i + 1) as u8,
            };
            let user_data = encoding.finish(&encoded.units[start..end], fill_bits);

            let mut payload = BytesMut::with_capacity(UDH_LEN + user_data.len());
            payload.put_slice(&concat.header());
            payload.put_slice(&user_data);

            MessageUnit {
                payload: payload.freeze(),
                encoding,
                concat: Some(concat),
            }
        })
        .collect();

    Ok(units)
}

/// Greedy split on character boundaries, each range at most `limit` units.
fn split_ranges(encoded: &EncodedText, limit: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut last_boundary = 0;

    for &boundary in &encoded.boundaries {
        if boundary - start > limit {
            ranges.push((start, last_boundary));
            start = last_boundary;
        }
        last_boundary = boundary;
    }
    if last_boundary > start {
        ranges.push((start, last_boundary));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::gsm7;

    fn joined(units: &[MessageUnit]) -> String {
        units.iter().map(MessageUnit::decode_text).collect()
    }

    fn assert_concat_laws(units: &[MessageUnit], reference: u8) {
        let total = units.len();
        for (i, unit) in units.iter().enumerate() {
            let concat = unit.concat.expect("segmented unit without concat info");
            assert_eq!(concat.reference, reference);
            assert_eq!(concat.total as usize, total);
            assert_eq!(concat.sequence as usize, i + 1);
            assert_eq!(
                &unit.payload[..UDH_LEN],
                &[0x05, 0x00, 0x03, reference, total as u8, (i + 1) as u8]
            );
            assert!(unit.esm_class().has_udhi());
        }
    }

    #[test]
    fn single_unit_without_multi_segment() {
        let text = "x".repeat(400);
        let units = segment_with_reference(&text, Encoding::Gsm7Bit, false, 1).unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].concat.is_none());
        assert_eq!(units[0].payload.len(), 400);
        assert_eq!(units[0].decode_text(), text);
    }

    #[test]
    fn short_text_same_with_or_without_multi_segment() {
        for enc in Encoding::ALL {
            let a = segment_with_reference("load-test", enc, true, 9).unwrap();
            let b = segment_with_reference("load-test", enc, false, 9).unwrap();
            assert_eq!(a, b, "{enc}");
            assert_eq!(a.len(), 1);
        }
    }

    #[test]
    fn empty_text_is_one_empty_unit() {
        for enc in Encoding::ALL {
            let units = segment_with_reference("", enc, true, 3).unwrap();
            assert_eq!(units.len(), 1, "{enc}");
            assert!(units[0].concat.is_none());
            assert!(units[0].payload.is_empty(), "{enc}");
        }
    }

    #[test]
    fn gsm_text_at_exact_single_limit() {
        let text = "a".repeat(160);
        let units = segment_with_reference(&text, Encoding::Gsm7BitPacked, true, 3).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].payload.len(), 140);
    }

    #[test]
    fn gsm_161_chars_make_two_segments() {
        let text = "b".repeat(161);
        let units = segment_with_reference(&text, Encoding::Gsm7Bit, true, 42).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].user_data().len(), 153);
        assert_eq!(units[1].user_data().len(), 8);
        assert_concat_laws(&units, 42);
        assert_eq!(joined(&units), text);
    }

    #[test]
    fn packed_segments_fit_140_octets() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        let units = segment_with_reference(&text, Encoding::Gsm7BitPacked, true, 7).unwrap();
        assert_eq!(units.len(), 3);
        for unit in &units {
            assert!(unit.payload.len() <= 140, "{}", unit.payload.len());
        }
        assert_eq!(units[0].payload.len(), 140);
        assert_concat_laws(&units, 7);
        assert_eq!(joined(&units), text);
    }

    #[test]
    fn ucs2_segments_hold_67_characters() {
        let text = "ж".repeat(71);
        let units = segment_with_reference(&text, Encoding::Ucs2, true, 200).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].user_data().len(), 134);
        assert_eq!(units[1].user_data().len(), 8);
        assert_concat_laws(&units, 200);
        assert_eq!(joined(&units), text);
    }

    #[test]
    fn escape_sequence_never_split() {
        let text = format!("{}€{}", "a".repeat(152), "b".repeat(20));
        let units = segment_with_reference(&text, Encoding::Gsm7Bit, true, 1).unwrap();
        assert_eq!(units[0].user_data().len(), 152);
        assert_eq!(units[1].user_data()[0], gsm7::ESC);
        assert_eq!(joined(&units), text);
    }

    #[test]
    fn surrogate_pair_never_split() {
        let text = format!("{}😀{}", "a".repeat(66), "b".repeat(10));
        let units = segment_with_reference(&text, Encoding::Ucs2, true, 1).unwrap();
        assert_eq!(units[0].user_data().len(), 132);
        assert_eq!(units.len(), 2);
        assert_eq!(joined(&units), text);
    }

    #[test]
    fn binary_multibyte_never_split() {
        let text = format!("{}✓{}", "a".repeat(132), "b".repeat(10));
        let units = segment_with_reference(&text, Encoding::Binary8Bit2, true, 1).unwrap();
        assert_eq!(units[0].user_data().len(), 132);
        assert_eq!(joined(&units), text);
    }

    #[test]
    fn concatenated_raw_user_data_decodes_once() {
        let text = "Ünïcödé Grüße ".repeat(20);
        for enc in [Encoding::Latin1, Encoding::Ucs2, Encoding::Binary8Bit1] {
            let units = segment_with_reference(&text, enc, true, 5).unwrap();
            assert!(units.len() > 1, "{enc}");
            let raw: Vec<u8> = units.iter().flat_map(|u| u.user_data().to_vec()).collect();
            assert_eq!(enc.decode(&raw), text, "{enc}");
        }
    }

    #[test]
    fn every_encoding_roundtrips_long_text() {
        let samples = [
            (Encoding::Gsm7Bit, "Sale {today} only € 5 - ".repeat(15)),
            (Encoding::Gsm7BitPacked, "Sale {today} only € 5 - ".repeat(15)),
            (Encoding::Latin1, "Café crème ".repeat(20)),
            (Encoding::Ascii, "plain ascii ".repeat(20)),
            (Encoding::Cyrillic, "Привет мир ".repeat(20)),
            (Encoding::Hebrew, "שלום עולם ".repeat(20)),
            (Encoding::Binary8Bit1, "bytes ✓ ".repeat(30)),
            (Encoding::Binary8Bit2, "bytes ✓ ".repeat(30)),
            (Encoding::Ucs2, "emoji 😀 中文 ".repeat(20)),
        ];
        for (enc, text) in samples {
            let units = segment_with_reference(&text, enc, true, 77).unwrap();
            assert!(units.len() > 1, "{enc}");
            assert_concat_laws(&units, 77);
            assert_eq!(joined(&units), text, "{enc}");
        }
    }

    #[test]
    fn too_many_segments() {
        let text = "c".repeat(153 * 255 + 1);
        let err = segment_with_reference(&text, Encoding::Gsm7Bit, true, 1).unwrap_err();
        assert_eq!(err, EncodingError::TooManySegments { needed: 256 });

        let text = "c".repeat(153 * 255);
        assert_eq!(
            segment_with_reference(&text, Encoding::Gsm7Bit, true, 1).unwrap().len(),
            255
        );
    }

    #[test]
    fn unrepresentable_text_is_an_error() {
        assert!(matches!(
            segment("Привет", Encoding::Ascii, true),
            Err(EncodingError::Unrepresentable { position: 0, .. })
        ));
    }

    #[test]
    fn random_reference_is_shared() {
        let units = segment(&"d".repeat(500), Encoding::Latin1, true).unwrap();
        let reference = units[0].concat.unwrap().reference;
        assert_concat_laws(&units, reference);
    }
}
