// ABOUTME: GSM 03.38 default alphabet with its extension table, one septet per octet or packed
// ABOUTME: Packing supports leading fill bits so user data can follow a UDH on a septet boundary

use super::EncodingError;

/// Escape to the extension table
pub const ESC: u8 = 0x1B;
const CR: u8 = 0x0D;

#[rustfmt::skip]
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1B}', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

const EXTENSION: [(char, u8); 10] = [
    ('\u{0C}', 0x0A),
    ('^', 0x14),
    ('{', 0x28),
    ('}', 0x29),
    ('\\', 0x2F),
    ('[', 0x3C),
    ('~', 0x3D),
    (']', 0x3E),
    ('|', 0x40),
    ('€', 0x65),
];

fn basic_code(ch: char) -> Option<u8> {
    if ch == '\u{1B}' {
        return None;
    }
    BASIC.iter().position(|&c| c == ch).map(|i| i as u8)
}

fn extension_code(ch: char) -> Option<u8> {
    EXTENSION.iter().find(|(c, _)| *c == ch).map(|(_, code)| *code)
}

/// Septets for one character: one for the basic table, ESC plus one for the
/// extension table.
pub fn encode_char(ch: char, position: usize, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    if let Some(code) = basic_code(ch) {
        out.push(code);
    } else if let Some(code) = extension_code(ch) {
        out.push(ESC);
        out.push(code);
    } else {
        return Err(EncodingError::Unrepresentable {
            ch,
            position,
            encoding: "gsm7bit",
        });
    }
    Ok(())
}

/// Decode unpacked septets. An escape followed by an undefined extension
/// code falls back to the basic table character, a trailing escape becomes a
/// space.
pub fn decode_septets(septets: &[u8]) -> String {
    let mut text = String::with_capacity(septets.len());
    let mut iter = septets.iter().map(|s| s & 0x7F);
    while let Some(septet) = iter.next() {
        if septet != ESC {
            text.push(BASIC[septet as usize]);
            continue;
        }
        match iter.next() {
            Some(ESC) | None => text.push(' '),
            Some(code) => {
                let ch = EXTENSION
                    .iter()
                    .find(|(_, c)| *c == code)
                    .map(|(ch, _)| *ch)
                    .unwrap_or(BASIC[code as usize]);
                text.push(ch);
            }
        }
    }
    text
}

/// Pack septets LSB first after `fill_bits` zero bits. When the last octet
/// would end with seven unused bits they are filled with CR so the receiver
/// does not read a trailing '@'.
pub fn pack(septets: &[u8], fill_bits: usize) -> Vec<u8> {
    let mut bits = fill_bits + septets.len() * 7;
    let pad_with_cr = bits % 8 == 1;
    if pad_with_cr {
        bits += 7;
    }

    let mut out = vec![0u8; bits.div_ceil(8)];
    let mut put = |bit: usize, septet: u8| {
        let value = u16::from(septet & 0x7F) << (bit % 8);
        out[bit / 8] |= value as u8;
        if bit % 8 > 1 {
            out[bit / 8 + 1] |= (value >> 8) as u8;
        }
    };

    let mut bit = fill_bits;
    for &septet in septets {
        put(bit, septet);
        bit += 7;
    }
    if pad_with_cr {
        put(bit, CR);
    }
    out
}

/// Unpack every whole septet following `fill_bits`. A CR that exactly fills
/// the last seven bits is treated as padding and dropped.
pub fn unpack(octets: &[u8], fill_bits: usize) -> Vec<u8> {
    let available = (octets.len() * 8).saturating_sub(fill_bits);
    let count = available / 7;

    let mut septets = Vec::with_capacity(count);
    for i in 0..count {
        let bit = fill_bits + i * 7;
        let low = u16::from(octets[bit / 8]);
        let high = octets.get(bit / 8 + 1).copied().map_or(0, u16::from);
        septets.push((((high << 8) | low) >> (bit % 8)) as u8 & 0x7F);
    }

    if available % 7 == 0 && septets.last() == Some(&CR) {
        septets.pop();
    }
    septets
}
