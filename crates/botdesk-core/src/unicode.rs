//! Decoding of literal `\uXXXX` sequences in dialogue text.
//!
//! Some dialogue-service deployments double-encode their replies, so text
//! arrives with escapes such as `Hola\u00e9` spelled out literally. Escapes
//! are UTF-16 code units; adjacent surrogate escapes combine into one char.

use crate::error::CoreError;

const ESCAPE: &str = "\\u";

/// Replace every `\uXXXX` escape in `text` with the character it encodes.
///
/// Fails when an escape is not followed by four hex digits or when a
/// surrogate escape has no partner. Callers that must not fail should fall
/// back to the original text.
pub fn decode_unicode_escapes(text: &str) -> Result<String, CoreError> {
    if !text.contains(ESCAPE) {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut units: Vec<u16> = Vec::new();
    let mut units_start = 0;
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(ESCAPE) {
        let at = cursor + offset;
        let hex = text
            .get(at + 2..at + 6)
            .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or(CoreError::MalformedEscape { position: at })?;
        let unit =
            u16::from_str_radix(hex, 16).map_err(|_| CoreError::MalformedEscape { position: at })?;

        if at > literal_start {
            flush_units(&mut out, &mut units, units_start)?;
            out.push_str(&text[literal_start..at]);
        }
        if units.is_empty() {
            units_start = at;
        }
        units.push(unit);

        cursor = at + 6;
        literal_start = cursor;
    }

    flush_units(&mut out, &mut units, units_start)?;
    out.push_str(&text[literal_start..]);
    Ok(out)
}

fn flush_units(out: &mut String, units: &mut Vec<u16>, position: usize) -> Result<(), CoreError> {
    for decoded in char::decode_utf16(units.drain(..)) {
        match decoded {
            Ok(c) => out.push(c),
            Err(e) => {
                return Err(CoreError::UnpairedSurrogate {
                    unit: e.unpaired_surrogate(),
                    position,
                })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(decode_unicode_escapes("Hola mundo").unwrap(), "Hola mundo");
    }

    #[test]
    fn test_decodes_latin_escape() {
        assert_eq!(decode_unicode_escapes("Hola\\u00e9").unwrap(), "Holaé");
    }

    #[test]
    fn test_uppercase_hex_and_surrounding_text() {
        assert_eq!(
            decode_unicode_escapes("\\u00BFC\\u00F3mo est\\u00e1s?").unwrap(),
            "¿Cómo estás?"
        );
    }

    #[test]
    fn test_surrogate_pair_becomes_one_char() {
        assert_eq!(decode_unicode_escapes("hi \\ud83d\\ude00").unwrap(), "hi 😀");
    }

    #[test]
    fn test_truncated_escape_is_an_error() {
        assert_eq!(
            decode_unicode_escapes("\\u00"),
            Err(CoreError::MalformedEscape { position: 0 })
        );
    }

    #[test]
    fn test_non_hex_escape_is_an_error() {
        assert!(decode_unicode_escapes("price \\u00zz").is_err());
    }

    #[test]
    fn test_lone_surrogate_is_an_error() {
        assert!(matches!(
            decode_unicode_escapes("\\ud83d alone"),
            Err(CoreError::UnpairedSurrogate { unit: 0xd83d, .. })
        ));
    }

    #[test]
    fn test_multibyte_text_before_escape() {
        assert_eq!(decode_unicode_escapes("ñ\\u00f1ñ").unwrap(), "ñññ");
    }
}
