//! Filter-name substitution for non-image files.
//!
//! Three tokens are recognised:
//!
//! | Token | Replaced with (for `WHITE_BLACK`) |
//! |---|---|
//! | `{{FILTER}}` | `WHITE_BLACK` |
//! | `{{filter}}` | `white_black` |
//! | `{{filter name}}` | `white black` |
//!
//! Files are decoded and re-encoded with the run's configured encoding.
//! Bytes that are not valid in that encoding make the job fail rather than
//! silently writing replacement characters.
//!
//! `encoding_rs` only encodes to ASCII-compatible encodings (UTF-16 maps to
//! UTF-8 on output), so UTF-16LE and UTF-16BE are written by hand.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

pub const UPPER_TOKEN: &str = "{{FILTER}}";
pub const LOWER_TOKEN: &str = "{{filter}}";
pub const SPACED_TOKEN: &str = "{{filter name}}";

/// The decoded bytes were not valid in the requested encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedText;

/// Replace every filter token in `text`.
pub fn substitute(text: &str, filter_name: &str) -> String {
    let lower = filter_name.to_lowercase();
    text.replace(UPPER_TOKEN, &filter_name.to_uppercase())
        .replace(LOWER_TOKEN, &lower)
        .replace(SPACED_TOKEN, &lower.replace(['_', '-'], " "))
}

/// Decode `bytes`, substitute, and encode back with the same encoding.
pub fn render(
    bytes: &[u8],
    filter_name: &str,
    encoding: &'static Encoding,
) -> Result<Vec<u8>, MalformedText> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(MalformedText);
    }
    encode(&substitute(&text, filter_name), encoding)
}

fn encode(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>, MalformedText> {
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    let (encoded, used, unmappable) = encoding.encode(text);
    if unmappable || used != encoding {
        return Err(MalformedText);
    }
    Ok(encoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tokens_substituted() {
        let out = substitute(
            "{{FILTER}} / {{filter}} / {{filter name}} / {{FILTER}}",
            "WHITE_BLACK",
        );
        assert_eq!(out, "WHITE_BLACK / white_black / white black / WHITE_BLACK");
    }

    #[test]
    fn text_without_tokens_unchanged() {
        assert_eq!(substitute("plain {text}", "ONLY_RED"), "plain {text}");
    }

    #[test]
    fn render_round_trips_latin1() {
        let latin1 = encoding_rs::WINDOWS_1252;
        let (input, _, _) = latin1.encode("Café {{filter}}");
        let out = render(&input, "ONLY_RED", latin1).unwrap();
        let (decoded, _, _) = latin1.decode(&out);
        assert_eq!(decoded, "Café only_red");
        assert_eq!(out[3], 0xE9);
    }

    #[test]
    fn invalid_utf8_rejected() {
        let result = render(&[0x66, 0xFF, 0xFE, 0x00], "ORIGINAL", encoding_rs::UTF_8);
        assert_eq!(result, Err(MalformedText));
    }

    fn utf16(text: &str, to_bytes: fn(u16) -> [u8; 2]) -> Vec<u8> {
        text.encode_utf16().flat_map(to_bytes).collect()
    }

    #[test]
    fn utf16le_stays_utf16le() {
        let input = utf16("hi {{filter}}", u16::to_le_bytes);
        let out = render(&input, "ONLY_RED", UTF_16LE).unwrap();
        assert_eq!(out, utf16("hi only_red", u16::to_le_bytes));
        assert_eq!(&out[..4], &[104, 0, 105, 0]);
    }

    #[test]
    fn utf16be_stays_utf16be() {
        let input = utf16("\u{FEFF}é {{FILTER}}", u16::to_be_bytes);
        let out = render(&input, "ORIGINAL", UTF_16BE).unwrap();
        assert_eq!(out, utf16("\u{FEFF}é ORIGINAL", u16::to_be_bytes));
    }

    #[test]
    fn odd_length_utf16_rejected() {
        assert_eq!(render(&[104, 0, 105], "ORIGINAL", UTF_16LE), Err(MalformedText));
    }

    #[test]
    fn utf8_passes_through() {
        let out = render("ünïcode {{FILTER}}".as_bytes(), "original", encoding_rs::UTF_8).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ünïcode ORIGINAL");
    }
}
