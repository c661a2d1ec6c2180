//! ISO-2022-JP transcoding.
//!
//! ISO-2022-JP is a stateful encoding: escape sequences switch between ASCII,
//! JIS X 0208 and JIS X 0201 katakana. Both functions here work on a complete
//! input, so every encoded output starts and ends in ASCII state and can be
//! decoded on its own.

use crate::error::{Error, Result};
use encoding_rs::{EncoderResult, ISO_2022_JP};

/// MIME charset name.
pub const CHARSET: &str = "ISO-2022-JP";

const ESC_ASCII: &[u8] = b"\x1b(B";
const ESC_KATAKANA: &[u8] = b"\x1b(I";

/// Encodes text as ISO-2022-JP.
///
/// The output ends in ASCII state, with a trailing `ESC ( B` when the text
/// ends in a JIS X 0208 or katakana run. Half-width katakana is written as
/// JIS X 0201 (`ESC ( I`) so it decodes to the same characters.
///
/// # Errors
///
/// Returns [`Error::Unmappable`] for the first character that has no
/// ISO-2022-JP representation, or that would decode to a different
/// character. No partial output is returned.
pub fn encode(text: &str) -> Result<Vec<u8>> {
    if let Some(err) = locate_unmappable(text) {
        return Err(err);
    }

    let mut out = Vec::with_capacity(worst_case_len(text.len()));
    let mut position = 0;
    for (katakana, run) in runs(text) {
        if katakana {
            // Stay in the previous run's shift state; ESC ( I replaces it
            if out.ends_with(ESC_ASCII) {
                out.truncate(out.len() - ESC_ASCII.len());
            }
            out.extend_from_slice(ESC_KATAKANA);
            out.extend(run.chars().filter_map(jis_x0201_katakana));
            out.extend_from_slice(ESC_ASCII);
        } else {
            encode_run(run, position, &mut out)?;
        }
        position += run.chars().count();
    }
    Ok(out)
}

/// Decodes ISO-2022-JP bytes back to text.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if the bytes are not valid ISO-2022-JP.
pub fn decode(bytes: &[u8]) -> Result<String> {
    ISO_2022_JP
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
        .ok_or(Error::Malformed)
}

/// Returns true if every character of `text` can be encoded.
#[must_use]
pub fn can_encode(text: &str) -> bool {
    locate_unmappable(text).is_none()
}

/// Upper bound on the encoded size: at most a 3-byte escape plus 2 bytes per
/// character, never more than 4 bytes per UTF-8 input byte, plus the final
/// return to ASCII.
const fn worst_case_len(utf8_len: usize) -> usize {
    utf8_len.saturating_mul(4).saturating_add(3)
}

/// Encodes a run without half-width katakana, starting and ending in ASCII
/// state. `position` is the code point index of the run within the text.
fn encode_run(run: &str, position: usize, out: &mut Vec<u8>) -> Result<()> {
    let mut encoder = ISO_2022_JP.new_encoder();
    let mut consumed = 0;

    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&run[consumed..], out, true);
        consumed += read;

        match result {
            EncoderResult::InputEmpty => return Ok(()),
            EncoderResult::OutputFull => out.reserve(worst_case_len(run.len() - consumed)),
            EncoderResult::Unmappable(character) => {
                return Err(Error::Unmappable {
                    character,
                    position: position + run[..consumed].chars().count().saturating_sub(1),
                });
            }
        }
    }
}

/// Splits text into maximal runs, flagged true for half-width katakana.
fn runs(text: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current = None;

    for (index, character) in text.char_indices() {
        let katakana = jis_x0201_katakana(character).is_some();
        match current {
            Some(previous) if previous != katakana => {
                runs.push((previous, &text[start..index]));
                start = index;
            }
            _ => {}
        }
        current = Some(katakana);
    }
    if let Some(katakana) = current {
        runs.push((katakana, &text[start..]));
    }
    runs
}

/// JIS X 0201 byte for a half-width katakana (U+FF61 to U+FF9F).
fn jis_x0201_katakana(character: char) -> Option<u8> {
    let offset = u32::from(character).checked_sub(0xFF61)?;
    u8::try_from(offset)
        .ok()
        .filter(|offset| *offset <= 0x3E)
        .map(|offset| offset + 0x21)
}

/// Finds the first character of `text` that cannot be encoded.
///
/// Mappability does not depend on shift state, so each character is tried on
/// its own. The encoder reports escape-like controls as U+FFFD; this gives the
/// caller the character that was actually in the input.
fn locate_unmappable(text: &str) -> Option<Error> {
    text.chars()
        .enumerate()
        .find(|(_, character)| !is_mappable(*character))
        .map(|(position, character)| Error::Unmappable {
            character,
            position,
        })
}

/// A character is mappable when it encodes and decodes back to itself. The
/// encoder folds a few code points (U+2212 to U+FF0D, for one) into others;
/// those count as unmappable.
fn is_mappable(character: char) -> bool {
    if jis_x0201_katakana(character).is_some() {
        return true;
    }
    let mut utf8 = [0u8; 4];
    let utf8 = character.encode_utf8(&mut utf8);
    let mut out = Vec::with_capacity(16);
    let (result, _) = ISO_2022_JP
        .new_encoder()
        .encode_from_utf8_to_vec_without_replacement(utf8, &mut out, true);
    if matches!(result, EncoderResult::Unmappable(_)) {
        return false;
    }
    ISO_2022_JP
        .decode_without_bom_handling_and_without_replacement(&out)
        .is_some_and(|decoded| decoded == *utf8)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii_has_no_escapes() {
        assert_eq!(encode("hello").unwrap(), b"hello");
        assert_eq!(encode("").unwrap(), b"");
    }

    #[test]
    fn test_encode_katakana() {
        let encoded = encode("テスト").unwrap();
        assert_eq!(encoded, b"\x1b$B%F%9%H\x1b(B");
    }

    #[test]
    fn test_encode_returns_to_ascii() {
        assert_eq!(encode("あa").unwrap(), b"\x1b$B$\"\x1b(Ba");
        assert!(encode("日本語").unwrap().ends_with(b"\x1b(B"));
    }

    #[test]
    fn test_encode_body_with_crlf() {
        let encoded = encode("テスト本文\r\n").unwrap();
        assert_eq!(encoded, b"\x1b$B%F%9%HK\\J8\x1b(B\r\n");
    }

    #[test]
    fn test_encode_is_seven_bit() {
        let encoded = encode("漢字とかなとASCII").unwrap();
        assert!(encoded.iter().all(|b| *b < 0x80));
    }

    #[test]
    fn test_encode_unmappable() {
        let err = encode("😀").unwrap_err();
        assert!(matches!(
            err,
            Error::Unmappable {
                character: '😀',
                position: 0
            }
        ));
    }

    #[test]
    fn test_encode_unmappable_position() {
        let err = encode("あいう한글").unwrap_err();
        assert_eq!(err.unmappable(), Some(('한', 3)));

        let err = encode("ab\u{1b}").unwrap_err();
        assert_eq!(err.unmappable(), Some(('\u{1b}', 2)));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(b"\x1b$B%F%9%H\x1b(B").unwrap(), "テスト");
        assert_eq!(decode(b"plain").unwrap(), "plain");
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode(b"\x1b$B%"), Err(Error::Malformed)));
        assert!(matches!(decode(&[0xff, 0xfe]), Err(Error::Malformed)));
    }

    #[test]
    fn test_round_trip() {
        for text in ["テストおおおおおお。", "ほげ ", "1234あああ", "", "Re: 日本語"] {
            assert_eq!(decode(&encode(text).unwrap()).unwrap(), text);
        }
    }

    #[test]
    fn test_encode_halfwidth_katakana() {
        assert_eq!(encode("ｱ").unwrap(), b"\x1b(I1\x1b(B");
        assert_eq!(encode("ｱｲｳ").unwrap(), b"\x1b(I123\x1b(B");
        assert_eq!(decode(&encode("ｱ").unwrap()).unwrap(), "ｱ");
    }

    #[test]
    fn test_encode_halfwidth_katakana_between_runs() {
        // Switches straight from JIS X 0208 to katakana, then back to ASCII
        assert_eq!(
            encode("あｶﾞa").unwrap(),
            b"\x1b$B$\"\x1b(I6^\x1b(Ba"
        );
        for text in ["ﾃｽﾄです", "abcｰﾟ｡def", "ｱ漢ｲ字ｳ", "｡ﾟ"] {
            assert_eq!(decode(&encode(text).unwrap()).unwrap(), text);
        }
    }

    #[test]
    fn test_encode_rejects_folded_characters() {
        let err = encode("1\u{2212}2").unwrap_err();
        assert_eq!(err.unmappable(), Some(('\u{2212}', 1)));
        assert!(!can_encode("\u{2212}"));
        assert!(can_encode("\u{FF0D}"));
    }

    #[test]
    fn test_can_encode() {
        assert!(can_encode("日本語"));
        assert!(!can_encode("emoji 🎉"));
    }
}
