//! RFC 2047 header encoding.
//!
//! Header text is split into chunks of at most [`MAX_CHUNK_CHARS`] code
//! points. Each chunk is transcoded to ISO-2022-JP on its own, base64 encoded
//! and written as one folded encoded-word line:
//!
//! ```text
//!  =?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?=\r\n
//! ```
//!
//! Splitting happens on the Unicode input, never on encoded bytes, so no
//! chunk can cut an escape sequence or a double-byte pair.

use crate::charset::{self, CHARSET};
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum number of code points per encoded-word.
///
/// Thirteen JIS X 0208 characters encode to 32 bytes (escapes included), or
/// 44 base64 characters, which keeps a folded line of Japanese text under
/// 76 octets.
pub const MAX_CHUNK_CHARS: usize = 13;

const WORD_PREFIX: &str = "=?ISO-2022-JP?B?";
const WORD_SUFFIX: &str = "?=";

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Splits text into consecutive slices of at most `length` code points.
///
/// Empty input yields no slices. A `length` of zero is treated as one.
#[must_use]
pub fn split_by_char_length(text: &str, length: usize) -> Vec<&str> {
    let length = length.max(1);
    let mut chunks = Vec::with_capacity(text.len() / length + 1);
    let mut start = 0;
    let mut accumulated = 0;

    for (offset, ch) in text.char_indices() {
        accumulated += 1;
        if accumulated == length {
            let end = offset + ch.len_utf8();
            chunks.push(&text[start..end]);
            start = end;
            accumulated = 0;
        }
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Encodes one chunk as a single `=?ISO-2022-JP?B?...?=` encoded-word.
///
/// # Errors
///
/// Returns [`Error::Unmappable`] if the chunk cannot be transcoded.
pub fn encode_word(chunk: &str) -> Result<String> {
    let bytes = charset::encode(chunk)?;
    Ok(format!("{WORD_PREFIX}{}{WORD_SUFFIX}", encode_base64(&bytes)))
}

/// Encodes a header value as folded ISO-2022-JP encoded-words.
///
/// Every chunk is written as `" " + encoded-word + "\r\n"`, including the
/// first and the last, so the result is appended directly after the header
/// label (`"Subject:"`) with no separator. Empty input produces an empty
/// string.
///
/// # Errors
///
/// Returns [`Error::Unmappable`] with the position in `text` of the first
/// character that cannot be encoded. Nothing is returned on failure.
pub fn encode_header_field(text: &str) -> Result<String> {
    let chunks = split_by_char_length(text, MAX_CHUNK_CHARS);
    let mut field = String::with_capacity(chunks.len() * 64);
    let mut position = 0;

    for chunk in chunks {
        let word = encode_word(chunk).map_err(|e| e.offset_by(position))?;
        field.push(' ');
        field.push_str(&word);
        field.push_str("\r\n");
        position += chunk.chars().count();
    }

    Ok(field)
}

/// Returns true if a header value must be written as encoded-words.
///
/// Plain values are limited to printable ASCII that cannot be mistaken for
/// an encoded-word.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    !text.bytes().all(|b| (b' '..=b'~').contains(&b)) || text.contains("=?")
}

/// Decodes a header value made of ISO-2022-JP base64 encoded-words.
///
/// Whitespace and line folds between encoded-words are ignored (RFC 2047
/// section 6.2), so the output of [`encode_header_field`] decodes back to
/// its input.
///
/// # Errors
///
/// Returns an error if a word is not a `B`-encoded ISO-2022-JP encoded-word,
/// or its payload is not valid Base64 or ISO-2022-JP.
pub fn decode_header_field(value: &str) -> Result<String> {
    let mut decoded = String::new();
    for word in value.split_whitespace() {
        decoded.push_str(&decode_word(word)?);
    }
    Ok(decoded)
}

/// Decodes a single `=?ISO-2022-JP?B?...?=` encoded-word.
///
/// # Errors
///
/// Returns an error if the word is malformed or uses another charset or
/// encoding.
pub fn decode_word(word: &str) -> Result<String> {
    let inner = word
        .strip_prefix("=?")
        .and_then(|w| w.strip_suffix("?="))
        .ok_or_else(|| Error::InvalidEncodedWord(word.to_string()))?;

    let mut parts = inner.splitn(3, '?');
    let (Some(word_charset), Some(encoding), Some(payload)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidEncodedWord(word.to_string()));
    };

    if !word_charset.eq_ignore_ascii_case(CHARSET) {
        return Err(Error::InvalidEncodedWord(format!(
            "Unsupported charset: {word_charset}"
        )));
    }
    if !encoding.eq_ignore_ascii_case("B") {
        return Err(Error::InvalidEncodedWord(format!(
            "Unsupported encoding: {encoding}"
        )));
    }

    charset::decode(&decode_base64(payload)?)
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
    use proptest::prelude::*;

    const SAMPLE_SUBJECT: &str = "テストおおおおおお。あああいいいいんんんaいいう1234あああああああああああいいいいいいいいいいう";

    fn words(field: &str) -> Vec<&str> {
        field.split("\r\n").filter(|line| !line.is_empty()).collect()
    }

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_by_char_length("", 13).is_empty());
    }

    #[test]
    fn test_split_counts_code_points() {
        let chunks = split_by_char_length("あいうえお", 2);
        assert_eq!(chunks, vec!["あい", "うえ", "お"]);
    }

    #[test]
    fn test_split_exact_multiple() {
        let text = "a".repeat(26);
        let chunks = split_by_char_length(&text, 13);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 13));
    }

    #[test]
    fn test_split_zero_length() {
        assert_eq!(split_by_char_length("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_encode_word() {
        assert_eq!(encode_word("テスト").unwrap(), "=?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?=");
    }

    #[test]
    fn test_encode_ascii_subject_single_chunk() {
        let field = encode_header_field("hi").unwrap();
        assert_eq!(field, " =?ISO-2022-JP?B?aGk=?=\r\n");
        assert_eq!(decode_header_field(&field).unwrap(), "hi");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_header_field("").unwrap(), "");
    }

    #[test]
    fn test_encode_26_chars_two_chunks() {
        let text = "あいうえおかきくけこさしすせそたちつてとなにぬねのは";
        assert_eq!(text.chars().count(), 26);

        let field = encode_header_field(text).unwrap();
        let words = words(&field);
        assert_eq!(words.len(), 2);
        assert_eq!(decode_word(words[0].trim_start()).unwrap(), "あいうえおかきくけこさしす");
        assert_eq!(decode_word(words[1].trim_start()).unwrap(), "せそたちつてとなにぬねのは");
    }

    #[test]
    fn test_encode_27_chars_three_chunks() {
        let text = "あいうえおかきくけこさしすせそたちつてとなにぬねのはA";
        let field = encode_header_field(text).unwrap();
        let lengths: Vec<usize> = words(&field)
            .iter()
            .map(|w| decode_word(w.trim_start()).unwrap().chars().count())
            .collect();
        assert_eq!(lengths, vec![13, 13, 1]);
    }

    #[test]
    fn test_encode_first_chunk_is_full() {
        let field = encode_header_field(SAMPLE_SUBJECT).unwrap();
        let first = words(&field)[0].trim_start();
        assert_eq!(decode_word(first).unwrap(), "テストおおおおおお。あああ");
        assert_eq!(
            first,
            "=?ISO-2022-JP?B?GyRCJUYlOSVIJCokKiQqJCokKiQqISMkIiQiJCIbKEI=?="
        );
    }

    #[test]
    fn test_encode_lines_fit_header_limit() {
        let field = encode_header_field(SAMPLE_SUBJECT).unwrap();
        for line in words(&field) {
            assert!(line.len() <= 76, "line too long: {line}");
        }
    }

    #[test]
    fn test_encode_unmappable_reports_absolute_position() {
        let text = format!("{}😀", "あ".repeat(20));
        let err = encode_header_field(&text).unwrap_err();
        assert_eq!(err.unmappable(), Some(('😀', 20)));
    }

    #[test]
    fn test_encode_halfwidth_katakana_round_trips() {
        let field = encode_header_field("ｱｲｳ").unwrap();
        assert_eq!(field, " =?ISO-2022-JP?B?GyhJMTIzGyhC?=\r\n");
        assert_eq!(decode_header_field(&field).unwrap(), "ｱｲｳ");
    }

    #[test]
    fn test_encode_rejects_minus_sign() {
        let err = encode_header_field("1\u{2212}2").unwrap_err();
        assert_eq!(err.unmappable(), Some(('\u{2212}', 1)));
    }

    #[test]
    fn test_needs_encoding() {
        assert!(!needs_encoding("Hello, World!"));
        assert!(!needs_encoding(""));
        assert!(needs_encoding("日本語"));
        assert!(needs_encoding("tab\there"));
        assert!(needs_encoding("looks =?like?= a word"));
    }

    #[test]
    fn test_decode_word_rejects_other_charsets() {
        assert!(matches!(
            decode_word("=?utf-8?B?SMOpbGxv?="),
            Err(Error::InvalidEncodedWord(_))
        ));
        assert!(matches!(
            decode_word("=?ISO-2022-JP?Q?abc?="),
            Err(Error::InvalidEncodedWord(_))
        ));
        assert!(matches!(
            decode_word("plain"),
            Err(Error::InvalidEncodedWord(_))
        ));
    }

    #[test]
    fn test_decode_word_bad_base64() {
        assert!(matches!(
            decode_word("=?ISO-2022-JP?B?***?="),
            Err(Error::Base64Decode(_))
        ));
    }

    fn encodable_char() -> impl Strategy<Value = char> {
        prop_oneof![
            proptest::char::range(' ', '~'),
            proptest::char::range('ぁ', 'ん'),
            proptest::char::range('ァ', 'ヶ'),
            proptest::sample::select(vec!['日', '本', '語', '漢', '字', '、', '。', 'ー', '「', '」']),
            proptest::char::range('\u{FF61}', '\u{FF9F}'),
        ]
    }

    /// Anything near the ISO-2022-JP repertoire, including characters the
    /// codec folds into others.
    fn borderline_char() -> impl Strategy<Value = char> {
        prop_oneof![
            encodable_char(),
            proptest::sample::select(vec!['\u{2212}', '\u{FF0D}', '¥', '‾', '~', '\u{1b}', '한', '😀']),
        ]
    }

    fn encodable_text() -> impl Strategy<Value = String> {
        proptest::collection::vec(encodable_char(), 0..80).prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_header_round_trip(text in encodable_text()) {
            let field = encode_header_field(&text).unwrap();
            prop_assert_eq!(decode_header_field(&field).unwrap(), text);
        }

        #[test]
        fn prop_header_round_trips_or_is_unmappable(
            chars in proptest::collection::vec(borderline_char(), 0..40)
        ) {
            let text: String = chars.into_iter().collect();
            match encode_header_field(&text) {
                Ok(field) => prop_assert_eq!(decode_header_field(&field).unwrap(), text),
                Err(err) => prop_assert!(err.unmappable().is_some(), "{err}"),
            }
        }

        #[test]
        fn prop_chunks_are_bounded(text in encodable_text()) {
            let field = encode_header_field(&text).unwrap();
            for line in words(&field) {
                let chunk = decode_word(line.trim_start()).unwrap();
                prop_assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
            }
        }

        #[test]
        fn prop_folding_structure(text in encodable_text()) {
            let field = encode_header_field(&text).unwrap();
            let expected = text.chars().count().div_ceil(MAX_CHUNK_CHARS);
            prop_assert!(field.is_empty() || field.ends_with("?=\r\n"));
            let lines = words(&field);
            prop_assert_eq!(lines.len(), expected);
            for line in lines {
                prop_assert!(line.starts_with(" =?ISO-2022-JP?B?"));
                prop_assert!(!line.starts_with("  "));
                prop_assert!(line.ends_with("?="));
            }
        }

        #[test]
        fn prop_split_preserves_text(text in ".{0,60}", length in 1usize..20) {
            let chunks = split_by_char_length(&text, length);
            prop_assert_eq!(chunks.concat(), text.clone());
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= length);
                prop_assert!(!chunk.is_empty());
            }
        }
    }
}
