//! From header parsing.

/// Sender identity split out of a raw From header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrom {
    /// Display name, verbatim (trailing whitespace is kept).
    pub display_name: Option<String>,
    /// Bare mailbox address for the SMTP envelope.
    pub envelope_address: String,
}

impl ParsedFrom {
    /// Parses a raw From value. See [`parse_from`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        parse_from(raw)
    }

    /// Returns true if the value carried a `Name <addr>` display name.
    #[must_use]
    pub const fn has_display_name(&self) -> bool {
        self.display_name.is_some()
    }
}

/// Parses a `"Display Name <addr>"` or bare `"addr"` From value.
///
/// Matches like the anchored pattern `^(.*)<(.*)>$` with greedy groups: the
/// value must end with `>`, and the display name runs up to the last `<`
/// before it. Values containing a line feed never match. When there is no
/// match the whole value is the envelope address.
///
/// This never fails; a missing display name is a normal outcome.
#[must_use]
pub fn parse_from(raw: &str) -> ParsedFrom {
    split_name_addr(raw).map_or_else(
        || ParsedFrom {
            display_name: None,
            envelope_address: raw.to_string(),
        },
        |(name, address)| ParsedFrom {
            display_name: Some(name.to_string()),
            envelope_address: address.to_string(),
        },
    )
}

fn split_name_addr(raw: &str) -> Option<(&str, &str)> {
    if raw.contains('\n') {
        return None;
    }
    let inner = raw.strip_suffix('>')?;
    let open = inner.rfind('<')?;
    Some((&inner[..open], &inner[open + 1..]))
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

    #[test]
    fn test_name_addr() {
        let parsed = parse_from("A <a@b.c>");
        assert_eq!(parsed.display_name.as_deref(), Some("A "));
        assert_eq!(parsed.envelope_address, "a@b.c");
        assert!(parsed.has_display_name());
    }

    #[test]
    fn test_bare_address() {
        let parsed = parse_from("a@b.c");
        assert!(!parsed.has_display_name());
        assert_eq!(parsed.envelope_address, "a@b.c");
    }

    #[test]
    fn test_japanese_display_name() {
        let parsed = ParsedFrom::parse("ほげ <sender@example.org>");
        assert_eq!(parsed.display_name.as_deref(), Some("ほげ "));
        assert_eq!(parsed.envelope_address, "sender@example.org");
    }

    #[test]
    fn test_angle_only() {
        let parsed = parse_from("<a@b.c>");
        assert_eq!(parsed.display_name.as_deref(), Some(""));
        assert_eq!(parsed.envelope_address, "a@b.c");
    }

    #[test]
    fn test_greedy_name_takes_last_open_bracket() {
        let parsed = parse_from("x <y> <a@b.c>");
        assert_eq!(parsed.display_name.as_deref(), Some("x <y> "));
        assert_eq!(parsed.envelope_address, "a@b.c");
    }

    #[test]
    fn test_greedy_address_keeps_inner_close_bracket() {
        let parsed = parse_from("N <a>b>");
        assert_eq!(parsed.display_name.as_deref(), Some("N "));
        assert_eq!(parsed.envelope_address, "a>b");
    }

    #[test]
    fn test_trailing_text_does_not_match() {
        let parsed = parse_from("N <a@b.c> ");
        assert!(!parsed.has_display_name());
        assert_eq!(parsed.envelope_address, "N <a@b.c> ");
    }

    #[test]
    fn test_missing_open_bracket() {
        let parsed = parse_from("a@b.c>");
        assert!(!parsed.has_display_name());
        assert_eq!(parsed.envelope_address, "a@b.c>");
    }

    #[test]
    fn test_line_feed_does_not_match() {
        let parsed = parse_from("N\n<a@b.c>");
        assert!(!parsed.has_display_name());
        assert_eq!(parsed.envelope_address, "N\n<a@b.c>");
    }

    #[test]
    fn test_empty() {
        let parsed = parse_from("");
        assert!(!parsed.has_display_name());
        assert_eq!(parsed.envelope_address, "");
    }

    proptest! {
        #[test]
        fn prop_parse_is_total(raw in any::<String>()) {
            let parsed = parse_from(&raw);
            match parsed.display_name {
                Some(name) => {
                    prop_assert_eq!(format!("{name}<{}>", parsed.envelope_address), raw);
                }
                None => prop_assert_eq!(parsed.envelope_address, raw),
            }
        }

        #[test]
        fn prop_name_addr_recovered(name in "[^<\n]{0,20}", addr in "[a-z]{1,8}@[a-z]{1,8}\\.io") {
            let parsed = parse_from(&format!("{name}<{addr}>"));
            prop_assert_eq!(parsed.display_name, Some(name));
            prop_assert_eq!(parsed.envelope_address, addr);
        }
    }
}
