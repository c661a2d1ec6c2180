//! Envelope addresses.

use std::fmt;

use crate::error::{Error, Result};

/// A bare mailbox (`local@domain`) for `MAIL FROM` / `RCPT TO`.
///
/// Only the checks that keep the command line well formed are made; the
/// server decides whether the mailbox exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    raw: String,
}

impl Address {
    /// Validates and wraps an address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the value is empty, contains
    /// whitespace, line breaks or angle brackets, or does not have exactly
    /// one `@` between a non-empty local part and domain.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let raw = addr.into();
        if let Err(reason) = Self::check(&raw) {
            return Err(Error::InvalidAddress(format!("{raw:?}: {reason}")));
        }
        Ok(Self { raw })
    }

    fn check(raw: &str) -> std::result::Result<(), &'static str> {
        if raw.is_empty() {
            return Err("empty");
        }
        if raw.contains(char::is_whitespace) {
            return Err("contains whitespace or a line break");
        }
        if raw.contains(['<', '>']) {
            return Err("must be a bare mailbox without angle brackets");
        }
        let mut ats = raw.match_indices('@').map(|(i, _)| i);
        let at = match (ats.next(), ats.next()) {
            (Some(at), None) => at,
            (None, _) => return Err("missing @"),
            (Some(_), Some(_)) => return Err("more than one @"),
        };
        if at == 0 || at + 1 == raw.len() {
            return Err("empty local part or domain");
        }
        Ok(())
    }

    /// Returns the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        let addr = Address::new("receipt@example.org").unwrap();
        assert_eq!(addr.as_str(), "receipt@example.org");
        assert_eq!(addr.to_string(), "receipt@example.org");
    }

    #[test]
    fn test_rejected() {
        for bad in [
            "",
            "userexample.com",
            "@example.com",
            "user@",
            "a@b@c",
            "a b@c.d",
            "a@b.c\r\nRCPT TO:<x@y.z>",
            "<a@b.c>",
            "ふー <receipt@example.org>",
        ] {
            assert!(
                matches!(Address::new(bad), Err(Error::InvalidAddress(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_error_names_the_value() {
        let err = Address::new("nobody").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email address: \"nobody\": missing @");
    }
}
