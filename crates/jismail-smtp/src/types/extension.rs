//! EHLO keywords.

/// One service extension line from an EHLO reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `AUTH` with the advertised SASL mechanisms.
    Auth(Vec<AuthMechanism>),
    /// `SIZE` with the optional limit in bytes.
    Size(Option<usize>),
    /// `8BITMIME`.
    EightBitMime,
    /// `PIPELINING`.
    Pipelining,
    /// `STARTTLS`. Recognized so it can be reported; never negotiated.
    StartTls,
    /// Anything else, kept verbatim.
    Other(String),
}

impl Extension {
    /// Parses one EHLO line (without the code).
    ///
    /// Accepts the obsolete `AUTH=PLAIN LOGIN` form some servers still send.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (keyword, params) = line
            .split_once([' ', '='])
            .map_or((line, ""), |(keyword, rest)| (keyword, rest.trim()));

        if keyword.eq_ignore_ascii_case("AUTH") {
            Self::Auth(params.split_whitespace().map(AuthMechanism::parse).collect())
        } else if keyword.eq_ignore_ascii_case("SIZE") {
            Self::Size(params.parse().ok())
        } else if keyword.eq_ignore_ascii_case("8BITMIME") {
            Self::EightBitMime
        } else if keyword.eq_ignore_ascii_case("PIPELINING") {
            Self::Pipelining
        } else if keyword.eq_ignore_ascii_case("STARTTLS") {
            Self::StartTls
        } else {
            Self::Other(line.to_string())
        }
    }
}

/// SASL mechanism named in an `AUTH` line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN (RFC 4616), the only one this client speaks.
    Plain,
    /// LOGIN.
    Login,
    /// CRAM-MD5.
    CramMd5,
    /// Any other mechanism, upper-cased.
    Other(String),
}

impl AuthMechanism {
    /// Parses a mechanism name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "PLAIN" => Self::Plain,
            "LOGIN" => Self::Login,
            "CRAM-MD5" => Self::CramMd5,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the mechanism name as sent after `AUTH`.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
            Self::CramMd5 => "CRAM-MD5",
            Self::Other(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth() {
        assert_eq!(
            Extension::parse("AUTH PLAIN LOGIN"),
            Extension::Auth(vec![AuthMechanism::Plain, AuthMechanism::Login])
        );
        assert_eq!(
            Extension::parse("auth=plain"),
            Extension::Auth(vec![AuthMechanism::Plain])
        );
        assert_eq!(
            Extension::parse("AUTH XOAUTH2 CRAM-MD5"),
            Extension::Auth(vec![
                AuthMechanism::Other("XOAUTH2".to_string()),
                AuthMechanism::CramMd5,
            ])
        );
        assert_eq!(Extension::parse("AUTH"), Extension::Auth(vec![]));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(
            Extension::parse("SIZE 52428800"),
            Extension::Size(Some(52_428_800))
        );
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        assert_eq!(Extension::parse("SIZE lots"), Extension::Size(None));
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        assert_eq!(Extension::parse("pipelining"), Extension::Pipelining);
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(
            Extension::parse("ENHANCEDSTATUSCODES"),
            Extension::Other("ENHANCEDSTATUSCODES".to_string())
        );
        assert_eq!(Extension::parse(""), Extension::Other(String::new()));
    }

    #[test]
    fn test_mechanism_names() {
        for mechanism in [
            AuthMechanism::Plain,
            AuthMechanism::Login,
            AuthMechanism::CramMd5,
            AuthMechanism::Other("GSSAPI".to_string()),
        ] {
            assert_eq!(AuthMechanism::parse(mechanism.name()), mechanism);
        }
        assert_eq!(AuthMechanism::parse("plain"), AuthMechanism::Plain);
    }
}
