use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use url::{Host, Url};

const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// A normalized, absolute destination URL.
///
/// The canonical value is the normalized input text itself rather than the
/// `url` crate's re-serialization, so the same submitted URL always maps to
/// the same key in storage.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OriginalUrl(String);

impl OriginalUrl {
    /// Validates and normalizes a user-supplied URL.
    ///
    /// Surrounding whitespace is trimmed. Input that does not start with a
    /// scheme gets `https://` prepended, and `http://` is rewritten to
    /// `https://` so both forms share one mapping. The result must name a
    /// domain host with a top-level domain.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidOriginalUrl(
                "url cannot be empty".to_string(),
            ));
        }

        let normalized = match leading_scheme(trimmed) {
            Some(scheme) if scheme.eq_ignore_ascii_case("http") => {
                format!("{DEFAULT_SCHEME_PREFIX}{}", &trimmed[scheme.len() + 3..])
            }
            Some(_) => trimmed.to_string(),
            None => format!("{DEFAULT_SCHEME_PREFIX}{trimmed}"),
        };

        let parsed = Url::parse(&normalized)
            .map_err(|e| CoreError::InvalidOriginalUrl(format!("{normalized}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CoreError::InvalidOriginalUrl(format!(
                    "scheme must be http or https, got '{other}'"
                )))
            }
        }

        match parsed.host() {
            Some(Host::Domain(domain)) if has_top_level_domain(domain) => {}
            Some(Host::Domain(domain)) => {
                return Err(CoreError::InvalidOriginalUrl(format!(
                    "host '{domain}' has no top-level domain"
                )))
            }
            Some(_) => {
                return Err(CoreError::InvalidOriginalUrl(format!(
                    "host must be a domain name: {normalized}"
                )))
            }
            None => {
                return Err(CoreError::InvalidOriginalUrl(format!(
                    "url has no host: {normalized}"
                )))
            }
        }

        Ok(Self(normalized))
    }

    /// Wraps an already-normalized URL without validation.
    ///
    /// Intended for values read back from storage, which only ever receives
    /// URLs that passed [`OriginalUrl::parse`].
    pub fn new_unchecked(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Returns the scheme of `input` if it starts with `<scheme>://`.
fn leading_scheme(input: &str) -> Option<&str> {
    let (scheme, _) = input.split_once("://")?;
    let mut symbols = scheme.chars();
    let starts_with_letter = symbols.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_with_letter
        && symbols.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

fn has_top_level_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.');
    match domain.rsplit_once('.') {
        Some((name, tld)) => {
            !name.is_empty()
                && !tld.is_empty()
                && (tld.starts_with("xn--") || tld.chars().all(|c| c.is_ascii_alphabetic()))
        }
        None => false,
    }
}

impl std::fmt::Debug for OriginalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OriginalUrl").field(&self.0).finish()
    }
}

impl Display for OriginalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OriginalUrl {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OriginalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for OriginalUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OriginalUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_normalized_input() {
        let url = OriginalUrl::parse("https://example.com/a").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn http_is_upgraded_to_https() {
        let plain = OriginalUrl::parse("http://example.com/a").unwrap();
        let secure = OriginalUrl::parse("https://example.com/a").unwrap();
        assert_eq!(plain.as_str(), "https://example.com/a");
        assert_eq!(plain, secure);

        let upper = OriginalUrl::parse("HTTP://example.com/a").unwrap();
        assert_eq!(upper.as_str(), "https://example.com/a");
    }

    #[test]
    fn embedded_url_in_query_still_gets_default_scheme() {
        let url = OriginalUrl::parse("example.com/login?next=https://example.com/home").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/login?next=https://example.com/home"
        );
    }

    #[test]
    fn leading_scheme_detection() {
        assert_eq!(leading_scheme("https://example.com"), Some("https"));
        assert_eq!(leading_scheme("svn+ssh://example.com"), Some("svn+ssh"));
        assert_eq!(leading_scheme("example.com/a?next=https://b.com"), None);
        assert_eq!(leading_scheme("example.com"), None);
        assert_eq!(leading_scheme("://example.com"), None);
    }

    #[test]
    fn prepends_default_scheme() {
        let url = OriginalUrl::parse("finance.example.ru/path?q=1").unwrap();
        assert_eq!(url.as_str(), "https://finance.example.ru/path?q=1");
    }

    #[test]
    fn trims_whitespace() {
        let url = OriginalUrl::parse("  https://example.com  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com");
    }

    #[test]
    fn rejects_empty() {
        assert!(OriginalUrl::parse("").is_err());
        assert!(OriginalUrl::parse("   ").is_err());
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(OriginalUrl::parse("ftp://example.com").is_err());
        assert!(OriginalUrl::parse("javascript://example.com").is_err());
    }

    #[test]
    fn rejects_hosts_without_tld() {
        assert!(OriginalUrl::parse("https://localhost/a").is_err());
        assert!(OriginalUrl::parse("not-a-valid-url").is_err());
        assert!(OriginalUrl::parse("https://example.").is_err());
    }

    #[test]
    fn rejects_ip_hosts() {
        assert!(OriginalUrl::parse("http://127.0.0.1/x").is_err());
    }

    #[test]
    fn accepts_punycode_tld() {
        assert!(OriginalUrl::parse("https://example.xn--p1ai").is_ok());
    }

    #[test]
    fn tld_detection() {
        assert!(has_top_level_domain("example.com"));
        assert!(has_top_level_domain("a.b.co.uk"));
        assert!(has_top_level_domain("example.com."));
        assert!(!has_top_level_domain("localhost"));
        assert!(!has_top_level_domain(".com"));
        assert!(!has_top_level_domain("example.123"));
    }
}
