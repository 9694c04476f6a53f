use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::Constraint;
use crate::error::{ErrorKind, SpecError};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email regex compiles")
});

static HOSTNAME_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("hostname regex compiles")
});

const HOSTNAME_MAX_LEN: usize = 253;

/// Named semantic string shapes, checked independently of any pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    Email,
    Uri,
    Uuid,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp with offset.
    DateTime,
    Ipv4,
    Ipv6,
    Hostname,
}

impl StringFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Uri => "uri",
            StringFormat::Uuid => "uuid",
            StringFormat::Date => "date",
            StringFormat::DateTime => "date-time",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Hostname => "hostname",
        }
    }

    pub fn matches(self, s: &str) -> bool {
        match self {
            StringFormat::Email => EMAIL.is_match(s),
            StringFormat::Uri => url::Url::parse(s).is_ok(),
            StringFormat::Uuid => uuid::Uuid::parse_str(s).is_ok(),
            StringFormat::Date => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
            StringFormat::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
            StringFormat::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            StringFormat::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            StringFormat::Hostname => {
                let s = s.strip_suffix('.').unwrap_or(s);
                !s.is_empty()
                    && s.len() <= HOSTNAME_MAX_LEN
                    && s.split('.').all(|label| HOSTNAME_LABEL.is_match(label))
            }
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled pattern plus the source it came from.
#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Anchored so the expression must cover the whole string.
    fn compile(source: String) -> Result<Self, SpecError> {
        match Regex::new(&format!("^(?:{source})$")) {
            Ok(regex) => Ok(Self { source, regex }),
            Err(err) => Err(SpecError::InvalidPattern { pattern: source, source: err }),
        }
    }
}

/// Length (in characters), pattern and format restrictions for strings.
#[derive(Debug, Clone)]
pub struct StringConstraint {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
    format: Option<StringFormat>,
}

impl StringConstraint {
    pub fn builder() -> StringConstraintBuilder { StringConstraintBuilder::default() }

    pub fn length(min_length: Option<usize>, max_length: Option<usize>) -> Result<Self, SpecError> {
        Self::builder().length(min_length, max_length).build()
    }

    pub fn pattern(pattern: impl Into<String>) -> Result<Self, SpecError> {
        Self::builder().pattern(pattern).build()
    }

    pub fn format(format: StringFormat) -> Result<Self, SpecError> {
        Self::builder().format(format).build()
    }

    pub fn min_length(&self) -> Option<usize> { self.min_length }

    pub fn max_length(&self) -> Option<usize> { self.max_length }

    pub fn pattern_source(&self) -> Option<&str> { self.pattern.as_ref().map(|p| p.source.as_str()) }

    pub fn string_format(&self) -> Option<StringFormat> { self.format }
}

impl Constraint<str> for StringConstraint {
    fn check(&self, value: &str) -> Option<ErrorKind> {
        if self.min_length.is_some() || self.max_length.is_some() {
            let len = value.chars().count();
            if let Some(min_length) = self.min_length {
                if len < min_length {
                    return Some(ErrorKind::BelowMinLength { min_length });
                }
            }
            if let Some(max_length) = self.max_length {
                if len > max_length {
                    return Some(ErrorKind::AboveMaxLength { max_length });
                }
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.regex.is_match(value) {
                return Some(ErrorKind::PatternMismatch { pattern: pattern.source.clone() });
            }
        }
        if let Some(format) = self.format {
            if !format.matches(value) {
                return Some(ErrorKind::FormatMismatch { format });
            }
        }
        None
    }
}

#[derive(Debug, Default)]
pub struct StringConstraintBuilder {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    format: Option<StringFormat>,
}

impl StringConstraintBuilder {
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn length(mut self, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn build(self) -> Result<StringConstraint, SpecError> {
        if let (Some(min_length), Some(max_length)) = (self.min_length, self.max_length) {
            if min_length > max_length {
                return Err(SpecError::InvalidLength { min_length, max_length });
            }
        }
        let pattern = self.pattern.map(Pattern::compile).transpose()?;
        Ok(StringConstraint {
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
            format: self.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_lengths_fail_at_build() {
        assert!(matches!(
            StringConstraint::length(Some(4), Some(2)),
            Err(SpecError::InvalidLength { min_length: 4, max_length: 2 })
        ));
    }

    #[test]
    fn bad_pattern_fails_at_build() {
        assert!(matches!(
            StringConstraint::pattern("(unclosed"),
            Err(SpecError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let c = StringConstraint::length(None, Some(3)).unwrap();
        assert_eq!(c.check("äöü"), None);
        assert_eq!(c.check("äöüß"), Some(ErrorKind::AboveMaxLength { max_length: 3 }));
        let c = StringConstraint::length(Some(1), None).unwrap();
        assert_eq!(c.check(""), Some(ErrorKind::BelowMinLength { min_length: 1 }));
    }

    #[test]
    fn pattern_covers_whole_string() {
        let c = StringConstraint::pattern("[a-z]+").unwrap();
        assert_eq!(c.check("abc"), None);
        assert!(matches!(c.check("abc1"), Some(ErrorKind::PatternMismatch { .. })));
        assert_eq!(c.pattern_source(), Some("[a-z]+"));
    }

    #[test]
    fn length_is_checked_before_pattern_and_format() {
        let c = StringConstraint::builder()
            .max_length(5)
            .pattern("[0-9]+")
            .format(StringFormat::Ipv4)
            .build()
            .unwrap();
        assert!(matches!(c.check("1234567"), Some(ErrorKind::AboveMaxLength { .. })));
        assert!(matches!(c.check("12a"), Some(ErrorKind::PatternMismatch { .. })));
        assert_eq!(c.check("123"), Some(ErrorKind::FormatMismatch { format: StringFormat::Ipv4 }));
    }

    #[test]
    fn formats() {
        assert!(StringFormat::Email.matches("ada@example.org"));
        assert!(!StringFormat::Email.matches("ada@"));
        assert!(StringFormat::Uri.matches("https://example.org/a?b=c"));
        assert!(!StringFormat::Uri.matches("not a uri"));
        assert!(StringFormat::Uuid.matches("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(StringFormat::Date.matches("2024-02-29"));
        assert!(!StringFormat::Date.matches("2023-02-29"));
        assert!(StringFormat::DateTime.matches("2024-02-29T12:00:00+01:00"));
        assert!(StringFormat::Ipv4.matches("10.0.0.1"));
        assert!(StringFormat::Ipv6.matches("::1"));
        assert!(StringFormat::Hostname.matches("api.example.org"));
        assert!(!StringFormat::Hostname.matches("-bad-.org"));
    }
}
