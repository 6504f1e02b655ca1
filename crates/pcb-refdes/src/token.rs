//! Splitting of raw reference designators into a prefix and a number.
//!
//! `R12` splits into `R` and `12`; `U?` and `U` split into `U` with no number
//! and are flagged as not yet annotated.

use serde::{Deserialize, Serialize};

/// A reference designator split into its letter prefix and numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceToken {
    /// Designator root without the number (`IC` for `IC1`).
    pub prefix: String,
    /// Numeric suffix; `None` means the reference is not annotated.
    pub number: Option<u32>,
}

impl ReferenceToken {
    pub fn new(prefix: impl Into<String>, number: Option<u32>) -> Self {
        Self {
            prefix: prefix.into(),
            number,
        }
    }

    /// Unannotated token for `prefix`.
    pub fn unannotated(prefix: impl Into<String>) -> Self {
        Self::new(prefix, None)
    }

    /// Split a raw designator.
    ///
    /// The trailing run of ASCII digits is the number. A trailing `?` is
    /// dropped and marks the token as unannotated, as does a string that does
    /// not end in a digit. An all-digit string yields an empty prefix; callers
    /// are expected to avoid it but it is accepted as is. A digit run too
    /// large for `u32` is kept in the prefix and the token is unannotated.
    pub fn parse(raw: &str) -> Self {
        if let Some(stripped) = raw.strip_suffix('?') {
            return Self::unannotated(stripped);
        }

        let digits_start = raw
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|i| i + raw[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);

        let (prefix, digits) = raw.split_at(digits_start);
        if digits.is_empty() {
            return Self::unannotated(prefix);
        }

        match digits.parse::<u32>() {
            Ok(number) => Self::new(prefix, Some(number)),
            Err(_) => Self::unannotated(raw),
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.number.is_some()
    }
}

impl std::str::FromStr for ReferenceToken {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.number {
            Some(number) => write!(f, "{}{number}", self.prefix),
            None => write!(f, "{}?", self.prefix),
        }
    }
}

/// Letter suffix for a 1-based unit index: 1 → `A`, 26 → `Z`, 27 → `AA`.
///
/// Units outside `1..` render as an empty string.
pub fn unit_suffix(unit: i32) -> String {
    if unit < 1 {
        return String::new();
    }

    let mut n = unit as u32;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}
