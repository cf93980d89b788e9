use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Exchange ticker symbol, normalized to uppercase.
///
/// A leading cashtag marker (`$AAPL`) is accepted and stripped, since that is
/// how tickers usually appear in post text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        let mut chars = normalized.chars().enumerate();
        if let Some((_, first)) = chars.next() {
            // Index symbols such as ^GSPC carry a caret prefix.
            if !(first.is_ascii_alphabetic() || first == '^') {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        for (index, ch) in chars {
            let valid = ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '=');
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cashtag_and_normalizes_case() {
        let parsed = Symbol::parse(" $tsla ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "TSLA");
    }

    #[test]
    fn accepts_share_class_and_index_forms() {
        assert_eq!(Symbol::parse("brk.b").expect("class share").as_str(), "BRK.B");
        assert_eq!(Symbol::parse("^gspc").expect("index").as_str(), "^GSPC");
    }

    #[test]
    fn rejects_bare_cashtag_and_digit_start() {
        assert!(matches!(Symbol::parse("$"), Err(ValidationError::EmptySymbol)));
        assert!(matches!(
            Symbol::parse("1AAPL"),
            Err(ValidationError::SymbolInvalidStart { .. })
        ));
    }

    #[test]
    fn rejects_embedded_whitespace() {
        let err = Symbol::parse("AA PL").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { ch: ' ', index: 2 }));
    }
}
