use std::{fmt::Display, str::FromStr};

use crate::commands::{user_err, CommandError};

const MAX_LENGTH: usize = 100;

/// A gifting day as typed by a human, stored verbatim apart from surrounding whitespace.
#[derive(Debug, PartialEq, Eq)]
pub struct ExchangeDateText(String);

impl FromStr for ExchangeDateText {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(user_err(
                "The gifting day can't be empty. Try something like `Dec 24th`.",
            ));
        }

        if s.chars().count() > MAX_LENGTH {
            return Err(user_err(format!(
                "The gifting day is too long, keep it under {MAX_LENGTH} characters."
            )));
        }

        Ok(ExchangeDateText(s.to_string()))
    }
}

impl Display for ExchangeDateText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExchangeDateText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::ExchangeDateText;

    #[test]
    fn trimmed() {
        assert_eq!(
            ExchangeDateText::from_str("  Dec 24th \t").unwrap().as_ref(),
            "Dec 24th"
        );
    }

    #[test]
    fn free_text_is_kept() {
        assert_eq!(
            ExchangeDateText::from_str("the Friday before the holidays")
                .unwrap()
                .as_ref(),
            "the Friday before the holidays"
        );
    }

    #[test]
    fn empty() {
        assert!(ExchangeDateText::from_str("   ").is_err());
    }

    #[test]
    fn too_long() {
        assert!(ExchangeDateText::from_str(&"x".repeat(101)).is_err());
        assert!(ExchangeDateText::from_str(&"x".repeat(100)).is_ok());
    }
}
