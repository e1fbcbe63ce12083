//! Book title validation

use std::fmt;

use super::ValidationError;

/// Maximum length for book titles, in characters
const MAX_TITLE_LEN: usize = 512;

/// Validated book title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookTitle(String);

impl BookTitle {
    /// Create a new book title.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 512 characters
    ///
    /// # Example
    /// ```
    /// use bookshelf_core::models::BookTitle;
    ///
    /// assert!(BookTitle::new("The Rust Programming Language").is_ok());
    /// assert!(BookTitle::new("").is_err());
    /// assert!(BookTitle::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for BookTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for BookTitle {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_titles() {
        assert!(BookTitle::new("Dune").is_ok());
        assert!(BookTitle::new("a").is_ok());
        assert_eq!(BookTitle::new("  Trimmed  ").unwrap().as_str(), "Trimmed");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            BookTitle::new("").unwrap_err(),
            ValidationError::Empty { field: "title" }
        );
        assert!(BookTitle::new(" \t\n").is_err());
    }

    #[test]
    fn rejects_too_long() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            BookTitle::new(&long).unwrap_err(),
            ValidationError::TooLong { max: MAX_TITLE_LEN, .. }
        ));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let title = "é".repeat(MAX_TITLE_LEN);
        assert!(BookTitle::new(&title).is_ok());
    }

    proptest! {
        #[test]
        fn accepted_titles_are_trimmed_and_non_empty(s in "\\PC{0,64}") {
            if let Ok(title) = BookTitle::new(&s) {
                prop_assert!(!title.as_str().is_empty());
                prop_assert_eq!(title.as_str(), s.trim());
            } else {
                prop_assert!(s.trim().is_empty());
            }
        }
    }
}
