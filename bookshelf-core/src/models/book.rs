//! Book record and identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend-assigned book identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BookId(i64);

impl BookId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for BookId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for BookId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Book record from the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: BookId,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids() {
        assert_eq!("42".parse::<BookId>().unwrap(), BookId::new(42));
        assert_eq!(" 7 ".parse::<BookId>().unwrap().get(), 7);
        assert!("abc".parse::<BookId>().is_err());
    }

    #[test]
    fn serializes_id_as_plain_number() {
        let book = Book {
            id: BookId::new(3),
            title: "Dune".into(),
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 3, "title": "Dune" }));
    }
}
