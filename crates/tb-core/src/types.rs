//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core newtypes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The day rating was outside 1..=5.
    #[error("day rating must be between 1 and 5, got {value}")]
    RatingOutOfRange { value: u8 },

    /// Unknown block status string.
    #[error("invalid block status: {value}")]
    InvalidStatus { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated time block identifier.
    ///
    /// Block IDs are opaque, non-empty strings generated once when a block is
    /// created and never reused.
    BlockId, "block ID"
);

impl BlockId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the first `len` characters, for compact display.
    pub fn short(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

/// A user's 1 to 5 rating of how a day went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayRating(u8);

impl DayRating {
    /// Lowest allowed rating.
    pub const MIN: Self = Self(1);

    /// Highest allowed rating.
    pub const MAX: Self = Self(5);

    /// Creates a rating after validation.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value < Self::MIN.0 || value > Self::MAX.0 {
            return Err(ValidationError::RatingOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DayRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

impl TryFrom<u8> for DayRating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayRating> for u8 {
    fn from(rating: DayRating) -> Self {
        rating.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_rejects_empty() {
        assert!(BlockId::new("").is_err());
        assert!(BlockId::new("   ").is_err());
        assert!(BlockId::new("block-1").is_ok());
    }

    #[test]
    fn block_id_generate_is_unique() {
        let a = BlockId::generate();
        let b = BlockId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn block_id_serde_rejects_empty() {
        let result: Result<BlockId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn block_id_short_truncates() {
        let id = BlockId::new("abcdef123456").unwrap();
        assert_eq!(id.short(6), "abcdef");
        assert_eq!(id.short(50), "abcdef123456");
    }

    #[test]
    fn day_rating_validates_range() {
        assert!(DayRating::new(0).is_err());
        assert!(DayRating::new(1).is_ok());
        assert!(DayRating::new(5).is_ok());
        assert_eq!(
            DayRating::new(6),
            Err(ValidationError::RatingOutOfRange { value: 6 })
        );
    }

    #[test]
    fn day_rating_serde_rejects_out_of_range() {
        let parsed: DayRating = serde_json::from_str("4").unwrap();
        assert_eq!(parsed.value(), 4);
        let result: Result<DayRating, _> = serde_json::from_str("9");
        assert!(result.is_err());
    }

    #[test]
    fn day_rating_display() {
        assert_eq!(DayRating::new(3).unwrap().to_string(), "3/5");
    }
}
