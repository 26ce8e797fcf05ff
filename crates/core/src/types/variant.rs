//! Variant identity: the (product, size) pair stock is tracked against.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::ProductId;

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// The label is empty after trimming.
    #[error("size cannot be empty")]
    Empty,
    /// The label is too long.
    #[error("size must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A size label such as `"M"`, `"42"` or `"One Size"`.
///
/// Labels are trimmed but otherwise kept verbatim, so `"m"` and `"M"` are
/// different sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size(String);

impl Size {
    /// Maximum length of a size label.
    pub const MAX_LENGTH: usize = 16;

    /// Parse a size label.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError`] if the trimmed label is empty or too long.
    pub fn parse(s: &str) -> Result<Self, SizeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SizeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(SizeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Size {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Size {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

/// Composite cart/stock key: one product in one size.
///
/// Two requests for the same product and size always produce equal keys; the
/// same product in a different size never does. The key is a structured pair,
/// so no label can collide with another product's label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub size: Size,
}

impl VariantKey {
    /// Build the key for a product and size.
    #[must_use]
    pub const fn new(product_id: ProductId, size: Size) -> Self {
        Self { product_id, size }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product_id, self.size)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(id: i32, size: &str) -> VariantKey {
        VariantKey::new(ProductId::new(id), Size::parse(size).unwrap())
    }

    #[test]
    fn test_size_trims_but_keeps_case() {
        assert_eq!(Size::parse("  M ").unwrap().as_str(), "M");
        assert_ne!(Size::parse("m").unwrap(), Size::parse("M").unwrap());
    }

    #[test]
    fn test_size_rejects_empty_and_long_labels() {
        assert_eq!(Size::parse(" "), Err(SizeError::Empty));
        assert_eq!(
            Size::parse("extra extra extra large"),
            Err(SizeError::TooLong { max: 16 })
        );
    }

    #[test]
    fn test_same_product_and_size_resolve_to_same_key() {
        assert_eq!(key(1, "M"), key(1, " M"));
        let keys: HashSet<_> = [key(1, "M"), key(1, "L"), key(2, "M"), key(1, "M")]
            .into_iter()
            .collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_structured_key_does_not_collide_on_display_form() {
        // "1" + "1/M" and "11" + "/M" would collide if keys were concatenated strings.
        let a = key(1, "1/M");
        let b = VariantKey::new(ProductId::new(11), Size::parse("/M").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(key(7, "XS").to_string(), "7/XS");
    }
}
