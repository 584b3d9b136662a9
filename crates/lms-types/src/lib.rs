//! Validated primitive types shared across the LMS crates.
//!
//! Values of these types are checked once at construction, so code that receives one never
//! has to re-validate it.

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when creating an [`EntityId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    #[error("entity id cannot be empty")]
    Empty,
    #[error("entity id must not contain control characters")]
    ControlCharacter,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, returning `TextError::Empty` for blank input.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None`.
    ///
    /// Handy for optional fields such as captions where an empty string means "absent".
    pub fn optional(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque identifier of an orderable entity (category, course, lesson, ...).
///
/// The backend decides the format (numeric ids, UUIDs, slugs), so the only guarantees are
/// that the id is non-empty after trimming and free of control characters. Ids are compared
/// exactly; `"42"` and `"042"` are different entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(IdError::ControlCharacter);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EntityId {
    /// Accepts both JSON strings and integers, since REST backends commonly use numeric ids.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Uint(u64),
        }

        let raw = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Uint(n) => n.to_string(),
        };
        EntityId::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims() {
        let text = NonEmptyText::new("  hello  ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn test_non_empty_text_rejects_blank() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn test_non_empty_text_optional() {
        assert_eq!(NonEmptyText::optional(None::<&str>), None);
        assert_eq!(NonEmptyText::optional(Some(" ")), None);
        assert_eq!(
            NonEmptyText::optional(Some("caption")),
            Some(NonEmptyText::new("caption").unwrap())
        );
    }

    #[test]
    fn test_entity_id_rejects_control_characters() {
        assert_eq!(EntityId::new("a\u{0}b"), Err(IdError::ControlCharacter));
        assert_eq!(EntityId::new(" "), Err(IdError::Empty));
    }

    #[test]
    fn test_entity_id_deserializes_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"["abc", 42, " 7 "]"#).unwrap();
        assert_eq!(ids[0].as_str(), "abc");
        assert_eq!(ids[1].as_str(), "42");
        assert_eq!(ids[2].as_str(), "7");
    }

    #[test]
    fn test_entity_id_rejects_empty_string_in_json() {
        let result: Result<EntityId, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }
}
