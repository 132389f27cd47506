//! Keys and slash-separated paths for addressing nested values.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment is neither an identifier nor a decimal index.
    #[error("invalid path segment '{segment}' at position {position}: {message}")]
    InvalidSegment {
        segment: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    #[error("invalid path: {message}")]
    InvalidPath { message: String },
}

/// One step into a container: a mapping field or a sequence position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Field(String),
    Index(usize),
}

impl Key {
    /// The key as it is stored in a mapping. Indices become their decimal form.
    fn from_segment(segment: &str) -> Key {
        let canonical = segment == "0" || !segment.starts_with('0');
        match segment.parse::<usize>() {
            Ok(i) if canonical => Key::Index(i),
            _ => Key::Field(segment.to_string()),
        }
    }

    pub fn field_name(&self) -> Cow<'_, str> {
        match self {
            Key::Field(name) => Cow::Borrowed(name),
            Key::Index(i) => Cow::Owned(i.to_string()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => write!(f, "{}", name),
            Key::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Field(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Field(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Field(s.clone())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

/// A validated path into a value tree.
///
/// Segments must be valid Unicode identifiers (per UAX#31) or decimal
/// strings. Decimal segments address sequence positions; on a mapping they
/// are looked up as field names.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parse a path string, validating segments.
    ///
    /// Empty segments are ignored, so `a//b/` is the same path as `a/b`.
    ///
    /// ```rust
    /// use limero_value::Path;
    ///
    /// let path = Path::parse("wifi/peers/0").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(Path::parse("a/b/").unwrap(), Path::parse("a/b").unwrap());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let segments: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        for (i, segment) in segments.iter().enumerate() {
            Self::validate_segment(segment, i)?;
        }

        Ok(Path { segments })
    }

    /// The empty path, addressing the root value itself.
    pub fn root() -> Self {
        Path::default()
    }

    fn validate_segment(segment: &str, position: usize) -> Result<(), PathError> {
        let invalid = |message: &str| PathError::InvalidSegment {
            segment: segment.to_string(),
            position,
            message: message.to_string(),
        };

        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return Err(invalid("empty segment"));
        };

        if segment.chars().all(|c| c.is_ascii_digit()) {
            return Ok(());
        }

        let valid_start = unicode_ident::is_xid_start(first)
            || (first == '_'
                && chars
                    .clone()
                    .next()
                    .is_some_and(unicode_ident::is_xid_continue));
        if !valid_start {
            return Err(invalid(
                "must start with a letter or underscore followed by letter/digit",
            ));
        }

        if let Some(c) = chars.find(|c| !unicode_ident::is_xid_continue(*c)) {
            return Err(PathError::InvalidSegment {
                segment: segment.to_string(),
                position,
                message: format!("invalid character '{}' in identifier", c),
            });
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Raw segments, as written.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Segments interpreted as keys: canonical decimal segments (no leading
    /// zero) become indices, everything else stays a field name.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.segments.iter().map(|s| Key::from_segment(s))
    }

    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    /// Split off the last segment, returning the parent path and the key.
    pub fn split_last(&self) -> Option<(Path, Key)> {
        let (_, parent) = self.segments.split_last()?;
        let last = self.keys().last()?;
        Some((
            Path {
                segments: parent.to_vec(),
            },
            last,
        ))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Build a [`Path`] from a string literal.
///
/// ```rust
/// use limero_value::path;
///
/// let p = path!("sys/uptime");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(Path::parse("").unwrap().len(), 0);
        assert_eq!(Path::parse("led").unwrap().len(), 1);
        assert_eq!(Path::parse("wifi/ssid").unwrap().len(), 2);
    }

    #[test]
    fn normalize_slashes() {
        assert_eq!(
            Path::parse("/motor//pid/").unwrap(),
            Path::parse("motor/pid").unwrap()
        );
    }

    #[test]
    fn numeric_segments_become_indices() {
        let keys: Vec<Key> = Path::parse("peers/2/name").unwrap().keys().collect();
        assert_eq!(
            keys,
            vec![Key::from("peers"), Key::Index(2), Key::from("name")]
        );
    }

    #[test]
    fn zero_padded_segments_stay_fields() {
        let keys: Vec<Key> = Path::parse("0/007/10").unwrap().keys().collect();
        assert_eq!(keys, vec![Key::Index(0), Key::from("007"), Key::Index(10)]);
    }

    #[test]
    fn rejects_invalid_segments() {
        let err = Path::parse("wifi/bad-name").unwrap_err();
        assert!(matches!(err, PathError::InvalidSegment { position: 1, .. }));
        assert!(Path::parse("1abc").is_err());
        assert!(Path::parse("_").is_err());
        assert!(Path::parse("_x").is_ok());
    }

    #[test]
    fn split_last_and_join() {
        let p = Path::parse("a/b/3").unwrap();
        let (parent, last) = p.split_last().unwrap();
        assert_eq!(parent.to_string(), "a/b");
        assert_eq!(last, Key::Index(3));
        assert_eq!(parent.join(&Path::parse("3").unwrap()), p);
        assert!(Path::root().split_last().is_none());
    }

    #[test]
    fn key_field_name() {
        assert_eq!(Key::Index(7).field_name(), "7");
        assert_eq!(Key::from("x").field_name(), "x");
    }
}
