//! Dotted, escapable hierarchical keys used to address resources and
//! context values.
//!
//! Canonical string forms:
//! - `document.metadata.foo` — three segments
//! - `document.metadata\.foo` — two segments, the second containing a literal dot
//! - `document\\.foo` — two segments, the first ending in a literal backslash

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PolicyError;

/// An immutable, ordered sequence of string segments forming a hierarchical
/// key. Segments are separated by unescaped periods; within a segment, `\.`
/// denotes a literal period and `\\` a literal backslash.
///
/// Specifiers are totally ordered and hashable, so they can be used as map
/// keys, e.g. in equals-condition predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specifier {
    segments: Vec<String>,
}

impl Specifier {
    /// The zero-length specifier.
    pub fn empty() -> Self {
        Specifier {
            segments: Vec::new(),
        }
    }

    /// Construct a specifier from explicit, already-unescaped segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Specifier {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a specifier from its escaped string form.
    ///
    /// Surrounding whitespace is trimmed before parsing. The empty string
    /// parses to the zero-length specifier. Leading, trailing and duplicate
    /// separators as well as isolated backslashes are rejected.
    pub fn parse(input: &str) -> Result<Self, PolicyError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Specifier::empty());
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = input.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped @ ('.' | '\\')) => current.push(escaped),
                    Some(other) => {
                        return Err(PolicyError::ParseError(format!(
                            "isolated backslash before '{other}' in '{input}'"
                        )))
                    }
                    None => {
                        return Err(PolicyError::ParseError(format!(
                            "isolated backslash at end of '{input}'"
                        )))
                    }
                },
                '.' => {
                    if current.is_empty() {
                        return Err(PolicyError::ParseError(format!(
                            "empty segment in '{input}'"
                        )));
                    }
                    segments.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }

        if current.is_empty() {
            return Err(PolicyError::ParseError(format!(
                "empty segment in '{input}'"
            )));
        }
        segments.push(current);

        Ok(Specifier { segments })
    }

    /// Iterate over the unescaped segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether there is more than one segment left.
    pub fn has_more(&self) -> bool {
        self.segments.len() > 1
    }

    /// The first segment.
    pub fn head(&self) -> Result<&str, PolicyError> {
        self.element(0)
    }

    /// The segment at the given index.
    pub fn element(&self, index: usize) -> Result<&str, PolicyError> {
        self.segments
            .get(index)
            .map(String::as_str)
            .ok_or(PolicyError::IndexOutOfBounds {
                index,
                length: self.segments.len(),
            })
    }

    /// The specifier with the head segment removed.
    pub fn suffix(&self) -> Result<Specifier, PolicyError> {
        self.suffix_from(1)
    }

    /// The specifier with the given prefix removed. Only the prefix length is
    /// considered; use [`Specifier::starts_with`] to verify the prefix first.
    pub fn suffix_after(&self, prefix: &Specifier) -> Result<Specifier, PolicyError> {
        self.suffix_from(prefix.len())
    }

    fn suffix_from(&self, offset: usize) -> Result<Specifier, PolicyError> {
        if offset > self.segments.len() {
            return Err(PolicyError::IndexOutOfBounds {
                index: offset,
                length: self.segments.len(),
            });
        }
        Ok(Specifier {
            segments: self.segments[offset..].to_vec(),
        })
    }

    /// Whether this specifier starts with all segments of the given prefix.
    pub fn starts_with(&self, prefix: &Specifier) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Whether the head segment equals the given string.
    pub fn starts_with_segment(&self, segment: &str) -> bool {
        self.segments.first().is_some_and(|s| s == segment)
    }

    /// Render the specifier back to its escaped string form. Parsing the
    /// result yields an equal specifier.
    pub fn as_string(&self) -> String {
        self.segments
            .iter()
            .map(|s| escape_segment(s))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '\\' || c == '.' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Display for Specifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_string())
    }
}

impl std::str::FromStr for Specifier {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specifier::parse(s)
    }
}

impl Serialize for Specifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Specifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Specifier::parse(&s).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[test]
    fn simple_specifiers_parse() {
        assert_eq!(Specifier::parse("").unwrap(), Specifier::empty());
        assert_eq!(
            Specifier::parse("foo").unwrap(),
            Specifier::from_segments(["foo"])
        );
        assert_eq!(
            Specifier::parse("foo.bar").unwrap(),
            Specifier::from_segments(["foo", "bar"])
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            Specifier::parse(" foo.bar").unwrap(),
            Specifier::from_segments(["foo", "bar"])
        );
        assert_eq!(
            Specifier::parse("foo.bar ").unwrap(),
            Specifier::from_segments(["foo", "bar"])
        );
    }

    #[parameterized(
        leading_dot = { ".foo.bar" },
        trailing_dot = { "foo.bar." },
        duplicate_dot = { "foo..bar" },
        duplicate_dot_after_escaped_backslash = { r"foo\\..bar" },
        duplicate_dot_before_escaped_backslash = { r"foo..\\bar" },
        triple_dot = { "foo...bar" },
        duplicate_dot_before_escaped_dot = { r"foo..\.bar" },
    )]
    fn empty_segments_are_rejected(input: &str) {
        assert!(matches!(
            Specifier::parse(input),
            Err(PolicyError::ParseError(_))
        ));
    }

    #[parameterized(
        mid_segment = { r"foo\bar" },
        at_start = { r"\foo.bar" },
        at_end = { "foo.bar\\" },
    )]
    fn isolated_backslashes_are_rejected(input: &str) {
        assert!(matches!(
            Specifier::parse(input),
            Err(PolicyError::ParseError(_))
        ));
    }

    #[test]
    fn escaping_works() {
        assert_eq!(
            Specifier::parse(r"foo\.bar").unwrap(),
            Specifier::from_segments(["foo.bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo\\.bar").unwrap(),
            Specifier::from_segments([r"foo\", "bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo\\\.bar").unwrap(),
            Specifier::from_segments([r"foo\.bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo\\\\.bar").unwrap(),
            Specifier::from_segments([r"foo\\", "bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo\..bar").unwrap(),
            Specifier::from_segments(["foo.", "bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo.\.bar").unwrap(),
            Specifier::from_segments(["foo", ".bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo\\bar").unwrap(),
            Specifier::from_segments([r"foo\bar"])
        );
        assert_eq!(
            Specifier::parse(r"foo\\bar.baz").unwrap(),
            Specifier::from_segments([r"foo\bar", "baz"])
        );
    }

    #[parameterized(
        plain = { "foo" },
        two_segments = { "foo.bar" },
        escaped_backslash = { r"foo\\bar" },
        escaped_dot = { r"foo\.bar" },
    )]
    fn as_string_round_trips(input: &str) {
        assert_eq!(Specifier::parse(input).unwrap().as_string(), input);
    }

    #[test]
    fn element_access_works() {
        let s = Specifier::parse("foo.bar.baz").unwrap();

        assert_eq!(s.head().unwrap(), "foo");
        assert_eq!(s.element(1).unwrap(), "bar");
        assert_eq!(s.element(2).unwrap(), "baz");
    }

    #[test]
    fn length_is_correct() {
        assert_eq!(Specifier::parse("").unwrap().len(), 0);
        assert_eq!(Specifier::parse("foo").unwrap().len(), 1);
        assert_eq!(Specifier::parse("foo.bar").unwrap().len(), 2);

        assert!(!Specifier::parse("").unwrap().has_more());
        assert!(!Specifier::parse("foo").unwrap().has_more());
        assert!(Specifier::parse("foo.bar").unwrap().has_more());

        assert!(Specifier::parse("").unwrap().is_empty());
        assert!(!Specifier::parse("foo").unwrap().is_empty());
    }

    #[test]
    fn suffix_is_correct() {
        let parse = |s| Specifier::parse(s).unwrap();

        assert_eq!(parse("foo").suffix().unwrap(), parse(""));
        assert_eq!(parse("foo.bar").suffix().unwrap(), parse("bar"));
        assert_eq!(parse("foo.bar.baz").suffix().unwrap(), parse("bar.baz"));

        assert_eq!(
            parse("foo.bar.baz").suffix_after(&parse("foo")).unwrap(),
            parse("bar.baz")
        );
        assert_eq!(
            parse("foo.bar.baz").suffix_after(&parse("foo.bar")).unwrap(),
            parse("baz")
        );
    }

    #[test]
    fn prefix_matching_is_correct() {
        let parse = |s| Specifier::parse(s).unwrap();

        assert!(parse("foo").starts_with_segment("foo"));
        assert!(parse("foo.bar").starts_with_segment("foo"));
        assert!(parse("foo.bar.baz").starts_with_segment("foo"));
        assert!(!parse("foo.bar.baz").starts_with_segment("bar"));

        assert!(parse("foo.bar.baz").starts_with(&parse("foo")));
        assert!(parse("foo.bar.baz").starts_with(&parse("foo.bar")));
        assert!(parse("foo.bar.baz").starts_with(&parse("foo.bar.baz")));

        assert!(!parse("foo.bar.baz").starts_with(&parse("bar.baz")));
        assert!(!parse("foo.bar.baz").starts_with(&parse("baz")));
        assert!(!parse("foo.bar.baz").starts_with(&parse("foo.bar.baz.yada")));
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let s = Specifier::parse("foo.bar.baz").unwrap();
        assert!(matches!(
            s.element(3),
            Err(PolicyError::IndexOutOfBounds { index: 3, length: 3 })
        ));

        let empty = Specifier::parse("").unwrap();
        assert!(empty.head().is_err());
        assert!(empty.suffix().is_err());
    }

    #[test]
    fn serde_uses_the_escaped_string_form() {
        let s = Specifier::parse(r"foo\.bar.baz").unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#""foo\\.bar.baz""#);

        let back: Specifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
