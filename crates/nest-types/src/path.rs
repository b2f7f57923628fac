//! Slash-addressed paths into the bucket namespace.
//!
//! A [`Path`] is an immutable, non-empty sequence of opaque byte segments.
//! Every prefix except the full path names a bucket; the last segment names
//! either a bucket or a key inside the bucket named by the rest.
//!
//! Extending a path with [`Path::child`] always yields a new value. Recursive
//! walks hand each branch its own path, so sibling branches never observe
//! each other's segments.
//!
//! # String form
//!
//! Segments are joined with `/`. Inside a segment `%`, `/` and every byte
//! that is not part of valid UTF-8 are written as `%XX` (two uppercase hex
//! digits), so distinct paths always have distinct strings and
//! [`Path::parse`] reverses [`Path::to_key_string`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Separator used by the string form of a path.
pub const SEPARATOR: char = '/';

const ESCAPE: char = '%';

/// An ordered, non-empty sequence of byte-string segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Path {
    segments: Vec<Vec<u8>>,
}

impl Path {
    /// Build a path from raw segments.
    ///
    /// Fails if there are no segments or any segment is empty.
    pub fn new<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let segments: Vec<Vec<u8>> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(index) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment { index });
        }
        Ok(Self { segments })
    }

    /// A single-segment path naming a top-level bucket.
    pub fn top_level(name: impl Into<Vec<u8>>) -> Result<Self, PathError> {
        Self::new([name.into()])
    }

    /// Parse the `/`-joined string form.
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_types::Path;
    ///
    /// let path = Path::parse("a/b/k").unwrap();
    /// assert_eq!(path.depth(), 3);
    /// assert_eq!(path.name(), b"k");
    /// assert!(Path::parse("").is_err());
    /// assert!(Path::parse("a//b").is_err());
    ///
    /// let escaped = Path::parse("a/b%2Fc").unwrap();
    /// assert_eq!(escaped.depth(), 2);
    /// assert_eq!(escaped.name(), b"b/c");
    /// ```
    ///
    /// A `%` that does not start a two-digit hex escape is kept as is.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        Self::new(s.split(SEPARATOR).map(unescape_segment))
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Number of segments. Always at least one.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The last segment: the name of the entry this path addresses.
    pub fn name(&self) -> &[u8] {
        // Non-empty by construction.
        &self.segments[self.segments.len() - 1]
    }

    /// Returns `true` if this path names an entry of the root namespace.
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// The path of the enclosing bucket, or `None` for a top-level path.
    pub fn parent(&self) -> Option<Path> {
        if self.is_top_level() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// A new path one level deeper. `self` is left untouched.
    pub fn child(&self, name: impl Into<Vec<u8>>) -> Result<Path, PathError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PathError::EmptySegment {
                index: self.segments.len(),
            });
        }
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(name);
        Ok(Self { segments })
    }

    /// A path with the same parent and a different last segment.
    pub fn sibling(&self, name: impl Into<Vec<u8>>) -> Result<Path, PathError> {
        match self.parent() {
            Some(parent) => parent.child(name),
            None => Self::top_level(name),
        }
    }

    /// Returns `true` if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The escaped string form used as the [`PathIndex`](crate::PathIndex)
    /// key. Same as `Display`.
    pub fn to_key_string(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            escape_segment(segment, &mut out);
        }
        out
    }
}

fn escape_segment(segment: &[u8], out: &mut String) {
    for chunk in segment.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == ESCAPE || c == SEPARATOR {
                push_escaped(c as u8, out);
            } else {
                out.push(c);
            }
        }
        for &byte in chunk.invalid() {
            push_escaped(byte, out);
        }
    }
}

fn push_escaped(byte: u8, out: &mut String) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push(ESCAPE);
    out.push(HEX[usize::from(byte >> 4)] as char);
    out.push(HEX[usize::from(byte & 0x0f)] as char);
}

fn unescape_segment(part: &str) -> Vec<u8> {
    let bytes = part.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == ESCAPE as u8 {
            if let Some(byte) = bytes.get(i + 1..i + 3).and_then(decode_hex) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn decode_hex(pair: &[u8]) -> Option<u8> {
    let digits = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(digits, 16).ok()
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key_string())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Vec<Vec<u8>>> for Path {
    type Error = PathError;

    fn try_from(segments: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<Path> for Vec<Vec<u8>> {
    fn from(path: Path) -> Self {
        path.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_and_display() {
        let path = Path::parse("a/b/c").unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "a/b/c");
        assert_eq!(path.name(), b"c");
    }

    #[test]
    fn reject_empty_path() {
        assert_eq!(Path::parse(""), Err(PathError::Empty));
        let none: Vec<Vec<u8>> = Vec::new();
        assert_eq!(Path::new(none), Err(PathError::Empty));
    }

    #[test]
    fn reject_empty_segment() {
        assert_eq!(
            Path::parse("a//b"),
            Err(PathError::EmptySegment { index: 1 })
        );
        assert_eq!(
            Path::parse("a/"),
            Err(PathError::EmptySegment { index: 1 })
        );
        let root = Path::parse("a").unwrap();
        assert!(root.child("").is_err());
    }

    #[test]
    fn parent_and_top_level() {
        let path = Path::parse("a/b").unwrap();
        assert!(!path.is_top_level());
        let parent = path.parent().unwrap();
        assert_eq!(parent, Path::parse("a").unwrap());
        assert!(parent.is_top_level());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn child_leaves_receiver_untouched() {
        let base = Path::parse("a/b").unwrap();
        let left = base.child("x").unwrap();
        let right = base.child("y").unwrap();
        assert_eq!(base.to_string(), "a/b");
        assert_eq!(left.to_string(), "a/b/x");
        assert_eq!(right.to_string(), "a/b/y");
    }

    #[test]
    fn sibling_replaces_last_segment() {
        let path = Path::parse("a/b/k").unwrap();
        assert_eq!(path.sibling("j").unwrap().to_string(), "a/b/j");
        let top = Path::parse("a").unwrap();
        assert_eq!(top.sibling("z").unwrap().to_string(), "z");
    }

    #[test]
    fn prefix_containment() {
        let a = Path::parse("a").unwrap();
        let ab = Path::parse("a/b").unwrap();
        let abx = Path::parse("ab/x").unwrap();
        assert!(ab.starts_with(&a));
        assert!(a.starts_with(&a));
        assert!(!a.starts_with(&ab));
        // Segment-wise, not string-wise.
        assert!(!abx.starts_with(&a));
    }

    #[test]
    fn non_utf8_segments_are_escaped() {
        let path = Path::new(vec![b"a".to_vec(), vec![0xff, 0xfe]]).unwrap();
        assert_eq!(path.to_string(), "a/%FF%FE");
        let other = Path::new(vec![b"a".to_vec(), vec![0xfe, 0xff]]).unwrap();
        assert_ne!(path.to_key_string(), other.to_key_string());
        assert_eq!(Path::parse("a/%FF%FE").unwrap(), path);
    }

    #[test]
    fn separator_inside_segment_is_escaped() {
        let split = Path::new(vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]).unwrap();
        let joined = Path::new(vec![b"a".to_vec(), b"b/c".to_vec()]).unwrap();
        assert_eq!(split.to_key_string(), "a/b/c");
        assert_eq!(joined.to_key_string(), "a/b%2Fc");
        assert_eq!(Path::parse("a/b%2Fc").unwrap(), joined);
    }

    #[test]
    fn percent_round_trips() {
        let path = Path::new(vec![b"100%".to_vec(), "caf\u{e9}".as_bytes().to_vec()])
            .unwrap();
        assert_eq!(path.to_key_string(), "100%25/caf\u{e9}");
        assert_eq!(Path::parse(&path.to_key_string()).unwrap(), path);
        // A stray `%` parses literally.
        assert_eq!(Path::parse("100%").unwrap().name(), b"100%");
        assert_eq!(Path::parse("x%zz").unwrap().name(), b"x%zz");
    }

    #[test]
    fn serde_rejects_empty_path() {
        let path = Path::parse("a/b").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<Path>("[]").is_err());
    }

    proptest! {
        #[test]
        fn key_string_is_reversible(
            segments in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 1..6),
                1..4,
            ),
        ) {
            let path = Path::new(segments).unwrap();
            let parsed = Path::parse(&path.to_key_string()).unwrap();
            prop_assert_eq!(parsed, path);
        }

        #[test]
        fn children_of_one_parent_are_independent(
            base in proptest::collection::vec("[a-z]{1,4}", 1..4),
            names in proptest::collection::vec("[a-z]{1,4}", 1..6),
        ) {
            let parent = Path::parse(&base.join("/")).unwrap();
            let children: Vec<Path> = names
                .iter()
                .map(|n| parent.child(n.as_bytes()).unwrap())
                .collect();
            for (child, name) in children.iter().zip(&names) {
                prop_assert_eq!(child.depth(), parent.depth() + 1);
                prop_assert_eq!(child.name(), name.as_bytes());
                prop_assert!(child.starts_with(&parent));
                prop_assert_eq!(child.parent().unwrap(), parent.clone());
            }
        }
    }
}
