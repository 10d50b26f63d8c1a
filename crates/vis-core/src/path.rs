//! VIS path handling.
//!
//! VIS paths are dot-separated strings like "Signal.Emulator.speed".
//! Segments form a virtual hierarchy, but the store keys on the raw string;
//! this type is only used where a path has to be taken apart or built up.

/// A parsed VIS path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    /// The original path string
    raw: String,
    /// Path segments split by '.'
    segments: Vec<String>,
}

impl Path {
    /// Separator between path segments.
    pub const SEPARATOR: char = '.';

    /// Parse a path string into segments.
    pub fn new(path: &str) -> Self {
        Self {
            raw: path.to_string(),
            segments: path.split(Self::SEPARATOR).map(String::from).collect(),
        }
    }

    /// Get the raw path string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this path starts with a given prefix, segment by segment.
    ///
    /// "Signal.Emulator.speed" starts with "Signal.Emulator" but not with
    /// "Signal.Emu".
    pub fn starts_with(&self, prefix: &Path) -> bool {
        if prefix.segments.len() > self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(prefix.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Remove a segment prefix, returning the remaining dot-separated tail.
    ///
    /// Returns `None` when the prefix doesn't match or nothing would remain.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<String> {
        if !self.starts_with(prefix) || self.segments.len() == prefix.segments.len() {
            return None;
        }
        let rest = self.segments[prefix.segments.len()..].join(&Self::SEPARATOR.to_string());
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Append a child key, producing "self.key".
    ///
    /// An empty path yields just the key.
    pub fn join(&self, key: &str) -> Path {
        if self.raw.is_empty() {
            Path::new(key)
        } else {
            Path::new(&format!("{}{}{}", self.raw, Self::SEPARATOR, key))
        }
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::new(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path::new(&s)
    }
}

impl From<Path> for String {
    fn from(p: Path) -> Self {
        p.raw
    }
}
