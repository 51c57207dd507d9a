use std::fmt;

/// Separator between the segments of a field path (`outer###0###inner`).
pub const KEY_SEPARATOR: &str = "###";

/// Location of a field inside the form data: property keys for objects,
/// decimal indices for arrays. The empty path is the root object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    /// Parse a `###`-separated path. The empty string is the root.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        FieldPath(path.split(KEY_SEPARATOR).map(String::from).collect())
    }

    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.into());
        FieldPath(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment, if any.
    pub fn key(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Split into the parent path and the last segment.
    pub fn split_last(&self) -> Option<(FieldPath, &str)> {
        let (last, parent) = self.0.split_last()?;
        Some((FieldPath(parent.to_vec()), last.as_str()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(KEY_SEPARATOR))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = FieldPath::parse("outer###0###inner");
        assert_eq!(path.segments(), ["outer", "0", "inner"]);
        assert_eq!(path.to_string(), "outer###0###inner");
        assert_eq!(path.key(), Some("inner"));
        assert!(FieldPath::parse("").is_root());
        assert_eq!(FieldPath::root().child("a").index(2).to_string(), "a###2");
    }

    #[test]
    fn test_split_last() {
        let path = FieldPath::parse("a###b");
        let (parent, last) = path.split_last().unwrap();
        assert_eq!(parent, FieldPath::parse("a"));
        assert_eq!(last, "b");
        assert_eq!(FieldPath::root().split_last(), None);
    }
}
