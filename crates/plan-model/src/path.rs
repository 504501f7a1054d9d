//! Field paths into a plan document
//!
//! Provides [`FieldPath`] for pointing validation diagnostics at a specific
//! location, e.g. `blocks[2].data.slides[0].imageUrl`.

use std::fmt::{self, Display, Formatter};

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object field, using the wire (camelCase) name
    Field(String),
    /// Array element
    Index(usize),
}

/// Path within a plan document
///
/// Built incrementally while walking a plan; rendered with dots between
/// fields and brackets around indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// Empty path (the document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path with a single field segment
    #[inline]
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![Segment::Field(name.into())])
    }

    /// Append a field segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::Field(name.into()));
        new
    }

    /// Append an index segment, returning new path
    #[inline]
    #[must_use]
    pub fn index(&self, i: usize) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::Index(i));
        new
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl serde::Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_dollar() {
        assert_eq!(FieldPath::root().to_string(), "$");
    }

    #[test]
    fn mixed_segments_render() {
        let path = FieldPath::field("blocks")
            .index(2)
            .child("data")
            .child("slides")
            .index(0)
            .child("imageUrl");
        assert_eq!(path.to_string(), "blocks[2].data.slides[0].imageUrl");
    }

    #[test]
    fn index_directly_after_field() {
        let path = FieldPath::field("meta").child("flags").index(0);
        assert_eq!(path.to_string(), "meta.flags[0]");
    }
}
