//! Incremental builder for JSON-Path-like location strings.
//!
//! Passes build a path as they descend into the document (`$`, `.field`,
//! `[index]`) rather than parsing one back out of a string; this mirrors
//! the document note that the path is "a human aid, not a parser target."

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(String);

impl Path {
    pub fn root() -> Self {
        Path("$".to_string())
    }

    pub fn field(&self, name: &str) -> Self {
        Path(format!("{}.{name}", self.0))
    }

    pub fn index(&self, i: usize) -> Self {
        Path(format!("{}[{i}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_documented_shape() {
        let p = Path::root().field("entities").index(0).field("fields").index(1).field("type").field("inner");
        assert_eq!(p.as_str(), "$.entities[0].fields[1].type.inner");
    }
}
