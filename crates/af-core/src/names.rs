//! Unique identifier allocation.

use std::collections::HashSet;

/// Allocates names that are unique within a model and legal as identifiers
/// in every code-generation dialect.
///
/// Requested names are sanitized (characters outside `[A-Za-z0-9_]` become
/// `_`, a leading digit gets a `_` prefix). A name already taken receives
/// the first free `_<n>` suffix, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct NameList {
    names: HashSet<String>,
}

impl NameList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve and return a unique name derived from `requested`.
    pub fn get(&mut self, requested: &str) -> String {
        let base = sanitize(requested);
        let mut candidate = base.clone();
        let mut suffix = 1_usize;
        while self.names.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.names.insert(candidate.clone());
        candidate
    }

    /// Reserve a name verbatim. Returns false if it was already taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Map arbitrary text onto `[A-Za-z0-9_]+` without a leading digit.
pub fn sanitize(requested: &str) -> String {
    let mut out: String = requested
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_get_suffixes() {
        let mut names = NameList::new();
        assert_eq!(names.get("limiter"), "limiter");
        assert_eq!(names.get("limiter"), "limiter_1");
        assert_eq!(names.get("limiter"), "limiter_2");
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn illegal_characters_are_replaced() {
        let mut names = NameList::new();
        assert_eq!(names.get("Cm total (body)"), "Cm_total__body_");
        assert_eq!(names.get("2nd"), "_2nd");
        assert_eq!(names.get(""), "_");
    }

    #[test]
    fn suffix_skips_reserved_names() {
        let mut names = NameList::new();
        assert!(names.reserve("x_1"));
        assert!(!names.reserve("x_1"));
        assert_eq!(names.get("x"), "x");
        assert_eq!(names.get("x"), "x_2");
        assert!(names.contains("x_2"));
    }
}
