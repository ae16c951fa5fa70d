//! Set of issue keys that have already been handled.

use std::collections::HashSet;

/// Tracks issue keys the watcher has already seen, alerted or not.
///
/// Keys are never removed, so memory grows with the number of distinct issues
/// the filter returns over the life of the process. For filters that close and
/// open thousands of issues a day, restart the process periodically.
#[derive(Debug, Clone, Default)]
pub struct SeenIssueRegistry {
    keys: HashSet<String>,
}

impl SeenIssueRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an issue key has been seen.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Mark an issue key as seen. Returns `true` if it was not seen before.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    /// Number of seen keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_default() {
        let registry = SeenIssueRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains("OPS-1"));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut registry = SeenIssueRegistry::new();

        assert!(registry.insert("OPS-1"));
        assert_eq!(registry.len(), 1);

        assert!(!registry.insert("OPS-1"));
        assert!(registry.contains("OPS-1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut registry = SeenIssueRegistry::new();
        registry.insert("OPS-1");
        assert!(!registry.contains("ops-1"));
    }
}
