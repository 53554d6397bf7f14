use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Transaction ids already folded into the mined total.
///
/// Never pruned: ids stay for as long as the tracking state lives, so the set
/// grows with the account's transaction volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownTransactions(HashSet<String>);

impl KnownTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_new(&self, id: &str) -> bool {
        !self.0.contains(id)
    }

    pub fn mark_known(&mut self, id: impl Into<String>) {
        self.0.insert(id.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for KnownTransactions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_then_not_new() {
        let mut known = KnownTransactions::new();
        assert!(known.is_new("abc"));
        known.mark_known("abc");
        assert!(!known.is_new("abc"));
        known.mark_known("abc");
        assert_eq!(known.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let known: KnownTransactions = vec!["x".to_string()].into_iter().collect();
        assert_eq!(serde_json::to_string(&known).unwrap(), r#"["x"]"#);

        let back: KnownTransactions = serde_json::from_str(r#"["x","y","x"]"#).unwrap();
        assert_eq!(back.len(), 2);
        assert!(!back.is_new("y"));
    }
}
