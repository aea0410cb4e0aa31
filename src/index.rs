//! Key indexing
//!
//! Maps user identifiers and date strings to dense row/column positions.
//! Positions are assigned in first-seen order and form a contiguous range
//! starting at zero.

use std::collections::HashMap;

use crate::error::GridError;

/// Bijective mapping from string keys to positions `[0, len)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIndex {
    /// Keys in position order
    keys: Vec<String>,
    positions: HashMap<String, usize>,
}

impl KeyIndex {
    /// Build an index from an ordered key sequence.
    ///
    /// Duplicate keys keep the position of their first occurrence.
    /// An empty sequence is rejected since nothing downstream can index into it.
    pub fn build<I, S>(keys: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self {
            keys: Vec::new(),
            positions: HashMap::new(),
        };

        for key in keys {
            let key = key.into();
            if !index.positions.contains_key(&key) {
                index.positions.insert(key.clone(), index.keys.len());
                index.keys.push(key);
            }
        }

        if index.keys.is_empty() {
            return Err(GridError::InvalidInput(
                "cannot build an index from an empty key sequence".to_string(),
            ));
        }

        Ok(index)
    }

    /// Position of a key, if present
    pub fn get(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in position order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Iterate `(key, position)` pairs in position order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys.iter().enumerate().map(|(i, k)| (k.as_str(), i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_first_seen_order() {
        let index = KeyIndex::build(["u2", "u1", "u3"]).unwrap();

        assert_eq!(index.get("u2"), Some(0));
        assert_eq!(index.get("u1"), Some(1));
        assert_eq!(index.get("u3"), Some(2));
        assert_eq!(index.get("u4"), None);
    }

    #[test]
    fn test_duplicates_collapse() {
        let index = KeyIndex::build(["a", "b", "a", "c", "b"]).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.keys(), &["a", "b", "c"]);
        assert_eq!(index.get("c"), Some(2));
    }

    #[test]
    fn test_positions_are_contiguous() {
        let keys: Vec<String> = (0..50).map(|i| format!("user-{}", i % 17)).collect();
        let index = KeyIndex::build(keys).unwrap();

        assert_eq!(index.len(), 17);
        let mut positions: Vec<usize> = index.iter().map(|(_, p)| p).collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..17).collect::<Vec<_>>());

        for (key, position) in index.iter() {
            assert_eq!(index.get(key), Some(position));
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = KeyIndex::build(Vec::<String>::new());
        assert!(matches!(result, Err(GridError::InvalidInput(_))));
    }
}
