//! Token vocabulary
//!
//! Maps token strings to the dense indices used as node features. The
//! vocabulary is fixed at builder construction; its index assignment follows
//! the order of the input token list so that downstream models see stable
//! feature values.

use std::collections::{hash_map::Entry, HashMap};

/// Dense index of a token in a vocabulary, in `[0, len)`.
pub type TokenIndex = usize;

/// An immutable token → index mapping.
pub struct Vocabulary {
    index: HashMap<String, TokenIndex>,
}

impl Vocabulary {
    /// Build a vocabulary from an ordered token list. The i-th token gets
    /// index `i`.
    ///
    /// # Panics
    ///
    /// Panics if the list contains the same token twice. Duplicates are a
    /// configuration error: the two occurrences would silently disagree on
    /// the token's feature value.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.into_iter().enumerate() {
            match index.entry(token) {
                Entry::Occupied(entry) => {
                    panic!("duplicate vocabulary token: '{}'", entry.key())
                }
                Entry::Vacant(entry) => {
                    entry.insert(i);
                }
            }
        }
        Self { index }
    }

    /// Look up a token. Returns `None` when the token is out of vocabulary.
    pub fn get(&self, token: &str) -> Option<TokenIndex> {
        self.index.get(token).copied()
    }

    /// Look up a token that the configuration requires to be present.
    ///
    /// # Panics
    ///
    /// Panics if the token is absent.
    pub fn resolve(&self, token: &str) -> TokenIndex {
        match self.get(token) {
            Some(index) => index,
            None => panic!("token was not found in the vocabulary: '{token}'"),
        }
    }

    /// Number of tokens in the vocabulary.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary(tokens: &[&str]) -> Vocabulary {
        Vocabulary::from_tokens(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_indices_follow_input_order() {
        let vocabulary = vocabulary(&["MOV", "ADD", "RAX"]);
        assert_eq!(vocabulary.get("MOV"), Some(0));
        assert_eq!(vocabulary.get("ADD"), Some(1));
        assert_eq!(vocabulary.get("RAX"), Some(2));
        assert_eq!(vocabulary.len(), 3);
    }

    #[test]
    fn test_missing_token_is_distinguishable() {
        let vocabulary = vocabulary(&["MOV"]);
        assert_eq!(vocabulary.get("XOR"), None);
    }

    #[test]
    fn test_empty_vocabulary() {
        let vocabulary = vocabulary(&[]);
        assert!(vocabulary.is_empty());
        assert_eq!(vocabulary.get("MOV"), None);
    }

    #[test]
    #[should_panic(expected = "duplicate vocabulary token")]
    fn test_duplicate_token_panics() {
        vocabulary(&["MOV", "ADD", "MOV"]);
    }

    #[test]
    fn test_resolve_present_token() {
        let vocabulary = vocabulary(&["MOV", "ADD"]);
        assert_eq!(vocabulary.resolve("ADD"), 1);
    }

    #[test]
    #[should_panic(expected = "token was not found")]
    fn test_resolve_missing_token_panics() {
        vocabulary(&["MOV"]).resolve("XOR");
    }
}
