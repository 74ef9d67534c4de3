//! Out-of-vocabulary policy
//!
//! Decides what [`BasicBlockGraphBuilder`] does when a node token is not in
//! the vocabulary. The policy is fixed at builder construction.
//!
//! [`BasicBlockGraphBuilder`]: crate::builder::BasicBlockGraphBuilder

/// Behavior on an out-of-vocabulary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OovPolicy {
    /// Node creation fails; the block being appended is rolled back.
    ReturnError,
    /// The unknown token is replaced by the named vocabulary token. The
    /// replacement must itself resolve in the vocabulary; a warning is
    /// logged for each replaced token.
    ReplaceToken(String),
}

impl OovPolicy {
    /// Convenience constructor for [`OovPolicy::ReplaceToken`].
    pub fn replace_with(token: impl Into<String>) -> Self {
        OovPolicy::ReplaceToken(token.into())
    }
}
