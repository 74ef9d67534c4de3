//! All-or-nothing block appends
//!
//! A [`Transaction`] records the length of every graph array when a block
//! append starts. On failure the arrays are truncated back to the recorded
//! lengths, which restores the batch exactly: all mutations during an append
//! are pushes to the tails of the arrays.

use crate::graph::GraphArrays;

/// Snapshot of the graph array lengths at the start of a block append.
///
/// The transaction is resolved exactly once, either with [`commit`] (keep
/// the appended data) or [`rollback`] (discard it); both consume the
/// transaction.
///
/// [`commit`]: Transaction::commit
/// [`rollback`]: Transaction::rollback
#[must_use]
pub(crate) struct Transaction {
    node_types_len: usize,
    node_features_len: usize,
    edge_senders_len: usize,
    edge_receivers_len: usize,
    edge_types_len: usize,
    num_nodes_per_block_len: usize,
    num_edges_per_block_len: usize,
    global_features_len: usize,
}

impl Transaction {
    /// Record the current length of every array.
    pub fn open(arrays: &GraphArrays) -> Self {
        Self {
            node_types_len: arrays.node_types.len(),
            node_features_len: arrays.node_features.len(),
            edge_senders_len: arrays.edge_senders.len(),
            edge_receivers_len: arrays.edge_receivers.len(),
            edge_types_len: arrays.edge_types.len(),
            num_nodes_per_block_len: arrays.num_nodes_per_block.len(),
            num_edges_per_block_len: arrays.num_edges_per_block.len(),
            global_features_len: arrays.global_features.len(),
        }
    }

    /// Keep the data appended since [`Transaction::open`].
    pub fn commit(self) {}

    /// Truncate every array back to its recorded length.
    ///
    /// # Panics
    ///
    /// Panics if any array is shorter than its recorded length. The arrays
    /// only shrink through `reset()`, so a shrink mid-transaction means the
    /// builder was reset while a block append was in flight.
    pub fn rollback(self, arrays: &mut GraphArrays) {
        truncate_checked(&mut arrays.node_types, self.node_types_len, "node_types");
        truncate_checked(
            &mut arrays.node_features,
            self.node_features_len,
            "node_features",
        );
        truncate_checked(
            &mut arrays.edge_senders,
            self.edge_senders_len,
            "edge_senders",
        );
        truncate_checked(
            &mut arrays.edge_receivers,
            self.edge_receivers_len,
            "edge_receivers",
        );
        truncate_checked(&mut arrays.edge_types, self.edge_types_len, "edge_types");
        truncate_checked(
            &mut arrays.num_nodes_per_block,
            self.num_nodes_per_block_len,
            "num_nodes_per_block",
        );
        truncate_checked(
            &mut arrays.num_edges_per_block,
            self.num_edges_per_block_len,
            "num_edges_per_block",
        );
        truncate_checked(
            &mut arrays.global_features,
            self.global_features_len,
            "global_features",
        );
    }
}

fn truncate_checked<T>(vec: &mut Vec<T>, recorded_len: usize, name: &str) {
    assert!(
        vec.len() >= recorded_len,
        "{name} shrank during a transaction ({} < {recorded_len}); \
         was the builder reset while a block was being appended?",
        vec.len(),
    );
    vec.truncate(recorded_len);
}
