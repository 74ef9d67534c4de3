//! Graph data structures
//!
//! The batch is stored as flat parallel arrays addressed by dense indices;
//! node and edge types are closed enums whose numeric codes are part of the
//! output contract (downstream models embed them directly).

use std::fmt;

use crate::vocabulary::TokenIndex;

/// Dense index of a node in the batch, in `[0, num_nodes)`.
pub type NodeIndex = usize;

/// Type of a node in the graph.
///
/// The numeric codes are stable: they follow the declaration order and are
/// consumed as-is by downstream models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    /// One node per instruction in the block.
    Instruction = 0,
    /// The value of a register between two writes.
    Register = 1,
    /// An integer immediate value.
    Immediate = 2,
    /// A floating-point immediate value.
    FpImmediate = 3,
    /// An address computed by an addressing expression.
    AddressOperand = 4,
    /// The value of a memory region between two writes.
    MemoryOperand = 5,
    /// An instruction prefix.
    Prefix = 6,
}

impl NodeType {
    /// The numeric code of this node type.
    pub const fn code(self) -> usize {
        self as usize
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Instruction => "Instruction",
            NodeType::Register => "Register",
            NodeType::Immediate => "Immediate",
            NodeType::FpImmediate => "FpImmediate",
            NodeType::AddressOperand => "AddressOperand",
            NodeType::MemoryOperand => "MemoryOperand",
            NodeType::Prefix => "Prefix",
        };
        write!(f, "{name}")
    }
}

/// Type of an edge in the graph.
///
/// Like [`NodeType`], the numeric codes follow declaration order and are
/// part of the output contract. Parallel edges and self-loops are permitted;
/// edges are distinguished by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EdgeType {
    /// Sequencing edge between consecutive instructions of a block.
    StructuralDependency = 0,
    /// From an operand node to the instruction that reads it.
    InputOperands = 1,
    /// From an instruction to an operand node it writes.
    OutputOperands = 2,
    /// From the base register node to the address node.
    AddressBaseRegister = 3,
    /// From the index register node to the address node.
    AddressIndexRegister = 4,
    /// From the segment register node to the address node.
    AddressSegmentRegister = 5,
    /// From the displacement immediate node to the address node.
    AddressDisplacement = 6,
    /// Reverse of [`EdgeType::StructuralDependency`]. Reserved for models
    /// that propagate information against instruction order; never emitted
    /// by the builder.
    ReverseStructuralDependency = 7,
    /// From a prefix node to its instruction.
    InstructionPrefix = 8,
}

impl EdgeType {
    /// The numeric code of this edge type.
    pub const fn code(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeType::StructuralDependency => "StructuralDependency",
            EdgeType::InputOperands => "InputOperands",
            EdgeType::OutputOperands => "OutputOperands",
            EdgeType::AddressBaseRegister => "AddressBaseRegister",
            EdgeType::AddressIndexRegister => "AddressIndexRegister",
            EdgeType::AddressSegmentRegister => "AddressSegmentRegister",
            EdgeType::AddressDisplacement => "AddressDisplacement",
            EdgeType::ReverseStructuralDependency => "ReverseStructuralDependency",
            EdgeType::InstructionPrefix => "InstructionPrefix",
        };
        write!(f, "{name}")
    }
}

/// Flat storage of the batch: parallel vectors for nodes, edges and
/// per-block counts.
///
/// Invariants (restored by every rollback):
/// - `node_types.len() == node_features.len()`
/// - `edge_senders.len() == edge_receivers.len() == edge_types.len()`
/// - `num_nodes_per_block`, `num_edges_per_block` and `global_features`
///   have one entry per block and their sums match the node/edge totals
#[derive(Debug, Default)]
pub(crate) struct GraphArrays {
    /// Type of each node.
    pub node_types: Vec<NodeType>,
    /// Token feature of each node.
    pub node_features: Vec<TokenIndex>,
    /// Source node of each edge.
    pub edge_senders: Vec<NodeIndex>,
    /// Destination node of each edge.
    pub edge_receivers: Vec<NodeIndex>,
    /// Type of each edge.
    pub edge_types: Vec<EdgeType>,
    /// Number of nodes contributed by each block.
    pub num_nodes_per_block: Vec<usize>,
    /// Number of edges contributed by each block.
    pub num_edges_per_block: Vec<usize>,
    /// Per-block histogram of node token features, length = vocabulary size.
    pub global_features: Vec<Vec<usize>>,
}

impl GraphArrays {
    pub fn num_nodes(&self) -> usize {
        self.node_types.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_senders.len()
    }

    pub fn clear(&mut self) {
        self.node_types.clear();
        self.node_features.clear();
        self.edge_senders.clear();
        self.edge_receivers.clear();
        self.edge_types.clear();
        self.num_nodes_per_block.clear();
        self.num_edges_per_block.clear();
        self.global_features.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_codes_are_stable() {
        assert_eq!(NodeType::Instruction.code(), 0);
        assert_eq!(NodeType::Register.code(), 1);
        assert_eq!(NodeType::Immediate.code(), 2);
        assert_eq!(NodeType::FpImmediate.code(), 3);
        assert_eq!(NodeType::AddressOperand.code(), 4);
        assert_eq!(NodeType::MemoryOperand.code(), 5);
        assert_eq!(NodeType::Prefix.code(), 6);
    }

    #[test]
    fn test_edge_type_codes_are_stable() {
        assert_eq!(EdgeType::StructuralDependency.code(), 0);
        assert_eq!(EdgeType::InputOperands.code(), 1);
        assert_eq!(EdgeType::OutputOperands.code(), 2);
        assert_eq!(EdgeType::AddressBaseRegister.code(), 3);
        assert_eq!(EdgeType::AddressIndexRegister.code(), 4);
        assert_eq!(EdgeType::AddressSegmentRegister.code(), 5);
        assert_eq!(EdgeType::AddressDisplacement.code(), 6);
        assert_eq!(EdgeType::ReverseStructuralDependency.code(), 7);
        assert_eq!(EdgeType::InstructionPrefix.code(), 8);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(NodeType::AddressOperand.to_string(), "AddressOperand");
        assert_eq!(
            EdgeType::AddressSegmentRegister.to_string(),
            "AddressSegmentRegister"
        );
    }

    #[test]
    fn test_clear_empties_every_array() {
        let mut arrays = GraphArrays::default();
        arrays.node_types.push(NodeType::Instruction);
        arrays.node_features.push(0);
        arrays.edge_senders.push(0);
        arrays.edge_receivers.push(0);
        arrays.edge_types.push(EdgeType::InputOperands);
        arrays.num_nodes_per_block.push(1);
        arrays.num_edges_per_block.push(1);
        arrays.global_features.push(vec![1]);

        arrays.clear();

        assert_eq!(arrays.num_nodes(), 0);
        assert_eq!(arrays.num_edges(), 0);
        assert!(arrays.num_nodes_per_block.is_empty());
        assert!(arrays.num_edges_per_block.is_empty());
        assert!(arrays.global_features.is_empty());
    }
}
