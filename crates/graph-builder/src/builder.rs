//! Basic block graph builder
//!
//! Translates instruction sequences into the batched graph described in the
//! crate docs. One builder accumulates any number of blocks; the parallel
//! arrays grow monotonically across successful [`add_block`] calls and are
//! read back through the accessors.
//!
//! [`add_block`]: BasicBlockGraphBuilder::add_block

use std::collections::HashMap;
use std::fmt::Display;

use basic_block::{Instruction, InstructionOperand};
use petgraph::graph::DiGraph;
use thiserror::Error;
use tracing::warn;

use crate::{
    graph::{EdgeType, GraphArrays, NodeIndex, NodeType},
    oov::OovPolicy,
    transaction::Transaction,
    vocabulary::{TokenIndex, Vocabulary},
};

/// Result type alias for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Recoverable errors during a block append.
#[derive(Debug, Clone, Error)]
pub enum BuilderError {
    /// A node token was not in the vocabulary and the builder uses
    /// [`OovPolicy::ReturnError`].
    #[error("token is not in the vocabulary: '{token}'")]
    UnknownToken { token: String },
}

/// The out-of-vocabulary policy with its replacement token resolved.
enum ResolvedOovPolicy {
    ReturnError,
    ReplaceToken(TokenIndex),
}

/// Builds a batch of heterogeneous graphs from basic blocks.
///
/// The batch is exposed as parallel arrays: node types and token features
/// indexed by node, edge senders/receivers/types indexed by edge, and
/// per-block node counts, edge counts and token histograms indexed by
/// block. Within one block, register reads share the node of the most
/// recent write (or a fresh node standing for the live-in value), and
/// memory operands are shared per alias group; nothing is shared across
/// blocks.
///
/// A failed [`add_block`] rolls back every array, so the builder is always
/// in the state produced by its successful calls alone.
///
/// [`add_block`]: BasicBlockGraphBuilder::add_block
pub struct BasicBlockGraphBuilder {
    vocabulary: Vocabulary,
    immediate_token: TokenIndex,
    fp_immediate_token: TokenIndex,
    address_token: TokenIndex,
    memory_token: TokenIndex,
    oov_policy: ResolvedOovPolicy,

    arrays: GraphArrays,

    /// Register name → its current node, cleared before each block.
    register_nodes: HashMap<String, NodeIndex>,
    /// Alias group id → its current node, cleared before each block.
    alias_group_nodes: HashMap<usize, NodeIndex>,
}

impl BasicBlockGraphBuilder {
    /// Create a builder over the given vocabulary.
    ///
    /// The four named tokens are resolved eagerly; they carry the features
    /// of immediate, floating-point immediate, address and memory nodes,
    /// whose types alone determine their token.
    ///
    /// # Panics
    ///
    /// Panics if `tokens` contains duplicates, if any of the four named
    /// tokens is absent from the vocabulary, or if the replacement token of
    /// [`OovPolicy::ReplaceToken`] is absent.
    pub fn new(
        tokens: Vec<String>,
        immediate_token: &str,
        fp_immediate_token: &str,
        address_token: &str,
        memory_token: &str,
        oov_policy: OovPolicy,
    ) -> Self {
        let vocabulary = Vocabulary::from_tokens(tokens);
        let oov_policy = match oov_policy {
            OovPolicy::ReturnError => ResolvedOovPolicy::ReturnError,
            OovPolicy::ReplaceToken(replacement) => {
                ResolvedOovPolicy::ReplaceToken(vocabulary.resolve(&replacement))
            }
        };
        Self {
            immediate_token: vocabulary.resolve(immediate_token),
            fp_immediate_token: vocabulary.resolve(fp_immediate_token),
            address_token: vocabulary.resolve(address_token),
            memory_token: vocabulary.resolve(memory_token),
            vocabulary,
            oov_policy,
            arrays: GraphArrays::default(),
            register_nodes: HashMap::new(),
            alias_group_nodes: HashMap::new(),
        }
    }

    /// Append one basic block to the batch.
    ///
    /// On success the batch gains one block entry (possibly with zero nodes
    /// and edges, for an empty instruction sequence). On error the batch is
    /// left exactly as it was before the call.
    ///
    /// # Panics
    ///
    /// Panics on malformed input: an [`InstructionOperand::Unknown`]
    /// operand anywhere, or an immediate, floating-point immediate or
    /// address expression used as an output operand.
    pub fn add_block(&mut self, instructions: &[Instruction]) -> BuilderResult<()> {
        let transaction = Transaction::open(&self.arrays);

        // The scratch maps are per block; sharing register or memory nodes
        // across blocks would create spurious cross-block data flow.
        self.register_nodes.clear();
        self.alias_group_nodes.clear();

        match self.translate_block(instructions) {
            Ok(()) => {
                transaction.commit();
                Ok(())
            }
            Err(error) => {
                transaction.rollback(&mut self.arrays);
                Err(error)
            }
        }
    }

    /// Discard all blocks. The vocabulary and policy are retained.
    pub fn reset(&mut self) {
        self.arrays.clear();
    }

    fn translate_block(&mut self, instructions: &[Instruction]) -> BuilderResult<()> {
        let prev_num_nodes = self.num_nodes();
        let prev_num_edges = self.num_edges();

        let mut previous_instruction_node: Option<NodeIndex> = None;
        for instruction in instructions {
            let instruction_node = self.add_node(NodeType::Instruction, &instruction.mnemonic)?;

            for prefix in &instruction.prefixes {
                let prefix_node = self.add_node(NodeType::Prefix, prefix)?;
                self.add_edge(EdgeType::InstructionPrefix, prefix_node, instruction_node);
            }

            if let Some(previous) = previous_instruction_node {
                self.add_edge(EdgeType::StructuralDependency, previous, instruction_node);
            }

            for operand in &instruction.input_operands {
                self.add_input_operand(instruction_node, operand)?;
            }
            for operand in &instruction.implicit_input_operands {
                self.add_input_operand(instruction_node, operand)?;
            }

            for operand in &instruction.output_operands {
                self.add_output_operand(instruction_node, operand)?;
            }
            for operand in &instruction.implicit_output_operands {
                self.add_output_operand(instruction_node, operand)?;
            }

            previous_instruction_node = Some(instruction_node);
        }

        let mut histogram = vec![0usize; self.vocabulary.len()];
        for &token in &self.arrays.node_features[prev_num_nodes..] {
            histogram[token] += 1;
        }
        self.arrays.global_features.push(histogram);

        let num_nodes = self.num_nodes();
        let num_edges = self.num_edges();
        self.arrays.num_nodes_per_block.push(num_nodes - prev_num_nodes);
        self.arrays.num_edges_per_block.push(num_edges - prev_num_edges);
        Ok(())
    }

    fn add_input_operand(
        &mut self,
        instruction_node: NodeIndex,
        operand: &InstructionOperand,
    ) -> BuilderResult<()> {
        assert!(instruction_node < self.num_nodes());

        match operand {
            InstructionOperand::Register(name) => {
                self.add_dependency_on_register(instruction_node, name, EdgeType::InputOperands)?;
            }
            InstructionOperand::Immediate(_) => {
                let node = self.add_node_with_token(NodeType::Immediate, self.immediate_token);
                self.add_edge(EdgeType::InputOperands, node, instruction_node);
            }
            InstructionOperand::FpImmediate(_) => {
                let node =
                    self.add_node_with_token(NodeType::FpImmediate, self.fp_immediate_token);
                self.add_edge(EdgeType::InputOperands, node, instruction_node);
            }
            InstructionOperand::Address(address) => {
                let address_node =
                    self.add_node_with_token(NodeType::AddressOperand, self.address_token);
                if let Some(base) = &address.base_register {
                    self.add_dependency_on_register(
                        address_node,
                        base,
                        EdgeType::AddressBaseRegister,
                    )?;
                }
                if let Some(index) = &address.index_register {
                    self.add_dependency_on_register(
                        address_node,
                        index,
                        EdgeType::AddressIndexRegister,
                    )?;
                }
                if let Some(segment) = &address.segment_register {
                    self.add_dependency_on_register(
                        address_node,
                        segment,
                        EdgeType::AddressSegmentRegister,
                    )?;
                }
                if address.displacement != 0 {
                    let displacement_node =
                        self.add_node_with_token(NodeType::Immediate, self.immediate_token);
                    self.add_edge(EdgeType::AddressDisplacement, displacement_node, address_node);
                }
                // The scale factor is not represented in the graph.
                self.add_edge(EdgeType::InputOperands, address_node, instruction_node);
            }
            InstructionOperand::Memory { alias_group_id } => {
                let memory_node = match self.alias_group_nodes.get(alias_group_id).copied() {
                    Some(node) => node,
                    None => {
                        let node =
                            self.add_node_with_token(NodeType::MemoryOperand, self.memory_token);
                        self.alias_group_nodes.insert(*alias_group_id, node);
                        node
                    }
                };
                self.add_edge(EdgeType::InputOperands, memory_node, instruction_node);
            }
            InstructionOperand::Unknown => {
                panic!("the instruction has an unknown input operand")
            }
        }
        Ok(())
    }

    fn add_output_operand(
        &mut self,
        instruction_node: NodeIndex,
        operand: &InstructionOperand,
    ) -> BuilderResult<()> {
        assert!(instruction_node < self.num_nodes());

        match operand {
            InstructionOperand::Register(name) => {
                // A write always gets a fresh node; reads later in the block
                // attach to it rather than to the overwritten value.
                let register_node = self.add_node(NodeType::Register, name)?;
                self.add_edge(EdgeType::OutputOperands, instruction_node, register_node);
                self.register_nodes.insert(name.clone(), register_node);
            }
            InstructionOperand::Immediate(_)
            | InstructionOperand::FpImmediate(_)
            | InstructionOperand::Address(_) => {
                panic!(
                    "immediate values, floating-point immediate values and address \
                     expressions can't be output operands"
                );
            }
            InstructionOperand::Memory { alias_group_id } => {
                let memory_node =
                    self.add_node_with_token(NodeType::MemoryOperand, self.memory_token);
                self.alias_group_nodes.insert(*alias_group_id, memory_node);
                self.add_edge(EdgeType::OutputOperands, instruction_node, memory_node);
            }
            InstructionOperand::Unknown => {
                panic!("the instruction has an unknown output operand")
            }
        }
        Ok(())
    }

    /// Adds an edge of `edge_type` from the register's current node to
    /// `dependent_node`.
    ///
    /// When the register has not been touched yet in this block, a node is
    /// created for it with no incoming edge; it stands for the value the
    /// register holds when the block is entered.
    fn add_dependency_on_register(
        &mut self,
        dependent_node: NodeIndex,
        register_name: &str,
        edge_type: EdgeType,
    ) -> BuilderResult<()> {
        let register_node = match self.register_nodes.get(register_name).copied() {
            Some(node) => node,
            None => {
                let node = self.add_node(NodeType::Register, register_name)?;
                self.register_nodes.insert(register_name.to_owned(), node);
                node
            }
        };
        self.add_edge(edge_type, register_node, dependent_node);
        Ok(())
    }

    /// Appends a node whose token feature is already resolved.
    fn add_node_with_token(&mut self, node_type: NodeType, token_index: TokenIndex) -> NodeIndex {
        let node = self.num_nodes();
        self.arrays.node_types.push(node_type);
        self.arrays.node_features.push(token_index);
        node
    }

    /// Appends a node, resolving `token` through the vocabulary and the
    /// out-of-vocabulary policy.
    fn add_node(&mut self, node_type: NodeType, token: &str) -> BuilderResult<NodeIndex> {
        let token_index = match self.vocabulary.get(token) {
            Some(index) => index,
            None => {
                warn!("unexpected node token: '{}'", token);
                match self.oov_policy {
                    ResolvedOovPolicy::ReturnError => {
                        return Err(BuilderError::UnknownToken {
                            token: token.to_owned(),
                        })
                    }
                    ResolvedOovPolicy::ReplaceToken(replacement) => replacement,
                }
            }
        };
        Ok(self.add_node_with_token(node_type, token_index))
    }

    fn add_edge(&mut self, edge_type: EdgeType, sender: NodeIndex, receiver: NodeIndex) {
        assert!(sender < self.num_nodes());
        assert!(receiver < self.num_nodes());
        self.arrays.edge_senders.push(sender);
        self.arrays.edge_receivers.push(receiver);
        self.arrays.edge_types.push(edge_type);
    }

    /// Number of nodes across all blocks.
    pub fn num_nodes(&self) -> usize {
        self.arrays.num_nodes()
    }

    /// Number of edges across all blocks.
    pub fn num_edges(&self) -> usize {
        self.arrays.num_edges()
    }

    /// Number of blocks appended since construction or the last `reset`.
    pub fn num_blocks(&self) -> usize {
        self.arrays.num_nodes_per_block.len()
    }

    /// Size of the vocabulary.
    pub fn num_node_tokens(&self) -> usize {
        self.vocabulary.len()
    }

    /// Type of each node.
    pub fn node_types(&self) -> &[NodeType] {
        &self.arrays.node_types
    }

    /// Token feature of each node.
    pub fn node_features(&self) -> &[TokenIndex] {
        &self.arrays.node_features
    }

    /// Source node of each edge.
    pub fn edge_senders(&self) -> &[NodeIndex] {
        &self.arrays.edge_senders
    }

    /// Destination node of each edge.
    pub fn edge_receivers(&self) -> &[NodeIndex] {
        &self.arrays.edge_receivers
    }

    /// Type of each edge.
    pub fn edge_types(&self) -> &[EdgeType] {
        &self.arrays.edge_types
    }

    /// Number of nodes contributed by each block.
    pub fn num_nodes_per_block(&self) -> &[usize] {
        &self.arrays.num_nodes_per_block
    }

    /// Number of edges contributed by each block.
    pub fn num_edges_per_block(&self) -> &[usize] {
        &self.arrays.num_edges_per_block
    }

    /// Per-block histograms of node token features.
    pub fn global_features(&self) -> &[Vec<usize>] {
        &self.arrays.global_features
    }

    /// Numeric code of each edge's type, indexed by edge.
    pub fn edge_features(&self) -> Vec<usize> {
        self.arrays.edge_types.iter().map(|t| t.code()).collect()
    }

    /// For each node, whether it is an instruction node.
    pub fn instruction_node_mask(&self) -> Vec<bool> {
        self.arrays
            .node_types
            .iter()
            .map(|&node_type| node_type == NodeType::Instruction)
            .collect()
    }

    /// For each instruction node in node order, the 0-based index of the
    /// block it belongs to.
    ///
    /// # Panics
    ///
    /// Panics when the walk over the per-block node counts does not line up
    /// with the node arrays; that indicates internal corruption, not bad
    /// input.
    pub fn delta_block_index(&self) -> Vec<usize> {
        let num_instructions = self
            .arrays
            .node_types
            .iter()
            .filter(|&&node_type| node_type == NodeType::Instruction)
            .count();
        let num_blocks = self.num_blocks() as isize;

        let mut delta_block_index = Vec::with_capacity(num_instructions);
        let mut block: isize = -1;
        let mut block_end: usize = 0;
        for (node, &node_type) in self.arrays.node_types.iter().enumerate() {
            if node_type != NodeType::Instruction {
                continue;
            }
            while node >= block_end && block < num_blocks {
                block += 1;
                block_end += self.arrays.num_nodes_per_block[block as usize];
            }
            delta_block_index.push(block as usize);
        }

        assert_eq!(
            block,
            num_blocks - 1,
            "the last instruction node does not fall in the last block"
        );
        assert_eq!(block_end, self.num_nodes(), "block sizes do not cover the node array");
        assert_eq!(delta_block_index.len(), num_instructions);
        delta_block_index
    }

    /// Export the batch as a `petgraph` graph, with `(type, token)` node
    /// weights and edge-type edge weights. Node indices in the result equal
    /// the builder's node indices.
    pub fn to_digraph(&self) -> DiGraph<(NodeType, TokenIndex), EdgeType> {
        let mut graph = DiGraph::with_capacity(self.num_nodes(), self.num_edges());
        let nodes: Vec<_> = self
            .arrays
            .node_types
            .iter()
            .zip(&self.arrays.node_features)
            .map(|(&node_type, &token)| graph.add_node((node_type, token)))
            .collect();
        for ((&sender, &receiver), &edge_type) in self
            .arrays
            .edge_senders
            .iter()
            .zip(&self.arrays.edge_receivers)
            .zip(&self.arrays.edge_types)
        {
            graph.add_edge(nodes[sender], nodes[receiver], edge_type);
        }
        graph
    }

    /// Human-readable dump of the batch. The set of keys is stable; the
    /// exact formatting is not a contract.
    pub fn debug_string(&self) -> String {
        let mut buffer = String::new();
        buffer.push_str(&format!("num_blocks = {}\n", self.num_blocks()));
        buffer.push_str(&format!("num_nodes = {}\n", self.num_nodes()));
        buffer.push_str(&format!("num_edges = {}\n", self.num_edges()));
        buffer.push_str(&format!("num_node_tokens = {}\n", self.num_node_tokens()));
        append_list(&mut buffer, "num_nodes_per_block", self.num_nodes_per_block());
        append_list(&mut buffer, "num_edges_per_block", self.num_edges_per_block());
        append_list(&mut buffer, "node_types", self.node_types());
        append_list(&mut buffer, "node_features", self.node_features());
        append_list(&mut buffer, "edge_senders", self.edge_senders());
        append_list(&mut buffer, "edge_receivers", self.edge_receivers());
        append_list(&mut buffer, "edge_types", self.edge_types());
        append_list(&mut buffer, "instruction_node_mask", &self.instruction_node_mask());
        append_list(&mut buffer, "delta_block_index", &self.delta_block_index());
        buffer
    }
}

fn append_list<T: Display>(buffer: &mut String, name: &str, items: &[T]) {
    let rendered: Vec<String> = items.iter().map(|item| item.to_string()).collect();
    buffer.push_str(&format!("{name} = [{}]\n", rendered.join(",")));
}
