//! Instruction and operand types.

use std::fmt;

/// The decomposed form of an address computation:
/// `segment:[base + index * scaling + displacement]`.
///
/// Absent registers are `None`. A displacement of zero means "no
/// displacement"; producers do not emit an explicit zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTuple {
    /// Base register of the address, if any.
    pub base_register: Option<String>,
    /// Index register of the address, if any.
    pub index_register: Option<String>,
    /// Segment register override, if any.
    pub segment_register: Option<String>,
    /// Constant displacement added to the address.
    pub displacement: i64,
    /// Multiplier applied to the index register (1, 2, 4 or 8 on x86-64).
    pub scaling: i32,
}

impl fmt::Display for AddressTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(segment) = &self.segment_register {
            write!(f, "{segment}:")?;
        }
        write!(f, "[")?;
        let mut separator = "";
        if let Some(base) = &self.base_register {
            write!(f, "{base}")?;
            separator = " + ";
        }
        if let Some(index) = &self.index_register {
            write!(f, "{separator}{index}")?;
            if self.scaling > 1 {
                write!(f, "*{}", self.scaling)?;
            }
            separator = " + ";
        }
        if self.displacement != 0 {
            write!(f, "{separator}{}", self.displacement)?;
        }
        write!(f, "]")
    }
}

/// A single operand of an instruction.
///
/// Immediate operands carry their value even though not all consumers use
/// it; the graph builder, for one, looks only at the operand kind.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionOperand {
    /// A register operand, identified by its canonical name.
    Register(String),
    /// An integer immediate value.
    Immediate(u64),
    /// A floating-point immediate value.
    FpImmediate(f64),
    /// An address computation, e.g. the `[RSI + 8]` of a load.
    Address(AddressTuple),
    /// A memory access. Operands with the same alias group id may refer to
    /// the same storage.
    Memory {
        /// The alias group of the accessed memory.
        alias_group_id: usize,
    },
    /// An operand the producer could not classify. Consumers treat this as
    /// malformed input.
    Unknown,
}

impl fmt::Display for InstructionOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionOperand::Register(name) => write!(f, "{name}"),
            InstructionOperand::Immediate(value) => write!(f, "{value}"),
            InstructionOperand::FpImmediate(value) => write!(f, "{value}"),
            InstructionOperand::Address(address) => write!(f, "{address}"),
            InstructionOperand::Memory { alias_group_id } => {
                write!(f, "mem:{alias_group_id}")
            }
            InstructionOperand::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// A decoded instruction with explicit operand structure.
///
/// Operands are split four ways: explicit vs. implicit, and input vs.
/// output. Implicit operands are read or written by the instruction without
/// being named in the assembly (flag registers, fixed-register forms). The
/// order within each list follows the producer and is preserved by
/// consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instruction {
    /// Canonicalized mnemonic of the instruction.
    pub mnemonic: String,
    /// Prefixes applied to the instruction, in the order they appear.
    pub prefixes: Vec<String>,
    /// Explicit input operands, in assembly order.
    pub input_operands: Vec<InstructionOperand>,
    /// Implicit input operands.
    pub implicit_input_operands: Vec<InstructionOperand>,
    /// Explicit output operands, in assembly order.
    pub output_operands: Vec<InstructionOperand>,
    /// Implicit output operands.
    pub implicit_output_operands: Vec<InstructionOperand>,
}

impl Instruction {
    /// Create an instruction with the given mnemonic and no prefixes or
    /// operands. Fill in operand lists with struct update syntax.
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for prefix in &self.prefixes {
            write!(f, "{prefix} ")?;
        }
        write!(f, "{}", self.mnemonic)?;
        let mut separator = " ";
        for operand in self.output_operands.iter().chain(&self.input_operands) {
            write!(f, "{separator}{operand}")?;
            separator = ", ";
        }
        Ok(())
    }
}
