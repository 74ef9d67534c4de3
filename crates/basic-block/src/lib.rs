//! Structured machine instruction model
//!
//! This crate defines the instruction representation consumed by the graph
//! builder:
//!
//! - [`Instruction`]: a decoded instruction with its mnemonic, prefixes and
//!   four ordered operand lists (explicit/implicit × input/output)
//! - [`InstructionOperand`]: a closed sum type over the operand kinds
//! - [`AddressTuple`]: the decomposed form of an address computation
//!   (base + index * scaling + displacement, with an optional segment)
//!
//! Producers of these values (disassemblers, dataset importers) live outside
//! this workspace; the types here are the seam between them and the graph
//! builder.
//!
//! # Modules
//!
//! - [`instruction`]: the instruction and operand types
//! - [`tokens`]: canonical structural tokens shared by vocabularies

pub mod instruction;
pub mod tokens;

pub use instruction::{AddressTuple, Instruction, InstructionOperand};
