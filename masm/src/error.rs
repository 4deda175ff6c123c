//! Assembler diagnostics.
//!
//! Every error carries the 1-based source line it came from. Pass 1
//! accumulates these across the whole source rather than stopping at the
//! first one, the way the teacher's `vasm::error` module structures a
//! nested `Error::Parse` / `Error::Assemble` split — except here both
//! categories collapse into one flat, `thiserror`-derived enum, since the
//! hand-rolled tokenizer has no separate parser-library error type to wrap.

use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum AssembleError {
    #[error("line {line}: \"{label}\" is not a valid label")]
    InvalidLabel { line: usize, label: String },

    #[error("line {line}: label \"{label}\" is already defined")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: unknown mnemonic \"{mnemonic}\"")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: \"{statement}\" is missing its operand")]
    MissingOperand { line: usize, statement: String },

    #[error("line {line}: \"{mnemonic}\" does not take an operand")]
    UnexpectedOperand { line: usize, mnemonic: String },

    #[error("line {line}: label \"{label}\" was never defined")]
    UndefinedLabel { line: usize, label: String },

    #[error("line {line}: \"{operand}\" is neither a defined label nor a 3-digit hex literal")]
    InvalidOperand { line: usize, operand: String },

    #[error("line {line}: literal \"{literal}\" is out of range")]
    LiteralOutOfRange { line: usize, literal: String },

    #[error("line {line}: ORG address \"{literal}\" is out of range (000..FFF)")]
    OrgOutOfRange { line: usize, literal: String },

    #[error("line {line}: a label must be followed by a statement")]
    EmptyStatement { line: usize },
}
