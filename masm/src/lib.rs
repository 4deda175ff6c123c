//! Two-pass assembler for Mano basic computer assembly source.
//!
//! Pass 1 tokenizes every line, binds labels to addresses, and resolves
//! everything that doesn't depend on the symbol table (`ORG`, `HEX`, `DEC`
//! literals). Pass 2 resolves MRI operands against the now-complete symbol
//! table and emits the final machine-code image. If pass 1 reports any
//! error, pass 2 is skipped entirely — see [`assemble`].

mod assembler;
mod disasm;
mod error;
mod instructions;
mod int_util;
mod labels;
mod lexer;

pub use assembler::{assemble, AssembleResult, Usage};
pub use disasm::disassemble;
pub use error::AssembleError;
pub use instructions::{Encoding, Mnemonic};
pub use labels::LabelMap;
