//! Small helpers shared between the `mano` core crate and the `masm`
//! assembler crate.

use thiserror::Error;

/// Error returned when a string does not match any variant of an
/// [`EnumFromStr`] enum, e.g. an unknown mnemonic or register name.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("failed to parse \"{value}\" as {enum_name}")]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

/// Implemented via `#[derive(EnumFromStr)]` (see `mano-util-derive`) for
/// fieldless enums that need case-sensitive, exact-match string parsing —
/// mnemonics and register names, primarily.
pub trait EnumFromStr: Sized {
    fn from_str(s: &str) -> Result<Self, ParseEnumError>;
}
