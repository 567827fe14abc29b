use std::io;

use thiserror::Error;

use crate::opcode::{Arity, Opcode};

/// Codec failure kinds.
///
/// Variants that can only arise while reading carry the absolute byte
/// offset at which the violation was detected; domain and consistency
/// checks that also run before encoding identify the offending value or
/// field instead. Nothing is swallowed or logged internally, every
/// failure propagates to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended in the middle of a structure.
    #[error("stream ended at offset {offset:#x}: wanted {expected} more byte(s)")]
    Truncated { expected: usize, offset: u64 },

    /// The header magic was not `0xFA57C0DE`.
    #[error("bad magic {found:#010x}")]
    BadMagic { found: u32 },

    /// Major/minor version or game id outside the accepted set.
    #[error("unsupported version {major}.{minor} (game id {game_id})")]
    UnsupportedVersion { major: u8, minor: u8, game_id: u16 },

    /// A value tag byte outside `0..=5`.
    #[error("unknown value tag {tag} at offset {offset:#x}")]
    UnknownVariableDataTag { tag: u8, offset: u64 },

    /// An opcode byte with no entry in the arity table.
    #[error("unknown opcode {opcode:#04x} at offset {offset:#x}")]
    UnknownOpcode { opcode: u8, offset: u64 },

    /// A wire value whose kind does not fit the slot it occupies, e.g. a
    /// variadic operand count that is not a non-negative integer.
    #[error("expected {expected} at offset {offset:#x}, found {found}")]
    TagPayloadMismatch {
        expected: &'static str,
        found: &'static str,
        offset: u64,
    },

    /// An operand list that violates the opcode's arity.
    #[error("{opcode:?} takes {expected} operand(s), got {found}")]
    BadArity {
        opcode: Opcode,
        expected: Arity,
        found: usize,
    },

    /// A sequence or string longer than its `u16` count field can declare.
    #[error("{field}: length {len} does not fit the count field")]
    CountMismatch { field: &'static str, len: usize },

    /// A string reference past the end of the string table.
    #[error("string index {index} out of range (table holds {count})")]
    StringIndexOutOfRange { index: u16, count: usize },

    /// Property flag bits that disagree with the accessor records present.
    #[error("property flags {flags:#010b} disagree with the accessors present")]
    PropertyFlagsInconsistent { flags: u8 },

    /// An object whose declared size does not match its contents.
    #[error("object declares {declared} byte(s) but its data spans {actual}")]
    ObjectSizeMismatch { declared: u32, actual: u64 },

    /// A debug function type outside `0..=3`.
    #[error("invalid debug function type {value}")]
    InvalidDebugFunctionType { value: u8 },

    /// A user flag naming a bit position past 31.
    #[error("user flag bit {bit} out of range")]
    InvalidFlagBit { bit: u8 },

    /// The underlying stream failed. Short reads surface as [`Error::Truncated`].
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
