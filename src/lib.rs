//! Codec for the PEX (Papyrus Executable) container format, the compiled
//! form of Skyrim and Fallout 4 scripts.
//!
//! [`PexFile::read`] decodes a byte slice into a validated tree of
//! sections; [`PexFile::write`] serializes it back, reproducing a
//! conformant producer's bytes exactly. Both directions also run over
//! arbitrary [`std::io`] streams via [`PexFile::parse`] and
//! [`PexFile::dump`]. All multi-byte integers are big-endian and strings
//! are length-prefixed raw bytes; see the section modules for the exact
//! layouts.

/// Error taxonomy
pub mod error;
/// Instruction model and codec
pub mod instruction;
mod io;
/// Opcodes and the operand arity table
pub mod opcode;
/// Top-level file model
pub mod pex;
/// Section models
pub mod sections;
/// Tagged on-wire values
pub mod value;

pub use self::error::Error;
pub use self::instruction::Instruction;
pub use self::io::{Reader, Writer};
pub use self::opcode::{Arity, Opcode};
pub use self::pex::PexFile;
pub use self::value::{ValueTag, VariableData};
