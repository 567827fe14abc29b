use std::io::{Read, Write};

use bitflags::bitflags;

use super::string_table::StringIndex;
use super::variable::VariableType;
use crate::error::Error;
use crate::instruction::Instruction;
use crate::io::{self, Reader, Writer};

bitflags! {
    /// Function flag byte. Unknown bits are preserved verbatim.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FunctionFlags: u8 {
        const GLOBAL = 1 << 0;
        /// Implemented by the engine; the body carries no instructions.
        const NATIVE = 1 << 1;
    }
}

/// Function body: signature, frame layout and bytecode.
///
/// Used standalone for property accessors and wrapped in
/// [`super::state::NamedFunction`] inside states.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub return_type: StringIndex,
    pub docstring: StringIndex,
    pub user_flags: u32,
    pub flags: FunctionFlags,
    pub params: Vec<VariableType>,
    pub locals: Vec<VariableType>,
    pub instructions: Vec<Instruction>,
}

impl Function {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            return_type: StringIndex(r.read_u16()?),
            docstring: StringIndex(r.read_u16()?),
            user_flags: r.read_u32()?,
            flags: FunctionFlags::from_bits_retain(r.read_u8()?),
            params: io::parse_counted(r, VariableType::parse)?,
            locals: io::parse_counted(r, VariableType::parse)?,
            instructions: io::parse_counted(r, Instruction::parse)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(self.return_type.0)?;
        w.write_u16(self.docstring.0)?;
        w.write_u32(self.user_flags)?;
        w.write_u8(self.flags.bits())?;
        io::dump_counted(w, "function params", &self.params, |w, p| p.dump(w))?;
        io::dump_counted(w, "function locals", &self.locals, |w, l| l.dump(w))?;
        io::dump_counted(w, "function instructions", &self.instructions, |w, i| {
            i.dump(w)
        })
    }
}

#[cfg(test)]
use crate::opcode::Opcode;
#[cfg(test)]
use crate::value::VariableData;

/// No params, no locals, no instructions.
#[test]
fn test_empty_function() {
    let function = Function {
        return_type: StringIndex(1),
        docstring: StringIndex(1),
        user_flags: 0,
        flags: FunctionFlags::NATIVE,
        params: Vec::new(),
        locals: Vec::new(),
        instructions: Vec::new(),
    };

    let mut w = Writer::new(Vec::new());
    function.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0, 1, 0, 1, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Function::parse(&mut r).unwrap(), function);
}

#[test]
fn test_body_roundtrip() {
    let function = Function {
        return_type: StringIndex(1),
        docstring: StringIndex(1),
        user_flags: 0,
        flags: FunctionFlags::empty(),
        params: vec![VariableType {
            name: StringIndex(6),
            type_name: StringIndex(7),
        }],
        locals: vec![VariableType {
            name: StringIndex(8),
            type_name: StringIndex(7),
        }],
        instructions: vec![
            Instruction::new(
                Opcode::Assign,
                vec![
                    VariableData::Identifier(StringIndex(8)),
                    VariableData::Identifier(StringIndex(6)),
                ],
            )
            .unwrap(),
            Instruction::new(
                Opcode::Return,
                vec![VariableData::Identifier(StringIndex(8))],
            )
            .unwrap(),
        ],
    };

    let mut w = Writer::new(Vec::new());
    function.dump(&mut w).unwrap();
    let bytes = w.into_inner();

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Function::parse(&mut r).unwrap(), function);
    assert_eq!(r.offset(), bytes.len() as u64);
}

#[test]
fn test_unknown_flag_bits_survive() {
    let mut bytes = Vec::new();
    let mut w = Writer::new(&mut bytes);
    w.write_u16(0).unwrap();
    w.write_u16(0).unwrap();
    w.write_u32(0).unwrap();
    w.write_u8(0x83).unwrap();
    w.write_u16(0).unwrap();
    w.write_u16(0).unwrap();
    w.write_u16(0).unwrap();

    let mut r = Reader::new(bytes.as_slice());
    let function = Function::parse(&mut r).unwrap();
    assert!(function.flags.contains(FunctionFlags::GLOBAL));
    assert_eq!(function.flags.bits(), 0x83);

    let mut w = Writer::new(Vec::new());
    function.dump(&mut w).unwrap();
    assert_eq!(w.into_inner(), bytes);
}
