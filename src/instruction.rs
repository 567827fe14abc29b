use std::io::{Read, Write};

use crate::error::Error;
use crate::io::{Reader, Writer};
use crate::opcode::Opcode;
use crate::value::VariableData;

/// A single bytecode instruction: an opcode and its operand list.
///
/// Variadic opcodes (the call forms) keep the tail operands in the same
/// list after the fixed ones; the on-wire tail count is derived from the
/// list length at encode time.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<VariableData>,
}

impl Instruction {
    /// Builds an instruction, rejecting operand lists that violate the
    /// opcode's arity.
    pub fn new(opcode: Opcode, operands: Vec<VariableData>) -> Result<Self, Error> {
        check_arity(opcode, operands.len())?;
        Ok(Self { opcode, operands })
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let at = r.offset();
        let byte = r.read_u8()?;
        let opcode = Opcode::try_from(byte).map_err(|_| Error::UnknownOpcode {
            opcode: byte,
            offset: at,
        })?;

        let arity = opcode.arity();
        let mut operands = Vec::with_capacity(arity.fixed());
        for _ in 0..arity.fixed() {
            operands.push(VariableData::parse(r)?);
        }
        if arity.is_variadic() {
            let at = r.offset();
            let count = match VariableData::parse(r)? {
                VariableData::Integer(n) if n >= 0 => n as usize,
                other => {
                    return Err(Error::TagPayloadMismatch {
                        expected: "non-negative integer operand count",
                        found: other.kind(),
                        offset: at,
                    });
                }
            };
            operands.reserve(count.min(1024));
            for _ in 0..count {
                operands.push(VariableData::parse(r)?);
            }
        }
        Ok(Self { opcode, operands })
    }

    /// Writes the opcode and operand list. The arity is re-checked here
    /// because the fields are freely assignable.
    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        check_arity(self.opcode, self.operands.len())?;
        w.write_u8(self.opcode as u8)?;

        let fixed = self.opcode.arity().fixed();
        for operand in &self.operands[..fixed] {
            operand.dump(w)?;
        }
        if self.opcode.arity().is_variadic() {
            let tail = &self.operands[fixed..];
            let count = i32::try_from(tail.len()).map_err(|_| Error::CountMismatch {
                field: "call varargs",
                len: tail.len(),
            })?;
            VariableData::Integer(count).dump(w)?;
            for operand in tail {
                operand.dump(w)?;
            }
        }
        Ok(())
    }
}

fn check_arity(opcode: Opcode, found: usize) -> Result<(), Error> {
    let expected = opcode.arity();
    if expected.admits(found) {
        Ok(())
    } else {
        Err(Error::BadArity {
            opcode,
            expected,
            found,
        })
    }
}

#[cfg(test)]
use crate::sections::string_table::StringIndex;

#[cfg(test)]
fn id(index: u16) -> VariableData {
    VariableData::Identifier(StringIndex(index))
}

#[test]
fn test_fixed_arity_roundtrip() {
    let instruction = Instruction::new(
        Opcode::IAdd,
        vec![id(1), id(2), VariableData::Integer(40)],
    )
    .unwrap();

    let mut w = Writer::new(Vec::new());
    instruction.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes[0], 0x01);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Instruction::parse(&mut r).unwrap(), instruction);
    assert_eq!(r.offset(), bytes.len() as u64);
}

#[test]
fn test_variadic_roundtrip() {
    // CALLMETHOD name, object, destination + two arguments.
    let instruction = Instruction::new(
        Opcode::CallMethod,
        vec![
            id(4),
            id(0),
            id(5),
            VariableData::Integer(10),
            VariableData::Bool(false),
        ],
    )
    .unwrap();

    let mut w = Writer::new(Vec::new());
    instruction.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    // opcode + 3 identifiers + Integer(2) tail count + 2 arguments
    assert_eq!(
        bytes,
        [
            0x17, 1, 0, 4, 1, 0, 0, 1, 0, 5, 3, 0, 0, 0, 2, 3, 0, 0, 0, 10, 5, 0
        ]
    );

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Instruction::parse(&mut r).unwrap(), instruction);
}

#[test]
fn test_empty_vararg_tail() {
    let instruction = Instruction::new(Opcode::CallParent, vec![id(1), id(2)]).unwrap();

    let mut w = Writer::new(Vec::new());
    instruction.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0x18, 1, 0, 1, 1, 0, 2, 3, 0, 0, 0, 0]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Instruction::parse(&mut r).unwrap(), instruction);
}

#[test]
fn test_arity_rejected_on_construction() {
    match Instruction::new(Opcode::Jmp, vec![]) {
        Err(Error::BadArity {
            opcode: Opcode::Jmp,
            found: 0,
            ..
        }) => {}
        other => panic!("expected BadArity, got {other:?}"),
    }
    assert!(Instruction::new(Opcode::CallMethod, vec![id(0)]).is_err());
}

#[test]
fn test_arity_rejected_on_dump() {
    let instruction = Instruction {
        opcode: Opcode::Assign,
        operands: vec![id(0)],
    };
    let mut w = Writer::new(Vec::new());
    assert!(matches!(
        instruction.dump(&mut w),
        Err(Error::BadArity { .. })
    ));
    assert_eq!(w.offset(), 0);
}

#[test]
fn test_vararg_count_must_be_integer() {
    // CALLPARENT with a float where the tail count belongs.
    let bytes = [0x18, 0, 0, 4, 0x3F, 0x80, 0x00, 0x00];
    let mut r = Reader::new(&bytes[..]);
    match Instruction::parse(&mut r) {
        Err(Error::TagPayloadMismatch { found: "float", offset: 3, .. }) => {}
        other => panic!("expected TagPayloadMismatch, got {other:?}"),
    }

    // Negative count is rejected the same way.
    let bytes = [0x18, 0, 0, 3, 0xFF, 0xFF, 0xFF, 0xFF];
    let mut r = Reader::new(&bytes[..]);
    assert!(matches!(
        Instruction::parse(&mut r),
        Err(Error::TagPayloadMismatch { .. })
    ));
}

#[test]
fn test_unknown_opcode() {
    let mut r = Reader::new(&[0x2F][..]);
    match Instruction::parse(&mut r) {
        Err(Error::UnknownOpcode { opcode: 0x2F, offset: 0 }) => {}
        other => panic!("expected UnknownOpcode, got {other:?}"),
    }
}
