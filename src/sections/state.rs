use std::io::{Read, Write};

use super::function::Function;
use super::string_table::StringIndex;
use crate::error::Error;
use crate::io::{self, Reader, Writer};

/// A function bound to its name inside a state.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFunction {
    pub name: StringIndex,
    pub function: Function,
}

impl NamedFunction {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            name: StringIndex(r.read_u16()?),
            function: Function::parse(r)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(self.name.0)?;
        self.function.dump(w)
    }
}

/// Named group of functions; one state is active per object at runtime.
/// The default state's name is the empty-string index.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: StringIndex,
    pub functions: Vec<NamedFunction>,
}

impl State {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            name: StringIndex(r.read_u16()?),
            functions: io::parse_counted(r, NamedFunction::parse)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(self.name.0)?;
        io::dump_counted(w, "state functions", &self.functions, |w, f| f.dump(w))
    }
}

#[cfg(test)]
use super::function::FunctionFlags;

#[test]
fn test_state_roundtrip() {
    let state = State {
        name: StringIndex(1),
        functions: vec![NamedFunction {
            name: StringIndex(2),
            function: Function {
                return_type: StringIndex(1),
                docstring: StringIndex(1),
                user_flags: 0,
                flags: FunctionFlags::GLOBAL,
                params: Vec::new(),
                locals: Vec::new(),
                instructions: Vec::new(),
            },
        }],
    };

    let mut w = Writer::new(Vec::new());
    state.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(&bytes[..4], &[0, 1, 0, 1]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(State::parse(&mut r).unwrap(), state);
    assert_eq!(r.offset(), bytes.len() as u64);
}

#[test]
fn test_empty_state() {
    let mut r = Reader::new(&[0, 0, 0, 0][..]);
    let state = State::parse(&mut r).unwrap();
    assert!(state.functions.is_empty());
}
