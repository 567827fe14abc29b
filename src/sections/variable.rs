use std::io::{Read, Write};

use super::string_table::StringIndex;
use crate::error::Error;
use crate::io::{Reader, Writer};
use crate::value::VariableData;

/// Script member variable with its initial value.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: StringIndex,
    pub type_name: StringIndex,
    pub user_flags: u32,
    pub value: VariableData,
}

impl Variable {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            name: StringIndex(r.read_u16()?),
            type_name: StringIndex(r.read_u16()?),
            user_flags: r.read_u32()?,
            value: VariableData::parse(r)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(self.name.0)?;
        w.write_u16(self.type_name.0)?;
        w.write_u32(self.user_flags)?;
        self.value.dump(w)
    }
}

/// Name/type pair describing a parameter or local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableType {
    pub name: StringIndex,
    pub type_name: StringIndex,
}

impl VariableType {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            name: StringIndex(r.read_u16()?),
            type_name: StringIndex(r.read_u16()?),
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(self.name.0)?;
        w.write_u16(self.type_name.0)
    }
}

#[test]
fn test_variable_roundtrip() {
    let variable = Variable {
        name: StringIndex(3),
        type_name: StringIndex(4),
        user_flags: 0x0000_0002,
        value: VariableData::Null,
    };
    let mut w = Writer::new(Vec::new());
    variable.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0, 3, 0, 4, 0, 0, 0, 2, 0]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Variable::parse(&mut r).unwrap(), variable);
}

#[test]
fn test_variable_type_roundtrip() {
    let param = VariableType {
        name: StringIndex(1),
        type_name: StringIndex(2),
    };
    let mut w = Writer::new(Vec::new());
    param.dump(&mut w).unwrap();

    let bytes = w.into_inner();
    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(VariableType::parse(&mut r).unwrap(), param);
    assert_eq!(r.offset(), 4);
}
