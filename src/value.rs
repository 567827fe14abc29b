use std::io::{Read, Write};

use num_enum::TryFromPrimitive;

use crate::error::Error;
use crate::io::{Reader, Writer};
use crate::sections::string_table::StringIndex;

/// On-wire tag byte of a [`VariableData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum ValueTag {
    Null = 0,
    Identifier = 1,
    String = 2,
    Integer = 3,
    Float = 4,
    Bool = 5,
}

/// Tagged value used for variable initializers, property defaults and
/// instruction operands.
///
/// The integer variant stores the raw 32 wire bits. The format does not
/// record signedness; slots whose declared type is unsigned read the same
/// bits through [`VariableData::as_unsigned`]. Booleans are canonicalized
/// on encode: any non-zero payload parses as `true` and is written back
/// as 1.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    Null,
    /// Reference to a named entity (variable, property, type, label).
    Identifier(StringIndex),
    /// String literal, interned in the string table.
    String(StringIndex),
    Integer(i32),
    Float(f32),
    Bool(bool),
}

impl VariableData {
    #[must_use]
    pub fn tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Identifier(_) => ValueTag::Identifier,
            Self::String(_) => ValueTag::String,
            Self::Integer(_) => ValueTag::Integer,
            Self::Float(_) => ValueTag::Float,
            Self::Bool(_) => ValueTag::Bool,
        }
    }

    /// Unsigned view of an integer value.
    #[must_use]
    pub fn as_unsigned(&self) -> Option<u32> {
        match *self {
            Self::Integer(v) => Some(v as u32),
            _ => None,
        }
    }

    /// Short noun for diagnostics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Identifier(_) => "identifier",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
        }
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let at = r.offset();
        let tag = r.read_u8()?;
        let tag = ValueTag::try_from(tag).map_err(|_| Error::UnknownVariableDataTag {
            tag,
            offset: at,
        })?;
        Ok(match tag {
            ValueTag::Null => Self::Null,
            ValueTag::Identifier => Self::Identifier(StringIndex(r.read_u16()?)),
            ValueTag::String => Self::String(StringIndex(r.read_u16()?)),
            ValueTag::Integer => Self::Integer(r.read_i32()?),
            ValueTag::Float => Self::Float(r.read_f32()?),
            ValueTag::Bool => Self::Bool(r.read_u8()? != 0),
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u8(self.tag() as u8)?;
        match *self {
            Self::Null => Ok(()),
            Self::Identifier(index) | Self::String(index) => w.write_u16(index.0),
            Self::Integer(v) => w.write_i32(v),
            Self::Float(v) => w.write_f32(v),
            Self::Bool(v) => w.write_u8(u8::from(v)),
        }
    }
}

#[cfg(test)]
fn roundtrip(value: &VariableData) -> Vec<u8> {
    let mut w = Writer::new(Vec::new());
    value.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(&VariableData::parse(&mut r).unwrap(), value);
    assert_eq!(r.offset(), bytes.len() as u64);
    bytes
}

#[test]
fn test_value_roundtrip() {
    assert_eq!(roundtrip(&VariableData::Null), [0]);
    assert_eq!(
        roundtrip(&VariableData::Identifier(StringIndex(0x0203))),
        [1, 2, 3]
    );
    assert_eq!(
        roundtrip(&VariableData::String(StringIndex(7))),
        [2, 0, 7]
    );
    assert_eq!(
        roundtrip(&VariableData::Integer(-1)),
        [3, 0xFF, 0xFF, 0xFF, 0xFF]
    );
    assert_eq!(
        roundtrip(&VariableData::Float(1.0)),
        [4, 0x3F, 0x80, 0x00, 0x00]
    );
    assert_eq!(roundtrip(&VariableData::Bool(true)), [5, 1]);
    assert_eq!(roundtrip(&VariableData::Bool(false)), [5, 0]);
}

#[test]
fn test_unknown_tag() {
    let mut r = Reader::new(&[6u8][..]);
    match VariableData::parse(&mut r) {
        Err(Error::UnknownVariableDataTag { tag: 6, offset: 0 }) => {}
        other => panic!("expected UnknownVariableDataTag, got {other:?}"),
    }
}

#[test]
fn test_bool_canonicalized() {
    let mut r = Reader::new(&[5u8, 0xCC][..]);
    let value = VariableData::parse(&mut r).unwrap();
    assert_eq!(value, VariableData::Bool(true));

    let mut w = Writer::new(Vec::new());
    value.dump(&mut w).unwrap();
    assert_eq!(w.into_inner(), [5, 1]);
}

#[test]
fn test_integer_views() {
    let value = VariableData::Integer(-1);
    assert_eq!(value.as_unsigned(), Some(u32::MAX));
    assert_eq!(VariableData::Null.as_unsigned(), None);
}
