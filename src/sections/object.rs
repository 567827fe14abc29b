use std::io::{Read, Write};

use super::property::Property;
use super::state::State;
use super::string_table::StringIndex;
use super::variable::Variable;
use crate::error::Error;
use crate::io::{self, Reader, Writer};

/// Payload of a compiled class.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectData {
    pub parent_class_name: StringIndex,
    pub docstring: StringIndex,
    pub user_flags: u32,
    /// State entered when the object is created.
    pub auto_state_name: StringIndex,
    pub variables: Vec<Variable>,
    pub properties: Vec<Property>,
    pub states: Vec<State>,
}

impl ObjectData {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            parent_class_name: StringIndex(r.read_u16()?),
            docstring: StringIndex(r.read_u16()?),
            user_flags: r.read_u32()?,
            auto_state_name: StringIndex(r.read_u16()?),
            variables: io::parse_counted(r, Variable::parse)?,
            properties: io::parse_counted(r, Property::parse)?,
            states: io::parse_counted(r, State::parse)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(self.parent_class_name.0)?;
        w.write_u16(self.docstring.0)?;
        w.write_u32(self.user_flags)?;
        w.write_u16(self.auto_state_name.0)?;
        io::dump_counted(w, "object variables", &self.variables, |w, v| v.dump(w))?;
        io::dump_counted(w, "object properties", &self.properties, |w, p| p.dump(w))?;
        io::dump_counted(w, "object states", &self.states, |w, s| s.dump(w))
    }
}

/// Compiled class.
///
/// Self-delimiting on the wire: after the name index a `u32` size, which
/// counts itself, frames the [`ObjectData`] that follows. Parsing bounds
/// the data to exactly that region and rejects both overruns and leftover
/// bytes; encoding serializes the data to a scratch buffer first so the
/// size prefix is always exact.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: StringIndex,
    pub data: ObjectData,
}

impl Object {
    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let name = StringIndex(r.read_u16()?);
        let size = r.read_u32()?;
        let body_len = size.checked_sub(4).ok_or(Error::ObjectSizeMismatch {
            declared: size,
            actual: 4,
        })?;
        let body_start = r.offset();
        let body = r.read_bytes(body_len as usize)?;

        let mut body_reader = Reader::with_offset(body.as_slice(), body_start);
        let data = ObjectData::parse(&mut body_reader)?;
        let consumed = body_reader.offset() - body_start;
        if consumed != u64::from(body_len) {
            return Err(Error::ObjectSizeMismatch {
                declared: size,
                actual: consumed + 4,
            });
        }
        Ok(Self { name, data })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        let mut scratch = Writer::new(Vec::new());
        self.data.dump(&mut scratch)?;
        let body = scratch.into_inner();
        let size = u32::try_from(body.len() + 4).map_err(|_| Error::CountMismatch {
            field: "object size",
            len: body.len() + 4,
        })?;

        w.write_u16(self.name.0)?;
        w.write_u32(size)?;
        w.write_bytes(&body)
    }
}

#[cfg(test)]
use crate::value::VariableData;

#[cfg(test)]
fn sample() -> Object {
    Object {
        name: StringIndex(0),
        data: ObjectData {
            parent_class_name: StringIndex(1),
            docstring: StringIndex(1),
            user_flags: 0,
            auto_state_name: StringIndex(1),
            variables: vec![Variable {
                name: StringIndex(3),
                type_name: StringIndex(4),
                user_flags: 0,
                value: VariableData::Integer(2),
            }],
            properties: Vec::new(),
            states: Vec::new(),
        },
    }
}

#[test]
fn test_size_prefix_counts_itself() {
    let object = sample();
    let mut w = Writer::new(Vec::new());
    object.dump(&mut w).unwrap();
    let bytes = w.into_inner();

    // name (2) + declared size
    let declared = u32::from_be_bytes(bytes[2..6].try_into().unwrap());
    assert_eq!(declared as usize, bytes.len() - 2 - 4 + 4);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(Object::parse(&mut r).unwrap(), object);
    assert_eq!(r.offset(), bytes.len() as u64);
}

#[test]
fn test_leftover_bytes_rejected() {
    let object = sample();
    let mut w = Writer::new(Vec::new());
    object.dump(&mut w).unwrap();
    let mut bytes = w.into_inner();

    // Grow the declared size and pad; the data no longer fills the region.
    let declared = u32::from_be_bytes(bytes[2..6].try_into().unwrap()) + 1;
    bytes[2..6].copy_from_slice(&declared.to_be_bytes());
    bytes.push(0);

    let mut r = Reader::new(bytes.as_slice());
    match Object::parse(&mut r) {
        Err(Error::ObjectSizeMismatch { declared: d, actual }) => {
            assert_eq!(d, declared);
            assert_eq!(actual, u64::from(declared) - 1);
        }
        other => panic!("expected ObjectSizeMismatch, got {other:?}"),
    }
}

#[test]
fn test_overrun_is_truncation() {
    let object = sample();
    let mut w = Writer::new(Vec::new());
    object.dump(&mut w).unwrap();
    let mut bytes = w.into_inner();

    // Shrink the declared size; the data overruns its region.
    let declared = u32::from_be_bytes(bytes[2..6].try_into().unwrap()) - 1;
    bytes[2..6].copy_from_slice(&declared.to_be_bytes());
    bytes.truncate(bytes.len() - 1);

    let mut r = Reader::new(bytes.as_slice());
    assert!(matches!(
        Object::parse(&mut r),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn test_undersized_prefix_rejected() {
    let mut r = Reader::new(&[0, 0, 0, 0, 0, 3][..]);
    assert!(matches!(
        Object::parse(&mut r),
        Err(Error::ObjectSizeMismatch { declared: 3, .. })
    ));
}
