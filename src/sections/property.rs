use std::io::{Read, Write};

use bitflags::bitflags;

use super::function::Function;
use super::string_table::StringIndex;
use crate::error::Error;
use crate::io::{Reader, Writer};

bitflags! {
    /// Property flag byte.
    ///
    /// `AUTO_VAR` alone keys the wire layout: when set, the record carries
    /// only the backing-variable index and `READ`/`WRITE` are advisory
    /// (compilers emit all three bits for auto properties). Unknown bits
    /// are preserved verbatim.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const AUTO_VAR = 1 << 2;
    }
}

/// Accessor records of a property, keyed on its flags.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyBody {
    /// Backed by a compiler-generated variable; no accessor functions.
    AutoVar { variable: StringIndex },
    Read { get: Function },
    Write { set: Function },
    ReadWrite { get: Function, set: Function },
}

/// Object property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: StringIndex,
    pub type_name: StringIndex,
    pub docstring: StringIndex,
    pub user_flags: u32,
    pub flags: PropertyFlags,
    pub body: PropertyBody,
}

impl Property {
    /// The flags byte and the records present must agree; this is checked
    /// on parse and again before encoding.
    fn check_flags(flags: PropertyFlags, body: &PropertyBody) -> Result<(), Error> {
        let consistent = if flags.contains(PropertyFlags::AUTO_VAR) {
            matches!(body, PropertyBody::AutoVar { .. })
        } else {
            match body {
                PropertyBody::AutoVar { .. } => false,
                PropertyBody::Read { .. } => {
                    flags.contains(PropertyFlags::READ) && !flags.contains(PropertyFlags::WRITE)
                }
                PropertyBody::Write { .. } => {
                    flags.contains(PropertyFlags::WRITE) && !flags.contains(PropertyFlags::READ)
                }
                PropertyBody::ReadWrite { .. } => {
                    flags.contains(PropertyFlags::READ | PropertyFlags::WRITE)
                }
            }
        };
        if consistent {
            Ok(())
        } else {
            Err(Error::PropertyFlagsInconsistent {
                flags: flags.bits(),
            })
        }
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let name = StringIndex(r.read_u16()?);
        let type_name = StringIndex(r.read_u16()?);
        let docstring = StringIndex(r.read_u16()?);
        let user_flags = r.read_u32()?;
        let flags = PropertyFlags::from_bits_retain(r.read_u8()?);

        let body = if flags.contains(PropertyFlags::AUTO_VAR) {
            PropertyBody::AutoVar {
                variable: StringIndex(r.read_u16()?),
            }
        } else {
            match (
                flags.contains(PropertyFlags::READ),
                flags.contains(PropertyFlags::WRITE),
            ) {
                (true, false) => PropertyBody::Read {
                    get: Function::parse(r)?,
                },
                (false, true) => PropertyBody::Write {
                    set: Function::parse(r)?,
                },
                (true, true) => PropertyBody::ReadWrite {
                    get: Function::parse(r)?,
                    set: Function::parse(r)?,
                },
                (false, false) => {
                    return Err(Error::PropertyFlagsInconsistent {
                        flags: flags.bits(),
                    });
                }
            }
        };

        Ok(Self {
            name,
            type_name,
            docstring,
            user_flags,
            flags,
            body,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        Self::check_flags(self.flags, &self.body)?;
        w.write_u16(self.name.0)?;
        w.write_u16(self.type_name.0)?;
        w.write_u16(self.docstring.0)?;
        w.write_u32(self.user_flags)?;
        w.write_u8(self.flags.bits())?;
        match &self.body {
            PropertyBody::AutoVar { variable } => w.write_u16(variable.0),
            PropertyBody::Read { get } => get.dump(w),
            PropertyBody::Write { set } => set.dump(w),
            PropertyBody::ReadWrite { get, set } => {
                get.dump(w)?;
                set.dump(w)
            }
        }
    }
}

#[cfg(test)]
use super::function::FunctionFlags;

#[cfg(test)]
fn accessor() -> Function {
    Function {
        return_type: StringIndex(2),
        docstring: StringIndex(1),
        user_flags: 0,
        flags: FunctionFlags::empty(),
        params: Vec::new(),
        locals: Vec::new(),
        instructions: Vec::new(),
    }
}

#[cfg(test)]
fn prelude(flags: PropertyFlags, body: PropertyBody) -> Property {
    Property {
        name: StringIndex(5),
        type_name: StringIndex(2),
        docstring: StringIndex(1),
        user_flags: 0,
        flags,
        body,
    }
}

#[cfg(test)]
fn roundtrip(property: &Property) -> Vec<u8> {
    let mut w = Writer::new(Vec::new());
    property.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(&Property::parse(&mut r).unwrap(), property);
    assert_eq!(r.offset(), bytes.len() as u64);
    bytes
}

#[test]
fn test_autovar_has_no_accessors() {
    let bytes = roundtrip(&prelude(
        PropertyFlags::AUTO_VAR,
        PropertyBody::AutoVar {
            variable: StringIndex(9),
        },
    ));
    // prelude (11 bytes) + backing variable index
    assert_eq!(bytes.len(), 13);
    assert_eq!(&bytes[11..], &[0, 9]);
}

#[test]
fn test_autovar_keeps_advisory_bits() {
    // Compilers set READ | WRITE | AUTO_VAR; the layout is still autovar.
    roundtrip(&prelude(
        PropertyFlags::all(),
        PropertyBody::AutoVar {
            variable: StringIndex(9),
        },
    ));
}

#[test]
fn test_accessor_layouts() {
    roundtrip(&prelude(
        PropertyFlags::READ,
        PropertyBody::Read { get: accessor() },
    ));
    roundtrip(&prelude(
        PropertyFlags::WRITE,
        PropertyBody::Write { set: accessor() },
    ));
    roundtrip(&prelude(
        PropertyFlags::READ | PropertyFlags::WRITE,
        PropertyBody::ReadWrite {
            get: accessor(),
            set: accessor(),
        },
    ));
}

#[test]
fn test_inconsistent_flags_rejected_on_dump() {
    let property = prelude(
        PropertyFlags::READ | PropertyFlags::WRITE,
        PropertyBody::Read { get: accessor() },
    );
    let mut w = Writer::new(Vec::new());
    match property.dump(&mut w) {
        Err(Error::PropertyFlagsInconsistent { flags: 0b11 }) => {}
        other => panic!("expected PropertyFlagsInconsistent, got {other:?}"),
    }
    assert_eq!(w.offset(), 0);
}

#[test]
fn test_empty_flags_rejected_on_parse() {
    let mut bytes = Vec::new();
    let mut w = Writer::new(&mut bytes);
    w.write_u16(5).unwrap();
    w.write_u16(2).unwrap();
    w.write_u16(1).unwrap();
    w.write_u32(0).unwrap();
    w.write_u8(0).unwrap();

    let mut r = Reader::new(bytes.as_slice());
    assert!(matches!(
        Property::parse(&mut r),
        Err(Error::PropertyFlagsInconsistent { flags: 0 })
    ));
}
