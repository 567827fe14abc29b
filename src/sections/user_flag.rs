use std::io::{Read, Write};

use super::string_table::StringIndex;
use crate::error::Error;
use crate::io::{Reader, Writer};

/// A game-defined flag name bound to a bit position.
///
/// The position indexes the 32-bit `user_flags` masks carried by objects,
/// variables, properties and functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFlag {
    pub name: StringIndex,
    /// Bit position, `0..=31`.
    pub flag_index: u8,
}

impl UserFlag {
    fn check_bit(bit: u8) -> Result<(), Error> {
        if bit < 32 {
            Ok(())
        } else {
            Err(Error::InvalidFlagBit { bit })
        }
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let name = StringIndex(r.read_u16()?);
        let flag_index = r.read_u8()?;
        Self::check_bit(flag_index)?;
        Ok(Self { name, flag_index })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        Self::check_bit(self.flag_index)?;
        w.write_u16(self.name.0)?;
        w.write_u8(self.flag_index)
    }
}

#[test]
fn test_user_flag_roundtrip() {
    let flag = UserFlag {
        name: StringIndex(12),
        flag_index: 1,
    };
    let mut w = Writer::new(Vec::new());
    flag.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0, 12, 1]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(UserFlag::parse(&mut r).unwrap(), flag);
}

#[test]
fn test_bit_position_domain() {
    let mut r = Reader::new(&[0, 0, 32][..]);
    match UserFlag::parse(&mut r) {
        Err(Error::InvalidFlagBit { bit: 32 }) => {}
        other => panic!("expected InvalidFlagBit, got {other:?}"),
    }

    let flag = UserFlag {
        name: StringIndex(0),
        flag_index: 31,
    };
    let mut w = Writer::new(Vec::new());
    flag.dump(&mut w).unwrap();
}
