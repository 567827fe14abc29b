use std::io::{Read, Write};

use num_enum::TryFromPrimitive;

use super::string_table::WString;
use crate::error::Error;
use crate::io::{Reader, Writer};

/// File signature, big-endian `FA 57 C0 DE` on the wire.
pub const MAGIC: u32 = 0xFA57_C0DE;

/// The only supported major format version.
pub const MAJOR_VERSION: u8 = 3;

/// Host game a script was compiled for.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive)]
#[repr(u16)]
pub enum GameId {
    Skyrim = 1,
    Fallout4 = 2,
}

/// Fixed-layout file header.
///
/// The magic is a constant rather than a field; versions are recorded
/// verbatim (minor 1 is Skyrim LE, minor 2 is SSE/Fallout 4) and checked
/// against the supported set on both parse and dump.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub major_version: u8,
    pub minor_version: u8,
    pub game_id: GameId,
    /// Unix epoch seconds.
    pub compilation_time: u64,
    pub source_file_name: WString,
    pub username: WString,
    pub machine_name: WString,
}

impl Header {
    fn check_version(major: u8, minor: u8, game_id: u16) -> Result<(), Error> {
        if major == MAJOR_VERSION && matches!(minor, 1 | 2) {
            Ok(())
        } else {
            Err(Error::UnsupportedVersion {
                major,
                minor,
                game_id,
            })
        }
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let magic = r.read_u32()?;
        if magic != MAGIC {
            return Err(Error::BadMagic { found: magic });
        }
        let major_version = r.read_u8()?;
        let minor_version = r.read_u8()?;
        let raw_game = r.read_u16()?;
        Self::check_version(major_version, minor_version, raw_game)?;
        let game_id = GameId::try_from(raw_game).map_err(|_| Error::UnsupportedVersion {
            major: major_version,
            minor: minor_version,
            game_id: raw_game,
        })?;

        Ok(Self {
            major_version,
            minor_version,
            game_id,
            compilation_time: r.read_u64()?,
            source_file_name: WString::parse(r)?,
            username: WString::parse(r)?,
            machine_name: WString::parse(r)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        Self::check_version(self.major_version, self.minor_version, self.game_id as u16)?;
        w.write_u32(MAGIC)?;
        w.write_u8(self.major_version)?;
        w.write_u8(self.minor_version)?;
        w.write_u16(self.game_id as u16)?;
        w.write_u64(self.compilation_time)?;
        self.source_file_name.dump(w)?;
        self.username.dump(w)?;
        self.machine_name.dump(w)
    }
}

#[cfg(test)]
fn sample() -> Header {
    Header {
        major_version: 3,
        minor_version: 2,
        game_id: GameId::Skyrim,
        compilation_time: 1_601_329_996,
        source_file_name: WString::from("_WetQuestScript.psc"),
        username: WString::from("TechAngel"),
        machine_name: WString::from("DESKTOP-O95F7AQ"),
    }
}

#[test]
fn test_header_roundtrip() {
    let header = sample();
    let mut w = Writer::new(Vec::new());
    header.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(&bytes[..4], &[0xFA, 0x57, 0xC0, 0xDE]);

    let mut r = Reader::new(bytes.as_slice());
    let parsed = Header::parse(&mut r).unwrap();
    assert_eq!(parsed, header);
    assert_eq!(parsed.source_file_name, "_WetQuestScript.psc");
    assert_eq!(parsed.username, "TechAngel");
    assert_eq!(parsed.machine_name, "DESKTOP-O95F7AQ");
    assert_eq!(r.offset(), bytes.len() as u64);
}

#[test]
fn test_bad_magic() {
    let mut r = Reader::new(&[0xDE, 0xC0, 0x57, 0xFA, 3, 2, 0, 1][..]);
    match Header::parse(&mut r) {
        Err(Error::BadMagic { found: 0xDEC0_57FA }) => {}
        other => panic!("expected BadMagic, got {other:?}"),
    }
}

#[test]
fn test_version_domain() {
    let mut header = sample();
    header.minor_version = 1;
    let mut w = Writer::new(Vec::new());
    header.dump(&mut w).unwrap();

    header.minor_version = 3;
    let mut w = Writer::new(Vec::new());
    assert!(matches!(
        header.dump(&mut w),
        Err(Error::UnsupportedVersion {
            major: 3,
            minor: 3,
            ..
        })
    ));
    assert_eq!(w.offset(), 0);
}

#[test]
fn test_unknown_game_rejected() {
    let mut w = Writer::new(Vec::new());
    sample().dump(&mut w).unwrap();
    let mut bytes = w.into_inner();
    bytes[7] = 9;
    let mut r = Reader::new(bytes.as_slice());
    assert!(matches!(
        Header::parse(&mut r),
        Err(Error::UnsupportedVersion { game_id: 9, .. })
    ));
}
