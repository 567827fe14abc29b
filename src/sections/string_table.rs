use std::fmt;
use std::io::{Read, Write};

use crate::error::Error;
use crate::io::{self, Reader, Writer};

/// Zero-based index into the [`StringTable`].
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct StringIndex(pub u16);

impl fmt::Display for StringIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u16> for StringIndex {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

/// Length-prefixed byte string.
///
/// The payload is kept verbatim. PEX producers write whatever their locale
/// uses (commonly Windows-1252); the codec never transcodes. The text
/// accessors map each byte to the Unicode scalar of the same value, which
/// is exact for ASCII and Latin-1 content.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct WString(Vec<u8>);

impl WString {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Byte-per-scalar text view.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.0.iter().map(|&b| b as char).collect()
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let len = r.read_u16()? as usize;
        Ok(Self(r.read_bytes(len)?))
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        w.write_u16(io::count_u16("wstring payload", self.0.len())?)?;
        w.write_bytes(&self.0)
    }
}

impl fmt::Debug for WString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for WString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for WString {
    /// Takes the string's bytes verbatim (UTF-8 for non-ASCII input).
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl PartialEq<str> for WString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for WString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Per-file intern pool.
///
/// Every name, docstring and string literal elsewhere in the file is a
/// [`StringIndex`] into this table. Order is significant and the table is
/// written back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringTable {
    pub strings: Vec<WString>,
}

impl StringTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: StringIndex) -> Option<&WString> {
        self.strings.get(index.0 as usize)
    }

    /// Bounds-checks a reference into this table.
    pub(crate) fn check(&self, index: StringIndex) -> Result<(), Error> {
        if (index.0 as usize) < self.strings.len() {
            Ok(())
        } else {
            Err(Error::StringIndexOutOfRange {
                index: index.0,
                count: self.strings.len(),
            })
        }
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        Ok(Self {
            strings: io::parse_counted(r, WString::parse)?,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        io::dump_counted(w, "string table", &self.strings, |w, s| s.dump(w))
    }
}

#[test]
fn test_wstring_roundtrip() {
    let mut w = Writer::new(Vec::new());
    WString::from("GetState").dump(&mut w).unwrap();
    WString::default().dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(&bytes[..2], &[0x00, 0x08]);
    assert_eq!(&bytes[10..], &[0x00, 0x00]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(WString::parse(&mut r).unwrap(), "GetState");
    assert_eq!(WString::parse(&mut r).unwrap(), "");
    assert_eq!(r.offset(), 12);
}

#[test]
fn test_wstring_payload_cap() {
    let mut w = Writer::new(Vec::new());
    let max = WString::new(vec![b'x'; u16::MAX as usize]);
    max.dump(&mut w).unwrap();

    let over = WString::new(vec![b'x'; u16::MAX as usize + 1]);
    match over.dump(&mut w) {
        Err(Error::CountMismatch { field, len }) => {
            assert_eq!(field, "wstring payload");
            assert_eq!(len, u16::MAX as usize + 1);
        }
        other => panic!("expected CountMismatch, got {other:?}"),
    }
}

#[test]
fn test_table_lookup() {
    let table = StringTable {
        strings: vec![WString::from("alpha"), WString::from("")],
    };
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(StringIndex(0)).unwrap(), "alpha");
    assert!(table.get(StringIndex(2)).is_none());
    assert!(table.check(StringIndex(1)).is_ok());
    assert!(matches!(
        table.check(StringIndex(2)),
        Err(Error::StringIndexOutOfRange { index: 2, count: 2 })
    ));
}

#[test]
fn test_empty_table() {
    let mut w = Writer::new(Vec::new());
    StringTable::default().dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0x00, 0x00]);

    let mut r = Reader::new(bytes.as_slice());
    assert!(StringTable::parse(&mut r).unwrap().is_empty());
}
