use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;

/// Offset-tracking reader for the big-endian PEX primitives.
///
/// Wraps any [`std::io::Read`] and advances an absolute byte offset with
/// every primitive, so structural errors can name the exact position at
/// which they were detected.
#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Continue counting from `offset`, for bounded sub-regions.
    pub(crate) fn with_offset(inner: R, offset: u64) -> Self {
        Self { inner, offset }
    }

    /// Absolute offset of the next byte to be read.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn short(&self, expected: usize, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated {
                expected,
                offset: self.offset,
            }
        } else {
            Error::Io(err)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let v = self.inner.read_u8().map_err(|e| self.short(1, e))?;
        self.offset += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let v = self
            .inner
            .read_u16::<BigEndian>()
            .map_err(|e| self.short(2, e))?;
        self.offset += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let v = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(|e| self.short(4, e))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let v = self
            .inner
            .read_u64::<BigEndian>()
            .map_err(|e| self.short(8, e))?;
        self.offset += 8;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        let v = self
            .inner
            .read_i32::<BigEndian>()
            .map_err(|e| self.short(4, e))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let v = self
            .inner
            .read_f32::<BigEndian>()
            .map_err(|e| self.short(4, e))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; len];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| self.short(len, e))?;
        self.offset += len as u64;
        Ok(buf)
    }
}

/// Offset-tracking writer, the mirror of [`Reader`].
#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
    offset: u64,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    /// Absolute offset of the next byte to be written.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), Error> {
        self.inner.write_u8(v)?;
        self.offset += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), Error> {
        self.inner.write_u16::<BigEndian>(v)?;
        self.offset += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), Error> {
        self.inner.write_u32::<BigEndian>(v)?;
        self.offset += 4;
        Ok(())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), Error> {
        self.inner.write_u64::<BigEndian>(v)?;
        self.offset += 8;
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<(), Error> {
        self.inner.write_i32::<BigEndian>(v)?;
        self.offset += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<(), Error> {
        self.inner.write_f32::<BigEndian>(v)?;
        self.offset += 4;
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<(), Error> {
        self.inner.write_all(v)?;
        self.offset += v.len() as u64;
        Ok(())
    }
}

/// Narrows a length to the `u16` count field that precedes every wire list.
pub(crate) fn count_u16(field: &'static str, len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::CountMismatch { field, len })
}

/// Reads a `u16` count followed by that many elements.
pub(crate) fn parse_counted<R: Read, T>(
    r: &mut Reader<R>,
    mut parse: impl FnMut(&mut Reader<R>) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    let count = r.read_u16()? as usize;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(parse(r)?);
    }
    Ok(items)
}

/// Writes the `u16` count of `items` followed by every element.
pub(crate) fn dump_counted<W: Write, T>(
    w: &mut Writer<W>,
    field: &'static str,
    items: &[T],
    mut dump: impl FnMut(&mut Writer<W>, &T) -> Result<(), Error>,
) -> Result<(), Error> {
    w.write_u16(count_u16(field, items.len())?)?;
    for item in items {
        dump(w, item)?;
    }
    Ok(())
}

#[test]
fn test_primitive_roundtrip() {
    let mut w = Writer::new(Vec::new());
    w.write_u8(0xAB).unwrap();
    w.write_u16(0x0102).unwrap();
    w.write_u32(0xFA57_C0DE).unwrap();
    w.write_u64(1_601_329_996).unwrap();
    w.write_i32(-7).unwrap();
    w.write_f32(1.5).unwrap();
    assert_eq!(w.offset(), 23);

    let bytes = w.into_inner();
    assert_eq!(&bytes[1..3], &[0x01, 0x02]);
    assert_eq!(&bytes[3..7], &[0xFA, 0x57, 0xC0, 0xDE]);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(r.read_u8().unwrap(), 0xAB);
    assert_eq!(r.read_u16().unwrap(), 0x0102);
    assert_eq!(r.read_u32().unwrap(), 0xFA57_C0DE);
    assert_eq!(r.read_u64().unwrap(), 1_601_329_996);
    assert_eq!(r.read_i32().unwrap(), -7);
    assert_eq!(r.read_f32().unwrap(), 1.5);
    assert_eq!(r.offset(), 23);
}

#[test]
fn test_truncated_carries_offset() {
    let mut r = Reader::new(&[0x01, 0x02, 0x03][..]);
    assert_eq!(r.read_u16().unwrap(), 0x0102);
    match r.read_u32() {
        Err(Error::Truncated { expected, offset }) => {
            assert_eq!(expected, 4);
            assert_eq!(offset, 2);
        }
        other => panic!("expected Truncated, got {other:?}"),
    }
}

#[test]
fn test_counted_list() {
    let mut w = Writer::new(Vec::new());
    dump_counted(&mut w, "numbers", &[3u8, 5, 7], |w, v| w.write_u8(*v)).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0x00, 0x03, 3, 5, 7]);

    let mut r = Reader::new(bytes.as_slice());
    let items = parse_counted(&mut r, Reader::read_u8).unwrap();
    assert_eq!(items, [3, 5, 7]);
}
