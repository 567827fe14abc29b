use std::io::{Read, Write};

use super::string_table::StringIndex;
use crate::error::Error;
use crate::io::{self, Reader, Writer};

/// Source-line mapping for one compiled function.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugFunction {
    pub object_name: StringIndex,
    pub state_name: StringIndex,
    pub function_name: StringIndex,
    /// Function kind byte; the toolchain emits values 0 through 3.
    pub function_type: u8,
    /// One source line per bytecode instruction.
    pub line_numbers: Vec<u16>,
}

impl DebugFunction {
    fn check_type(value: u8) -> Result<(), Error> {
        if value <= 3 {
            Ok(())
        } else {
            Err(Error::InvalidDebugFunctionType { value })
        }
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let object_name = StringIndex(r.read_u16()?);
        let state_name = StringIndex(r.read_u16()?);
        let function_name = StringIndex(r.read_u16()?);
        let function_type = r.read_u8()?;
        Self::check_type(function_type)?;
        let line_numbers = io::parse_counted(r, Reader::read_u16)?;

        Ok(Self {
            object_name,
            state_name,
            function_name,
            function_type,
            line_numbers,
        })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        Self::check_type(self.function_type)?;
        w.write_u16(self.object_name.0)?;
        w.write_u16(self.state_name.0)?;
        w.write_u16(self.function_name.0)?;
        w.write_u8(self.function_type)?;
        io::dump_counted(w, "debug line numbers", &self.line_numbers, |w, n| {
            w.write_u16(*n)
        })
    }
}

/// Payload of a present debug section.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugData {
    /// Source modification time, Unix epoch seconds.
    pub modification_time: u64,
    pub functions: Vec<DebugFunction>,
}

/// Optional debug section.
///
/// The wire marks presence with a leading byte; modification time and the
/// function list exist exactly when that byte is non-zero, which this
/// model captures with a single `Option`. Encoding writes the marker as
/// 0 or 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    pub data: Option<DebugData>,
}

impl DebugInfo {
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.data.is_some()
    }

    pub fn parse<R: Read>(r: &mut Reader<R>) -> Result<Self, Error> {
        let data = if r.read_u8()? != 0 {
            Some(DebugData {
                modification_time: r.read_u64()?,
                functions: io::parse_counted(r, DebugFunction::parse)?,
            })
        } else {
            None
        };
        Ok(Self { data })
    }

    pub fn dump<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        match &self.data {
            None => w.write_u8(0),
            Some(data) => {
                w.write_u8(1)?;
                w.write_u64(data.modification_time)?;
                io::dump_counted(w, "debug functions", &data.functions, |w, f| f.dump(w))
            }
        }
    }
}

#[test]
fn test_absent_is_one_byte() {
    let mut w = Writer::new(Vec::new());
    DebugInfo::default().dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes, [0]);

    let mut r = Reader::new(bytes.as_slice());
    assert!(!DebugInfo::parse(&mut r).unwrap().is_present());
}

#[test]
fn test_present_roundtrip() {
    let info = DebugInfo {
        data: Some(DebugData {
            modification_time: 1_601_329_000,
            functions: vec![DebugFunction {
                object_name: StringIndex(0),
                state_name: StringIndex(1),
                function_name: StringIndex(2),
                function_type: 0,
                line_numbers: vec![10, 11, 11, 14],
            }],
        }),
    };

    let mut w = Writer::new(Vec::new());
    info.dump(&mut w).unwrap();
    let bytes = w.into_inner();
    assert_eq!(bytes[0], 1);

    let mut r = Reader::new(bytes.as_slice());
    assert_eq!(DebugInfo::parse(&mut r).unwrap(), info);
    assert_eq!(r.offset(), bytes.len() as u64);
}

#[test]
fn test_nonzero_marker_parses_as_present() {
    let bytes = [0xFF, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0];
    let mut r = Reader::new(&bytes[..]);
    let info = DebugInfo::parse(&mut r).unwrap();
    let data = info.data.unwrap();
    assert_eq!(data.modification_time, 5);
    assert!(data.functions.is_empty());
}

#[test]
fn test_function_type_domain() {
    let function = DebugFunction {
        object_name: StringIndex(0),
        state_name: StringIndex(0),
        function_name: StringIndex(0),
        function_type: 4,
        line_numbers: Vec::new(),
    };
    let mut w = Writer::new(Vec::new());
    assert!(matches!(
        function.dump(&mut w),
        Err(Error::InvalidDebugFunctionType { value: 4 })
    ));

    // 2 = property setter, fine.
    let function = DebugFunction {
        function_type: 2,
        ..function
    };
    function.dump(&mut w).unwrap();

    // On the wire the type byte sits after the three name indices.
    let bytes = [0, 0, 0, 1, 0, 2, 9, 0, 0];
    let mut r = Reader::new(&bytes[..]);
    match DebugFunction::parse(&mut r) {
        Err(Error::InvalidDebugFunctionType { value: 9 }) => {}
        other => panic!("expected InvalidDebugFunctionType, got {other:?}"),
    }
}
