use std::io::{self, Read, Write};

use crate::error::Error;
use crate::io::{Reader, Writer, dump_counted, parse_counted};
use crate::sections::{
    DebugInfo, Function, Header, Object, Property, PropertyBody, StringTable, UserFlag, Variable,
};
use crate::value::VariableData;

/// A fully decoded PEX file.
///
/// A value is safe to share between threads once constructed; the codec
/// itself is synchronous and keeps no state outside the streams it is
/// handed.
#[derive(Debug, Clone, PartialEq)]
pub struct PexFile {
    pub header: Header,
    pub string_table: StringTable,
    pub debug_info: DebugInfo,
    pub user_flags: Vec<UserFlag>,
    pub objects: Vec<Object>,
}

impl PexFile {
    /// Decodes a whole file from a byte slice.
    pub fn read(data: &[u8]) -> Result<Self, Error> {
        Self::parse(data)
    }

    /// Encodes the whole file to a byte vector.
    pub fn write(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.dump(&mut out)?;
        Ok(out)
    }

    /// Decodes a file from a stream, consuming exactly the file's bytes.
    /// Fails fast on the first structural violation.
    pub fn parse<R: Read>(input: R) -> Result<Self, Error> {
        let r = &mut Reader::new(input);
        Ok(Self {
            header: Header::parse(r)?,
            string_table: StringTable::parse(r)?,
            debug_info: DebugInfo::parse(r)?,
            user_flags: parse_counted(r, UserFlag::parse)?,
            objects: parse_counted(r, Object::parse)?,
        })
    }

    /// Encodes the file to a stream.
    ///
    /// Every length and consistency invariant is checked in a dry run
    /// before the first byte is written, so a validation failure never
    /// leaves partial output. A failure of the stream itself still can;
    /// the codec makes no transactional guarantee there.
    pub fn dump<W: Write>(&self, output: W) -> Result<(), Error> {
        self.emit(&mut Writer::new(io::sink()))?;
        self.emit(&mut Writer::new(output))
    }

    fn emit<W: Write>(&self, w: &mut Writer<W>) -> Result<(), Error> {
        self.header.dump(w)?;
        self.string_table.dump(w)?;
        self.debug_info.dump(w)?;
        dump_counted(w, "user flags", &self.user_flags, |w, f| f.dump(w))?;
        dump_counted(w, "objects", &self.objects, |w, o| o.dump(w))
    }

    /// Strict cross-section check: every string reference in the tree,
    /// including identifier and string-literal operands, must point inside
    /// the string table. Not invoked by [`PexFile::parse`]; callers opt in
    /// when they need the guarantee.
    pub fn validate_string_indices(&self) -> Result<(), Error> {
        let table = &self.string_table;

        if let Some(debug) = &self.debug_info.data {
            for function in &debug.functions {
                table.check(function.object_name)?;
                table.check(function.state_name)?;
                table.check(function.function_name)?;
            }
        }
        for flag in &self.user_flags {
            table.check(flag.name)?;
        }
        for object in &self.objects {
            table.check(object.name)?;
            table.check(object.data.parent_class_name)?;
            table.check(object.data.docstring)?;
            table.check(object.data.auto_state_name)?;
            for variable in &object.data.variables {
                self.check_variable(variable)?;
            }
            for property in &object.data.properties {
                self.check_property(property)?;
            }
            for state in &object.data.states {
                table.check(state.name)?;
                for named in &state.functions {
                    table.check(named.name)?;
                    self.check_function(&named.function)?;
                }
            }
        }
        Ok(())
    }

    fn check_variable(&self, variable: &Variable) -> Result<(), Error> {
        self.string_table.check(variable.name)?;
        self.string_table.check(variable.type_name)?;
        self.check_value(&variable.value)
    }

    fn check_property(&self, property: &Property) -> Result<(), Error> {
        let table = &self.string_table;
        table.check(property.name)?;
        table.check(property.type_name)?;
        table.check(property.docstring)?;
        match &property.body {
            PropertyBody::AutoVar { variable } => table.check(*variable),
            PropertyBody::Read { get } => self.check_function(get),
            PropertyBody::Write { set } => self.check_function(set),
            PropertyBody::ReadWrite { get, set } => {
                self.check_function(get)?;
                self.check_function(set)
            }
        }
    }

    fn check_function(&self, function: &Function) -> Result<(), Error> {
        let table = &self.string_table;
        table.check(function.return_type)?;
        table.check(function.docstring)?;
        for slot in function.params.iter().chain(&function.locals) {
            table.check(slot.name)?;
            table.check(slot.type_name)?;
        }
        for instruction in &function.instructions {
            for operand in &instruction.operands {
                self.check_value(operand)?;
            }
        }
        Ok(())
    }

    fn check_value(&self, value: &VariableData) -> Result<(), Error> {
        match *value {
            VariableData::Identifier(index) | VariableData::String(index) => {
                self.string_table.check(index)
            }
            _ => Ok(()),
        }
    }
}
