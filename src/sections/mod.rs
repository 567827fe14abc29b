//! Wire sections of a PEX file, one module per record type.

/// Optional debug section
pub mod debug_info;
/// Function bodies and their flags
pub mod function;
/// File header
pub mod header;
/// Compiled classes
pub mod object;
/// Properties and their accessor records
pub mod property;
/// States and named functions
pub mod state;
/// Intern pool and string references
pub mod string_table;
/// Game-defined flag declarations
pub mod user_flag;
/// Variables, parameters and locals
pub mod variable;

pub use self::debug_info::{DebugData, DebugFunction, DebugInfo};
pub use self::function::{Function, FunctionFlags};
pub use self::header::{GameId, Header, MAGIC, MAJOR_VERSION};
pub use self::object::{Object, ObjectData};
pub use self::property::{Property, PropertyBody, PropertyFlags};
pub use self::state::{NamedFunction, State};
pub use self::string_table::{StringIndex, StringTable, WString};
pub use self::user_flag::UserFlag;
pub use self::variable::{Variable, VariableType};
