use papyrus_pex::error::Error;
use papyrus_pex::sections::{
    DebugData, DebugFunction, DebugInfo, Function, FunctionFlags, GameId, Header, NamedFunction,
    Object, ObjectData, Property, PropertyBody, PropertyFlags, State, StringIndex, StringTable,
    UserFlag, Variable, VariableType, WString,
};
use papyrus_pex::{Instruction, Opcode, PexFile, VariableData};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_wstr(out: &mut Vec<u8>, s: &str) {
    push_u16(out, s.len() as u16);
    out.extend_from_slice(s.as_bytes());
}

const GOLDEN_STRINGS: [&str; 14] = [
    "_wetquestscript",
    "",
    "GetState",
    "GotoState",
    "ScanArea",
    "Quest",
    "Int",
    "::Count_var",
    "Count",
    "String",
    "asNewState",
    "hidden",
    "::Ready_var",
    "Bool",
];

/// A complete file assembled byte by byte, independently of the codec.
fn golden_image() -> Vec<u8> {
    let mut image = Vec::new();

    // header
    image.extend_from_slice(&[0xFA, 0x57, 0xC0, 0xDE, 0x03, 0x02, 0x00, 0x01]);
    push_u64(&mut image, 1_601_329_996);
    push_wstr(&mut image, "_WetQuestScript.psc");
    push_wstr(&mut image, "TechAngel");
    push_wstr(&mut image, "DESKTOP-O95F7AQ");

    // string table
    push_u16(&mut image, GOLDEN_STRINGS.len() as u16);
    for s in GOLDEN_STRINGS {
        push_wstr(&mut image, s);
    }

    // debug info
    image.push(1);
    push_u64(&mut image, 1_601_329_900);
    push_u16(&mut image, 1);
    push_u16(&mut image, 0); // object name
    push_u16(&mut image, 1); // state name
    push_u16(&mut image, 4); // function name
    image.push(0); // function type
    push_u16(&mut image, 2); // instruction count
    push_u16(&mut image, 9);
    push_u16(&mut image, 10);

    // user flags
    push_u16(&mut image, 1);
    push_u16(&mut image, 11);
    image.push(0);

    // one object, its data framed by a size prefix that counts itself
    push_u16(&mut image, 1);
    push_u16(&mut image, 0);
    let mut data = Vec::new();
    push_u16(&mut data, 5); // parent class "Quest"
    push_u16(&mut data, 1); // docstring ""
    push_u32(&mut data, 0);
    push_u16(&mut data, 1); // auto state ""

    // variables
    push_u16(&mut data, 2);
    push_u16(&mut data, 7); // ::Count_var
    push_u16(&mut data, 6); // Int
    push_u32(&mut data, 0);
    data.push(3); // integer initial value
    push_u32(&mut data, 0);
    push_u16(&mut data, 12); // ::Ready_var
    push_u16(&mut data, 13); // Bool
    push_u32(&mut data, 0);
    data.push(0); // null initial value

    // properties: Count, auto with all three bits set
    push_u16(&mut data, 1);
    push_u16(&mut data, 8);
    push_u16(&mut data, 6);
    push_u16(&mut data, 1);
    push_u32(&mut data, 0);
    data.push(0b111);
    push_u16(&mut data, 7);

    // states: the default state with ScanArea
    push_u16(&mut data, 1);
    push_u16(&mut data, 1);
    push_u16(&mut data, 1);
    push_u16(&mut data, 4);
    push_u16(&mut data, 1); // return type ""
    push_u16(&mut data, 1); // docstring ""
    push_u32(&mut data, 0);
    data.push(0); // function flags
    push_u16(&mut data, 1); // params
    push_u16(&mut data, 10);
    push_u16(&mut data, 9);
    push_u16(&mut data, 0); // locals
    push_u16(&mut data, 2); // instructions
    // CALLMETHOD GotoState, self, <no destination> + 1 argument
    data.push(0x17);
    data.push(1);
    push_u16(&mut data, 3);
    data.push(1);
    push_u16(&mut data, 0);
    data.push(0);
    data.push(3);
    push_u32(&mut data, 1);
    data.push(1);
    push_u16(&mut data, 10);
    // RETURN none
    data.push(0x1A);
    data.push(0);

    push_u32(&mut image, (data.len() + 4) as u32);
    image.extend_from_slice(&data);
    image
}

#[test]
fn golden_parse() {
    let file = PexFile::read(&golden_image()).unwrap();

    assert_eq!(file.header.major_version, 3);
    assert_eq!(file.header.minor_version, 2);
    assert_eq!(file.header.game_id, GameId::Skyrim);
    assert_eq!(file.header.compilation_time, 1_601_329_996);
    assert_eq!(file.header.source_file_name, "_WetQuestScript.psc");
    assert_eq!(file.header.username, "TechAngel");
    assert_eq!(file.header.machine_name, "DESKTOP-O95F7AQ");

    assert_eq!(file.string_table.len(), GOLDEN_STRINGS.len());
    for (string, expected) in file.string_table.strings.iter().zip(GOLDEN_STRINGS) {
        assert_eq!(string, expected);
    }
    assert_eq!(file.string_table.get(StringIndex(2)).unwrap(), "GetState");

    let debug = file.debug_info.data.as_ref().unwrap();
    assert_eq!(debug.modification_time, 1_601_329_900);
    assert_eq!(debug.functions.len(), 1);
    assert_eq!(debug.functions[0].line_numbers, [9, 10]);

    assert_eq!(file.user_flags.len(), 1);
    assert_eq!(file.user_flags[0].flag_index, 0);

    let object = &file.objects[0];
    assert_eq!(object.name, StringIndex(0));
    assert_eq!(object.data.variables.len(), 2);
    assert_eq!(object.data.variables[1].value, VariableData::Null);

    let property = &object.data.properties[0];
    assert_eq!(property.flags, PropertyFlags::all());
    assert_eq!(
        property.body,
        PropertyBody::AutoVar {
            variable: StringIndex(7)
        }
    );

    let function = &object.data.states[0].functions[0].function;
    assert_eq!(function.params.len(), 1);
    assert_eq!(function.instructions.len(), 2);
    assert_eq!(function.instructions[0].opcode, Opcode::CallMethod);
    assert_eq!(function.instructions[0].operands.len(), 4);
    assert_eq!(function.instructions[1].opcode, Opcode::Return);
    assert_eq!(function.instructions[1].operands, [VariableData::Null]);

    file.validate_string_indices().unwrap();
}

#[test]
fn golden_roundtrip() {
    let image = golden_image();
    let file = PexFile::read(&image).unwrap();
    assert_eq!(file.write().unwrap(), image);
}

#[test]
fn golden_reparse_is_identical() {
    let file = PexFile::read(&golden_image()).unwrap();
    let reparsed = PexFile::read(&file.write().unwrap()).unwrap();
    assert_eq!(reparsed, file);
}

#[test]
fn minimal_file() {
    let mut image = Vec::new();
    image.extend_from_slice(&[0xFA, 0x57, 0xC0, 0xDE, 0x03, 0x01, 0x00, 0x02]);
    push_u64(&mut image, 0);
    push_wstr(&mut image, "");
    push_wstr(&mut image, "");
    push_wstr(&mut image, "");
    push_u16(&mut image, 0); // strings
    image.push(0); // no debug info
    push_u16(&mut image, 0); // user flags
    push_u16(&mut image, 0); // objects

    let file = PexFile::read(&image).unwrap();
    assert_eq!(file.header.minor_version, 1);
    assert_eq!(file.header.game_id, GameId::Fallout4);
    assert!(file.string_table.is_empty());
    assert!(!file.debug_info.is_present());
    assert!(file.user_flags.is_empty());
    assert!(file.objects.is_empty());

    assert_eq!(file.write().unwrap(), image);
    file.validate_string_indices().unwrap();
}

#[test]
fn truncated_file() {
    let image = golden_image();
    match PexFile::read(&image[..10]) {
        Err(Error::Truncated { offset, .. }) => assert!(offset <= 10),
        other => panic!("expected Truncated, got {other:?}"),
    }
}

#[test]
fn strict_index_validation() {
    let mut file = PexFile::read(&golden_image()).unwrap();
    file.user_flags[0].name = StringIndex(99);
    match file.validate_string_indices() {
        Err(Error::StringIndexOutOfRange { index: 99, count }) => {
            assert_eq!(count, GOLDEN_STRINGS.len());
        }
        other => panic!("expected StringIndexOutOfRange, got {other:?}"),
    }

    // Dangling indices do not block encoding, only the strict check.
    file.write().unwrap();
}

#[test]
fn max_count_containers() {
    let full = DebugFunction {
        object_name: StringIndex(0),
        state_name: StringIndex(0),
        function_name: StringIndex(0),
        function_type: 0,
        line_numbers: vec![7; u16::MAX as usize],
    };
    let file = PexFile {
        header: Header {
            major_version: 3,
            minor_version: 2,
            game_id: GameId::Skyrim,
            compilation_time: 0,
            source_file_name: WString::from(""),
            username: WString::from(""),
            machine_name: WString::from(""),
        },
        string_table: StringTable {
            strings: vec![WString::from("")],
        },
        debug_info: DebugInfo {
            data: Some(DebugData {
                modification_time: 0,
                functions: vec![full],
            }),
        },
        user_flags: Vec::new(),
        objects: Vec::new(),
    };

    let bytes = file.write().unwrap();
    assert_eq!(PexFile::read(&bytes).unwrap(), file);

    let mut overfull = file.clone();
    overfull.debug_info.data.as_mut().unwrap().functions[0]
        .line_numbers
        .push(7);
    match overfull.write() {
        Err(Error::CountMismatch { field, len }) => {
            assert_eq!(field, "debug line numbers");
            assert_eq!(len, u16::MAX as usize + 1);
        }
        other => panic!("expected CountMismatch, got {other:?}"),
    }
}

fn arb_index(g: &mut Gen) -> StringIndex {
    StringIndex(u16::arbitrary(g) % 32)
}

fn arb_wstring(g: &mut Gen) -> WString {
    let len = usize::arbitrary(g) % 8;
    WString::new((0..len).map(|_| u8::arbitrary(g) % 94 + 32).collect())
}

fn arb_value(g: &mut Gen) -> VariableData {
    match u8::arbitrary(g) % 6 {
        0 => VariableData::Null,
        1 => VariableData::Identifier(arb_index(g)),
        2 => VariableData::String(arb_index(g)),
        3 => VariableData::Integer(i32::arbitrary(g)),
        // kept exactly representable so equality is meaningful
        4 => VariableData::Float(f32::from(i16::arbitrary(g))),
        _ => VariableData::Bool(bool::arbitrary(g)),
    }
}

fn arb_instruction(g: &mut Gen) -> Instruction {
    let opcode = *g
        .choose(&[
            Opcode::Nop,
            Opcode::IAdd,
            Opcode::FSub,
            Opcode::Not,
            Opcode::Assign,
            Opcode::Cast,
            Opcode::CmpLe,
            Opcode::Jmp,
            Opcode::JmpT,
            Opcode::CallMethod,
            Opcode::CallParent,
            Opcode::CallStatic,
            Opcode::Return,
            Opcode::StrCat,
            Opcode::PropGet,
            Opcode::ArrayCreate,
            Opcode::ArrayFindElement,
            Opcode::ArrayFindStruct,
            Opcode::ArrayClear,
        ])
        .unwrap();
    let arity = opcode.arity();
    let mut operands: Vec<_> = (0..arity.fixed()).map(|_| arb_value(g)).collect();
    if arity.is_variadic() {
        for _ in 0..usize::arbitrary(g) % 3 {
            operands.push(arb_value(g));
        }
    }
    Instruction::new(opcode, operands).unwrap()
}

fn arb_variable_type(g: &mut Gen) -> VariableType {
    VariableType {
        name: arb_index(g),
        type_name: arb_index(g),
    }
}

fn arb_function(g: &mut Gen) -> Function {
    Function {
        return_type: arb_index(g),
        docstring: arb_index(g),
        user_flags: u32::arbitrary(g),
        flags: FunctionFlags::from_bits_truncate(u8::arbitrary(g)),
        params: (0..usize::arbitrary(g) % 3)
            .map(|_| arb_variable_type(g))
            .collect(),
        locals: (0..usize::arbitrary(g) % 3)
            .map(|_| arb_variable_type(g))
            .collect(),
        instructions: (0..usize::arbitrary(g) % 4)
            .map(|_| arb_instruction(g))
            .collect(),
    }
}

fn arb_property(g: &mut Gen) -> Property {
    let (flags, body) = match u8::arbitrary(g) % 4 {
        0 => {
            // compilers set the advisory read/write bits on auto properties
            let flags = if bool::arbitrary(g) {
                PropertyFlags::AUTO_VAR
            } else {
                PropertyFlags::all()
            };
            (
                flags,
                PropertyBody::AutoVar {
                    variable: arb_index(g),
                },
            )
        }
        1 => (
            PropertyFlags::READ,
            PropertyBody::Read {
                get: arb_function(g),
            },
        ),
        2 => (
            PropertyFlags::WRITE,
            PropertyBody::Write {
                set: arb_function(g),
            },
        ),
        _ => (
            PropertyFlags::READ | PropertyFlags::WRITE,
            PropertyBody::ReadWrite {
                get: arb_function(g),
                set: arb_function(g),
            },
        ),
    };
    Property {
        name: arb_index(g),
        type_name: arb_index(g),
        docstring: arb_index(g),
        user_flags: u32::arbitrary(g),
        flags,
        body,
    }
}

fn arb_object(g: &mut Gen) -> Object {
    Object {
        name: arb_index(g),
        data: ObjectData {
            parent_class_name: arb_index(g),
            docstring: arb_index(g),
            user_flags: u32::arbitrary(g),
            auto_state_name: arb_index(g),
            variables: (0..usize::arbitrary(g) % 3)
                .map(|_| Variable {
                    name: arb_index(g),
                    type_name: arb_index(g),
                    user_flags: u32::arbitrary(g),
                    value: arb_value(g),
                })
                .collect(),
            properties: (0..usize::arbitrary(g) % 3).map(|_| arb_property(g)).collect(),
            states: (0..usize::arbitrary(g) % 3)
                .map(|_| State {
                    name: arb_index(g),
                    functions: (0..usize::arbitrary(g) % 3)
                        .map(|_| NamedFunction {
                            name: arb_index(g),
                            function: arb_function(g),
                        })
                        .collect(),
                })
                .collect(),
        },
    }
}

#[derive(Debug, Clone)]
struct ArbPex(PexFile);

impl Arbitrary for ArbPex {
    fn arbitrary(g: &mut Gen) -> Self {
        let debug_info = if bool::arbitrary(g) {
            DebugInfo {
                data: Some(DebugData {
                    modification_time: u64::arbitrary(g),
                    functions: (0..usize::arbitrary(g) % 3)
                        .map(|_| DebugFunction {
                            object_name: arb_index(g),
                            state_name: arb_index(g),
                            function_name: arb_index(g),
                            function_type: u8::arbitrary(g) % 4,
                            line_numbers: Vec::arbitrary(g),
                        })
                        .collect(),
                }),
            }
        } else {
            DebugInfo::default()
        };

        Self(PexFile {
            header: Header {
                major_version: 3,
                minor_version: *g.choose(&[1, 2]).unwrap(),
                game_id: *g.choose(&[GameId::Skyrim, GameId::Fallout4]).unwrap(),
                compilation_time: u64::arbitrary(g),
                source_file_name: arb_wstring(g),
                username: arb_wstring(g),
                machine_name: arb_wstring(g),
            },
            string_table: StringTable {
                strings: (0..usize::arbitrary(g) % 6).map(|_| arb_wstring(g)).collect(),
            },
            debug_info,
            user_flags: (0..usize::arbitrary(g) % 3)
                .map(|_| UserFlag {
                    name: arb_index(g),
                    flag_index: u8::arbitrary(g) % 32,
                })
                .collect(),
            objects: (0..usize::arbitrary(g) % 3).map(|_| arb_object(g)).collect(),
        })
    }
}

#[quickcheck]
fn structured_roundtrip(file: ArbPex) -> bool {
    let bytes = file.0.write().unwrap();
    PexFile::read(&bytes).unwrap() == file.0
}

#[quickcheck]
fn byte_roundtrip_is_stable(file: ArbPex) -> bool {
    let bytes = file.0.write().unwrap();
    PexFile::read(&bytes).unwrap().write().unwrap() == bytes
}
