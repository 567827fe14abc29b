use std::fmt;

use num_enum::TryFromPrimitive;

/// Operand count of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many operands.
    Fixed(usize),
    /// This many fixed operands, then an integer count and that many more.
    Variadic(usize),
}

impl Arity {
    /// Operands preceding any variadic tail.
    #[must_use]
    pub const fn fixed(self) -> usize {
        match self {
            Self::Fixed(n) | Self::Variadic(n) => n,
        }
    }

    #[must_use]
    pub const fn is_variadic(self) -> bool {
        matches!(self, Self::Variadic(_))
    }

    /// Whether an operand list of `len` elements satisfies this arity.
    #[must_use]
    pub const fn admits(self, len: usize) -> bool {
        match self {
            Self::Fixed(n) => len == n,
            Self::Variadic(n) => len >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "exactly {n}"),
            Self::Variadic(n) => write!(f, "at least {n}"),
        }
    }
}

/// Papyrus VM opcodes.
///
/// `0x00..=0x23` is the Skyrim instruction set; `0x24..=0x2E` were added
/// for Fallout 4. Bytes outside this range are rejected during decoding.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// `NOP`
    Nop = 0x00,

    /// `IADD`
    IAdd = 0x01,

    /// `FADD`
    FAdd = 0x02,

    /// `ISUB`
    ISub = 0x03,

    /// `FSUB`
    FSub = 0x04,

    /// `IMUL`
    IMul = 0x05,

    /// `FMUL`
    FMul = 0x06,

    /// `IDIV`
    IDiv = 0x07,

    /// `FDIV`
    FDiv = 0x08,

    /// `IMOD`
    IMod = 0x09,

    /// `NOT`
    Not = 0x0A,

    /// `INEG`
    INeg = 0x0B,

    /// `FNEG`
    FNeg = 0x0C,

    /// `ASSIGN`
    Assign = 0x0D,

    /// `CAST`
    Cast = 0x0E,

    /// `CMP_EQ`
    CmpEq = 0x0F,

    /// `CMP_LT`
    CmpLt = 0x10,

    /// `CMP_LE`
    CmpLe = 0x11,

    /// `CMP_GT`
    CmpGt = 0x12,

    /// `CMP_GE`
    CmpGe = 0x13,

    /// `JMP`
    Jmp = 0x14,

    /// `JMPT`
    JmpT = 0x15,

    /// `JMPF`
    JmpF = 0x16,

    /// `CALLMETHOD`: name, object, destination, then varargs
    CallMethod = 0x17,

    /// `CALLPARENT`: name, destination, then varargs
    CallParent = 0x18,

    /// `CALLSTATIC`: type, name, destination, then varargs
    CallStatic = 0x19,

    /// `RETURN`
    Return = 0x1A,

    /// `STRCAT`
    StrCat = 0x1B,

    /// `PROPGET`
    PropGet = 0x1C,

    /// `PROPSET`
    PropSet = 0x1D,

    /// `ARRAY_CREATE`
    ArrayCreate = 0x1E,

    /// `ARRAY_LENGTH`
    ArrayLength = 0x1F,

    /// `ARRAY_GETELEMENT`
    ArrayGetElement = 0x20,

    /// `ARRAY_SETELEMENT`
    ArraySetElement = 0x21,

    /// `ARRAY_FINDELEMENT`
    ArrayFindElement = 0x22,

    /// `ARRAY_RFINDELEMENT`
    ArrayRFindElement = 0x23,

    /// `IS` (Fallout 4)
    Is = 0x24,

    /// `STRUCT_CREATE` (Fallout 4)
    StructCreate = 0x25,

    /// `STRUCT_GET` (Fallout 4)
    StructGet = 0x26,

    /// `STRUCT_SET` (Fallout 4)
    StructSet = 0x27,

    /// `ARRAY_FINDSTRUCT` (Fallout 4)
    ArrayFindStruct = 0x28,

    /// `ARRAY_RFINDSTRUCT` (Fallout 4)
    ArrayRFindStruct = 0x29,

    /// `ARRAY_ADD` (Fallout 4)
    ArrayAdd = 0x2A,

    /// `ARRAY_INSERT` (Fallout 4)
    ArrayInsert = 0x2B,

    /// `ARRAY_REMOVELAST` (Fallout 4)
    ArrayRemoveLast = 0x2C,

    /// `ARRAY_REMOVE` (Fallout 4)
    ArrayRemove = 0x2D,

    /// `ARRAY_CLEAR` (Fallout 4)
    ArrayClear = 0x2E,
}

impl Opcode {
    /// Operand arity, per the Papyrus VM instruction set.
    ///
    /// The three call opcodes take a variadic tail: after the fixed
    /// operands the wire carries an integer operand count followed by that
    /// many further operands.
    #[must_use]
    pub const fn arity(self) -> Arity {
        use Opcode::*;

        match self {
            Nop => Arity::Fixed(0),
            IAdd | FAdd | ISub | FSub | IMul | FMul | IDiv | FDiv | IMod => Arity::Fixed(3),
            Not | INeg | FNeg => Arity::Fixed(2),
            Assign | Cast => Arity::Fixed(2),
            CmpEq | CmpLt | CmpLe | CmpGt | CmpGe => Arity::Fixed(3),
            Jmp => Arity::Fixed(1),
            JmpT | JmpF => Arity::Fixed(2),
            CallMethod | CallStatic => Arity::Variadic(3),
            CallParent => Arity::Variadic(2),
            Return => Arity::Fixed(1),
            StrCat => Arity::Fixed(3),
            PropGet | PropSet => Arity::Fixed(3),
            ArrayCreate | ArrayLength => Arity::Fixed(2),
            ArrayGetElement | ArraySetElement => Arity::Fixed(3),
            ArrayFindElement | ArrayRFindElement => Arity::Fixed(4),
            Is => Arity::Fixed(3),
            StructCreate => Arity::Fixed(1),
            StructGet | StructSet => Arity::Fixed(3),
            ArrayFindStruct | ArrayRFindStruct => Arity::Fixed(5),
            ArrayAdd | ArrayInsert | ArrayRemove => Arity::Fixed(3),
            ArrayRemoveLast | ArrayClear => Arity::Fixed(1),
        }
    }
}

#[test]
fn test_opcode_coverage() {
    for byte in 0x00..=0x2Eu8 {
        let opcode = Opcode::try_from(byte).unwrap();
        assert_eq!(opcode as u8, byte);
    }
    assert!(Opcode::try_from(0x2F).is_err());
    assert!(Opcode::try_from(0xFF).is_err());
}

#[test]
fn test_arity_table() {
    assert_eq!(Opcode::Nop.arity(), Arity::Fixed(0));
    assert_eq!(Opcode::IAdd.arity(), Arity::Fixed(3));
    assert_eq!(Opcode::FNeg.arity(), Arity::Fixed(2));
    assert_eq!(Opcode::Jmp.arity(), Arity::Fixed(1));
    assert_eq!(Opcode::JmpF.arity(), Arity::Fixed(2));
    assert_eq!(Opcode::Return.arity(), Arity::Fixed(1));
    assert_eq!(Opcode::ArrayCreate.arity(), Arity::Fixed(2));
    assert_eq!(Opcode::ArrayRFindElement.arity(), Arity::Fixed(4));
    assert_eq!(Opcode::ArrayFindStruct.arity(), Arity::Fixed(5));
    assert_eq!(Opcode::ArrayClear.arity(), Arity::Fixed(1));

    // The call forms are the only variadic opcodes.
    for byte in 0x00..=0x2Eu8 {
        let opcode = Opcode::try_from(byte).unwrap();
        let variadic = matches!(
            opcode,
            Opcode::CallMethod | Opcode::CallParent | Opcode::CallStatic
        );
        assert_eq!(opcode.arity().is_variadic(), variadic, "{opcode:?}");
    }
    assert_eq!(Opcode::CallMethod.arity(), Arity::Variadic(3));
    assert_eq!(Opcode::CallParent.arity(), Arity::Variadic(2));
    assert_eq!(Opcode::CallStatic.arity(), Arity::Variadic(3));
}

#[test]
fn test_arity_admits() {
    assert!(Arity::Fixed(3).admits(3));
    assert!(!Arity::Fixed(3).admits(2));
    assert!(!Arity::Fixed(3).admits(4));
    assert!(Arity::Variadic(2).admits(2));
    assert!(Arity::Variadic(2).admits(7));
    assert!(!Arity::Variadic(2).admits(1));
}
