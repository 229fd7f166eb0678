use std::fmt::{self, Display, Formatter};

/// Operand forms an instruction may be encoded in, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Inherent,
    Immediate,
    Direct,
    Extended,
    Indexed,
    Relative,
}

impl Display for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inherent => "inherent",
            Self::Immediate => "immediate",
            Self::Direct => "direct",
            Self::Extended => "extended",
            Self::Indexed => "indexed",
            Self::Relative => "relative",
        };
        f.write_str(name)
    }
}

/// Opcode and total instruction length of one form. Codes above `$FF` carry a
/// page prefix (`$10` or `$11`) in the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub code: u16,
    pub size: u8,
}

impl Code {
    pub fn len(&self) -> u8 {
        if self.code > 0xFF {
            2
        } else {
            1
        }
    }

    /// Bytes following the opcode, excluding indexed extension bytes.
    pub fn operand_len(&self) -> u8 {
        self.size - self.len()
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        if self.code > 0xFF {
            buf.push((self.code >> 8) as u8);
        }
        buf.push(self.code as u8);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Inherent,
    Relative,
    Register,
    /// Push/pull on the given stack pointer.
    Stack(Reg),
    General,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Opcode {
    pub mne: &'static str,
    pub forms: [Option<Code>; 6],
}

impl Opcode {
    const fn new(mne: &'static str, forms: [Option<Code>; 6]) -> Self {
        Self { mne, forms }
    }

    pub fn lookup(mne: &str) -> Option<&'static Opcode> {
        OPCODES.iter().find(|op| op.mne.eq_ignore_ascii_case(mne))
    }

    pub fn form(&self, form: Form) -> Option<Code> {
        self.forms[form as usize]
    }

    pub fn class(&self) -> Class {
        if REGISTER_ONLY.contains(&self.mne) {
            return Class::Register;
        }
        if let Some((_, reg)) = PUSH_PULL.iter().find(|(mne, _)| *mne == self.mne) {
            return Class::Stack(*reg);
        }
        if self.form(Form::Relative).is_some() {
            return Class::Relative;
        }
        let only_inherent = self
            .forms
            .iter()
            .enumerate()
            .all(|(i, code)| (i == Form::Inherent as usize) == code.is_some());
        if only_inherent {
            Class::Inherent
        } else {
            Class::General
        }
    }
}

pub const REGISTER_ONLY: &[&str] = &["exg", "tfr"];

pub const PUSH_PULL: &[(&str, Reg)] = &[
    ("pshs", Reg::S),
    ("puls", Reg::S),
    ("pshu", Reg::U),
    ("pulu", Reg::U),
];

const ____: Option<Code> = None;

const fn c(code: u16, size: u8) -> Option<Code> {
    Some(Code { code, size })
}

#[rustfmt::skip]
pub const OPCODES: &[Opcode] = &[
    //                    inh           imm           dir           ext           idx           rel
    Opcode::new("neg",   [____,         ____,         c(0x00, 2),   c(0x70, 3),   c(0x60, 2),   ____]),
    Opcode::new("com",   [____,         ____,         c(0x03, 2),   c(0x73, 3),   c(0x63, 2),   ____]),
    Opcode::new("lsr",   [____,         ____,         c(0x04, 2),   c(0x74, 3),   c(0x64, 2),   ____]),
    Opcode::new("ror",   [____,         ____,         c(0x06, 2),   c(0x76, 3),   c(0x66, 2),   ____]),
    Opcode::new("asr",   [____,         ____,         c(0x07, 2),   c(0x77, 3),   c(0x67, 2),   ____]),
    Opcode::new("asl",   [____,         ____,         c(0x08, 2),   c(0x78, 3),   c(0x68, 2),   ____]),
    Opcode::new("lsl",   [____,         ____,         c(0x08, 2),   c(0x78, 3),   c(0x68, 2),   ____]),
    Opcode::new("rol",   [____,         ____,         c(0x09, 2),   c(0x79, 3),   c(0x69, 2),   ____]),
    Opcode::new("dec",   [____,         ____,         c(0x0A, 2),   c(0x7A, 3),   c(0x6A, 2),   ____]),
    Opcode::new("inc",   [____,         ____,         c(0x0C, 2),   c(0x7C, 3),   c(0x6C, 2),   ____]),
    Opcode::new("tst",   [____,         ____,         c(0x0D, 2),   c(0x7D, 3),   c(0x6D, 2),   ____]),
    Opcode::new("jmp",   [____,         ____,         c(0x0E, 2),   c(0x7E, 3),   c(0x6E, 2),   ____]),
    Opcode::new("clr",   [____,         ____,         c(0x0F, 2),   c(0x7F, 3),   c(0x6F, 2),   ____]),
    Opcode::new("nop",   [c(0x12, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("sync",  [c(0x13, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("lbra",  [____,         ____,         ____,         ____,         ____,         c(0x16, 3)]),
    Opcode::new("lbsr",  [____,         ____,         ____,         ____,         ____,         c(0x17, 3)]),
    Opcode::new("daa",   [c(0x19, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("orcc",  [____,         c(0x1A, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("andcc", [____,         c(0x1C, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("sex",   [c(0x1D, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("exg",   [____,         c(0x1E, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("tfr",   [____,         c(0x1F, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("bra",   [____,         ____,         ____,         ____,         ____,         c(0x20, 2)]),
    Opcode::new("brn",   [____,         ____,         ____,         ____,         ____,         c(0x21, 2)]),
    Opcode::new("bhi",   [____,         ____,         ____,         ____,         ____,         c(0x22, 2)]),
    Opcode::new("bls",   [____,         ____,         ____,         ____,         ____,         c(0x23, 2)]),
    Opcode::new("bcc",   [____,         ____,         ____,         ____,         ____,         c(0x24, 2)]),
    Opcode::new("bhs",   [____,         ____,         ____,         ____,         ____,         c(0x24, 2)]),
    Opcode::new("bcs",   [____,         ____,         ____,         ____,         ____,         c(0x25, 2)]),
    Opcode::new("blo",   [____,         ____,         ____,         ____,         ____,         c(0x25, 2)]),
    Opcode::new("bne",   [____,         ____,         ____,         ____,         ____,         c(0x26, 2)]),
    Opcode::new("beq",   [____,         ____,         ____,         ____,         ____,         c(0x27, 2)]),
    Opcode::new("bvc",   [____,         ____,         ____,         ____,         ____,         c(0x28, 2)]),
    Opcode::new("bvs",   [____,         ____,         ____,         ____,         ____,         c(0x29, 2)]),
    Opcode::new("bpl",   [____,         ____,         ____,         ____,         ____,         c(0x2A, 2)]),
    Opcode::new("bmi",   [____,         ____,         ____,         ____,         ____,         c(0x2B, 2)]),
    Opcode::new("bge",   [____,         ____,         ____,         ____,         ____,         c(0x2C, 2)]),
    Opcode::new("blt",   [____,         ____,         ____,         ____,         ____,         c(0x2D, 2)]),
    Opcode::new("bgt",   [____,         ____,         ____,         ____,         ____,         c(0x2E, 2)]),
    Opcode::new("ble",   [____,         ____,         ____,         ____,         ____,         c(0x2F, 2)]),
    Opcode::new("leax",  [____,         ____,         ____,         ____,         c(0x30, 2),   ____]),
    Opcode::new("leay",  [____,         ____,         ____,         ____,         c(0x31, 2),   ____]),
    Opcode::new("leas",  [____,         ____,         ____,         ____,         c(0x32, 2),   ____]),
    Opcode::new("leau",  [____,         ____,         ____,         ____,         c(0x33, 2),   ____]),
    Opcode::new("pshs",  [____,         c(0x34, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("puls",  [____,         c(0x35, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("pshu",  [____,         c(0x36, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("pulu",  [____,         c(0x37, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("rts",   [c(0x39, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("abx",   [c(0x3A, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("rti",   [c(0x3B, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("cwai",  [____,         c(0x3C, 2),   ____,         ____,         ____,         ____]),
    Opcode::new("mul",   [c(0x3D, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("swi",   [c(0x3F, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("nega",  [c(0x40, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("coma",  [c(0x43, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("lsra",  [c(0x44, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("rora",  [c(0x46, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("asra",  [c(0x47, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("asla",  [c(0x48, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("lsla",  [c(0x48, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("rola",  [c(0x49, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("deca",  [c(0x4A, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("inca",  [c(0x4C, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("tsta",  [c(0x4D, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("clra",  [c(0x4F, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("negb",  [c(0x50, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("comb",  [c(0x53, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("lsrb",  [c(0x54, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("rorb",  [c(0x56, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("asrb",  [c(0x57, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("aslb",  [c(0x58, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("lslb",  [c(0x58, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("rolb",  [c(0x59, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("decb",  [c(0x5A, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("incb",  [c(0x5C, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("tstb",  [c(0x5D, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("clrb",  [c(0x5F, 1),   ____,         ____,         ____,         ____,         ____]),
    Opcode::new("suba",  [____,         c(0x80, 2),   c(0x90, 2),   c(0xB0, 3),   c(0xA0, 2),   ____]),
    Opcode::new("cmpa",  [____,         c(0x81, 2),   c(0x91, 2),   c(0xB1, 3),   c(0xA1, 2),   ____]),
    Opcode::new("sbca",  [____,         c(0x82, 2),   c(0x92, 2),   c(0xB2, 3),   c(0xA2, 2),   ____]),
    Opcode::new("subd",  [____,         c(0x83, 3),   c(0x93, 2),   c(0xB3, 3),   c(0xA3, 2),   ____]),
    Opcode::new("anda",  [____,         c(0x84, 2),   c(0x94, 2),   c(0xB4, 3),   c(0xA4, 2),   ____]),
    Opcode::new("bita",  [____,         c(0x85, 2),   c(0x95, 2),   c(0xB5, 3),   c(0xA5, 2),   ____]),
    Opcode::new("lda",   [____,         c(0x86, 2),   c(0x96, 2),   c(0xB6, 3),   c(0xA6, 2),   ____]),
    Opcode::new("sta",   [____,         ____,         c(0x97, 2),   c(0xB7, 3),   c(0xA7, 2),   ____]),
    Opcode::new("eora",  [____,         c(0x88, 2),   c(0x98, 2),   c(0xB8, 3),   c(0xA8, 2),   ____]),
    Opcode::new("adca",  [____,         c(0x89, 2),   c(0x99, 2),   c(0xB9, 3),   c(0xA9, 2),   ____]),
    Opcode::new("ora",   [____,         c(0x8A, 2),   c(0x9A, 2),   c(0xBA, 3),   c(0xAA, 2),   ____]),
    Opcode::new("adda",  [____,         c(0x8B, 2),   c(0x9B, 2),   c(0xBB, 3),   c(0xAB, 2),   ____]),
    Opcode::new("cmpx",  [____,         c(0x8C, 3),   c(0x9C, 2),   c(0xBC, 3),   c(0xAC, 2),   ____]),
    Opcode::new("bsr",   [____,         ____,         ____,         ____,         ____,         c(0x8D, 2)]),
    Opcode::new("ldx",   [____,         c(0x8E, 3),   c(0x9E, 2),   c(0xBE, 3),   c(0xAE, 2),   ____]),
    Opcode::new("jsr",   [____,         ____,         c(0x9D, 2),   c(0xBD, 3),   c(0xAD, 2),   ____]),
    Opcode::new("stx",   [____,         ____,         c(0x9F, 2),   c(0xBF, 3),   c(0xAF, 2),   ____]),
    Opcode::new("subb",  [____,         c(0xC0, 2),   c(0xD0, 2),   c(0xF0, 3),   c(0xE0, 2),   ____]),
    Opcode::new("cmpb",  [____,         c(0xC1, 2),   c(0xD1, 2),   c(0xF1, 3),   c(0xE1, 2),   ____]),
    Opcode::new("sbcb",  [____,         c(0xC2, 2),   c(0xD2, 2),   c(0xF2, 3),   c(0xE2, 2),   ____]),
    Opcode::new("addd",  [____,         c(0xC3, 3),   c(0xD3, 2),   c(0xF3, 3),   c(0xE3, 2),   ____]),
    Opcode::new("andb",  [____,         c(0xC4, 2),   c(0xD4, 2),   c(0xF4, 3),   c(0xE4, 2),   ____]),
    Opcode::new("bitb",  [____,         c(0xC5, 2),   c(0xD5, 2),   c(0xF5, 3),   c(0xE5, 2),   ____]),
    Opcode::new("ldb",   [____,         c(0xC6, 2),   c(0xD6, 2),   c(0xF6, 3),   c(0xE6, 2),   ____]),
    Opcode::new("stb",   [____,         ____,         c(0xD7, 2),   c(0xF7, 3),   c(0xE7, 2),   ____]),
    Opcode::new("eorb",  [____,         c(0xC8, 2),   c(0xD8, 2),   c(0xF8, 3),   c(0xE8, 2),   ____]),
    Opcode::new("adcb",  [____,         c(0xC9, 2),   c(0xD9, 2),   c(0xF9, 3),   c(0xE9, 2),   ____]),
    Opcode::new("orb",   [____,         c(0xCA, 2),   c(0xDA, 2),   c(0xFA, 3),   c(0xEA, 2),   ____]),
    Opcode::new("addb",  [____,         c(0xCB, 2),   c(0xDB, 2),   c(0xFB, 3),   c(0xEB, 2),   ____]),
    Opcode::new("ldd",   [____,         c(0xCC, 3),   c(0xDC, 2),   c(0xFC, 3),   c(0xEC, 2),   ____]),
    Opcode::new("std",   [____,         ____,         c(0xDD, 2),   c(0xFD, 3),   c(0xED, 2),   ____]),
    Opcode::new("ldu",   [____,         c(0xCE, 3),   c(0xDE, 2),   c(0xFE, 3),   c(0xEE, 2),   ____]),
    Opcode::new("stu",   [____,         ____,         c(0xDF, 2),   c(0xFF, 3),   c(0xEF, 2),   ____]),
    Opcode::new("lbrn",  [____,         ____,         ____,         ____,         ____,         c(0x1021, 4)]),
    Opcode::new("lbhi",  [____,         ____,         ____,         ____,         ____,         c(0x1022, 4)]),
    Opcode::new("lbls",  [____,         ____,         ____,         ____,         ____,         c(0x1023, 4)]),
    Opcode::new("lbcc",  [____,         ____,         ____,         ____,         ____,         c(0x1024, 4)]),
    Opcode::new("lbhs",  [____,         ____,         ____,         ____,         ____,         c(0x1024, 4)]),
    Opcode::new("lbcs",  [____,         ____,         ____,         ____,         ____,         c(0x1025, 4)]),
    Opcode::new("lblo",  [____,         ____,         ____,         ____,         ____,         c(0x1025, 4)]),
    Opcode::new("lbne",  [____,         ____,         ____,         ____,         ____,         c(0x1026, 4)]),
    Opcode::new("lbeq",  [____,         ____,         ____,         ____,         ____,         c(0x1027, 4)]),
    Opcode::new("lbvc",  [____,         ____,         ____,         ____,         ____,         c(0x1028, 4)]),
    Opcode::new("lbvs",  [____,         ____,         ____,         ____,         ____,         c(0x1029, 4)]),
    Opcode::new("lbpl",  [____,         ____,         ____,         ____,         ____,         c(0x102A, 4)]),
    Opcode::new("lbmi",  [____,         ____,         ____,         ____,         ____,         c(0x102B, 4)]),
    Opcode::new("lbge",  [____,         ____,         ____,         ____,         ____,         c(0x102C, 4)]),
    Opcode::new("lblt",  [____,         ____,         ____,         ____,         ____,         c(0x102D, 4)]),
    Opcode::new("lbgt",  [____,         ____,         ____,         ____,         ____,         c(0x102E, 4)]),
    Opcode::new("lble",  [____,         ____,         ____,         ____,         ____,         c(0x102F, 4)]),
    Opcode::new("swi2",  [c(0x103F, 2), ____,         ____,         ____,         ____,         ____]),
    Opcode::new("cmpd",  [____,         c(0x1083, 4), c(0x1093, 3), c(0x10B3, 4), c(0x10A3, 3), ____]),
    Opcode::new("cmpy",  [____,         c(0x108C, 4), c(0x109C, 3), c(0x10BC, 4), c(0x10AC, 3), ____]),
    Opcode::new("ldy",   [____,         c(0x108E, 4), c(0x109E, 3), c(0x10BE, 4), c(0x10AE, 3), ____]),
    Opcode::new("sty",   [____,         ____,         c(0x109F, 3), c(0x10BF, 4), c(0x10AF, 3), ____]),
    Opcode::new("lds",   [____,         c(0x10CE, 4), c(0x10DE, 3), c(0x10FE, 4), c(0x10EE, 3), ____]),
    Opcode::new("sts",   [____,         ____,         c(0x10DF, 3), c(0x10FF, 4), c(0x10EF, 3), ____]),
    Opcode::new("swi3",  [c(0x113F, 2), ____,         ____,         ____,         ____,         ____]),
    Opcode::new("cmpu",  [____,         c(0x1183, 4), c(0x1193, 3), c(0x11B3, 4), c(0x11A3, 3), ____]),
    Opcode::new("cmps",  [____,         c(0x118C, 4), c(0x119C, 3), c(0x11BC, 4), c(0x11AC, 3), ____]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    A,
    B,
    D,
    X,
    Y,
    U,
    S,
    Pc,
    Pcr,
    Cc,
    Dp,
}

const REGISTERS: &[(&str, Reg)] = &[
    ("a", Reg::A),
    ("b", Reg::B),
    ("d", Reg::D),
    ("x", Reg::X),
    ("y", Reg::Y),
    ("u", Reg::U),
    ("s", Reg::S),
    ("pc", Reg::Pc),
    ("pcr", Reg::Pcr),
    ("cc", Reg::Cc),
    ("dp", Reg::Dp),
];

impl Reg {
    pub fn parse(s: &str) -> Option<Self> {
        REGISTERS
            .iter()
            .find_map(|(name, reg)| name.eq_ignore_ascii_case(s).then_some(*reg))
    }

    pub fn name(self) -> &'static str {
        REGISTERS
            .iter()
            .find_map(|(name, reg)| (*reg == self).then_some(*name))
            .unwrap_or("?")
    }

    /// Nibble used by `tfr` and `exg`.
    #[rustfmt::skip]
    pub fn transfer_code(self) -> Option<u8> {
        match self {
            Self::D => Some(0x0), Self::X => Some(0x1), Self::Y => Some(0x2),
            Self::U => Some(0x3), Self::S => Some(0x4), Self::Pc => Some(0x5),
            Self::A => Some(0x8), Self::B => Some(0x9), Self::Cc => Some(0xA),
            Self::Dp => Some(0xB),
            Self::Pcr => None,
        }
    }

    /// Bit used by the push/pull postbyte. `u` and `s` share a position.
    #[rustfmt::skip]
    pub fn stack_bit(self) -> Option<u8> {
        match self {
            Self::Cc => Some(0x01), Self::A => Some(0x02), Self::B => Some(0x04),
            Self::D => Some(0x06), Self::Dp => Some(0x08), Self::X => Some(0x10),
            Self::Y => Some(0x20), Self::U | Self::S => Some(0x40), Self::Pc => Some(0x80),
            Self::Pcr => None,
        }
    }

    /// Register select bits (`0RR00000`) of an indexed postbyte.
    pub fn index_bits(self) -> Option<u8> {
        match self {
            Self::X => Some(0x00),
            Self::Y => Some(0x20),
            Self::U => Some(0x40),
            Self::S => Some(0x60),
            _ => None,
        }
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
