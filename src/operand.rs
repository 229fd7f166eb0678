use crate::{
    asm::{Asm, Expr},
    error::AsmError,
    lexer::Tok,
    opcodes::{Class, Form, Opcode, Reg},
    Pos,
};

/// Indexed operand as written, before it is sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// `,R` or `n,R`
    Offset { reg: Reg, offset: Option<Expr> },
    /// `A,R`, `B,R` or `D,R`
    Accumulator { acc: Reg, reg: Reg },
    /// `,R+` or `,R++`
    Inc { reg: Reg, double: bool },
    /// `,-R` or `,--R`
    Dec { reg: Reg, double: bool },
    /// `n,PCR` where `n` is the target address
    Pcr(Expr),
    /// `n,PC` where `n` is a literal offset
    Pc(Expr),
    /// Bare address. Only valid as `[n]`.
    Address(Expr),
}

/// A sized indexed operand: the postbyte selection plus its extension bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexed {
    Zero(Reg),
    Offset5(Reg, i8),
    Offset8(Reg, i8),
    Offset16(Reg, u16),
    Accumulator(Reg, Reg),
    Inc(Reg),
    Inc2(Reg),
    Dec(Reg),
    Dec2(Reg),
    Pc8(i8),
    Pc16(u16),
    Extended(u16),
}

impl Indexed {
    /// Bytes after the postbyte.
    pub fn extension_len(&self) -> u8 {
        match self {
            Self::Offset8(..) | Self::Pc8(_) => 1,
            Self::Offset16(..) | Self::Pc16(_) | Self::Extended(_) => 2,
            _ => 0,
        }
    }

    /// Writes the postbyte and extension bytes. Callers never pass a 5-bit
    /// offset or a single step auto inc/dec with `indirect` set.
    pub fn encode(&self, indirect: bool, buf: &mut Vec<u8>) {
        let bits = |reg: Reg| reg.index_bits().unwrap_or(0);
        let ind = if indirect { 0x10 } else { 0x00 };
        match *self {
            Self::Zero(reg) => buf.push(0x84 | ind | bits(reg)),
            Self::Offset5(reg, n) => buf.push(bits(reg) | (n as u8 & 0x1F)),
            Self::Offset8(reg, n) => buf.extend_from_slice(&[0x88 | ind | bits(reg), n as u8]),
            Self::Offset16(reg, n) => {
                buf.push(0x89 | ind | bits(reg));
                buf.extend_from_slice(&n.to_be_bytes());
            }
            Self::Accumulator(acc, reg) => {
                let code = match acc {
                    Reg::A => 0x86,
                    Reg::B => 0x85,
                    _ => 0x8B,
                };
                buf.push(code | ind | bits(reg));
            }
            Self::Inc(reg) => buf.push(0x80 | ind | bits(reg)),
            Self::Inc2(reg) => buf.push(0x81 | ind | bits(reg)),
            Self::Dec(reg) => buf.push(0x82 | ind | bits(reg)),
            Self::Dec2(reg) => buf.push(0x83 | ind | bits(reg)),
            Self::Pc8(n) => buf.extend_from_slice(&[0x8C | ind, n as u8]),
            Self::Pc16(n) => {
                buf.push(0x8D | ind);
                buf.extend_from_slice(&n.to_be_bytes());
            }
            Self::Extended(addr) => {
                buf.push(0x9F);
                buf.extend_from_slice(&addr.to_be_bytes());
            }
        }
    }
}

impl<'a> Asm<'a> {
    pub(crate) fn operand(&mut self, op: &'static Opcode) -> Result<(), AsmError> {
        match op.class() {
            Class::Inherent => {
                let pos = self.pos();
                let code = self.form(op, Form::Inherent, pos)?;
                self.instr(code, &[], pos)
            }
            Class::Relative => self.branch(op),
            Class::Register => self.transfer(op),
            Class::Stack(stack) => self.stack(op, stack),
            Class::General => self.general(op),
        }
    }

    fn branch(&mut self, op: &'static Opcode) -> Result<(), AsmError> {
        let pos = self.pos();
        let code = self.form(op, Form::Relative, pos)?;
        let expr = self.sum()?;
        let end = self.ctx.pc as i64 + code.size as i64;
        let disp = match self.resolve(&expr)? {
            Some(target) => target as i64 - end,
            None => 0,
        };
        if code.operand_len() == 1 {
            if self.emitting() && !(-128..=127).contains(&disp) {
                return Err(AsmError::range(
                    pos,
                    format!("branch out of range: {disp}"),
                ));
            }
            self.instr(code, &[disp as u8], pos)
        } else {
            if self.emitting() && !(-32768..=32767).contains(&disp) {
                return Err(AsmError::range(
                    pos,
                    format!("long branch out of range: {disp}"),
                ));
            }
            self.instr(code, &(disp as i16).to_be_bytes(), pos)
        }
    }

    fn transfer_reg(&mut self) -> Result<u8, AsmError> {
        if let Tok::Reg(reg) = self.peek() {
            if let Some(code) = reg.transfer_code() {
                self.eat();
                return Ok(code);
            }
        }
        Err(self.err("expected register"))
    }

    /// `tfr`/`exg src, dst`
    fn transfer(&mut self, op: &'static Opcode) -> Result<(), AsmError> {
        let pos = self.pos();
        let code = self.form(op, Form::Immediate, pos)?;
        let src = self.transfer_reg()?;
        self.expect(Tok::Comma, "expected ,")?;
        let dst = self.transfer_reg()?;
        self.instr(code, &[(src << 4) | dst], pos)
    }

    /// Register list of a push or pull on `stack`.
    fn stack(&mut self, op: &'static Opcode, stack: Reg) -> Result<(), AsmError> {
        let pos = self.pos();
        let code = self.form(op, Form::Immediate, pos)?;
        let mut postbyte = 0;
        loop {
            let bit = match self.peek() {
                Tok::Reg(reg) if *reg == stack => {
                    return Err(self.err(&format!("cannot {} {stack} on its own stack", op.mne)));
                }
                Tok::Reg(reg) => reg.stack_bit(),
                _ => None,
            };
            let Some(bit) = bit else {
                return Err(self.err("expected register"));
            };
            self.eat();
            postbyte |= bit;
            if *self.peek() != Tok::Comma {
                break;
            }
            self.eat();
        }
        self.instr(code, &[postbyte], pos)
    }

    fn general(&mut self, op: &'static Opcode) -> Result<(), AsmError> {
        let pos = self.pos();
        match self.peek() {
            Tok::Hash => {
                self.eat();
                let code = self.form(op, Form::Immediate, pos)?;
                let expr = self.sum()?;
                if code.operand_len() == 1 {
                    let byte = self.byte(&expr, pos)?;
                    self.instr(code, &[byte], pos)
                } else {
                    let word = self.word(&expr, pos)?;
                    self.instr(code, &word.to_be_bytes(), pos)
                }
            }
            Tok::Lt => {
                self.eat();
                let code = self.form(op, Form::Direct, pos)?;
                let expr = self.sum()?;
                let byte = match self.resolve(&expr)? {
                    Some(value) if self.in_direct_page(value) => value as u8,
                    Some(value) => {
                        return Err(AsmError::range(
                            pos,
                            format!("address outside direct page: {value}"),
                        ))
                    }
                    None => 0,
                };
                self.instr(code, &[byte], pos)
            }
            Tok::Gt => {
                self.eat();
                let code = self.form(op, Form::Extended, pos)?;
                let expr = self.sum()?;
                let word = self.word(&expr, pos)?;
                self.instr(code, &word.to_be_bytes(), pos)
            }
            Tok::LBracket => {
                self.eat();
                let index = self.index()?;
                self.expect(Tok::RBracket, "expected ]")?;
                self.indexed(op, index, true, pos)
            }
            _ => match self.index()? {
                Index::Address(expr) => self.memory(op, expr, pos),
                index => self.indexed(op, index, false, pos),
            },
        }
    }

    /// Direct when the address is known before this statement and lies in the
    /// direct page, extended otherwise.
    fn memory(&mut self, op: &'static Opcode, expr: Expr, pos: Pos) -> Result<(), AsmError> {
        if let (Some(code), Some(value), false) = (op.form(Form::Direct), expr.value, expr.forward)
        {
            if self.in_direct_page(value) {
                return self.instr(code, &[value as u8], pos);
            }
        }
        let code = self.form(op, Form::Extended, pos)?;
        let word = self.word(&expr, pos)?;
        self.instr(code, &word.to_be_bytes(), pos)
    }

    fn index_reg(&mut self) -> Result<Reg, AsmError> {
        if let Tok::Reg(reg) = self.peek() {
            if reg.index_bits().is_some() {
                self.eat();
                return Ok(*reg);
            }
        }
        Err(self.err("expected index register"))
    }

    pub(crate) fn index(&mut self) -> Result<Index, AsmError> {
        if let Tok::Reg(acc) = self.peek() {
            if !matches!(acc, Reg::A | Reg::B | Reg::D) {
                return Err(self.err("expected accumulator offset"));
            }
            self.eat();
            self.expect(Tok::Comma, "expected ,")?;
            let reg = self.index_reg()?;
            return Ok(Index::Accumulator { acc: *acc, reg });
        }
        let offset = if *self.peek() == Tok::Comma {
            None
        } else {
            let expr = self.sum()?;
            if *self.peek() != Tok::Comma {
                return Ok(Index::Address(expr));
            }
            Some(expr)
        };
        self.eat();
        match self.peek() {
            Tok::Dec | Tok::Dec2 if offset.is_some() => {
                Err(self.err("auto decrement takes no offset"))
            }
            Tok::Dec | Tok::Dec2 => {
                let double = *self.peek() == Tok::Dec2;
                self.eat();
                let reg = self.index_reg()?;
                Ok(Index::Dec { reg, double })
            }
            Tok::Reg(Reg::Pcr) => {
                let Some(target) = offset else {
                    return Err(self.err("expected target address before ,pcr"));
                };
                self.eat();
                Ok(Index::Pcr(target))
            }
            Tok::Reg(Reg::Pc) => {
                self.eat();
                Ok(Index::Pc(offset.unwrap_or(Expr::known(0))))
            }
            _ => {
                let reg = self.index_reg()?;
                match self.peek() {
                    Tok::Inc | Tok::Inc2 if offset.is_some() => {
                        Err(self.err("auto increment takes no offset"))
                    }
                    Tok::Inc | Tok::Inc2 => {
                        let double = *self.peek() == Tok::Inc2;
                        self.eat();
                        Ok(Index::Inc { reg, double })
                    }
                    _ => Ok(Index::Offset { reg, offset }),
                }
            }
        }
    }

    fn indexed(
        &mut self,
        op: &'static Opcode,
        index: Index,
        indirect: bool,
        pos: Pos,
    ) -> Result<(), AsmError> {
        let code = self.form(op, Form::Indexed, pos)?;
        let mode = match index {
            Index::Offset { reg, offset: None } => Indexed::Zero(reg),
            Index::Offset {
                reg,
                offset: Some(expr),
            } if expr.forward => {
                let n = self.fits(&expr, -32768..=32767, pos, "offset")?;
                Indexed::Offset16(reg, n as u16)
            }
            Index::Offset {
                reg,
                offset: Some(expr),
            } => match expr.require()? {
                n @ -16..=15 if !indirect => Indexed::Offset5(reg, n as i8),
                n @ -128..=127 => Indexed::Offset8(reg, n as i8),
                n @ -32768..=32767 => Indexed::Offset16(reg, n as u16),
                n => return Err(AsmError::range(pos, format!("offset out of range: {n}"))),
            },
            Index::Accumulator { acc, reg } => Indexed::Accumulator(acc, reg),
            Index::Inc { reg, double: true } => Indexed::Inc2(reg),
            Index::Dec { reg, double: true } => Indexed::Dec2(reg),
            Index::Inc { .. } | Index::Dec { .. } if indirect => {
                return Err(AsmError::syntax(
                    pos,
                    "single step auto increment/decrement cannot be indirect",
                ));
            }
            Index::Inc { reg, .. } => Indexed::Inc(reg),
            Index::Dec { reg, .. } => Indexed::Dec(reg),
            Index::Pcr(expr) => {
                let pc = self.ctx.pc as i64 + code.size as i64;
                let short = match (expr.value, expr.forward) {
                    (Some(target), false) => i8::try_from(target as i64 - (pc + 1)).ok(),
                    _ => None,
                };
                match short {
                    Some(disp) => Indexed::Pc8(disp),
                    None => {
                        let target = self.word(&expr, pos)?;
                        Indexed::Pc16(target.wrapping_sub((pc + 2) as u16))
                    }
                }
            }
            Index::Pc(expr) if expr.forward => {
                let n = self.fits(&expr, -32768..=32767, pos, "offset")?;
                Indexed::Pc16(n as u16)
            }
            Index::Pc(expr) => match expr.require()? {
                n @ -128..=127 => Indexed::Pc8(n as i8),
                n @ -32768..=32767 => Indexed::Pc16(n as u16),
                n => return Err(AsmError::range(pos, format!("offset out of range: {n}"))),
            },
            Index::Address(expr) => Indexed::Extended(self.word(&expr, pos)?),
        };
        let mut operand = Vec::with_capacity(3);
        mode.encode(indirect, &mut operand);
        self.instr(code, &operand, pos)
    }
}
