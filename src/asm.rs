use std::ops::RangeInclusive;

use crate::{
    error::AsmError,
    lexer::{Cursor, Directive, Tok, Token},
    opcodes::{Code, Form, Opcode},
    symbols::{Sym, SymbolTable},
    Pos,
};

pub const DEFAULT_BASE: u16 = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

/// Per-run assembler state shared by both passes.
#[derive(Debug)]
pub struct Context {
    /// One past the last addressable byte is a valid value after the final write.
    pub pc: u32,
    pub dp: u8,
    pub pass: Pass,
    pub binary: Vec<u8>,
    pub base: u16,
    pub symbols: SymbolTable,
}

impl Context {
    pub fn new(base: u16) -> Self {
        Self {
            pc: base as u32,
            dp: 0,
            pass: Pass::First,
            binary: Vec::new(),
            base,
            symbols: SymbolTable::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pc = self.base as u32;
        self.dp = 0;
        self.pass = Pass::First;
        self.binary.clear();
        self.symbols.clear();
    }
}

/// Result of evaluating a value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub value: Option<i32>,
    /// Some symbol in the sum is defined after the referencing statement.
    pub forward: bool,
    missing: Option<(Pos, String)>,
}

impl Expr {
    pub fn known(value: i32) -> Self {
        Self {
            value: Some(value),
            forward: false,
            missing: None,
        }
    }

    pub fn require(&self) -> Result<i32, AsmError> {
        match (self.value, &self.missing) {
            (Some(value), _) => Ok(value),
            (None, Some((pos, name))) => Err(AsmError::Unresolved {
                pos: *pos,
                name: name.clone(),
            }),
            (None, None) => Ok(0),
        }
    }
}

pub struct Asm<'a> {
    pub(crate) toks: Cursor<'a>,
    pub(crate) ctx: &'a mut Context,
}

impl<'a> Asm<'a> {
    pub fn new(toks: &'a [Token], ctx: &'a mut Context) -> Self {
        Self {
            toks: Cursor::new(toks),
            ctx,
        }
    }

    pub fn rewind(&mut self) {
        self.toks.rewind();
        self.ctx.pc = self.ctx.base as u32;
        self.ctx.dp = 0;
        self.ctx.binary.clear();
        self.ctx.pass = Pass::Second;
    }

    pub fn pass(&mut self) -> Result<(), AsmError> {
        loop {
            match self.peek() {
                Tok::Eof => return Ok(()),
                Tok::Newline => self.eat(),
                Tok::Label(name) => self.label(name)?,
                Tok::Directive(Directive::End) => return Ok(()),
                Tok::Directive(dir) => {
                    self.eat();
                    self.directive(*dir)?;
                    self.eol()?;
                }
                Tok::Opcode(op) => {
                    self.eat();
                    self.operand(*op)?;
                    self.eol()?;
                }
                Tok::Ident(name) => {
                    self.assignment(name)?;
                    self.eol()?;
                }
                _ => return Err(self.err("expected label, instruction or directive")),
            }
        }
    }

    pub(crate) fn peek(&self) -> &'a Tok {
        self.toks.peek()
    }

    pub(crate) fn eat(&mut self) {
        self.toks.eat();
    }

    pub(crate) fn pos(&self) -> Pos {
        self.toks.pos()
    }

    pub(crate) fn err(&self, msg: &str) -> AsmError {
        self.toks.err(msg)
    }

    pub(crate) fn emitting(&self) -> bool {
        self.ctx.pass == Pass::Second
    }

    pub(crate) fn eol(&mut self) -> Result<(), AsmError> {
        match self.peek() {
            Tok::Newline => {
                self.eat();
                Ok(())
            }
            Tok::Eof => Ok(()),
            _ => Err(self.err("expected end of line")),
        }
    }

    pub(crate) fn expect(&mut self, tok: Tok, msg: &str) -> Result<(), AsmError> {
        if *self.peek() != tok {
            return Err(self.err(msg));
        }
        self.eat();
        Ok(())
    }

    fn add_pc(&mut self, amt: u32, pos: Pos) -> Result<(), AsmError> {
        let val = self.ctx.pc + amt;
        if val > 0x10000 {
            return Err(AsmError::range(pos, "pc overflow"));
        }
        self.ctx.pc = val;
        Ok(())
    }

    /// Advances the pc in both passes, stores the bytes in the second.
    pub(crate) fn write(&mut self, buf: &[u8], pos: Pos) -> Result<(), AsmError> {
        self.add_pc(buf.len() as u32, pos)?;
        if self.emitting() {
            self.ctx.binary.extend_from_slice(buf);
        }
        Ok(())
    }

    pub(crate) fn instr(&mut self, code: Code, operand: &[u8], pos: Pos) -> Result<(), AsmError> {
        let mut buf = Vec::with_capacity(code.size as usize + 2);
        code.encode(&mut buf);
        buf.extend_from_slice(operand);
        self.write(&buf, pos)
    }

    pub(crate) fn form(&self, op: &Opcode, form: Form, pos: Pos) -> Result<Code, AsmError> {
        op.form(form).ok_or(AsmError::Unsupported {
            pos,
            mnemonic: op.mne,
            form,
        })
    }

    fn term(&mut self) -> Result<Expr, AsmError> {
        let expr = match self.peek() {
            Tok::Num(value) => Expr::known(*value),
            Tok::Char(c) => Expr::known(*c as i32),
            Tok::Ident(name) => {
                let index = self.toks.index();
                match self.ctx.symbols.lookup(name) {
                    Some(sym) => Expr {
                        value: Some(sym.value),
                        forward: sym.is_forward_of(index),
                        missing: None,
                    },
                    None => Expr {
                        value: None,
                        forward: true,
                        missing: Some((self.pos(), name.clone())),
                    },
                }
            }
            _ => return Err(self.err("expected value")),
        };
        self.eat();
        Ok(expr)
    }

    /// Signed sum of numbers, characters and symbols.
    pub(crate) fn sum(&mut self) -> Result<Expr, AsmError> {
        let mut expr = Expr::known(0);
        let mut negate = false;
        loop {
            match self.peek() {
                Tok::Inc => {
                    self.eat();
                    continue;
                }
                Tok::Dec => {
                    self.eat();
                    negate = !negate;
                    continue;
                }
                _ => {}
            }
            let term = self.term()?;
            expr.forward |= term.forward;
            if expr.missing.is_none() {
                expr.missing = term.missing;
            }
            expr.value = match (expr.value, term.value) {
                (Some(a), Some(b)) if negate => Some(a.wrapping_sub(b)),
                (Some(a), Some(b)) => Some(a.wrapping_add(b)),
                _ => None,
            };
            negate = false;
            if !matches!(self.peek(), Tok::Inc | Tok::Dec) {
                return Ok(expr);
            }
        }
    }

    /// The value in the second pass, where every symbol must exist. The first
    /// pass may leave it unknown.
    pub(crate) fn resolve(&self, expr: &Expr) -> Result<Option<i32>, AsmError> {
        match self.ctx.pass {
            Pass::First => Ok(expr.value),
            Pass::Second => expr.require().map(Some),
        }
    }

    /// Resolves and range checks a value, 0 when not yet known.
    pub(crate) fn fits(
        &self,
        expr: &Expr,
        range: RangeInclusive<i32>,
        pos: Pos,
        what: &str,
    ) -> Result<i32, AsmError> {
        match self.resolve(expr)? {
            Some(value) if range.contains(&value) => Ok(value),
            Some(value) => Err(AsmError::range(pos, format!("{what} out of range: {value}"))),
            None => Ok(0),
        }
    }

    pub(crate) fn byte(&self, expr: &Expr, pos: Pos) -> Result<u8, AsmError> {
        Ok(self.fits(expr, -128..=255, pos, "byte")? as u8)
    }

    pub(crate) fn word(&self, expr: &Expr, pos: Pos) -> Result<u16, AsmError> {
        Ok(self.fits(expr, -32768..=65535, pos, "word")? as u16)
    }

    /// A value that determines layout and so must be known in the first pass.
    fn layout(&mut self, range: RangeInclusive<i32>, what: &str) -> Result<i32, AsmError> {
        let pos = self.pos();
        let value = self.sum()?.require()?;
        if !range.contains(&value) {
            return Err(AsmError::range(pos, format!("{what} out of range: {value}")));
        }
        Ok(value)
    }

    pub(crate) fn in_direct_page(&self, value: i32) -> bool {
        let dp = self.ctx.dp;
        (dp == 0 && (-128..=255).contains(&value))
            || ((0..=0xFFFF).contains(&value) && (value >> 8) as u8 == dp)
    }

    fn label(&mut self, name: &'a str) -> Result<(), AsmError> {
        let pos = self.pos();
        let index = self.toks.index() + 1;
        self.eat();
        if matches!(self.peek(), Tok::Directive(Directive::Equ) | Tok::Equ) {
            self.eat();
            self.constant(name, pos, index)?;
            return self.eol();
        }
        let pc = self.ctx.pc as i32;
        match self.ctx.pass {
            Pass::First => {
                if !self.ctx.symbols.define_label(name, Sym { value: pc, index }) {
                    return Err(AsmError::syntax(
                        pos,
                        format!("label `{name}` already defined"),
                    ));
                }
                tracing::trace!("{name} = ${pc:04X}");
            }
            Pass::Second => {
                if let Some(sym) = self.ctx.symbols.label(name) {
                    if sym.value != pc {
                        return Err(AsmError::Phase {
                            pos,
                            name: name.to_string(),
                            expected: sym.value,
                            found: pc,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// `name equ value` or `name = value[, name = value]...`
    fn assignment(&mut self, name: &'a str) -> Result<(), AsmError> {
        let pos = self.pos();
        let index = self.toks.index() + 1;
        self.eat();
        match self.peek() {
            Tok::Directive(Directive::Equ) => {
                self.eat();
                self.constant(name, pos, index)
            }
            Tok::Equ => {
                self.eat();
                self.constant(name, pos, index)?;
                if *self.peek() == Tok::Comma {
                    self.eat();
                    self.const_list()?;
                }
                Ok(())
            }
            _ => Err(AsmError::syntax(
                pos,
                format!("unrecognized instruction `{name}`"),
            )),
        }
    }

    fn const_list(&mut self) -> Result<(), AsmError> {
        loop {
            let pos = self.pos();
            let index = self.toks.index() + 1;
            let Tok::Ident(name) = self.peek() else {
                return Err(self.err("expected constant name"));
            };
            self.eat();
            self.expect(Tok::Equ, "expected =")?;
            self.constant(name, pos, index)?;
            if *self.peek() != Tok::Comma {
                return Ok(());
            }
            self.eat();
        }
    }

    /// Constants are bound once, in the first pass, and skipped afterwards.
    fn constant(&mut self, name: &str, pos: Pos, index: usize) -> Result<(), AsmError> {
        let expr = self.sum()?;
        if self.ctx.pass == Pass::Second {
            return Ok(());
        }
        let value = expr.require()?;
        if !self.ctx.symbols.define_const(name, Sym { value, index }) {
            return Err(AsmError::syntax(
                pos,
                format!("constant `{name}` already defined"),
            ));
        }
        tracing::trace!("{name} equ {value}");
        Ok(())
    }

    fn reserve(&mut self, count: u32, pos: Pos) -> Result<(), AsmError> {
        if count > 0x10000 {
            return Err(AsmError::range(pos, "pc overflow"));
        }
        self.write(&vec![0; count as usize], pos)
    }

    fn directive(&mut self, dir: Directive) -> Result<(), AsmError> {
        let pos = self.pos();
        match dir {
            Directive::Org => {
                self.ctx.pc = self.layout(0..=0xFFFF, "origin")? as u32;
            }
            Directive::SetDp => {
                self.ctx.dp = self.layout(0..=0xFF, "direct page")? as u8;
            }
            Directive::Rmb => {
                let count = self.layout(0..=0x10000, "count")?;
                self.reserve(count as u32, pos)?;
            }
            Directive::Var => {
                let count = self.layout(0..=0x10000, "count")?;
                let size = if *self.peek() == Tok::Comma {
                    self.eat();
                    self.layout(0..=0x10000, "element size")?
                } else {
                    1
                };
                self.reserve((count as u32).saturating_mul(size as u32), pos)?;
            }
            Directive::Fill => {
                let expr = self.sum()?;
                self.expect(Tok::Comma, "expected ,")?;
                let count = self.layout(0..=0x10000, "count")?;
                let byte = self.byte(&expr, pos)?;
                self.write(&vec![byte; count as usize], pos)?;
            }
            Directive::Byte => loop {
                let pos = self.pos();
                if let Tok::Str(string) = self.peek() {
                    self.eat();
                    self.write(string.as_bytes(), pos)?;
                } else {
                    let expr = self.sum()?;
                    let byte = self.byte(&expr, pos)?;
                    self.write(&[byte], pos)?;
                }
                if *self.peek() != Tok::Comma {
                    break;
                }
                self.eat();
            },
            Directive::Word => loop {
                let pos = self.pos();
                if let Tok::Str(string) = self.peek() {
                    self.eat();
                    self.write(string.as_bytes(), pos)?;
                } else {
                    let expr = self.sum()?;
                    let word = self.word(&expr, pos)?;
                    self.write(&word.to_be_bytes(), pos)?;
                }
                if *self.peek() != Tok::Comma {
                    break;
                }
                self.eat();
            },
            Directive::Const => self.const_list()?,
            Directive::Equ => return Err(AsmError::syntax(pos, "expected name before equ")),
            Directive::End => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> Result<Context, AsmError> {
        let toks = tokenize(source);
        let mut ctx = Context::new(DEFAULT_BASE);
        let mut asm = Asm::new(&toks, &mut ctx);
        asm.pass()?;
        asm.rewind();
        asm.pass()?;
        Ok(ctx)
    }

    #[test]
    fn labels_bind_current_pc() {
        let ctx = run("start: nop\nnext: rts\n").unwrap();
        assert_eq!(ctx.symbols.label("start").map(|s| s.value), Some(0x4000));
        assert_eq!(ctx.symbols.label("next").map(|s| s.value), Some(0x4001));
        assert_eq!(ctx.binary, [0x12, 0x39]);
        assert_eq!(ctx.pc, 0x4002);
    }

    #[test]
    fn sums() {
        let ctx = run("a1 equ 10\nb1 = a1+5-'0'+-2\n").unwrap();
        assert_eq!(ctx.symbols.constant("b1").map(|s| s.value), Some(10 + 5 - 48 - 2));
    }

    #[test]
    fn forward_flag_matches_in_both_passes() {
        let toks = tokenize("lda later\nlater: rts\n");
        let mut ctx = Context::new(DEFAULT_BASE);
        let mut asm = Asm::new(&toks, &mut ctx);
        asm.toks.eat();
        let first = asm.sum().unwrap();
        assert_eq!(first.value, None);
        assert!(first.forward);
        asm.toks.rewind();
        asm.pass().unwrap();
        asm.rewind();
        asm.toks.eat();
        let second = asm.sum().unwrap();
        assert_eq!(second.value, Some(0x4003));
        assert!(second.forward);
    }

    #[test]
    fn org_moves_pc_without_padding() {
        let ctx = run("org $1000\nnop\norg $2000\nrts\n").unwrap();
        assert_eq!(ctx.binary, [0x12, 0x39]);
        assert_eq!(ctx.pc, 0x2001);
    }

    #[test]
    fn pc_may_reach_the_top_of_memory() {
        let ctx = run("org $FFFF\nnop\n").unwrap();
        assert_eq!(ctx.pc, 0x10000);
        assert!(matches!(
            run("org $FFFF\nnop\nnop\n"),
            Err(AsmError::Range { .. })
        ));
    }

    #[test]
    fn direct_page_check() {
        let toks = tokenize("");
        let mut ctx = Context::new(DEFAULT_BASE);
        let mut asm = Asm::new(&toks, &mut ctx);
        assert!(asm.in_direct_page(0x80));
        assert!(asm.in_direct_page(-1));
        assert!(!asm.in_direct_page(0x100));
        asm.ctx.dp = 0x40;
        assert!(asm.in_direct_page(0x4012));
        assert!(!asm.in_direct_page(0x12));
    }
}
