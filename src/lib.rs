use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    mem,
};

use indexmap::IndexMap;

pub mod asm;
pub mod config;
pub mod error;
pub mod lexer;
pub mod opcodes;
pub mod operand;
pub mod symbols;

pub use asm::DEFAULT_BASE;
pub use config::Config;
pub use error::AsmError;
pub use lexer::{parse_int, tokenize, Cursor, Tok, Token};
pub use opcodes::{Opcode, OPCODES};
pub use symbols::{Sym, SymbolDump, SymbolTable};

use asm::{Asm, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Parses `NAME=value`, where value is any integer literal the assembler accepts.
pub fn parse_defines(s: &str) -> Result<(String, i32), Box<dyn Error + Send + Sync + 'static>> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid SYMBOL=value: no `=` found in `{s}`"))?;
    let value = parse_int(&s[pos + 1..])
        .ok_or_else(|| format!("invalid SYMBOL=value: `{}` is not a number", &s[pos + 1..]))?;
    Ok((s[..pos].to_ascii_lowercase(), value))
}

/// Parses a 16-bit load address such as `$4000`, `0x4000` or `16384`.
pub fn parse_base(s: &str) -> Result<u16, Box<dyn Error + Send + Sync + 'static>> {
    let value = parse_int(s).ok_or_else(|| format!("`{s}` is not a number"))?;
    u16::try_from(value).map_err(|_| format!("base address `{s}` exceeds $FFFF").into())
}

/// Assembles `source` at `base` in one call.
pub fn assemble(source: &str, base: u16) -> Result<Vec<u8>, AsmError> {
    Assembler::with_base(base).assemble(source)
}

/// Reusable assembler. Symbols from the last run stay readable until the next
/// `assemble` or `reset`.
#[derive(Debug)]
pub struct Assembler {
    ctx: Context,
    defines: IndexMap<String, i32>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::with_base(DEFAULT_BASE)
    }

    pub fn with_base(base: u16) -> Self {
        Self {
            ctx: Context::new(base),
            defines: IndexMap::new(),
        }
    }

    pub fn base(&self) -> u16 {
        self.ctx.base
    }

    /// Predefines a constant for every following run.
    pub fn define(&mut self, name: &str, value: i32) {
        self.defines.insert(name.to_ascii_lowercase(), value);
    }

    pub fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AsmError> {
        self.reset();
        for (name, value) in &self.defines {
            self.ctx.symbols.define_const(name, Sym::predefined(*value));
        }
        let toks = tokenize(source);
        let mut asm = Asm::new(&toks, &mut self.ctx);

        tracing::trace!("starting pass 1");
        asm.pass()?;

        tracing::trace!("starting pass 2");
        asm.rewind();
        asm.pass()?;

        tracing::debug!(
            "{} labels, {} constants, {} bytes",
            self.ctx.symbols.labels().len(),
            self.ctx.symbols.consts().len(),
            self.ctx.binary.len()
        );
        Ok(mem::take(&mut self.ctx.binary))
    }

    /// Clears the program counter, symbol tables and output. Predefined
    /// constants are kept.
    pub fn reset(&mut self) {
        self.ctx.reset();
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.ctx.symbols
    }

    pub fn labels(&self) -> &IndexMap<String, Sym> {
        self.ctx.symbols.labels()
    }

    pub fn consts(&self) -> &IndexMap<String, Sym> {
        self.ctx.symbols.consts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines() {
        assert_eq!(parse_defines("PIA=$FF20").unwrap(), ("pia".to_string(), 0xFF20));
        assert_eq!(parse_defines("n=-3").unwrap(), ("n".to_string(), -3));
        assert!(parse_defines("novalue").is_err());
        assert!(parse_defines("x=abc").is_err());
    }

    #[test]
    fn bases() {
        assert_eq!(parse_base("$4000").unwrap(), 0x4000);
        assert_eq!(parse_base("0").unwrap(), 0);
        assert!(parse_base("$10000").is_err());
        assert!(parse_base("-1").is_err());
    }

    #[test]
    fn symbols_survive_until_reset() {
        let mut asm = Assembler::new();
        asm.define("screen", 0x400);
        asm.assemble("start: ldx #screen\n").unwrap();
        assert_eq!(asm.labels()["start"].value, 0x4000);
        assert_eq!(asm.consts()["screen"].value, 0x400);
        asm.reset();
        assert!(asm.labels().is_empty());
        assert_eq!(asm.base(), 0x4000);
    }
}
