use crate::{
    error::AsmError,
    opcodes::{Opcode, Reg},
    Pos,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Org,
    SetDp,
    Rmb,
    Var,
    Fill,
    Byte,
    Word,
    End,
    Equ,
    Const,
}

const DIRECTIVES: &[(&str, Directive)] = &[
    ("org", Directive::Org),
    ("setdp", Directive::SetDp),
    ("direct", Directive::SetDp),
    ("rmb", Directive::Rmb),
    ("ds", Directive::Rmb),
    ("var", Directive::Var),
    ("fill", Directive::Fill),
    ("db", Directive::Byte),
    ("fcb", Directive::Byte),
    ("fcc", Directive::Byte),
    (".byte", Directive::Byte),
    ("dw", Directive::Word),
    ("fdb", Directive::Word),
    (".word", Directive::Word),
    ("end", Directive::End),
    ("equ", Directive::Equ),
    ("const", Directive::Const),
];

impl Directive {
    pub fn parse(s: &str) -> Option<Self> {
        DIRECTIVES
            .iter()
            .find_map(|(name, dir)| name.eq_ignore_ascii_case(s).then_some(*dir))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Label(String),
    Directive(Directive),
    Opcode(&'static Opcode),
    Ident(String),
    Num(i32),
    Str(String),
    Char(u8),
    Reg(Reg),
    Comma,
    Inc,
    Inc2,
    Dec,
    Dec2,
    Equ,
    Lt,
    Gt,
    Hash,
    LBracket,
    RBracket,
    Newline,
    /// Text that does not start any token. Only an error if a statement reaches it.
    Invalid(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub pos: Pos,
}

static EOF: Token = Token {
    tok: Tok::Eof,
    pos: Pos { line: 1, column: 1 },
};

/// Splits the whole source into tokens. Whitespace and comments are dropped and
/// the result always ends with [`Tok::Eof`].
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut toks = Vec::new();
    loop {
        let token = lexer.next();
        let done = token.tok == Tok::Eof;
        toks.push(token);
        if done {
            return toks;
        }
    }
}

/// Parses an integer literal: decimal, `$`/`0x` hex or `%`/`0b` binary, with an
/// optional leading sign.
pub fn parse_int(s: &str) -> Option<i32> {
    let (negative, s) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = if let Some(digits) = s.strip_prefix('$') {
        (16, digits)
    } else if let Some(digits) = s.strip_prefix('%') {
        (2, digits)
    } else if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, digits)
    } else if let Some(digits) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, digits)
    } else {
        (10, s)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { -value } else { value };
    i32::try_from(value).ok()
}

struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    pos: Pos,
    string: String,
    after_value: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            pos: Pos { line: 1, column: 1 },
            string: String::new(),
            after_value: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.offset..].chars().nth(n)
    }

    fn eat(&mut self) {
        if let Some(c) = self.peek() {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.pos.line += 1;
                self.pos.column = 1;
            } else {
                self.pos.column += 1;
            }
        }
    }

    fn is_number_start(&self, n: usize) -> bool {
        match self.peek_at(n) {
            Some('$') => self.peek_at(n + 1).is_some_and(|c| c.is_ascii_hexdigit()),
            Some('%') => self.peek_at(n + 1).is_some_and(|c| c == '0' || c == '1'),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    fn next(&mut self) -> Token {
        // skip whitespace and comments, but never the newline ending a comment
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => self.eat(),
                ';' | '*' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.eat();
                    }
                }
                _ => break,
            }
        }
        let pos = self.pos;
        self.string.clear();
        let tok = match self.peek() {
            None => Tok::Eof,
            Some('\n') => {
                self.eat();
                Tok::Newline
            }
            Some('"') => self.string(),
            Some('\'') => self.char(),
            Some(c @ ('+' | '-')) => {
                // a sign after a value is an operator, not part of a literal
                if !self.after_value && self.is_number_start(1) {
                    self.number()
                } else {
                    self.eat();
                    let double = self.peek() == Some(c);
                    if double {
                        self.eat();
                    }
                    match (c, double) {
                        ('+', false) => Tok::Inc,
                        ('+', true) => Tok::Inc2,
                        (_, false) => Tok::Dec,
                        (_, true) => Tok::Dec2,
                    }
                }
            }
            Some(_) if self.is_number_start(0) => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => self.word(),
            Some(c) => {
                self.eat();
                match c {
                    ',' => Tok::Comma,
                    '=' => Tok::Equ,
                    '<' => Tok::Lt,
                    '>' => Tok::Gt,
                    '#' => Tok::Hash,
                    '[' => Tok::LBracket,
                    ']' => Tok::RBracket,
                    c => Tok::Invalid(c.to_string()),
                }
            }
        };
        self.after_value = matches!(tok, Tok::Num(_) | Tok::Char(_) | Tok::Ident(_));
        Token { tok, pos }
    }

    fn number(&mut self) -> Tok {
        if let Some(c @ ('+' | '-')) = self.peek() {
            self.string.push(c);
            self.eat();
        }
        let radix = match (self.peek(), self.peek_at(1), self.peek_at(2)) {
            (Some(c @ ('$' | '%')), _, _) => {
                self.string.push(c);
                self.eat();
                if c == '$' {
                    16
                } else {
                    2
                }
            }
            (Some('0'), Some(p @ ('x' | 'X')), Some(d)) if d.is_ascii_hexdigit() => {
                self.string.push('0');
                self.string.push(p);
                self.eat();
                self.eat();
                16
            }
            (Some('0'), Some(p @ ('b' | 'B')), Some('0' | '1')) => {
                self.string.push('0');
                self.string.push(p);
                self.eat();
                self.eat();
                2
            }
            _ => 10,
        };
        while let Some(c) = self.peek() {
            if !c.is_digit(radix) {
                break;
            }
            self.string.push(c);
            self.eat();
        }
        match parse_int(&self.string) {
            Some(value) => Tok::Num(value),
            None => Tok::Invalid(self.string.clone()),
        }
    }

    fn string(&mut self) -> Tok {
        self.eat();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Tok::Invalid(format!("\"{}", self.string));
                }
                Some('"') => {
                    self.eat();
                    return Tok::Str(self.string.clone());
                }
                Some('\\') if matches!(self.peek_at(1), Some('"' | '\\')) => {
                    self.eat();
                    if let Some(c) = self.peek() {
                        self.string.push(c);
                    }
                    self.eat();
                }
                Some(c) => {
                    self.string.push(c);
                    self.eat();
                }
            }
        }
    }

    // 'c or 'c'
    fn char(&mut self) -> Tok {
        self.eat();
        let c = match self.peek() {
            Some(c) if c != '\n' && c.is_ascii() => c,
            _ => return Tok::Invalid("'".into()),
        };
        self.eat();
        if self.peek() == Some('\'') {
            self.eat();
        }
        Tok::Char(c as u8)
    }

    fn word(&mut self) -> Tok {
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '.' {
                break;
            }
            self.string.push(c.to_ascii_lowercase());
            self.eat();
        }
        if self.peek() == Some(':') {
            self.eat();
            return Tok::Label(self.string.clone());
        }
        if let Some(dir) = Directive::parse(&self.string) {
            Tok::Directive(dir)
        } else if let Some(reg) = Reg::parse(&self.string) {
            Tok::Reg(reg)
        } else if let Some(op) = Opcode::lookup(&self.string) {
            Tok::Opcode(op)
        } else {
            Tok::Ident(self.string.clone())
        }
    }
}

/// Rewindable cursor over a token slice. Both passes walk the same slice, so
/// they see the same statements in the same order.
pub struct Cursor<'a> {
    toks: &'a [Token],
    index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(toks: &'a [Token]) -> Self {
        Self { toks, index: 0 }
    }

    pub fn token(&self) -> &'a Token {
        self.toks.get(self.index).unwrap_or(&EOF)
    }

    pub fn peek(&self) -> &'a Tok {
        &self.token().tok
    }

    pub fn pos(&self) -> Pos {
        self.token().pos
    }

    /// Index of the current token, used to order definitions against references.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn eat(&mut self) {
        if self.index < self.toks.len() {
            self.index += 1;
        }
    }

    pub fn rewind(&mut self) {
        self.index = 0;
    }

    pub fn err(&self, msg: &str) -> AsmError {
        if let Tok::Invalid(text) = self.peek() {
            return AsmError::syntax(self.pos(), format!("invalid token `{text}`"));
        }
        AsmError::syntax(self.pos(), msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(source: &str) -> Vec<Tok> {
        tokenize(source).into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            toks("48,+57,$38,0x37,%00110001,0b11,-$13"),
            vec![
                Tok::Num(48),
                Tok::Comma,
                Tok::Num(57),
                Tok::Comma,
                Tok::Num(0x38),
                Tok::Comma,
                Tok::Num(0x37),
                Tok::Comma,
                Tok::Num(49),
                Tok::Comma,
                Tok::Num(3),
                Tok::Comma,
                Tok::Num(-19),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn sign_after_value_is_an_operator() {
        assert_eq!(
            toks("table+2 5 -3 -x"),
            vec![
                Tok::Ident("table".into()),
                Tok::Inc,
                Tok::Num(2),
                Tok::Num(5),
                Tok::Dec,
                Tok::Num(3),
                Tok::Dec,
                Tok::Ident("x".into()),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn parse_int_literals() {
        assert_eq!(parse_int("$FF20"), Some(0xFF20));
        assert_eq!(parse_int("-%101"), Some(-5));
        assert_eq!(parse_int("0X1f"), Some(31));
        assert_eq!(parse_int("12a"), None);
        assert_eq!(parse_int("$"), None);
        assert_eq!(parse_int("99999999999"), None);
    }

    #[test]
    fn indexed_operand_markers() {
        assert_eq!(
            toks("lda ,x++\nsta [,--y]\nleax -16,u"),
            vec![
                Tok::Opcode(Opcode::lookup("lda").unwrap()),
                Tok::Comma,
                Tok::Reg(Reg::X),
                Tok::Inc2,
                Tok::Newline,
                Tok::Opcode(Opcode::lookup("sta").unwrap()),
                Tok::LBracket,
                Tok::Comma,
                Tok::Dec2,
                Tok::Reg(Reg::Y),
                Tok::RBracket,
                Tok::Newline,
                Tok::Opcode(Opcode::lookup("leax").unwrap()),
                Tok::Num(-16),
                Tok::Comma,
                Tok::Reg(Reg::U),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn words_fold_case() {
        assert_eq!(
            toks("Start: LDA #Foo,PCR .BYTE"),
            vec![
                Tok::Label("start".into()),
                Tok::Opcode(Opcode::lookup("lda").unwrap()),
                Tok::Hash,
                Tok::Ident("foo".into()),
                Tok::Comma,
                Tok::Reg(Reg::Pcr),
                Tok::Directive(Directive::Byte),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn comments_keep_newlines() {
        assert_eq!(
            toks("rts ; done\n* whole line\nnop"),
            vec![
                Tok::Opcode(Opcode::lookup("rts").unwrap()),
                Tok::Newline,
                Tok::Newline,
                Tok::Opcode(Opcode::lookup("nop").unwrap()),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn strings_and_chars() {
        assert_eq!(
            toks(r#"fcc "Hi \"x\"",'a,'b' '"#),
            vec![
                Tok::Directive(Directive::Byte),
                Tok::Str("Hi \"x\"".into()),
                Tok::Comma,
                Tok::Char(b'a'),
                Tok::Comma,
                Tok::Char(b'b'),
                Tok::Invalid("'".into()),
                Tok::Eof,
            ]
        );
        assert_eq!(
            toks("\"open\nnop"),
            vec![
                Tok::Invalid("\"open".into()),
                Tok::Newline,
                Tok::Opcode(Opcode::lookup("nop").unwrap()),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn positions() {
        let toks = tokenize("  nop\n\tlda #1");
        assert_eq!(toks[0].pos, Pos { line: 1, column: 3 });
        assert_eq!(toks[2].pos, Pos { line: 2, column: 2 });
        assert_eq!(toks[3].pos, Pos { line: 2, column: 6 });
    }

    #[test]
    fn cursor_stops_at_eof_and_rewinds() {
        let toks = tokenize("nop");
        let mut cursor = Cursor::new(&toks);
        cursor.eat();
        cursor.eat();
        cursor.eat();
        assert_eq!(cursor.peek(), &Tok::Eof);
        cursor.rewind();
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.peek(), &Tok::Opcode(Opcode::lookup("nop").unwrap()));
    }
}
