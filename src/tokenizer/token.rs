use std::rc::Rc;

/// A parsed literal value, shared between a token's payload and the
/// AST's [`Constant`](crate::ast::Constant) node so a literal's text is
/// only ever parsed once.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Every fixed multi-lexeme keyword phrase the tokenizer recognizes,
/// plus the three lexeme-level punctuation marks (`!`, `?`, `'Z`) which
/// are classified the same way since they too are closed, reserved
/// atoms rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Hai,
    Kthxbye,
    Kthx,
    Visible,
    Gimmeh,
    ORly,
    YaRly,
    NoWai,
    Mebbe,
    Oic,
    Wtf,
    Omg,
    Omgwtf,
    Gtfo,
    FoundYr,
    ImInYr,
    ImOuttaYr,
    UppinYr,
    NerfinYr,
    Wile,
    Til,
    HowIz,
    IfUSaySo,
    OhHaiIm,
    CanHas,
    IsNowA,
    R,
    HasA,
    RNoob,
    Maek,
    It,
    IDuz,
    An,
    Mkay,
    Srs,
    Iz,
    Yr,
    Itz,
    A,
    Liek,
    Noob,
    Troof,
    Numbr,
    Numbar,
    Yarn,
    Bukkit,
    SumOf,
    DiffOf,
    ProduktOf,
    QuoshuntOf,
    ModOf,
    BiggrOf,
    SmallrOf,
    BothOf,
    EitherOf,
    WonOf,
    BothSaem,
    Diffrint,
    Not,
    AllOf,
    AnyOf,
    Smoosh,
    Bang,
    Question,
    Slot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    BooleanLiteral,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    Identifier,
    Newline,
    Eof,
    Keyword(Keyword),
}

/// A classified atom: its kind, the verbatim text that produced it
/// (keyword images are re-joined from their matched lexemes so that
/// round-tripping preserves the source's exact spelling), its source
/// position, and a parsed literal for numeric/boolean/string tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub image: String,
    pub file: Rc<str>,
    pub line: usize,
    pub literal: Option<Literal>,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}
