//! Classification of a [`Lexeme`](crate::lexer::Lexeme) stream into typed
//! [`Token`]s: literal parsing, multi-word keyword collapsing, and newline
//! suppression. This is the second front-end stage; the
//! [parser](crate::parser) consumes the tokens this module produces.

mod keywords;
mod token;

pub use token::{Keyword, Literal, Token, TokenKind};

use crate::error::{ErrorKind, SourceError, SourceResult};
use crate::lexer::Lexeme;
use keywords::KEYWORDS;

fn is_integer_literal(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut idx = if bytes[0] == b'-' { 1 } else { 0 };
    if idx >= bytes.len() || !bytes[idx].is_ascii_digit() {
        return None;
    }
    if bytes[idx] == b'0' {
        if idx + 1 != bytes.len() {
            return None;
        }
    } else {
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx != bytes.len() {
            return None;
        }
    }
    s.parse::<i64>().ok()
}

fn is_float_literal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut idx = if bytes.first() == Some(&b'-') { 1 } else { 0 };
    let digits_before = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == digits_before {
        return None;
    }
    if bytes.get(idx) != Some(&b'.') {
        return None;
    }
    idx += 1;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx != bytes.len() {
        return None;
    }
    s.parse::<f64>().ok()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strips the literal `"`...`"` delimiters of a string lexeme, leaving the
/// raw inner text (escapes are expanded later, at interpolation time).
fn string_literal_shape(s: &str) -> Option<&str> {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

pub struct Tokenizer<'a> {
    lexemes: Vec<Lexeme<'a>>,
    pos: usize,
    tokens: Vec<Token>,
    last_was_newline: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(lexemes: Vec<Lexeme<'a>>) -> Self {
        Self {
            lexemes,
            pos: 0,
            tokens: vec![],
            last_was_newline: true,
        }
    }

    pub fn tokenize(mut self) -> SourceResult<Vec<Token>> {
        while self.pos < self.lexemes.len() {
            self.step()?;
        }
        Ok(self.tokens)
    }

    fn current(&self) -> &Lexeme<'a> {
        &self.lexemes[self.pos]
    }

    fn error(&self, kind: ErrorKind) -> SourceError {
        let lex = self.current();
        SourceError::new(kind, lex.file.clone(), lex.line)
    }

    fn push(&mut self, kind: TokenKind, image: String, literal: Option<Literal>) {
        let lex = self.current();
        self.tokens.push(Token {
            kind,
            image,
            file: lex.file.clone(),
            line: lex.line,
            literal,
        });
        self.last_was_newline = matches!(kind, TokenKind::Newline);
    }

    fn step(&mut self) -> SourceResult<()> {
        let lex = self.current();
        let text = lex.text;

        if text == "$" {
            self.push(TokenKind::Eof, text.to_owned(), None);
            self.pos += 1;
            return Ok(());
        }

        if let Some(inner) = string_literal_shape(text) {
            self.push(
                TokenKind::StringLiteral,
                text.to_owned(),
                Some(Literal::Str(inner.to_owned())),
            );
            self.pos += 1;
            return Ok(());
        }

        if let Some(value) = is_float_literal(text) {
            self.push(TokenKind::FloatLiteral, text.to_owned(), Some(Literal::Float(value)));
            self.pos += 1;
            return Ok(());
        }

        if let Some(value) = is_integer_literal(text) {
            self.push(TokenKind::IntegerLiteral, text.to_owned(), Some(Literal::Int(value)));
            self.pos += 1;
            return Ok(());
        }

        if text == "WIN" {
            self.push(TokenKind::BooleanLiteral, text.to_owned(), Some(Literal::Bool(true)));
            self.pos += 1;
            return Ok(());
        }
        if text == "FAIL" {
            self.push(TokenKind::BooleanLiteral, text.to_owned(), Some(Literal::Bool(false)));
            self.pos += 1;
            return Ok(());
        }

        if text == "\n" {
            if self.last_was_newline {
                // First newline of the stream, or immediately follows
                // another (already-suppressed) newline: drop it.
                self.pos += 1;
                return Ok(());
            }
            self.push(TokenKind::Newline, text.to_owned(), None);
            self.pos += 1;
            return Ok(());
        }

        if let Some((keyword, len)) = self.match_keyword() {
            let image = self.lexemes[self.pos..self.pos + len]
                .iter()
                .map(|l| l.text)
                .collect::<Vec<_>>()
                .join(" ");
            self.push(TokenKind::Keyword(keyword), image, None);
            self.pos += len;
            return Ok(());
        }

        if is_identifier(text) {
            self.push(TokenKind::Identifier, text.to_owned(), None);
            self.pos += 1;
            return Ok(());
        }

        // Malformed-number diagnostics are more useful than a bare
        // "unknown token" when the lexeme at least starts like a number.
        let first = text.chars().next().unwrap_or(' ');
        if first == '-' || first.is_ascii_digit() {
            if text.contains('.') {
                return Err(self.error(ErrorKind::TokenizeMalformedFloat).with_image(text));
            }
            return Err(self.error(ErrorKind::TokenizeMalformedInteger).with_image(text));
        }

        Err(self.error(ErrorKind::TokenizeUnknownLexeme).with_image(text))
    }

    /// Longest-match-first search over the keyword table, starting at the
    /// current position. Returns the matched keyword and how many lexemes
    /// it consumed.
    fn match_keyword(&self) -> Option<(Keyword, usize)> {
        let remaining = self.lexemes.len() - self.pos;
        let max_len = KEYWORDS.max_words.min(remaining);
        for len in (1..=max_len).rev() {
            let phrase = self.lexemes[self.pos..self.pos + len]
                .iter()
                .map(|l| l.text)
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(&keyword) = KEYWORDS.by_phrase.get(phrase.as_str()) {
                return Some((keyword, len));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use std::rc::Rc;

    fn tokenize(src: &str) -> Vec<Token> {
        let file: Rc<str> = Rc::from("test.ohai");
        let lexemes = Lexer::new(src, file).lex().expect("lex should succeed");
        Tokenizer::new(lexemes).tokenize().expect("tokenize should succeed")
    }

    #[test]
    fn collapses_multi_word_keywords() {
        let tokens = tokenize("HAI 1.2\nKTHXBYE\n");
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Hai));
        assert_eq!(tokens[1].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[1].literal, Some(Literal::Float(1.2)));
        // The leading newline of the stream and the final EOF's
        // preceding newline are both suppressed or kept per the rule;
        // KTHXBYE itself must show up as a keyword.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Keyword(Keyword::Kthxbye)));
    }

    #[test]
    fn longest_match_prefers_the_longer_phrase() {
        let tokens = tokenize("IM IN YR L UPPIN YR I TIL X\nIM OUTTA YR L\n");
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::ImInYr));
        // "L" is the loop's name, a plain identifier, not folded into
        // the keyword phrase.
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].image, "L");
        assert_eq!(tokens[2].kind, TokenKind::Keyword(Keyword::UppinYr));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Keyword(Keyword::ImOuttaYr)));
    }

    #[test]
    fn r_noob_wins_over_bare_r() {
        let tokens = tokenize("X R NOOB\n");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::RNoob));
    }

    #[test]
    fn newline_suppression_drops_leading_and_duplicate_newlines() {
        let tokens = tokenize("\n\nVISIBLE X\n\n\nVISIBLE Y\n");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        // No newline token before the first statement, exactly one
        // between the two VISIBLE statements.
        assert_eq!(kinds[0], TokenKind::Keyword(Keyword::Visible));
        let newline_positions: Vec<usize> = kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == TokenKind::Newline)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(newline_positions.len(), 1);
    }

    #[test]
    fn boolean_and_string_literals() {
        let tokens = tokenize("VISIBLE WIN\nVISIBLE \"hi\"\n");
        assert_eq!(tokens[1].literal, Some(Literal::Bool(true)));
        assert_eq!(tokens[4].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[4].literal, Some(Literal::Str("hi".to_owned())));
    }

    #[test]
    fn rejects_double_leading_zero() {
        let file: Rc<str> = Rc::from("test.ohai");
        let lexemes = Lexer::new("VISIBLE 00\n", file).lex().unwrap();
        let err = Tokenizer::new(lexemes).tokenize();
        assert!(err.is_err());
    }

    #[test]
    fn stream_ends_with_eof_token() {
        let tokens = tokenize("HAI 1.2\nKTHXBYE\n");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }
}
