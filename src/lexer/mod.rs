//! Lexical segmentation: turns a source buffer into an ordered list of
//! positional [`Lexeme`]s. This is the first of the three front-end
//! stages; the [tokenizer](crate::tokenizer) classifies the lexemes this
//! module produces into typed tokens.

use std::rc::Rc;

use crate::error::{ErrorKind, SourceError, SourceResult};

const NEWLINE_TEXT: &str = "\n";
const EOF_TEXT: &str = "$";

/// A positional atom: an exact slice of the source buffer (or, for
/// synthesized lexemes like newlines, a `'static` constant), the shared
/// filename, and the 1-based source line it was scanned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub text: &'a str,
    pub file: Rc<str>,
    pub line: usize,
}

fn is_delimiter_start(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if let Some(c) = s.chars().next() {
        if c.is_whitespace() || c == ',' || c == '!' || c == '?' {
            return true;
        }
    }
    s.starts_with("'Z") || s.starts_with("...") || s.starts_with('…')
}

/// True iff `rest` begins with `word` immediately followed by a
/// delimiter (or end of input) — i.e. `word` is a standalone lexeme,
/// not a prefix of some longer run of characters.
fn word_at(rest: &str, word: &str) -> bool {
    rest.starts_with(word) && is_delimiter_start(&rest[word.len()..])
}

pub struct Lexer<'a> {
    source: &'a str,
    file: Rc<str>,
    pos: usize,
    line: usize,
    at_line_start: bool,
    lexemes: Vec<Lexeme<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: Rc<str>) -> Self {
        Self {
            source,
            file,
            pos: 0,
            line: 1,
            at_line_start: true,
            lexemes: vec![],
        }
    }

    /// Scan the whole buffer and return its lexemes, ending with the
    /// synthetic `$` end-of-file lexeme.
    pub fn lex(mut self) -> SourceResult<Vec<Lexeme<'a>>> {
        loop {
            self.skip_horizontal_ws();
            match self.peek_char() {
                None => {
                    self.push_static(EOF_TEXT);
                    break;
                }
                Some('\r') | Some('\n') => self.lex_newline(),
                Some(',') => self.lex_comma(),
                Some('!') => self.lex_bang(),
                Some('?') => self.lex_question(),
                _ if self.rest().starts_with("'Z") => self.lex_quote_z(),
                _ if self.rest().starts_with("...") || self.rest().starts_with('…') => {
                    self.lex_continuation()?
                }
                _ if word_at(self.rest(), "OBTW") => self.lex_multi_comment()?,
                _ if word_at(self.rest(), "BTW") => self.lex_single_comment(),
                Some('"') => self.lex_string()?,
                Some(_) => self.lex_default(),
            }
        }
        Ok(self.lexemes)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn push(&mut self, start: usize, end: usize) {
        self.lexemes.push(Lexeme {
            text: &self.source[start..end],
            file: self.file.clone(),
            line: self.line,
        });
    }

    fn push_static(&mut self, text: &'static str) {
        self.lexemes.push(Lexeme {
            text,
            file: self.file.clone(),
            line: self.line,
        });
    }

    fn error(&self, kind: ErrorKind) -> SourceError {
        SourceError::new(kind, self.file.clone(), self.line)
    }

    fn skip_horizontal_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' || c == '\r' || !c.is_whitespace() {
                break;
            }
            self.advance(c.len_utf8());
        }
    }

    fn consume_line_ending(&mut self) {
        if self.peek_char() == Some('\r') {
            self.advance(1);
            if self.peek_char() == Some('\n') {
                self.advance(1);
            }
        } else if self.peek_char() == Some('\n') {
            self.advance(1);
        }
    }

    fn lex_newline(&mut self) {
        self.consume_line_ending();
        self.push_static(NEWLINE_TEXT);
        self.line += 1;
        self.at_line_start = true;
    }

    fn lex_comma(&mut self) {
        self.advance(1);
        self.push_static(NEWLINE_TEXT);
        self.at_line_start = false;
    }

    fn lex_bang(&mut self) {
        self.advance(1);
        self.push_static("!");
        self.at_line_start = false;
    }

    fn lex_question(&mut self) {
        self.advance(1);
        self.push_static("?");
        self.at_line_start = false;
    }

    fn lex_quote_z(&mut self) {
        self.advance(2);
        self.push_static("'Z");
        self.at_line_start = false;
    }

    fn lex_continuation(&mut self) -> SourceResult<()> {
        let marker_len = if self.rest().starts_with("...") {
            3
        } else {
            '…'.len_utf8()
        };
        self.advance(marker_len);
        self.skip_horizontal_ws();

        match self.peek_char() {
            Some('\r') | Some('\n') => self.consume_line_ending(),
            _ => return Err(self.error(ErrorKind::LexBadLineContinuation).with_image("...")),
        }
        self.line += 1;
        self.at_line_start = true;

        let mut lookahead = self.pos;
        for c in self.rest().chars() {
            if c == ' ' || c == '\t' {
                lookahead += c.len_utf8();
            } else {
                break;
            }
        }
        if matches!(self.source[lookahead..].chars().next(), Some('\n') | Some('\r')) {
            return Err(self.error(ErrorKind::LexBadLineContinuation).with_image("..."));
        }

        Ok(())
    }

    fn lex_single_comment(&mut self) {
        self.advance(3);
        while let Some(c) = self.peek_char() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.advance(c.len_utf8());
        }
        self.at_line_start = false;
    }

    fn lex_multi_comment(&mut self) -> SourceResult<()> {
        if !self.at_line_start {
            return Err(self.error(ErrorKind::LexIllPlacedComment).with_image("OBTW"));
        }
        self.advance(4);
        self.skip_horizontal_ws();
        match self.peek_char() {
            Some('\r') | Some('\n') => self.consume_line_ending(),
            _ => return Err(self.error(ErrorKind::LexIllPlacedComment).with_image("OBTW")),
        }
        self.line += 1;

        loop {
            if self.rest().starts_with("TLDR") {
                self.advance(4);
                break;
            }
            match self.peek_char() {
                None => return Err(self.error(ErrorKind::LexIllPlacedComment).with_image("OBTW")),
                Some('\n') => {
                    self.advance(1);
                    self.line += 1;
                }
                Some(c) => self.advance(c.len_utf8()),
            }
        }
        self.at_line_start = false;
        Ok(())
    }

    fn lex_string(&mut self) -> SourceResult<()> {
        let start = self.pos;
        self.advance(1);
        let mut trailing_colons = 0usize;
        let mut closed = false;

        loop {
            match self.peek_char() {
                None => break,
                Some('\n') | Some('\r') => break,
                Some('"') => {
                    self.advance(1);
                    if trailing_colons % 2 == 0 {
                        closed = true;
                        break;
                    }
                    trailing_colons = 0;
                }
                Some(':') => {
                    trailing_colons += 1;
                    self.advance(1);
                }
                Some(c) => {
                    trailing_colons = 0;
                    self.advance(c.len_utf8());
                }
            }
        }

        self.push(start, self.pos);

        if closed && !is_delimiter_start(self.rest()) {
            let next = self.rest().chars().next().map(String::from).unwrap_or_default();
            return Err(self
                .error(ErrorKind::LexMissingStringDelimiter)
                .with_image(next));
        }

        self.at_line_start = false;
        Ok(())
    }

    fn lex_default(&mut self) {
        let start = self.pos;
        loop {
            match self.peek_char() {
                None => break,
                Some(c) if c.is_whitespace() => break,
                Some(',') | Some('!') | Some('?') | Some('"') => break,
                _ if self.rest().starts_with("'Z") => break,
                _ if self.rest().starts_with("...") || self.rest().starts_with('…') => break,
                Some(c) => self.advance(c.len_utf8()),
            }
        }
        if self.pos == start {
            // Never happens for a Unicode scalar, but guards against
            // an infinite loop if it somehow did.
            if let Some(c) = self.peek_char() {
                self.advance(c.len_utf8());
            }
        }
        self.push(start, self.pos);
        self.at_line_start = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<String> {
        let file: Rc<str> = Rc::from("test.ohai");
        Lexer::new(src, file)
            .lex()
            .expect("lex should succeed")
            .into_iter()
            .map(|l| l.text.to_owned())
            .collect()
    }

    #[test]
    fn splits_words_and_newlines() {
        assert_eq!(lex("HAI 1.2\nKTHXBYE\n"), vec!["HAI", "1.2", "\n", "KTHXBYE", "\n", "$"]);
    }

    #[test]
    fn comma_is_a_soft_newline() {
        assert_eq!(lex("VISIBLE X, VISIBLE Y"), vec!["VISIBLE", "X", "\n", "VISIBLE", "Y", "$"]);
    }

    #[test]
    fn bang_question_and_quote_z_are_own_lexemes() {
        assert_eq!(lex("VISIBLE X!"), vec!["VISIBLE", "X", "!", "$"]);
        assert_eq!(lex("O RLY?"), vec!["O", "RLY", "?", "$"]);
        assert_eq!(lex("BUCKET'Z SLOT"), vec!["BUCKET", "'Z", "SLOT", "$"]);
    }

    #[test]
    fn single_line_comment_runs_to_end_of_line() {
        assert_eq!(
            lex("VISIBLE X BTW this is ignored\nKTHXBYE\n"),
            vec!["VISIBLE", "X", "\n", "KTHXBYE", "\n", "$"]
        );
    }

    #[test]
    fn multi_line_comment_must_start_a_line() {
        assert_eq!(
            lex("OBTW\nanything at all\nTLDR\nVISIBLE X\n"),
            vec!["\n", "VISIBLE", "X", "\n", "$"]
        );

        let file: Rc<str> = Rc::from("test.ohai");
        let err = Lexer::new("VISIBLE OBTW\nfoo\nTLDR\n", file).lex();
        assert!(err.is_err());
    }

    #[test]
    fn line_continuation_consumes_the_newline() {
        assert_eq!(
            lex("VISIBLE SUM OF 1 AN...\n2\n"),
            vec!["VISIBLE", "SUM", "OF", "1", "AN", "2", "\n", "$"]
        );
    }

    #[test]
    fn line_continuation_rejects_a_blank_continued_line() {
        let file: Rc<str> = Rc::from("test.ohai");
        let err = Lexer::new("VISIBLE X...\n\nY\n", file).lex();
        assert!(err.is_err());
    }

    #[test]
    fn string_literal_handles_doubled_colon_escape() {
        assert_eq!(
            lex("VISIBLE \"a::\"\n"),
            vec!["VISIBLE", "\"a::\"", "\n", "$"]
        );
    }

    #[test]
    fn string_literal_single_colon_escapes_the_quote() {
        assert_eq!(
            lex("VISIBLE \"a:\"b\"\n"),
            vec!["VISIBLE", "\"a:\"b\"", "\n", "$"]
        );
    }

    #[test]
    fn string_literal_requires_trailing_delimiter() {
        let file: Rc<str> = Rc::from("test.ohai");
        let err = Lexer::new(r#"VISIBLE "hi"X"#, file).lex();
        assert!(err.is_err());
    }
}
