//! Centralized error table for the OHAI pipeline.
//!
//! Every stage (lexer, tokenizer, parser, interpreter) produces a
//! [`SourceError`] rather than a stage-specific error type. The message
//! text and the process exit code for each [`ErrorKind`] live in one
//! table here, so the wording and exit codes stay consistent no matter
//! which stage raised the error.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::rc::Rc;

use once_cell::sync::Lazy;

/// One entry of the error table: the message template for a `SourceError`
/// of this kind, and the process exit code it maps to.
///
/// The template embeds four positional placeholders, filled in by
/// [`render`]: `{0}` the source filename, `{1}` the line number, `{2}`
/// the offending image text, `{3}` expected-keyword/kind text. Not every
/// kind uses every placeholder.
struct ErrorEntry {
    template: &'static str,
    exit_code: i32,
}

macro_rules! error_table {
    ($($kind:ident => ($exit:expr, $template:expr)),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorKind {
            $($kind),*
        }

        fn build_table() -> HashMap<ErrorKind, ErrorEntry> {
            let mut m = HashMap::new();
            $(
                m.insert(ErrorKind::$kind, ErrorEntry { template: $template, exit_code: $exit });
            )*
            m
        }
    };
}

error_table! {
    // 100s: file I/O, raised by the CLI before the pipeline runs.
    FileOpenFailed => (100, "{0}: could not open source file: {2}"),
    FileCloseFailed => (101, "{0}: could not close source file: {2}"),

    // 200s: lexer.
    LexBadLineContinuation => (200, "{0}:{1}: line continuation followed by an empty line"),
    LexIllPlacedComment => (201, "{0}:{1}: OBTW must begin a line and be followed by a newline"),
    LexMissingStringDelimiter => (202, "{0}:{1}: string literal must be followed by a delimiter, found '{2}'"),

    // 300s: tokenizer.
    TokenizeMalformedInteger => (300, "{0}:{1}: malformed integer literal '{2}'"),
    TokenizeMalformedFloat => (301, "{0}:{1}: malformed float literal '{2}'"),
    TokenizeUnknownLexeme => (302, "{0}:{1}: unknown token '{2}'"),

    // 400s: parser.
    ParseUnknownConstruct => (400, "{0}:{1}: unknown construct near '{2}'"),
    ParseExpectedToken => (401, "{0}:{1}: expected {3} but found '{2}'"),
    ParseExpectedType => (402, "{0}:{1}: expected a type name but found '{2}'"),
    ParseExpectedIdentifier => (403, "{0}:{1}: expected an identifier but found '{2}'"),
    ParseInvalidOperator => (404, "{0}:{1}: invalid operator '{2}'"),
    ParseExpectedExpression => (405, "{0}:{1}: expected an expression but found '{2}'"),
    ParseExpectedStatement => (406, "{0}:{1}: expected a statement but found '{2}'"),
    ParseExpectedEndOfExpression => (407, "{0}:{1}: expected end of expression near '{2}'"),
    ParseExpectedEndOfStatement => (408, "{0}:{1}: expected end of statement near '{2}'"),
    ParseLiteralReuse => (409, "{0}:{1}: literal '{2}' is used more than once in this switch"),
    ParseInterpolatedSwitchCase => (410, "{0}:{1}: switch case '{2}' may not contain an interpolation token"),
    ParseMismatchedLoopName => (411, "{0}:{1}: loop closed with '{2}' but opened with '{3}'"),
    ParseExpectedUnaryFunction => (412, "{0}:{1}: expected a unary function but found '{2}'"),

    // 500s: interpreter.
    RuntimeRedefinition => (500, "{0}:{1}: '{2}' is already defined in this scope"),
    RuntimeUndefinedName => (501, "{0}:{1}: undefined name '{2}'"),
    RuntimeUndefinedFunction => (502, "{0}:{1}: undefined function '{2}'"),
    RuntimeWrongArgumentCount => (503, "{0}:{1}: '{2}' expects {3} argument(s)"),
    RuntimeInvalidReturnType => (504, "{0}:{1}: invalid return value from '{2}'"),
    RuntimeCastFailure => (505, "{0}:{1}: cannot cast '{2}' to {3}"),
    RuntimeDivisionByZero => (506, "{0}:{1}: division by zero"),
    RuntimeOperandType => (507, "{0}:{1}: operand type error near '{2}'"),
    RuntimeBooleanCastFailure => (508, "{0}:{1}: cannot coerce '{2}' to a boolean"),
    RuntimeIntegerCastFailure => (509, "{0}:{1}: cannot coerce '{2}' to an integer"),
    RuntimeFloatCastFailure => (510, "{0}:{1}: cannot coerce '{2}' to a float"),
    RuntimeStringCastFailure => (511, "{0}:{1}: cannot coerce '{2}' to a string"),
    RuntimeBadHexEscape => (512, "{0}:{1}: bad hex escape '{2}'"),
    RuntimeNonPositiveCodepoint => (513, "{0}:{1}: codepoint '{2}' is not positive"),
    RuntimeUnclosedEscape => (514, "{0}:{1}: unclosed '{2}' escape"),
    RuntimeSubscriptOfNonArray => (515, "{0}:{1}: '{2}' is not an associative array"),
    RuntimeCommandExecutionFailure => (516, "{0}:{1}: system command failed: {2}"),
}

static TABLE: Lazy<HashMap<ErrorKind, ErrorEntry>> = Lazy::new(build_table);

fn render(template: &str, args: [&str; 4]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' {
            if let Some(&digit) = chars.peek() {
                if let Some(index) = digit.to_digit(10) {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        out.push_str(args[index as usize]);
                        continue;
                    }
                    out.push('{');
                    out.push(digit);
                    continue;
                }
            }
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// A single diagnostic: the kind that determines wording and exit code,
/// plus the source position and the offending/expected text that fill
/// the table's template placeholders.
#[derive(Debug, Clone)]
pub struct SourceError {
    pub kind: ErrorKind,
    pub file: Rc<str>,
    pub line: usize,
    pub image: String,
    pub expected: String,
}

impl SourceError {
    pub fn new(kind: ErrorKind, file: Rc<str>, line: usize) -> Self {
        Self {
            kind,
            file,
            line,
            image: String::new(),
            expected: String::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = expected.into();
        self
    }

    pub fn exit_code(&self) -> i32 {
        TABLE
            .get(&self.kind)
            .map(|entry| entry.exit_code)
            .unwrap_or(1)
    }

    /// Write this error's single diagnostic line to standard error and
    /// return the exit code the process should terminate with.
    pub fn report(&self) -> i32 {
        eprintln!("{self}");
        self.exit_code()
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line.to_string();
        let entry = TABLE.get(&self.kind);
        match entry {
            Some(entry) => {
                f.write_str(&render(
                    entry.template,
                    [&self.file, &line, &self.image, &self.expected],
                ))
            }
            None => write!(f, "{}:{}: unknown error", self.file, self.line),
        }
    }
}

impl std::error::Error for SourceError {}

pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_positional_placeholders() {
        let err = SourceError::new(ErrorKind::ParseExpectedToken, Rc::from("main.ohai"), 3)
            .with_image("VISIBLE")
            .with_expected("an identifier");
        assert_eq!(
            err.to_string(),
            "main.ohai:3: expected an identifier but found 'VISIBLE'"
        );
    }

    #[test]
    fn exit_codes_are_grouped_by_stage() {
        assert_eq!(
            SourceError::new(ErrorKind::FileOpenFailed, Rc::from("x"), 0).exit_code(),
            100
        );
        assert_eq!(
            SourceError::new(ErrorKind::LexBadLineContinuation, Rc::from("x"), 0).exit_code(),
            200
        );
        assert_eq!(
            SourceError::new(ErrorKind::TokenizeUnknownLexeme, Rc::from("x"), 0).exit_code(),
            302
        );
        assert_eq!(
            SourceError::new(ErrorKind::ParseExpectedToken, Rc::from("x"), 0).exit_code(),
            401
        );
        assert_eq!(
            SourceError::new(ErrorKind::RuntimeDivisionByZero, Rc::from("x"), 0).exit_code(),
            506
        );
    }
}
