//! The `:[NAME]` string-interpolation escape looks a named code point up
//! through this trait rather than a hardcoded match, so a host embedding
//! the interpreter can swap in a full Unicode name database without
//! touching the interpolation code.

pub trait UnicodeNameTable {
    fn lookup(&self, name: &str) -> Option<char>;
}

/// A small built-in table covering the control and punctuation names
/// programs are most likely to reach for. Not a full Unicode database —
/// callers needing the complete name registry should provide their own
/// [`UnicodeNameTable`].
pub struct BuiltinUnicodeNames;

const NAMES: &[(&str, char)] = &[
    ("NULL", '\u{0000}'),
    ("BELL", '\u{0007}'),
    ("BACKSPACE", '\u{0008}'),
    ("TAB", '\u{0009}'),
    ("LINE FEED", '\u{000A}'),
    ("ESCAPE", '\u{001B}'),
    ("SPACE", ' '),
    ("EXCLAMATION MARK", '!'),
    ("QUOTATION MARK", '"'),
    ("COLON", ':'),
    ("COMMA", ','),
    ("FULL STOP", '.'),
    ("CAT FACE", '\u{1F431}'),
    ("SNOWMAN", '\u{2603}'),
    ("HEAVY BLACK HEART", '\u{2764}'),
];

impl UnicodeNameTable for BuiltinUnicodeNames {
    fn lookup(&self, name: &str) -> Option<char> {
        NAMES.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
    }
}
