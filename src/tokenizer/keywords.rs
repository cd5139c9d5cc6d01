//! The canonical keyword/phrase table, built once behind a
//! [`once_cell::sync::Lazy`] and keyed by the space-joined phrase text a
//! sequence of lexemes must match exactly.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::token::Keyword;

pub struct KeywordTable {
    pub by_phrase: HashMap<&'static str, Keyword>,
    pub max_words: usize,
}

pub static KEYWORDS: Lazy<KeywordTable> = Lazy::new(|| {
    use Keyword::*;
    let entries: &[(&str, Keyword)] = &[
        ("HAI", Hai),
        ("KTHXBYE", Kthxbye),
        ("KTHX", Kthx),
        ("VISIBLE", Visible),
        ("GIMMEH", Gimmeh),
        ("O RLY ?", ORly),
        ("YA RLY", YaRly),
        ("NO WAI", NoWai),
        ("MEBBE", Mebbe),
        ("OIC", Oic),
        ("WTF ?", Wtf),
        ("OMG", Omg),
        ("OMGWTF", Omgwtf),
        ("GTFO", Gtfo),
        ("FOUND YR", FoundYr),
        ("IM IN YR", ImInYr),
        ("IM OUTTA YR", ImOuttaYr),
        ("UPPIN YR", UppinYr),
        ("NERFIN YR", NerfinYr),
        ("WILE", Wile),
        ("TIL", Til),
        ("HOW IZ", HowIz),
        ("IF U SAY SO", IfUSaySo),
        ("OH HAI IM", OhHaiIm),
        ("CAN HAS", CanHas),
        ("IS NOW A", IsNowA),
        ("R", R),
        ("HAS A", HasA),
        ("R NOOB", RNoob),
        ("MAEK", Maek),
        ("IT", It),
        ("I DUZ", IDuz),
        ("AN", An),
        ("MKAY", Mkay),
        ("SRS", Srs),
        ("IZ", Iz),
        ("YR", Yr),
        ("ITZ", Itz),
        ("A", A),
        ("LIEK", Liek),
        ("NOOB", Noob),
        ("TROOF", Troof),
        ("NUMBR", Numbr),
        ("NUMBAR", Numbar),
        ("YARN", Yarn),
        ("BUKKIT", Bukkit),
        ("SUM OF", SumOf),
        ("DIFF OF", DiffOf),
        ("PRODUKT OF", ProduktOf),
        ("QUOSHUNT OF", QuoshuntOf),
        ("MOD OF", ModOf),
        ("BIGGR OF", BiggrOf),
        ("SMALLR OF", SmallrOf),
        ("BOTH OF", BothOf),
        ("EITHER OF", EitherOf),
        ("WON OF", WonOf),
        ("BOTH SAEM", BothSaem),
        ("DIFFRINT", Diffrint),
        ("NOT", Not),
        ("ALL OF", AllOf),
        ("ANY OF", AnyOf),
        ("SMOOSH", Smoosh),
        ("!", Bang),
        ("?", Question),
        ("'Z", Slot),
    ];

    let max_words = entries
        .iter()
        .map(|(phrase, _)| phrase.split(' ').count())
        .max()
        .unwrap_or(1);

    KeywordTable {
        by_phrase: entries.iter().copied().collect(),
        max_words,
    }
});
