/// The six OHAI runtime types, used both as cast/declare targets in the
/// AST and as the tag on interpreter [`Value`](crate::interpreter::Value)s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Noob,
    Troof,
    Numbr,
    Numbar,
    Yarn,
    Bukkit,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Type::Noob => "NOOB",
            Type::Troof => "TROOF",
            Type::Numbr => "NUMBR",
            Type::Numbar => "NUMBAR",
            Type::Yarn => "YARN",
            Type::Bukkit => "BUKKIT",
        };
        f.write_str(name)
    }
}
