/// One classified script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    /// Blank, comment, or a `.` directive other than `.include`.
    Blank,
    /// `.include<path>`; the path keeps its case.
    Include(String),
    /// `function(name)`
    Function(String),
    /// `end()`
    End,
    Instruction(InstructionLine),
}

/// A `command(params)action` line, lowercased and trimmed.
///
/// `command` is not validated here; anything that is not a block keyword
/// lands in this shape and the loader decides whether it is `if`/`ifnot`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionLine {
    pub command: String,
    /// Up to four comma-separated fields: condition, list, message id, log
    /// message id. Extra commas stay in the last field.
    pub params: Vec<String>,
    pub action: String,
    /// The action began with the `return` keyword.
    pub return_after_action: bool,
}

impl InstructionLine {
    #[must_use]
    pub fn param(&self, index: usize) -> &str {
        self.params.get(index).map_or("", String::as_str)
    }
}
