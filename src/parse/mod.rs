mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{InstructionLine, ScriptLine};

/// Classify a single script line.
///
/// Surrounding whitespace is ignored. Everything except an include path is
/// lowercased.
///
/// # Errors
///
/// Returns [`ParseError`] if a parameter list is opened but never closed.
pub fn parse_line(line: &str) -> Result<ScriptLine, ParseError> {
    use winnow::Parser;
    grammar::script_line
        .parse(line.trim())
        .map_err(|e| ParseError::new(e.offset(), e.inner().to_string()))
}
