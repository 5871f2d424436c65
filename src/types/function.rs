use std::sync::Arc;

use super::action::FunctionId;
use super::instruction::Instruction;

/// A named, ordered sequence of instructions; the unit of recursive calls.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub id: FunctionId,
    pub file: Arc<str>,
    pub line: usize,
    pub instructions: Vec<Instruction>,
}

impl FunctionDef {
    pub(crate) fn new(name: &str, id: FunctionId, file: Arc<str>, line: usize) -> Self {
        Self {
            name: name.to_owned(),
            id,
            file,
            line,
            instructions: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
