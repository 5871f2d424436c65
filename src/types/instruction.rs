use std::sync::Arc;

use super::action::ActionRef;
use super::condition::{ConditionKind, Polarity};
use super::lists::ListHandle;

/// One rule line: a condition, the lists it checks and the action it runs.
///
/// Created by the loader with `lists` empty and `action` unresolved; the link
/// pass fills both in. Never mutated once the table is published.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub condition: ConditionKind,
    pub polarity: Polarity,
    pub list_name: Option<String>,
    pub lists: Vec<ListHandle>,
    /// Overrides the context's message id when non-zero.
    pub message_id: u32,
    /// Overrides the context's log message id when non-zero.
    pub log_message_id: u32,
    pub action: ActionRef,
    /// Stop the enclosing function after this instruction's action.
    pub return_after_action: bool,
    /// Stop only when the action succeeded. No script syntax sets this yet.
    pub return_after_action_is_true: bool,
    pub line: usize,
    pub file: Arc<str>,
}

impl Instruction {
    /// Raw action name as written in the script, if it was never resolved.
    #[must_use]
    pub fn unresolved_action(&self) -> Option<&str> {
        match &self.action {
            ActionRef::Unresolved(name) => Some(name),
            _ => None,
        }
    }
}
