use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::action::BuiltinAction;
use super::condition::{ConditionKind, Polarity};

/// One event in a script run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStep {
    Enter {
        function: String,
        line: usize,
        file: Arc<str>,
    },
    Condition {
        line: usize,
        polarity: Polarity,
        condition: ConditionKind,
        list: Option<String>,
        result: bool,
    },
    Action {
        action: BuiltinAction,
        result: bool,
    },
    /// Back in `function` after a nested call returned.
    Resume {
        function: String,
    },
    Return {
        function: String,
        result: bool,
    },
    /// A call to `function` was refused because the call chain was too deep.
    DepthExceeded {
        function: String,
        depth: usize,
    },
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceStep::Enter {
                function,
                line,
                file,
            } => write!(f, "entering {function} line:{line} of {file}"),
            TraceStep::Condition {
                line,
                polarity,
                condition,
                list,
                result,
            } => write!(
                f,
                "{line} {polarity}({condition},{}) is {result}",
                list.as_deref().unwrap_or_default()
            ),
            TraceStep::Action { action, result } => write!(f, "{action} {result}"),
            TraceStep::Resume { function } => write!(f, "resuming: {function}"),
            TraceStep::Return { function, result } => write!(f, "{function} returned {result}"),
            TraceStep::DepthExceeded { function, depth } => {
                write!(f, "call to {function} refused at depth {depth}")
            }
        }
    }
}

/// Outcome of [`Interpreter::run_detailed`](crate::Interpreter::run_detailed):
/// the boolean result plus every trace step and the wall-clock time taken.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    result: bool,
    steps: Vec<TraceStep>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(result: bool, steps: Vec<TraceStep>, duration: Duration) -> Self {
        Self {
            result,
            steps,
            duration,
        }
    }

    /// Same value [`Interpreter::run`](crate::Interpreter::run) would return.
    #[must_use]
    pub fn result(&self) -> bool {
        self.result
    }

    #[must_use]
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Lines whose condition held, in evaluation order.
    pub fn matched_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().filter_map(|step| match step {
            TraceStep::Condition {
                line, result: true, ..
            } => Some(*line),
            _ => None,
        })
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result: {}", self.result)?;
        write!(f, ", steps: {}", self.steps.len())?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
