mod action;
mod condition;
mod config;
mod context;
mod error;
mod evaluation_report;
mod function;
mod instruction;
mod lists;
mod request;
mod services;
mod table;

pub use action::{ActionRef, BuiltinAction, FunctionId, BUILTIN_ID_BASE};
pub use condition::{ConditionKind, Polarity};
pub use config::InterpreterConfig;
pub use context::{Annotations, DecisionContext, Flags, SearchState};
pub use error::{Diagnostic, LoadError};
pub use evaluation_report::{EvaluationReport, TraceStep};
pub use function::FunctionDef;
pub use instruction::Instruction;
pub use lists::{ListEngine, ListHandle, ListMatch, ListType, MemoryList, MemoryLists};
pub use request::RequestHead;
pub use services::{MessageTable, NoReverseLookup, ReverseResolver, Translator};
pub use table::{FunctionTable, HotFunctionTable};
