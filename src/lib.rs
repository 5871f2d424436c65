pub mod derive;
#[cfg(feature = "reverse-dns")]
pub mod dns;
mod evaluate;
mod load;
pub mod parse;
mod types;
pub mod url;

pub use evaluate::{Interpreter, TRACE_TARGET};
pub use load::{Loader, MAX_INCLUDE_DEPTH};
pub use types::{
    ActionRef, Annotations, BuiltinAction, ConditionKind, DecisionContext, Diagnostic,
    EvaluationReport, Flags, FunctionDef, FunctionId, FunctionTable, HotFunctionTable,
    Instruction, InterpreterConfig, ListEngine, ListHandle, ListMatch, ListType, LoadError,
    MemoryList, MemoryLists, MessageTable, NoReverseLookup, Polarity, RequestHead,
    ReverseResolver, SearchState, TraceStep, Translator, BUILTIN_ID_BASE,
};
