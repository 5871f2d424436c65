use std::fmt;
use std::num::NonZeroU32;

/// Built-in action ids start above this value; user function ids stay below it.
pub const BUILTIN_ID_BASE: u32 = 5000;

/// Identifier of a user-defined function. One-based and stable for the
/// lifetime of a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(NonZeroU32);

impl FunctionId {
    /// Wrap a raw id. Returns `None` for 0 and for ids in the built-in range.
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        if id > BUILTIN_ID_BASE {
            return None;
        }
        NonZeroU32::new(id).map(Self)
    }

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index + 1).ok().and_then(Self::new)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub(crate) fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed mutation routines over the decision context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAction {
    SetException,
    SetGrey,
    SetBlock,
    SetModUrl,
    SetLogCategory,
    SetRedirect,
    SetGoMitm,
    SetAddHeader,
    SetModHeader,
    SetNoCheckCert,
    SetSearchTerm,
    SetGoDirect,
    SetDone,
    SetNoLog,
    UnsetVirusCheck,
    UnsetBypass,
    SetTrue,
    SetFalse,
}

const BUILTINS: &[(&str, BuiltinAction)] = &[
    ("setexception", BuiltinAction::SetException),
    ("setgrey", BuiltinAction::SetGrey),
    ("setblock", BuiltinAction::SetBlock),
    ("setmodurl", BuiltinAction::SetModUrl),
    ("setlogcategory", BuiltinAction::SetLogCategory),
    ("setredirect", BuiltinAction::SetRedirect),
    ("setgomitm", BuiltinAction::SetGoMitm),
    ("setaddheader", BuiltinAction::SetAddHeader),
    ("setmodheader", BuiltinAction::SetModHeader),
    ("setnocheckcert", BuiltinAction::SetNoCheckCert),
    ("setsearchterm", BuiltinAction::SetSearchTerm),
    ("setgodirect", BuiltinAction::SetGoDirect),
    ("setdone", BuiltinAction::SetDone),
    ("setnolog", BuiltinAction::SetNoLog),
    ("unsetviruscheck", BuiltinAction::UnsetVirusCheck),
    ("unsetbypass", BuiltinAction::UnsetBypass),
    ("settrue", BuiltinAction::SetTrue),
    ("setfalse", BuiltinAction::SetFalse),
];

impl BuiltinAction {
    /// Look up a built-in by its script name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, a)| *a)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        BUILTINS[self.ordinal()].0
    }

    /// Numeric id in the built-in range, disjoint from user function ids.
    #[must_use]
    pub fn id(self) -> u32 {
        BUILTIN_ID_BASE + 1 + self.ordinal() as u32
    }

    fn ordinal(self) -> usize {
        BUILTINS
            .iter()
            .position(|(_, a)| *a == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an instruction does when its condition holds.
///
/// Parsing leaves every action `Unresolved`; linking replaces the raw name
/// with a built-in or a function id where one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRef {
    Unresolved(String),
    Builtin(BuiltinAction),
    Function(FunctionId),
}

impl ActionRef {
    /// Numeric form: built-in ids, user ids, or 0 when unresolved.
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            ActionRef::Unresolved(_) => 0,
            ActionRef::Builtin(b) => b.id(),
            ActionRef::Function(id) => id.get(),
        }
    }
}
