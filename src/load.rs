use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::parse::{parse_line, InstructionLine, ScriptLine};
use crate::types::{
    ActionRef, BuiltinAction, ConditionKind, Diagnostic, FunctionDef, FunctionTable, Instruction,
    ListEngine, LoadError, Polarity,
};

/// Deepest chain of `.include` files accepted.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Reads storyboard scripts into a [`FunctionTable`].
///
/// Loading is two passes. The first reads every line of the top file and
/// its inclusions, building functions. The second resolves list names
/// against the list engine and action names against the built-ins and the
/// functions now known, so a function may call one defined further down.
///
/// ```
/// use std::sync::Arc;
/// use storyboard::{ListType, Loader, MemoryLists};
///
/// let lists = MemoryLists::new().list("bannedsite", ListType::Site, ["bad.example"]);
/// let table = Loader::new(Arc::new(lists))
///     .load_source("inline", "function(checkrequest)\nif(sitein, bannedsite) return setblock\n")
///     .unwrap();
/// assert!(table.resolve_entry_point("checkrequest").is_some());
/// assert!(table.diagnostics().is_empty());
/// ```
#[derive(Clone)]
pub struct Loader {
    lists: Arc<dyn ListEngine>,
    strict: bool,
}

/// A function whose `end` has not been seen yet.
struct OpenFunction {
    name: String,
    file: Arc<str>,
    line: usize,
    instructions: Vec<Instruction>,
}

impl Loader {
    #[must_use]
    pub fn new(lists: Arc<dyn ListEngine>) -> Self {
        Self {
            lists,
            strict: false,
        }
    }

    /// Treat unresolved list and action names as fatal.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load the script at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] on I/O failure, malformed lines, reserved or
    /// unknown names, over-deep inclusion, or (in strict mode) unresolved
    /// references.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<FunctionTable, LoadError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(LoadError::EmptyPath {
                name: path.display().to_string(),
            });
        }
        let mut table = FunctionTable::new(Arc::clone(&self.lists));
        self.read_file(&mut table, path, 0)?;
        self.finish(table)
    }

    /// Load a script held in memory. `name` labels it in errors; relative
    /// inclusions resolve against the working directory.
    ///
    /// # Errors
    ///
    /// As for [`load`](Self::load).
    pub fn load_source(&self, name: &str, text: &str) -> Result<FunctionTable, LoadError> {
        let mut table = FunctionTable::new(Arc::clone(&self.lists));
        self.read_lines(&mut table, Arc::from(name), None, text, 0)?;
        self.finish(table)
    }

    fn finish(&self, mut table: FunctionTable) -> Result<FunctionTable, LoadError> {
        self.link(&mut table);
        if self.strict && !table.diagnostics.is_empty() {
            return Err(LoadError::Unresolved {
                diagnostics: std::mem::take(&mut table.diagnostics),
            });
        }
        tracing::debug!(%table, "storyboard loaded");
        Ok(table)
    }

    fn read_file(
        &self,
        table: &mut FunctionTable,
        path: &Path,
        depth: usize,
    ) -> Result<(), LoadError> {
        tracing::debug!(path = %path.display(), depth, "reading storyboard file");
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: Arc<str> = Arc::from(path.display().to_string());
        self.read_lines(table, file, path.parent(), &text, depth)
    }

    fn read_lines(
        &self,
        table: &mut FunctionTable,
        file: Arc<str>,
        dir: Option<&Path>,
        text: &str,
        depth: usize,
    ) -> Result<(), LoadError> {
        let mut open: Option<OpenFunction> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let parsed = parse_line(raw).map_err(|source| LoadError::Syntax {
                source,
                line,
                file: Arc::clone(&file),
            })?;

            match parsed {
                ScriptLine::Blank => {}
                ScriptLine::Include(target) => {
                    let path = resolve_include(dir, &target);
                    if depth + 1 > MAX_INCLUDE_DEPTH {
                        return Err(LoadError::IncludeDepth { path });
                    }
                    self.read_file(table, &path, depth + 1)?;
                }
                ScriptLine::Function(name) => {
                    if let Some(previous) = open.take() {
                        commit(table, previous)?;
                    }
                    if BuiltinAction::from_name(&name).is_some() {
                        return Err(LoadError::ReservedName {
                            name,
                            line,
                            file: Arc::clone(&file),
                        });
                    }
                    open = Some(OpenFunction {
                        name,
                        file: Arc::clone(&file),
                        line,
                        instructions: Vec::new(),
                    });
                }
                ScriptLine::End => {
                    if let Some(function) = open.take() {
                        commit(table, function)?;
                    }
                }
                ScriptLine::Instruction(parsed) => {
                    let instruction = build_instruction(&parsed, line, &file)?;
                    let Some(function) = open.as_mut() else {
                        return Err(LoadError::OutsideFunction {
                            line,
                            file: Arc::clone(&file),
                        });
                    };
                    function.instructions.push(instruction);
                }
            }
        }

        if let Some(function) = open {
            commit(table, function)?;
        }
        Ok(())
    }

    /// Resolve list handles and action references on every instruction.
    fn link(&self, table: &mut FunctionTable) {
        let FunctionTable {
            functions,
            names,
            lists,
            diagnostics,
            ..
        } = table;

        for instruction in functions.iter_mut().flat_map(|f| f.instructions.iter_mut()) {
            if instruction.condition.is_list_check() {
                let name = instruction.list_name.as_deref().unwrap_or_default();
                if !name.is_empty() {
                    instruction.lists = instruction
                        .condition
                        .accepted_list_types()
                        .iter()
                        .filter_map(|&list_type| lists.find_list(name, list_type))
                        .collect();
                }
                if instruction.lists.is_empty() {
                    diagnostics.push(Diagnostic::UndefinedList {
                        list: name.to_owned(),
                        line: instruction.line,
                        file: Arc::clone(&instruction.file),
                    });
                }
            }

            if let ActionRef::Unresolved(name) = &instruction.action {
                if name.is_empty() {
                    continue;
                }
                if let Some(builtin) = BuiltinAction::from_name(name) {
                    instruction.action = ActionRef::Builtin(builtin);
                } else if let Some(&id) = names.get(name) {
                    instruction.action = ActionRef::Function(id);
                } else {
                    diagnostics.push(Diagnostic::UndefinedAction {
                        action: name.clone(),
                        line: instruction.line,
                        file: Arc::clone(&instruction.file),
                    });
                }
            }
        }

        for diagnostic in diagnostics.iter() {
            tracing::warn!(%diagnostic, "storyboard reference not resolved");
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

fn resolve_include(dir: Option<&Path>, target: &str) -> PathBuf {
    let target = Path::new(target);
    match dir {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target.to_path_buf(),
    }
}

/// Add `function` to the table. A name already present keeps its id and
/// has its body replaced.
fn commit(table: &mut FunctionTable, function: OpenFunction) -> Result<(), LoadError> {
    let id = match table.function_id(&function.name) {
        Some(id) => {
            tracing::debug!(name = %function.name, %id, "redefining storyboard function");
            id
        }
        None => table.next_id().ok_or_else(|| LoadError::TooManyFunctions {
            line: function.line,
            file: Arc::clone(&function.file),
        })?,
    };
    let mut def = FunctionDef::new(&function.name, id, function.file, function.line);
    def.instructions = function.instructions;
    table.commit(def);
    Ok(())
}

fn build_instruction(
    parsed: &InstructionLine,
    line: usize,
    file: &Arc<str>,
) -> Result<Instruction, LoadError> {
    let polarity = match parsed.command.as_str() {
        "if" => Polarity::If,
        "ifnot" => Polarity::IfNot,
        _ => {
            return Err(LoadError::InvalidCommand {
                command: parsed.command.clone(),
                line,
                file: Arc::clone(file),
            })
        }
    };

    let condition_name = parsed.param(0);
    let condition =
        ConditionKind::from_name(condition_name).ok_or_else(|| LoadError::UnknownCondition {
            name: condition_name.to_owned(),
            line,
            file: Arc::clone(file),
        })?;

    let list_name = Some(parsed.param(1))
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    Ok(Instruction {
        condition,
        polarity,
        list_name,
        lists: Vec::new(),
        message_id: message_number(parsed.param(2), line, file)?,
        log_message_id: message_number(parsed.param(3), line, file)?,
        action: ActionRef::Unresolved(parsed.action.clone()),
        return_after_action: parsed.return_after_action,
        return_after_action_is_true: false,
        line,
        file: Arc::clone(file),
    })
}

fn message_number(value: &str, line: usize, file: &Arc<str>) -> Result<u32, LoadError> {
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| LoadError::InvalidNumber {
        value: value.to_owned(),
        line,
        file: Arc::clone(file),
    })
}
