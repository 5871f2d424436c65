use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::action::{BuiltinAction, FunctionId};
use super::error::{Diagnostic, LoadError};
use super::function::FunctionDef;
use super::lists::ListEngine;
use crate::load::Loader;

/// A loaded script: every function, a name index and the entry points.
///
/// Immutable once built and shared behind `Arc` by every in-flight request.
/// Lists referenced by instructions were resolved against `lists`, which the
/// interpreter then uses for lookups.
pub struct FunctionTable {
    pub(crate) functions: Vec<FunctionDef>,
    pub(crate) names: HashMap<String, FunctionId>,
    pub(crate) entries: Vec<Option<FunctionId>>,
    pub(crate) lists: Arc<dyn ListEngine>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl FunctionTable {
    pub(crate) fn new(lists: Arc<dyn ListEngine>) -> Self {
        Self {
            functions: Vec::new(),
            names: HashMap::new(),
            entries: Vec::new(),
            lists,
            diagnostics: Vec::new(),
        }
    }

    /// Id of the user function called `name`, ignoring ASCII case.
    #[must_use]
    pub fn function_id(&self, name: &str) -> Option<FunctionId> {
        self.names.get(&name.to_ascii_lowercase()).copied()
    }

    /// Id to start evaluation at for a named hook. Built-in action names
    /// are not entry points.
    #[must_use]
    pub fn resolve_entry_point(&self, name: &str) -> Option<FunctionId> {
        if BuiltinAction::from_name(name).is_some() {
            return None;
        }
        self.function_id(name)
    }

    /// Bind entry slot `index` to the function called `name`.
    ///
    /// Returns `false` (and leaves the slot unset) if no such function exists.
    pub fn set_entry(&mut self, index: usize, name: &str) -> bool {
        let id = self.resolve_entry_point(name);
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = id;
        id.is_some()
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<FunctionId> {
        self.entries.get(index).copied().flatten()
    }

    #[must_use]
    pub fn get(&self, id: FunctionId) -> Option<&FunctionDef> {
        self.functions.get(id.index())
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.functions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Unresolved list and action names found while linking.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn lists(&self) -> &Arc<dyn ListEngine> {
        &self.lists
    }

    /// Bind every entry slot that is bound in `previous` to the function of
    /// the same name here.
    pub(crate) fn rebind_entries(&mut self, previous: &FunctionTable) {
        for (index, id) in previous.entries.iter().enumerate() {
            let Some(name) = id.and_then(|id| previous.get(id)).map(|f| f.name.as_str()) else {
                continue;
            };
            if !self.set_entry(index, name) {
                tracing::warn!(index, function = name, "entry point missing after reload");
            }
        }
    }

    /// Define a function or replace the body of an existing one, keeping
    /// its id.
    pub(crate) fn commit(&mut self, function: FunctionDef) {
        let index = function.id.index();
        if index < self.functions.len() {
            self.functions[index] = function;
        } else {
            self.names.insert(function.name.clone(), function.id);
            self.functions.push(function);
        }
    }

    /// Id for the next new function.
    pub(crate) fn next_id(&self) -> Option<FunctionId> {
        FunctionId::from_index(self.functions.len())
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.functions)
            .field("entries", &self.entries)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionTable({} functions, {} instructions, {} entry points)",
            self.functions.len(),
            self.functions.iter().map(FunctionDef::len).sum::<usize>(),
            self.entries.iter().flatten().count(),
        )
    }
}

/// A [`FunctionTable`] that can be replaced while requests are running.
///
/// Readers take a [`snapshot`](Self::snapshot) per request; a reload builds
/// the new table off to the side and publishes it in one atomic swap.
/// Requests already holding the old snapshot finish against it.
pub struct HotFunctionTable {
    current: ArcSwap<FunctionTable>,
}

impl HotFunctionTable {
    #[must_use]
    pub fn new(table: FunctionTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<FunctionTable> {
        self.current.load_full()
    }

    pub fn update(&self, table: FunctionTable) {
        self.current.store(Arc::new(table));
    }

    /// Load `path` with `loader` and publish the result.
    ///
    /// Entry slots bound on the live table are bound again, by function
    /// name, on the new one. A slot whose function is gone stays unset.
    ///
    /// # Errors
    ///
    /// Returns the load error; the live table is left untouched.
    pub fn reload(&self, loader: &Loader, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let mut table = loader.load(path)?;
        table.rebind_entries(&self.current.load());
        tracing::debug!(%table, "publishing reloaded storyboard");
        self.update(table);
        Ok(())
    }
}

impl fmt::Debug for HotFunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HotFunctionTable")
            .field(&self.current.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryLists;

    fn table_with(names: &[&str]) -> FunctionTable {
        let mut table = FunctionTable::new(Arc::new(MemoryLists::new()));
        for name in names {
            let id = table.next_id().unwrap();
            table.commit(FunctionDef::new(name, id, Arc::from("test"), 1));
        }
        table
    }

    #[test]
    fn ids_are_one_based_and_stable() {
        let table = table_with(&["checkrequest", "checkresponse"]);
        assert_eq!(table.function_id("checkrequest").map(FunctionId::get), Some(1));
        assert_eq!(table.function_id("CheckResponse").map(FunctionId::get), Some(2));
        assert_eq!(table.function_id("missing"), None);
    }

    #[test]
    fn commit_with_existing_id_replaces_in_place() {
        let mut table = table_with(&["a", "b"]);
        let id = table.function_id("a").unwrap();
        table.commit(FunctionDef::new("a", id, Arc::from("other"), 9));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(id).unwrap().line, 9);
        assert_eq!(&*table.get(id).unwrap().file, "other");
    }

    #[test]
    fn entry_points() {
        let mut table = table_with(&["checkrequest"]);
        assert!(table.set_entry(2, "checkrequest"));
        assert_eq!(table.entry(2).map(FunctionId::get), Some(1));
        assert_eq!(table.entry(0), None);
        assert_eq!(table.entry(99), None);
        assert!(!table.set_entry(1, "nothere"));
        assert_eq!(table.entry(1), None);
    }

    #[test]
    fn builtins_are_not_entry_points() {
        let table = table_with(&["checkrequest"]);
        assert_eq!(table.resolve_entry_point("setblock"), None);
    }

    #[test]
    fn display() {
        let mut table = table_with(&["a"]);
        table.set_entry(0, "a");
        assert_eq!(
            table.to_string(),
            "FunctionTable(1 functions, 0 instructions, 1 entry points)"
        );
    }

    #[test]
    fn rebind_entries_by_name() {
        let mut live = table_with(&["checkrequest", "checkresponse"]);
        live.set_entry(0, "checkresponse");
        live.set_entry(3, "checkrequest");

        let mut next = table_with(&["checkrequest", "other"]);
        next.rebind_entries(&live);
        assert_eq!(next.entry(3), next.function_id("checkrequest"));
        assert_eq!(next.entry(0), None);
        assert_eq!(next.entry(1), None);
    }

    #[test]
    fn hot_table_swaps_atomically() {
        let hot = HotFunctionTable::new(table_with(&["old"]));
        let before = hot.snapshot();
        hot.update(table_with(&["new1", "new2"]));
        assert_eq!(before.len(), 1);
        assert_eq!(hot.snapshot().len(), 2);
    }
}
