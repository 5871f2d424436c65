use std::fmt;

use regex::{Regex, RegexBuilder};

/// Kinds of list the matching engine stores.
///
/// The list type decides which form of a target string is compared: site-style
/// lists see the host, regular-expression lists see the full string, and every
/// other type sees the base (protocol-stripped) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListType {
    Ip,
    IpSite,
    Site,
    Url,
    Search,
    RegexpBool,
    RegexpRep,
    FileExt,
    Mime,
}

impl ListType {
    /// Lists compared against the host part of a target.
    #[must_use]
    pub fn is_site_style(self) -> bool {
        matches!(self, ListType::Site | ListType::IpSite)
    }

    /// Lists compared against the full, unmodified target.
    #[must_use]
    pub fn is_regexp(self) -> bool {
        matches!(self, ListType::RegexpBool | ListType::RegexpRep)
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListType::Ip => "ip",
            ListType::IpSite => "ipsite",
            ListType::Site => "site",
            ListType::Url => "url",
            ListType::Search => "search",
            ListType::RegexpBool => "regexpbool",
            ListType::RegexpRep => "regexprep",
            ListType::FileExt => "fileext",
            ListType::Mime => "mime",
        };
        f.write_str(name)
    }
}

/// Opaque reference to a named, typed list owned by a [`ListEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListHandle {
    id: u64,
    name: String,
    list_type: ListType,
}

impl ListHandle {
    pub fn new(id: u64, name: impl Into<String>, list_type: ListType) -> Self {
        Self {
            id,
            name: name.into(),
            list_type,
        }
    }

    /// Engine-specific identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn list_type(&self) -> ListType {
        self.list_type
    }
}

/// What a successful list lookup reports back.
///
/// `payload` is opaque to the interpreter; rewrite-style actions read it as the
/// replacement URL, header or redirect target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListMatch {
    pub category: String,
    pub message_id: u32,
    pub log_message_id: u32,
    pub matched: String,
    pub payload: String,
}

/// The list-matching subsystem, consumed at link time and at evaluation time.
///
/// Implementations must treat their own failures as "no match": the
/// interpreter always completes.
pub trait ListEngine: Send + Sync {
    /// Find the list called `name` with the given type.
    fn find_list(&self, name: &str, list_type: ListType) -> Option<ListHandle>;

    /// Check `candidate` against a list previously returned by [`find_list`](Self::find_list).
    fn lookup(&self, list: &ListHandle, candidate: &str) -> Option<ListMatch>;
}

/// A small in-memory [`ListEngine`].
///
/// Site-style lists match the exact host or any subdomain of it, URL lists
/// match by prefix, IP, extension and MIME lists match exactly, and search
/// lists match by substring. Regexp entries are compiled as regular
/// expressions; a `RegexpRep` match reports the candidate with the entry's
/// payload substituted as its payload. All comparisons are case-insensitive.
///
/// # Example
///
/// ```
/// use storyboard::{ListEngine, ListType, MemoryLists};
///
/// let lists = MemoryLists::new()
///     .list("banned", ListType::Site, ["bad.example"])
///     .with_list("rewrites", ListType::RegexpRep, |l| {
///         l.entry_with_payload("http://old.example", "http://new.example")
///     });
///
/// let banned = lists.find_list("banned", ListType::Site).unwrap();
/// assert!(lists.lookup(&banned, "www.bad.example").is_some());
/// assert!(lists.find_list("banned", ListType::Url).is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemoryLists {
    lists: Vec<MemoryList>,
}

/// One list inside [`MemoryLists`], configured through
/// [`MemoryLists::with_list`].
#[derive(Debug, Clone)]
pub struct MemoryList {
    name: String,
    list_type: ListType,
    category: String,
    message_id: u32,
    log_message_id: u32,
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    pattern: String,
    payload: String,
    regex: Option<Regex>,
}

impl MemoryList {
    fn new(name: &str, list_type: ListType) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            list_type,
            category: name.to_owned(),
            message_id: 0,
            log_message_id: 0,
            entries: Vec::new(),
        }
    }

    /// Add a pattern. A regexp pattern that does not compile is skipped.
    #[must_use]
    pub fn entry(self, pattern: &str) -> Self {
        self.entry_with_payload(pattern, "")
    }

    /// Add a pattern carrying a payload (replacement text for `RegexpRep`).
    #[must_use]
    pub fn entry_with_payload(mut self, pattern: &str, payload: &str) -> Self {
        let regex = if self.list_type.is_regexp() {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(
                        list = %self.name,
                        pattern,
                        error = %e,
                        "skipping invalid regexp entry"
                    );
                    return self;
                }
            }
        } else {
            None
        };
        self.entries.push(Entry {
            pattern: if regex.is_some() {
                pattern.to_owned()
            } else {
                pattern.to_ascii_lowercase()
            },
            payload: payload.to_owned(),
            regex,
        });
        self
    }

    /// Category reported on a match. Defaults to the list name.
    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    #[must_use]
    pub fn message(mut self, message_id: u32) -> Self {
        self.message_id = message_id;
        self
    }

    #[must_use]
    pub fn log_message(mut self, log_message_id: u32) -> Self {
        self.log_message_id = log_message_id;
        self
    }

    /// First matching entry and the payload to report for it.
    fn find(&self, candidate: &str) -> Option<(&Entry, String)> {
        let lowered = candidate.to_ascii_lowercase();
        self.entries.iter().find_map(|entry| match &entry.regex {
            Some(regex) if !regex.is_match(candidate) => None,
            Some(regex) if self.list_type == ListType::RegexpRep => Some((
                entry,
                regex.replace(candidate, entry.payload.as_str()).into_owned(),
            )),
            Some(_) => Some((entry, entry.payload.clone())),
            None => plain_match(self.list_type, &entry.pattern, &lowered)
                .then(|| (entry, entry.payload.clone())),
        })
    }
}

fn plain_match(list_type: ListType, pattern: &str, candidate: &str) -> bool {
    match list_type {
        ListType::Site | ListType::IpSite => candidate
            .strip_suffix(pattern)
            .is_some_and(|rest| rest.is_empty() || rest.ends_with('.')),
        ListType::Url => candidate.starts_with(pattern),
        ListType::Ip | ListType::FileExt | ListType::Mime => candidate == pattern,
        ListType::Search => candidate.contains(pattern),
        // regexp entries always carry a compiled pattern
        ListType::RegexpBool | ListType::RegexpRep => false,
    }
}

impl MemoryLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a list with plain entries.
    #[must_use]
    pub fn list<I, S>(self, name: &str, list_type: ListType, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_list(name, list_type, |mut l| {
            for e in entries {
                l = l.entry(e.as_ref());
            }
            l
        })
    }

    /// Add a list configured by a closure.
    #[must_use]
    pub fn with_list(
        mut self,
        name: &str,
        list_type: ListType,
        f: impl FnOnce(MemoryList) -> MemoryList,
    ) -> Self {
        self.lists.push(f(MemoryList::new(name, list_type)));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl ListEngine for MemoryLists {
    fn find_list(&self, name: &str, list_type: ListType) -> Option<ListHandle> {
        self.lists
            .iter()
            .enumerate()
            .find(|(_, l)| l.list_type == list_type && l.name.eq_ignore_ascii_case(name))
            .map(|(idx, l)| ListHandle::new(idx as u64, &l.name, l.list_type))
    }

    fn lookup(&self, list: &ListHandle, candidate: &str) -> Option<ListMatch> {
        let idx = usize::try_from(list.id()).ok()?;
        let stored = self.lists.get(idx)?;
        let (entry, payload) = stored.find(candidate)?;
        Some(ListMatch {
            category: stored.category.clone(),
            message_id: stored.message_id,
            log_message_id: stored.log_message_id,
            matched: entry.pattern.clone(),
            payload,
        })
    }
}
