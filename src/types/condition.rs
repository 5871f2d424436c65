use std::fmt;

use super::lists::ListType;

/// The closed set of checks an instruction can perform.
///
/// The first group compares request-derived strings against lists; the second
/// reads a flag already present on the decision context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    SiteIn,
    UrlIn,
    FullUrlIn,
    SearchIn,
    EmbeddedIn,
    RefererIn,
    HeaderIn,
    ClientIn,
    UserAgentIn,
    ExtensionIn,
    MimeIn,
    Connect,
    Get,
    Post,
    ExceptionSet,
    GreySet,
    BlockSet,
    MitmSet,
    DoneSet,
    ReturnSet,
    RedirectSet,
    VirusCheckSet,
    BypassSet,
    HasSni,
    Tls,
    SiteIsIp,
    True,
}

/// Script spellings, canonical name first.
const NAMES: &[(&str, ConditionKind)] = &[
    ("sitein", ConditionKind::SiteIn),
    ("siteset", ConditionKind::SiteIn),
    ("urlin", ConditionKind::UrlIn),
    ("fullurlin", ConditionKind::FullUrlIn),
    ("searchin", ConditionKind::SearchIn),
    ("embeddedin", ConditionKind::EmbeddedIn),
    ("refererin", ConditionKind::RefererIn),
    ("headerin", ConditionKind::HeaderIn),
    ("clientin", ConditionKind::ClientIn),
    ("useragentin", ConditionKind::UserAgentIn),
    ("extensionin", ConditionKind::ExtensionIn),
    ("mimein", ConditionKind::MimeIn),
    ("connect", ConditionKind::Connect),
    ("get", ConditionKind::Get),
    ("post", ConditionKind::Post),
    ("exceptionset", ConditionKind::ExceptionSet),
    ("greyset", ConditionKind::GreySet),
    ("blockset", ConditionKind::BlockSet),
    ("mitmset", ConditionKind::MitmSet),
    ("doneset", ConditionKind::DoneSet),
    ("returnset", ConditionKind::ReturnSet),
    ("redirectset", ConditionKind::RedirectSet),
    ("viruscheckset", ConditionKind::VirusCheckSet),
    ("bypassset", ConditionKind::BypassSet),
    ("hassniset", ConditionKind::HasSni),
    ("hassni", ConditionKind::HasSni),
    ("tls", ConditionKind::Tls),
    ("siteisip", ConditionKind::SiteIsIp),
    ("true", ConditionKind::True),
];

impl ConditionKind {
    /// Look up a condition by its script name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }

    /// Canonical script name.
    #[must_use]
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("unknown", |(n, _)| *n)
    }

    /// List types a list name attached to this condition may resolve to, in
    /// lookup order. Empty for flag conditions.
    #[must_use]
    pub fn accepted_list_types(self) -> &'static [ListType] {
        use ListType::{FileExt, Ip, IpSite, Mime, RegexpBool, RegexpRep, Search, Site, Url};
        match self {
            ConditionKind::SiteIn => &[IpSite, Site, RegexpBool],
            ConditionKind::UrlIn
            | ConditionKind::EmbeddedIn
            | ConditionKind::RefererIn => &[IpSite, Site, Url, RegexpBool],
            ConditionKind::FullUrlIn => &[RegexpRep],
            ConditionKind::SearchIn => &[Search],
            ConditionKind::HeaderIn => &[RegexpRep, RegexpBool],
            ConditionKind::ClientIn => &[Ip, Site],
            ConditionKind::UserAgentIn => &[RegexpBool],
            ConditionKind::ExtensionIn => &[FileExt],
            ConditionKind::MimeIn => &[Mime],
            _ => &[],
        }
    }

    /// Whether this condition compares targets against lists.
    #[must_use]
    pub fn is_list_check(self) -> bool {
        !self.accepted_list_types().is_empty()
    }

    /// Whether a reverse-resolved hostname is checked, ahead of the usual
    /// targets, when the request host is an IP literal.
    #[must_use]
    pub(crate) fn uses_reverse_hosts(self) -> bool {
        matches!(
            self,
            ConditionKind::SiteIn
                | ConditionKind::UrlIn
                | ConditionKind::FullUrlIn
                | ConditionKind::EmbeddedIn
                | ConditionKind::RefererIn
        )
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether an instruction fires on a match (`if`) or on its absence (`ifnot`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    If,
    IfNot,
}

impl Polarity {
    #[must_use]
    pub fn apply(self, raw: bool) -> bool {
        match self {
            Polarity::If => raw,
            Polarity::IfNot => !raw,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::If => f.write_str("if"),
            Polarity::IfNot => f.write_str("ifnot"),
        }
    }
}
