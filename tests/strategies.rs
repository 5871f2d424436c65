use std::sync::Arc;

use proptest::prelude::*;
use storyboard::{DecisionContext, FunctionTable, ListType, Loader, MemoryLists, RequestHead};

// --- Fixed list schema ---
// banned   : site   {bad.example}
// ips      : ipsite {10.9.9.9}
// urls     : url    {good.example/private}
// words    : search {poker}
// agents   : regexpbool {sqlmap}
// staff    : ip     {192.168.1.10}

const HOSTS: &[&str] = &[
    "bad.example",
    "www.bad.example",
    "good.example",
    "10.9.9.9",
    "10.1.1.1",
];
const PATHS: &[&str] = &["", "private/x", "r?u=http://bad.example/", "dl/setup.exe"];
const METHODS: &[&str] = &["GET", "POST", "CONNECT"];
const AGENTS: &[&str] = &["curl/8.0", "sqlmap/1.7", ""];
const CLIENTS: &[&str] = &["192.168.1.10", "192.168.1.11"];

/// Conditions paired with a list name that resolves for them.
const CONDITIONS: &[(&str, &str)] = &[
    ("sitein", "banned"),
    ("sitein", "ips"),
    ("urlin", "urls"),
    ("urlin", "banned"),
    ("embeddedin", "banned"),
    ("searchin", "words"),
    ("useragentin", "agents"),
    ("clientin", "staff"),
    ("connect", ""),
    ("get", ""),
    ("post", ""),
    ("tls", ""),
    ("siteisip", ""),
    ("greyset", ""),
    ("blockset", ""),
    ("returnset", ""),
    ("viruscheckset", ""),
    ("true", ""),
];

const ACTIONS: &[&str] = &[
    "setgrey",
    "setblock",
    "setexception",
    "setdone",
    "setnolog",
    "unsetviruscheck",
    "settrue",
    "setfalse",
    "setgomitm",
];

pub fn lists() -> MemoryLists {
    MemoryLists::new()
        .list("banned", ListType::Site, ["bad.example"])
        .list("ips", ListType::IpSite, ["10.9.9.9"])
        .list("urls", ListType::Url, ["good.example/private"])
        .list("words", ListType::Search, ["poker"])
        .list("agents", ListType::RegexpBool, ["sqlmap"])
        .list("staff", ListType::Ip, ["192.168.1.10"])
}

pub fn load(source: &str) -> FunctionTable {
    Loader::new(Arc::new(lists()))
        .load_source("generated.story", source)
        .unwrap()
}

/// Generate a request context over the fixed schema.
pub fn arb_context() -> impl Strategy<Value = DecisionContext> {
    (
        prop::sample::select(HOSTS),
        prop::sample::select(PATHS),
        prop::sample::select(METHODS),
        prop::sample::select(AGENTS),
        prop::sample::select(CLIENTS),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(host, path, method, agent, client, tls, search)| {
            let mut head = RequestHead::new(method, &format!("http://{host}/{path}"));
            if !agent.is_empty() {
                head = head.header(&format!("User-Agent: {agent}"));
            }
            let ctx = DecisionContext::new(head)
                .client(client, "")
                .tls(tls, tls);
            if search {
                ctx.search_terms("texas+poker")
            } else {
                ctx
            }
        })
}

/// A condition name and the list it checks (empty for flag conditions).
pub fn arb_condition() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop::sample::select(CONDITIONS)
}

/// A generated instruction line.
#[derive(Debug, Clone)]
pub struct GenLine {
    pub negate: bool,
    pub condition: &'static str,
    pub list: &'static str,
    pub action: &'static str,
    pub early_return: bool,
}

impl GenLine {
    fn render(&self) -> String {
        format!(
            "{}({}, {}) {}{}",
            if self.negate { "ifnot" } else { "if" },
            self.condition,
            self.list,
            if self.early_return { "return " } else { "" },
            self.action,
        )
    }
}

fn arb_line() -> impl Strategy<Value = GenLine> {
    (
        any::<bool>(),
        arb_condition(),
        prop::sample::select(ACTIONS),
        prop::bool::weighted(0.2),
    )
        .prop_map(|(negate, (condition, list), action, early_return)| GenLine {
            negate,
            condition,
            list,
            action,
            early_return,
        })
}

/// A generated script: a `start` function that may call a `helper`.
#[derive(Debug, Clone)]
pub struct GenScript {
    pub start: Vec<GenLine>,
    pub helper: Vec<GenLine>,
    pub call_helper: bool,
}

impl GenScript {
    pub fn source(&self) -> String {
        let mut out = String::from("function(start)\n");
        for line in &self.start {
            out.push_str(&line.render());
            out.push('\n');
        }
        if self.call_helper {
            out.push_str("if(true) helper\n");
        }
        out.push_str("end\nfunction(helper)\n");
        for line in &self.helper {
            out.push_str(&line.render());
            out.push('\n');
        }
        out.push_str("end\n");
        out
    }
}

pub fn arb_script() -> impl Strategy<Value = GenScript> {
    (
        prop::collection::vec(arb_line(), 0..6),
        prop::collection::vec(arb_line(), 0..4),
        any::<bool>(),
    )
        .prop_map(|(start, helper, call_helper)| GenScript {
            start,
            helper,
            call_helper,
        })
}
