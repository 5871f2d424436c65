use std::sync::Arc;
use std::time::Instant;

use crate::derive::UrlRecord;
use crate::types::{
    ActionRef, BuiltinAction, ConditionKind, DecisionContext, EvaluationReport, FunctionDef,
    FunctionId, FunctionTable, Instruction, InterpreterConfig, ListHandle, ListMatch, ListType,
    MessageTable, NoReverseLookup, Polarity, ReverseResolver, TraceStep, Translator,
};
use crate::url;

/// Trace events go to this target so they can be filtered on their own.
pub const TRACE_TARGET: &str = "storyboard::trace";

/// Runs functions from a [`FunctionTable`] against a [`DecisionContext`].
///
/// The interpreter holds no per-request state; one instance serves every
/// thread. All mutation happens on the context passed to each run.
#[derive(Clone)]
pub struct Interpreter {
    config: InterpreterConfig,
    translator: Arc<dyn Translator>,
    resolver: Arc<dyn ReverseResolver>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl Interpreter {
    #[must_use]
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            translator: Arc::new(MessageTable::new()),
            resolver: Arc::new(NoReverseLookup),
        }
    }

    /// Message table used to compose reasons.
    #[must_use]
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Resolver for IP-literal hosts. Only consulted when
    /// [`InterpreterConfig::reverse_lookups`] is set.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ReverseResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Run function `id` and return its result. An id not in `table` yields
    /// `false`.
    pub fn run(&self, table: &FunctionTable, id: FunctionId, ctx: &mut DecisionContext) -> bool {
        Run::new(self, table, false).call(id, ctx, 1)
    }

    /// Run the function bound to entry slot `index`; `false` if the slot is
    /// unset.
    pub fn run_entry(&self, table: &FunctionTable, index: usize, ctx: &mut DecisionContext) -> bool {
        table
            .entry(index)
            .is_some_and(|id| self.run(table, id, ctx))
    }

    /// Run the function called `name`; `false` if there is none.
    pub fn run_named(&self, table: &FunctionTable, name: &str, ctx: &mut DecisionContext) -> bool {
        table
            .resolve_entry_point(name)
            .is_some_and(|id| self.run(table, id, ctx))
    }

    /// Like [`run`](Self::run), also collecting every trace step.
    pub fn run_detailed(
        &self,
        table: &FunctionTable,
        id: FunctionId,
        ctx: &mut DecisionContext,
    ) -> EvaluationReport {
        let start = Instant::now();
        let mut run = Run::new(self, table, true);
        let result = run.call(id, ctx, 1);
        EvaluationReport::new(result, run.steps, start.elapsed())
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The three forms a single target is compared in.
#[derive(Clone, Copy)]
struct Targets<'a> {
    base: &'a str,
    host: &'a str,
    full: &'a str,
}

impl<'a> Targets<'a> {
    fn same(value: &'a str) -> Self {
        Self {
            base: value,
            host: value,
            full: value,
        }
    }

    fn for_type(self, list_type: ListType) -> &'a str {
        if list_type.is_site_style() {
            self.host
        } else if list_type.is_regexp() {
            self.full
        } else {
            self.base
        }
    }
}

fn record_targets(record: &UrlRecord) -> Targets<'_> {
    Targets {
        base: &record.base,
        host: &record.domain,
        full: &record.full,
    }
}

/// State for one top-level run.
struct Run<'a> {
    interp: &'a Interpreter,
    table: &'a FunctionTable,
    collect: bool,
    steps: Vec<TraceStep>,
}

impl<'a> Run<'a> {
    fn new(interp: &'a Interpreter, table: &'a FunctionTable, collect: bool) -> Self {
        Self {
            interp,
            table,
            collect,
            steps: Vec::new(),
        }
    }

    fn trace(&mut self, step: impl FnOnce() -> TraceStep) {
        if !(self.collect || self.interp.config.trace) {
            return;
        }
        let step = step();
        if self.interp.config.trace {
            tracing::info!(target: TRACE_TARGET, "{step}");
        }
        if self.collect {
            self.steps.push(step);
        }
    }

    fn call(&mut self, id: FunctionId, ctx: &mut DecisionContext, depth: usize) -> bool {
        let table = self.table;
        let Some(function) = table.get(id) else {
            tracing::debug!(%id, "storyboard function id not in table");
            return false;
        };
        if depth > self.interp.config.max_call_depth {
            tracing::warn!(
                function = %function.name,
                depth,
                "storyboard call depth exceeded"
            );
            self.trace(|| TraceStep::DepthExceeded {
                function: function.name.clone(),
                depth,
            });
            return false;
        }

        self.trace(|| TraceStep::Enter {
            function: function.name.clone(),
            line: function.line,
            file: Arc::clone(&function.file),
        });

        let result = self.body(function, ctx, depth);

        self.trace(|| TraceStep::Return {
            function: function.name.clone(),
            result,
        });
        result
    }

    fn body(&mut self, function: &FunctionDef, ctx: &mut DecisionContext, depth: usize) -> bool {
        let mut result = false;
        for instruction in &function.instructions {
            let held = self.condition(instruction, ctx);
            self.trace(|| TraceStep::Condition {
                line: instruction.line,
                polarity: instruction.polarity,
                condition: instruction.condition,
                list: instruction.list_name.clone(),
                result: held,
            });

            if !held {
                result = false;
                ctx.flags.is_return = false;
                continue;
            }

            if instruction.message_id > 0 {
                ctx.annotations.message_id = instruction.message_id;
            }
            if instruction.log_message_id > 0 {
                ctx.annotations.log_message_id = instruction.log_message_id;
            }

            result = match &instruction.action {
                ActionRef::Builtin(action) => {
                    let done = self.builtin(*action, ctx);
                    self.trace(|| TraceStep::Action {
                        action: *action,
                        result: done,
                    });
                    done
                }
                ActionRef::Function(callee) => {
                    let done = self.call(*callee, ctx, depth + 1);
                    self.trace(|| TraceStep::Resume {
                        function: function.name.clone(),
                    });
                    done
                }
                ActionRef::Unresolved(_) => true,
            };
            ctx.flags.is_return = result;

            if instruction.return_after_action
                || (instruction.return_after_action_is_true && result)
            {
                break;
            }
        }
        result
    }

    /// Evaluate an instruction's condition, polarity applied.
    fn condition(&self, instruction: &Instruction, ctx: &mut DecisionContext) -> bool {
        let flags = &ctx.flags;
        let raw = match instruction.condition {
            ConditionKind::Connect => flags.connect,
            ConditionKind::Get => ctx.request.is_method("GET"),
            ConditionKind::Post => ctx.request.is_method("POST"),
            ConditionKind::ExceptionSet => flags.exception,
            ConditionKind::GreySet => flags.grey,
            ConditionKind::BlockSet => flags.blocked,
            ConditionKind::MitmSet => flags.mitm,
            ConditionKind::DoneSet => flags.done,
            ConditionKind::ReturnSet => flags.is_return,
            ConditionKind::RedirectSet => flags.redirect,
            ConditionKind::VirusCheckSet => !flags.no_virus_check,
            ConditionKind::BypassSet => flags.bypass,
            ConditionKind::HasSni => flags.has_sni,
            ConditionKind::Tls => flags.tls,
            ConditionKind::SiteIsIp => ctx.url.host_is_ip,
            ConditionKind::True => true,
            _ => match self.find(instruction, ctx) {
                Some(found) => {
                    if instruction.polarity == Polarity::If {
                        record_match(ctx, found);
                    }
                    true
                }
                None => false,
            },
        };
        instruction.polarity.apply(raw)
    }

    /// First list match for a list-checking instruction. Reverse-resolved
    /// hostnames, when they apply, are tried before the request's own targets.
    fn find(&self, instruction: &Instruction, ctx: &DecisionContext) -> Option<ListMatch> {
        let lists = instruction.lists.as_slice();
        if lists.is_empty() {
            return None;
        }
        if let Some(found) = self.reversed(instruction, ctx) {
            return Some(found);
        }
        let url = &ctx.url;
        match instruction.condition {
            ConditionKind::SiteIn => self.single(
                lists,
                Targets {
                    base: &url.domain,
                    host: &url.domain,
                    full: &url.raw,
                },
            ),
            ConditionKind::UrlIn | ConditionKind::FullUrlIn => self.single(
                lists,
                Targets {
                    base: &url.base,
                    host: &url.domain,
                    full: &url.raw,
                },
            ),
            ConditionKind::SearchIn if ctx.search.active => {
                self.single(lists, Targets::same(&ctx.search.words))
            }
            ConditionKind::EmbeddedIn => self.multi(lists, ctx.embedded_urls()),
            ConditionKind::RefererIn => {
                let referer = ctx.request.referer();
                let host = url::hostname(referer).to_ascii_lowercase();
                self.single(
                    lists,
                    Targets {
                        base: referer,
                        host: &host,
                        full: referer,
                    },
                )
            }
            ConditionKind::HeaderIn => ctx.request.headers.iter().find_map(|line| {
                lists
                    .iter()
                    .find_map(|list| self.table.lists.lookup(list, line))
            }),
            ConditionKind::ClientIn => self.single(
                lists,
                Targets {
                    base: &ctx.client_ip,
                    host: &ctx.client_host,
                    full: &ctx.client_ip,
                },
            ),
            ConditionKind::UserAgentIn => {
                self.single(lists, Targets::same(ctx.request.user_agent()))
            }
            ConditionKind::ExtensionIn => url::file_extension(&url.base)
                .and_then(|ext| self.single(lists, Targets::same(ext))),
            ConditionKind::MimeIn => self.single(lists, Targets::same(&ctx.mime_type)),
            _ => None,
        }
    }

    /// Check reverse-resolved hostnames of an IP-literal request host.
    fn reversed(&self, instruction: &Instruction, ctx: &DecisionContext) -> Option<ListMatch> {
        if !(instruction.condition.uses_reverse_hosts()
            && self.interp.config.reverse_lookups
            && ctx.url.host_is_ip)
        {
            return None;
        }
        let hosts = ctx.reverse_hosts(self.interp.resolver.as_ref());
        self.multi(&instruction.lists, hosts)
    }

    fn single(&self, lists: &[ListHandle], targets: Targets<'_>) -> Option<ListMatch> {
        lists.iter().find_map(|list| {
            self.table
                .lists
                .lookup(list, targets.for_type(list.list_type()))
        })
    }

    fn multi(&self, lists: &[ListHandle], records: &[UrlRecord]) -> Option<ListMatch> {
        records.iter().find_map(|record| {
            lists
                .iter()
                .filter(|list| match list.list_type() {
                    ListType::Url => !record.site_only,
                    ListType::IpSite => record.site_is_ip,
                    _ => true,
                })
                .find_map(|list| {
                    let target = record_targets(record).for_type(list.list_type());
                    self.table.lists.lookup(list, target)
                })
        })
    }

    /// Apply a built-in action; `false` only for a payload-less redirect and
    /// `setfalse`.
    fn builtin(&self, action: BuiltinAction, ctx: &mut DecisionContext) -> bool {
        let flags = &mut ctx.flags;
        match action {
            BuiltinAction::SetException => {
                flags.exception = true;
                flags.grey = false;
                flags.blocked = false;
                self.compose_reasons(ctx);
                ctx.annotations.exception_category = ctx.annotations.last_category.clone();
            }
            BuiltinAction::SetGrey => {
                flags.grey = true;
                flags.exception = false;
                flags.blocked = false;
            }
            BuiltinAction::SetBlock => {
                flags.blocked = true;
                flags.grey = false;
                flags.exception = false;
                self.compose_reasons(ctx);
                ctx.annotations.categories = ctx.annotations.last_category.clone();
            }
            BuiltinAction::SetModUrl => {
                let target = ctx.annotations.payload.clone();
                if !target.is_empty() {
                    ctx.flags.url_modified = true;
                    ctx.set_url(&target);
                    tracing::debug!(url = %target, "storyboard rewrote request url");
                }
            }
            BuiltinAction::SetLogCategory => {
                flags.log_category = true;
                self.compose_reasons(ctx);
                ctx.annotations.categories = ctx.annotations.last_category.clone();
            }
            BuiltinAction::SetRedirect => {
                if ctx.annotations.payload.is_empty() {
                    return false;
                }
                ctx.request.redirect = Some(ctx.annotations.payload.clone());
                ctx.flags.redirect = true;
            }
            BuiltinAction::SetGoMitm => flags.go_mitm = true,
            BuiltinAction::SetAddHeader => {
                flags.header_added = true;
                let header = ctx.annotations.payload.clone();
                ctx.request.add_header(&header);
            }
            BuiltinAction::SetModHeader => flags.header_modified = true,
            BuiltinAction::SetNoCheckCert => flags.no_check_cert = true,
            BuiltinAction::SetSearchTerm => {
                let terms = ctx.annotations.payload.clone();
                ctx.set_search_terms(&terms);
            }
            BuiltinAction::SetGoDirect => flags.go_direct = true,
            BuiltinAction::SetDone => flags.done = true,
            BuiltinAction::SetNoLog => flags.no_log = true,
            BuiltinAction::UnsetVirusCheck => flags.no_virus_check = true,
            BuiltinAction::UnsetBypass => {
                flags.bypass = false;
                flags.cookie_bypass = false;
                flags.scan_bypass = false;
                flags.virus_bypass = false;
                flags.exception = false;
            }
            BuiltinAction::SetTrue => {}
            BuiltinAction::SetFalse => return false,
        }
        true
    }

    /// `reason` = message text + matched text; `log_reason` likewise from the
    /// log message id, falling back to `reason`.
    fn compose_reasons(&self, ctx: &mut DecisionContext) {
        let notes = &mut ctx.annotations;
        let translator = &self.interp.translator;
        notes.reason = format!("{}{}", translator.translate(notes.message_id), notes.last_match);
        notes.log_reason = if notes.log_message_id == 0 {
            notes.reason.clone()
        } else {
            format!(
                "{}{}",
                translator.translate(notes.log_message_id),
                notes.last_match
            )
        };
    }
}

fn record_match(ctx: &mut DecisionContext, found: ListMatch) {
    let notes = &mut ctx.annotations;
    notes.last_category.clone_from(&found.category);
    notes.categories = found.category;
    notes.message_id = found.message_id;
    notes.log_message_id = found.log_message_id;
    notes.last_match = found.matched;
    notes.payload = found.payload;
}
