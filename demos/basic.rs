use std::sync::Arc;

use storyboard::{
    DecisionContext, Interpreter, InterpreterConfig, ListType, Loader, MemoryLists, MessageTable,
    RequestHead,
};
use tracing_subscriber::EnvFilter;

const SCRIPT: &str = "\
# request filtering
function(checkrequest)
if(sitein, exceptionsite) return setexception
if(embeddedin, bannedsite) return setblock
if(true) checksite
end

function(checksite)
if(sitein, bannedsite, 500) setblock
ifnot(blockset) setgrey
end
";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let lists = MemoryLists::new()
        .with_list("bannedsite", ListType::Site, |l| {
            l.entry("bad.example").category("Banned")
        })
        .list("exceptionsite", ListType::Site, ["trusted.example"]);

    let mut table = Loader::new(Arc::new(lists))
        .load_source("basic.story", SCRIPT)
        .expect("failed to load script");
    table.set_entry(0, "checkrequest");
    println!("{table}");

    let interpreter = Interpreter::new(InterpreterConfig {
        trace: true,
        ..InterpreterConfig::default()
    })
    .translator(Arc::new(MessageTable::new().message(500, "Banned site: ")));

    for url in [
        "http://www.bad.example/",
        "http://trusted.example/login",
        "http://other.example/?next=http://bad.example/",
        "http://other.example/",
    ] {
        let mut ctx = DecisionContext::new(RequestHead::new("GET", url));
        let result = interpreter.run_entry(&table, 0, &mut ctx);
        println!(
            "{url}: result={result} blocked={} exception={} grey={} reason={:?}",
            ctx.flags.blocked, ctx.flags.exception, ctx.flags.grey, ctx.annotations.reason
        );
    }
}
