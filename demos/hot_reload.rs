use std::sync::Arc;

use storyboard::{
    DecisionContext, HotFunctionTable, Interpreter, InterpreterConfig, ListType, Loader,
    MemoryLists, RequestHead,
};
use tracing_subscriber::EnvFilter;

fn decide(interpreter: &Interpreter, hot: &HotFunctionTable, url: &str) -> bool {
    let table = hot.snapshot();
    let mut ctx = DecisionContext::new(RequestHead::new("GET", url));
    interpreter.run_named(&table, "checkrequest", &mut ctx);
    ctx.flags.blocked
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("filter.story");
    std::fs::write(&path, "function(checkrequest)\nif(sitein, banned) setblock\n")
        .expect("failed to write script");

    let loader = Loader::new(Arc::new(
        MemoryLists::new()
            .list("banned", ListType::Site, ["bad.example"])
            .list("social", ListType::Site, ["social.example"]),
    ));
    let hot = HotFunctionTable::new(loader.load(&path).expect("failed to load script"));
    let interpreter = Interpreter::new(InterpreterConfig {
        trace: true,
        ..InterpreterConfig::default()
    });

    println!("v1 social blocked: {}", decide(&interpreter, &hot, "http://social.example/"));

    std::fs::write(
        &path,
        "function(checkrequest)\nif(sitein, banned) setblock\nif(sitein, social) setblock\n",
    )
    .expect("failed to write script");
    hot.reload(&loader, &path).expect("reload failed");
    println!("v2 social blocked: {}", decide(&interpreter, &hot, "http://social.example/"));

    std::fs::write(&path, "function(checkrequest)\nif(sitein banned) setblock\n")
        .expect("failed to write script");
    if let Err(e) = hot.reload(&loader, &path) {
        println!("reload rejected, keeping v2: {e}");
    }
    println!("still blocked: {}", decide(&interpreter, &hot, "http://social.example/"));
}
