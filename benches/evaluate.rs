use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use storyboard::{DecisionContext, FunctionTable, ListType, Loader, MemoryLists, RequestHead};

fn lists(n: usize) -> Arc<MemoryLists> {
    let mut lists = MemoryLists::new();
    for i in 0..n {
        lists = lists.list(
            &format!("l{i}"),
            ListType::Site,
            [format!("blocked{i}.example")],
        );
    }
    Arc::new(lists)
}

/// A script of `n` functions, each checking one site list and calling the
/// next, so a full run walks the whole chain.
fn script(n: usize) -> String {
    let mut out = String::new();
    for i in 0..n {
        out.push_str(&format!("function(f{i})\n"));
        out.push_str(&format!("if(sitein, l{i}) return setblock\n"));
        if i + 1 < n {
            out.push_str(&format!("if(true) return f{}\n", i + 1));
        }
        out.push_str("end\n");
    }
    out
}

fn build_table(n: usize) -> FunctionTable {
    Loader::new(lists(n))
        .load_source("bench.story", &script(n))
        .unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_eval");
    let interpreter = storyboard::Interpreter::default();

    for &n in &[5, 20, 50] {
        let table = build_table(n);
        let hit = DecisionContext::new(RequestHead::new(
            "GET",
            &format!("http://www.blocked{}.example/x", n - 1),
        ));
        let miss = DecisionContext::new(RequestHead::new("GET", "http://fine.example/x"));

        group.bench_function(format!("{n}_functions_hit_last"), |b| {
            b.iter(|| {
                let mut ctx = hit.clone();
                interpreter.run_named(&table, "f0", black_box(&mut ctx))
            });
        });
        group.bench_function(format!("{n}_functions_miss"), |b| {
            b.iter(|| {
                let mut ctx = miss.clone();
                interpreter.run_named(&table, "f0", black_box(&mut ctx))
            });
        });
    }

    group.finish();
}

fn bench_embedded(c: &mut Criterion) {
    let mut group = c.benchmark_group("embedded");
    let table = Loader::new(lists(1))
        .load_source("bench.story", "function(f0)\nif(embeddedin, l0) setblock\n")
        .unwrap();
    let interpreter = storyboard::Interpreter::default();

    for &n in &[1, 4, 16] {
        let mut url = String::from("http://redirect.example/go");
        for i in 0..n {
            url.push_str(&format!("?u{i}=http://site{i}.example/page"));
        }
        let ctx = DecisionContext::new(RequestHead::new("GET", &url));
        group.bench_function(format!("{n}_urls"), |b| {
            b.iter(|| {
                let mut ctx = ctx.clone();
                interpreter.run_named(&table, "f0", black_box(&mut ctx))
            });
        });
    }

    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for &n in &[5, 20, 50] {
        let source = script(n);
        let loader = Loader::new(lists(n));
        group.bench_function(format!("{n}_functions"), |b| {
            b.iter(|| black_box(loader.load_source("bench.story", &source).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_embedded, bench_load);
criterion_main!(benches);
