use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schemafit::adapt::plan;
use schemafit::matcher::match_netlists;
use schemafit::netlist::{normalize, BoxSpec, Connection, Port};
use schemafit::prelude::*;
use schemafit::templates::builtin;

/// A target the decoupled-chip template fits only after edits: the
/// chip grows one pin per side and gains an extra hanging passive.
fn grown_target() -> InputNetlist {
    let mut netlist = InputNetlist::new();
    netlist.add_box(BoxSpec::new("U9").with_pins(3, 3, 0, 0));
    netlist.add_box(BoxSpec::new("C7").with_pins(1, 1, 0, 0));
    netlist.add_connection(Connection::between(Port::pin("U9", 1), Port::net("GND")));
    netlist.add_connection(Connection::between(Port::pin("U9", 2), Port::net("IN")));
    netlist.add_connection(Connection::between(Port::pin("U9", 4), Port::net("OUT")));
    netlist.add_connection(Connection::between(Port::pin("U9", 6), Port::net("VCC")));
    netlist.add_connection(Connection::between(Port::pin("U9", 5), Port::pin("C7", 1)));
    netlist
}

fn bench_normalize(c: &mut Criterion) {
    let target = grown_target();
    c.bench_function("normalize_netlist", |b| {
        b.iter(|| normalize(black_box(&target)));
    });
}

fn bench_match(c: &mut Criterion) {
    let template = builtin::decoupled_chip();
    let (candidate, _) = normalize(&template.to_netlist()).expect("template netlist");
    let (target, _) = normalize(&grown_target()).expect("target netlist");
    c.bench_function("match_netlists", |b| {
        b.iter(|| match_netlists(black_box(&candidate), black_box(&target)));
    });
}

fn bench_plan(c: &mut Criterion) {
    let template = builtin::decoupled_chip();
    let target = grown_target();
    c.bench_function("plan_edits", |b| {
        b.iter(|| plan(black_box(&template), black_box(&target)));
    });
}

fn bench_adapt_best(c: &mut Criterion) {
    let templates = builtin::all();
    let target = grown_target();
    let options = AdaptOptions::default();
    c.bench_function("adapt_best", |b| {
        b.iter(|| {
            SchemaFitCore::adapt_best(
                black_box(&templates),
                black_box(&target),
                black_box(&options),
            )
        });
    });
}

criterion_group!(benches, bench_normalize, bench_match, bench_plan, bench_adapt_best);
criterion_main!(benches);
