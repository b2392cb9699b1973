// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_cascade` restyle passes.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_cascade::{
    CascadeCx, ClassId, NodeId, RecordingSink, Rule, Scope, ScopeBuilder, Selector, StyleSink,
    StyleTree, TypeTag,
};

/// A sink that accepts everything and only counts rules.
struct Counting(usize);

impl StyleSink<u32> for Counting {
    fn is_active(&self, _node: NodeId) -> bool {
        true
    }

    fn deliver(&mut self, _node: NodeId, rules: &[Rule<u32>]) {
        self.0 += rules.len();
    }
}

fn sheet(rules: u32) -> Scope<u32> {
    ScopeBuilder::new()
        .rules((0..rules).map(|i| {
            let selector = match i % 3 {
                0 => Selector::default(),
                1 => Selector::of_type(TypeTag(i % 4)),
                _ => Selector::with_classes([ClassId(i % 5)]),
            };
            Rule::with_selector(selector, i)
        }))
        .build()
}

/// A complete tree of the given fan-out and depth; every `scope_every`th
/// level owns a sheet.
fn build(fanout: usize, depth: usize, scope_every: usize) -> (StyleTree<u32>, NodeId) {
    let mut tree = StyleTree::new();
    let root = tree.add_root();
    let mut level = vec![root];
    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for &parent in &level {
            if d % scope_every == 0 {
                tree.set_scope(parent, Some(sheet(12)));
            }
            for i in 0..fanout {
                let Some(child) = tree.add_child(parent) else {
                    continue;
                };
                let tag = u32::try_from(i % 4).unwrap_or(0);
                tree.set_type_tag(child, Some(TypeTag(tag)));
                tree.set_classes(child, [ClassId(tag), ClassId(tag + 1)]);
                next.push(child);
            }
        }
        level = next;
    }
    (tree, root)
}

fn bench_cascade(c: &mut Criterion) {
    let global = sheet(24);
    let cx = CascadeCx::new().with_global(Some(&global));

    let mut group = c.benchmark_group("cascade/restyle");
    for (fanout, depth) in [(4_usize, 4_usize), (8, 4), (3, 8)] {
        let (tree, root) = build(fanout, depth, 2);
        let id = BenchmarkId::new("full", format!("{fanout}x{depth}"));
        group.bench_function(id, |b| {
            b.iter(|| {
                let mut sink = Counting(0);
                let summary = cx.restyle(&tree, root, &mut sink);
                black_box((summary, sink.0))
            });
        });
    }
    group.finish();

    let (tree, root) = build(4, 6, 1);
    let mut leaf = root;
    while let Some(&child) = tree.children(leaf).first() {
        leaf = child;
    }

    let mut group = c.benchmark_group("cascade/resolve");
    group.bench_function("deep_leaf", |b| {
        b.iter(|| black_box(cx.resolve(&tree, leaf)));
    });
    group.bench_function("ancestor_scopes", |b| {
        b.iter(|| black_box(cx.ancestor_scopes(&tree, leaf)));
    });
    group.bench_function("recording_sink_leaf", |b| {
        let mut sink = RecordingSink::new();
        sink.activate(leaf);
        b.iter(|| {
            sink.clear();
            black_box(cx.restyle(&tree, leaf, &mut sink))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cascade);
criterion_main!(benches);
