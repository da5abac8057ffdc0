//! Reconciler benchmarks, in the spirit of the JS framework benchmark: a
//! table of keyed rows that is created, swapped and rotated.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use graft_core::vdom::{Callback, VirtualNode};
use graft_core::{Document, Renderer};

criterion_group!(benches, create_rows, swap_rows, rotate_rows, rerender_unchanged);
criterion_main!(benches);

const ROWS: usize = 1_000;

fn table(order: &[usize], select: &Callback) -> VirtualNode {
    VirtualNode::builder("table")
        .child(
            VirtualNode::builder("tbody")
                .children(order.iter().map(|id| row(*id, select)))
                .build(),
        )
        .build()
}

fn row(id: usize, select: &Callback) -> VirtualNode {
    VirtualNode::builder("tr")
        .key(id as i64)
        .child(VirtualNode::builder("td").prop("class", "col-md-1").child(id as f64).build())
        .child(
            VirtualNode::builder("td")
                .prop("class", "col-md-4")
                .on("click", select.clone())
                .child(VirtualNode::builder("a").prop("class", "lbl").child(format!("row {id}")).build())
                .build(),
        )
        .build()
}

fn create_rows(c: &mut Criterion) {
    let select = Callback::new(|_| {});
    let order: Vec<usize> = (0..ROWS).collect();
    c.bench_function("create 1k rows", |b| {
        b.iter(|| {
            let renderer = Renderer::new(Document::new());
            renderer.render(&table(&order, &select), None)
        })
    });
}

fn swap_rows(c: &mut Criterion) {
    let select = Callback::new(|_| {});
    let order: Vec<usize> = (0..ROWS).collect();
    let mut swapped = order.clone();
    swapped.swap(1, ROWS - 2);

    c.bench_function("swap 2 of 1k rows", |b| {
        b.iter_batched(
            || {
                let renderer = Renderer::new(Document::new());
                let node = renderer.render(&table(&order, &select), None);
                (renderer, node, table(&swapped, &select))
            },
            |(renderer, node, next)| renderer.render(&next, Some(&node)),
            BatchSize::SmallInput,
        )
    });
}

fn rotate_rows(c: &mut Criterion) {
    let select = Callback::new(|_| {});
    let order: Vec<usize> = (0..ROWS).collect();
    let mut rotated = order.clone();
    rotated.rotate_right(1);

    c.bench_function("rotate 1k rows", |b| {
        b.iter_batched(
            || {
                let renderer = Renderer::new(Document::new());
                let node = renderer.render(&table(&order, &select), None);
                (renderer, node, table(&rotated, &select))
            },
            |(renderer, node, next)| renderer.render(&next, Some(&node)),
            BatchSize::SmallInput,
        )
    });
}

fn rerender_unchanged(c: &mut Criterion) {
    let select = Callback::new(|_| {});
    let order: Vec<usize> = (0..ROWS).collect();
    let renderer = Renderer::new(Document::new());
    let node = renderer.render(&table(&order, &select), None);

    c.bench_function("rerender 1k unchanged rows", |b| {
        b.iter(|| renderer.render(&table(&order, &select), Some(&node)))
    });
}
