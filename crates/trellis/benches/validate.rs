use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use trellis::{CellId, Graph};

/// A `side` x `side` grid of vertices with edges to the right and downward neighbours.
fn build_grid(side: usize) -> (Graph, Vec<CellId>) {
    let mut graph = Graph::new();
    let mut cells = Vec::with_capacity(side * side);
    graph.begin_update();
    for row in 0..side {
        for col in 0..side {
            let x = col as f64 * 80.0;
            let y = row as f64 * 60.0;
            let v = graph
                .insert_vertex(None, format!("n{row}_{col}"), x, y, 40.0, 30.0, None)
                .expect("insert vertex");
            cells.push(v);
        }
    }
    for row in 0..side {
        for col in 0..side {
            let from = cells[row * side + col];
            if col + 1 < side {
                let to = cells[row * side + col + 1];
                graph.insert_edge(None, "", Some(from), Some(to), None).expect("insert edge");
            }
            if row + 1 < side {
                let to = cells[(row + 1) * side + col];
                let style = (col % 2 == 0).then_some("edgeStyle=orthogonalEdgeStyle");
                graph.insert_edge(None, "", Some(from), Some(to), style).expect("insert edge");
            }
        }
    }
    graph.end_update();
    (graph, cells)
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("view");
    group.measurement_time(Duration::from_secs(10));

    for side in [10usize, 30, 60] {
        let name = format!("grid_{side}x{side}");
        group.bench_with_input(BenchmarkId::new("build_and_validate", &name), &side, |b, &side| {
            b.iter(|| {
                let (graph, _) = build_grid(black_box(side));
                black_box(graph.view().state_count());
            })
        });
        group.bench_with_input(BenchmarkId::new("move_row", &name), &side, |b, &side| {
            b.iter_batched(
                || build_grid(side),
                |(mut graph, cells)| {
                    graph
                        .move_cells(&cells[..side], 5.0, 5.0, false, None)
                        .expect("move cells");
                    black_box(graph.graph_bounds());
                },
                BatchSize::LargeInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("zoom", &name), &side, |b, &side| {
            b.iter_batched(
                || build_grid(side).0,
                |mut graph| {
                    graph.zoom_in();
                    graph.zoom_out();
                    black_box(graph.view().scale());
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
