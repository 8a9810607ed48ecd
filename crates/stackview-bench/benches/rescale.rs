use criterion::{Criterion, criterion_group, criterion_main};
use stackview_bench::util;
use stackview_graph::ScaleState;
use std::hint::black_box;

fn bench_rescale(c: &mut Criterion) {
    let stack = util::generate_synthetic_stack(2000, 25);
    let mut model = util::build_model(&stack).unwrap();
    model.take_commands();
    let mut scale = ScaleState::new(1.0).expect("valid scale");

    let mut zoomed = false;
    c.bench_function("rescale_2000_edges", |b| {
        b.iter(|| {
            zoomed = !zoomed;
            let next = if zoomed { 1.25 } else { 1.0 };
            scale
                .rescale(&mut model, black_box(next))
                .expect("valid scale");
            black_box(model.take_commands().len());
        })
    });
}

criterion_group!(benches, bench_rescale);
criterion_main!(benches);
