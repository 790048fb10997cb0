use criterion::{Criterion, criterion_group, criterion_main};
use markup_field_engine::Pipelines;
use std::hint::black_box;
mod common;

fn bench_input_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_pipelines");
    group.sample_size(10);

    let pipelines = Pipelines::new(false);
    let content = common::generate_field_content(100);
    let edited = pipelines.input.run_html(&content);

    group.bench_function("input", |b| {
        b.iter(|| {
            let html = pipelines.input.run_html(black_box(&content));
            black_box(html);
        });
    });

    group.bench_function("output", |b| {
        b.iter(|| {
            let html = pipelines.output.run_html(black_box(&edited));
            black_box(html);
        });
    });

    let markup = Pipelines::new(true);
    group.bench_function("output_with_markup_filters", |b| {
        b.iter(|| {
            let html = markup.output.run_html(black_box(&edited));
            black_box(html);
        });
    });

    group.finish();
}

fn bench_paste(c: &mut Criterion) {
    let mut group = c.benchmark_group("paste_pipeline");
    group.sample_size(10);

    let pipelines = Pipelines::new(false);
    let pasted = common::generate_office_paste(50);

    group.bench_function("office_document", |b| {
        b.iter(|| {
            let html = pipelines.paste.run_html(black_box(&pasted));
            black_box(html);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_input_output, bench_paste);
criterion_main!(benches);
