use cbct_lib::{
    config::BlendMode,
    render::{RenderOptions, RenderQuality},
};
use common::*;

mod common;

pub fn render_mip(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(false)
        .build_unchecked();
    bench_render(
        c,
        "render mip",
        BlendMode::MaximumIntensity,
        render_options,
        RenderQuality::Full,
    );
}

pub fn render_composite_ert(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .early_ray_termination(true)
        .multi_thread(false)
        .build_unchecked();
    bench_render(
        c,
        "render composite ert",
        BlendMode::Composite,
        render_options,
        RenderQuality::Full,
    );
}

pub fn render_composite(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .early_ray_termination(false)
        .multi_thread(false)
        .build_unchecked();
    bench_render(
        c,
        "render composite",
        BlendMode::Composite,
        render_options,
        RenderQuality::Full,
    );
}

pub fn render_interactive(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(false)
        .build_unchecked();
    bench_render(
        c,
        "render interactive",
        BlendMode::MaximumIntensity,
        render_options,
        RenderQuality::Interactive,
    );
}

pub fn render_parallel(c: &mut Criterion) {
    let render_options = RenderOptions::builder()
        .resolution(RESOLUTION)
        .multi_thread(true)
        .build_unchecked();
    bench_render(
        c,
        "render parallel",
        BlendMode::MaximumIntensity,
        render_options,
        RenderQuality::Full,
    );
}

criterion_group! {
    name = sequential;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = render_mip, render_composite, render_composite_ert, render_interactive
}

criterion_group! {
    name = parallel;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = render_parallel
}

criterion_main!(sequential, parallel);
