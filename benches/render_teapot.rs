use criterion::{Criterion, criterion_group, criterion_main};
use photontrace::{
    Camera, Environment, Integrator, Material, RenderSettings, Scene,
    geometry::{ScreenSize, WorldPoint, WorldVector},
    render,
};

fn criterion_benchmark(c: &mut Criterion) {
    let camera = Camera::builder()
        .center(WorldPoint::new(0.0, -5.0, 1.0))
        .forward(WorldVector::new(0.0, 1.0, 0.0))
        .up(WorldVector::new(0.0, 0.0, 1.0))
        .resolution(ScreenSize::new(2048, 1536))
        .film_width(36e-3)
        .focal_length(50e-3)
        .f_number(4.8)
        .focus_distance(5.0)
        .build();

    let settings = RenderSettings {
        tile_size: 64.try_into().unwrap(),
        sample_count: 10.try_into().unwrap(),
        max_bounces: 8,
        exposure: 1.0,
        integrator: Integrator::Path,
        threads: None,
    };

    let environment = Environment::ambient(rgb::RGBA::new(0.3, 0.4, 0.5, 1.0));
    let material = Material::diffuse(
        rgb::RGBA::new(0.8, 0.8, 0.8, 1.0),
        rgb::RGBA::new(0.0, 0.0, 0.0, 0.0),
    );
    let scene = Scene::from_obj("data/teapot.obj", material, environment).unwrap();

    c.bench_function("render_teapot", |b| {
        b.iter_batched(
            || (camera, settings, scene.clone()),
            |(camera, settings, scene)| {
                let mut render_progress = render(scene, camera, settings, None, |_| {}, |_, _| {}).unwrap();
                render_progress.wait();
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
