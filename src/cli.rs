use photontrace::{
    Camera, Environment, Integrator, Material, RenderSettings, Scene,
    geometry::{ScreenSize, WorldPoint, WorldVector},
    render,
};

use indicatif::ProgressBar;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let camera = Camera::builder()
        .center(WorldPoint::new(0.0, 2.0, 10.0))
        .forward(WorldVector::new(0.0, 0.0, -1.0))
        .up(WorldVector::new(0.0, 1.0, 0.0))
        .resolution(ScreenSize::new(2048, 1536))
        .film_width(36e-3)
        .focal_length(50e-3)
        .f_number(4.8)
        .focus_distance(10.0)
        .aperture_blades(6)
        .build();

    let settings = RenderSettings {
        tile_size: 64.try_into().unwrap(),
        sample_count: 100.try_into().unwrap(),
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
    let scene = Scene::from_obj("data/teapot.obj", material, environment)?;

    let bar = ProgressBar::no_length();
    let mut render_progress = render(scene, camera, settings, None, |_| {}, {
        let bar = bar.clone();
        move |_, progress| {
            bar.update(|ps| {
                ps.set_len(progress.total as u64);
                ps.set_pos(progress.finished as u64)
            })
        }
    })?;
    bar.set_length(render_progress.progress().total as u64);

    render_progress.wait();

    render_progress.image().lock().unwrap().save("teapot.png")?;

    Ok(())
}
