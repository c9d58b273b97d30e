use image::RgbaImage;
use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    camera::Camera,
    geometry::{ScreenBlock, ScreenPoint},
    renderer::RenderSettings,
    scene::Scene,
    screen_block::ScreenBlockExt as _,
    util::Rgba,
};

pub struct Worker {
    rng: SmallRng,
}

impl Worker {
    pub fn new(_worker_id: usize) -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn render_tile(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        settings: &RenderSettings,
        tile: &ScreenBlock,
        buffer: &mut RgbaImage,
    ) {
        for point in tile.internal_points() {
            let mut pixel_sum = Rgba::new(0.0, 0.0, 0.0, 0.0);
            for _ in 0..settings.sample_count.get() {
                pixel_sum += self.render_sample(scene, camera, settings, &point);
            }

            let sample_count = settings.sample_count.get() as f32;
            let averaged = Rgba::new(
                pixel_sum.r / sample_count,
                pixel_sum.g / sample_count,
                pixel_sum.b / sample_count,
                pixel_sum.a / sample_count,
            );
            let pixel = tonemap(averaged, settings.exposure);

            let buffer_position = point - tile.min;
            buffer.put_pixel(buffer_position.x, buffer_position.y, color_to_image(pixel));
        }
    }

    fn render_sample(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        settings: &RenderSettings,
        point: &ScreenPoint,
    ) -> Rgba {
        let ray = camera.sample_ray(point, &mut self.rng);
        settings
            .integrator
            .gather(scene, &ray, settings.max_bounces, &mut self.rng)
    }
}

/// Reinhard-style exposure tone map: `1 - exp(-exposure * linear)`. Alpha
/// passes through unchanged, just clamped.
fn tonemap(color: Rgba, exposure: f32) -> Rgba {
    Rgba::new(
        1.0 - (-exposure * color.r).exp(),
        1.0 - (-exposure * color.g).exp(),
        1.0 - (-exposure * color.b).exp(),
        color.a.clamp(0.0, 1.0),
    )
}

/// Maps a 0-1 f32 rgba pixel to pixel type compatible with module image.
pub fn color_to_image(color: Rgba) -> image::Rgba<u8> {
    image::Rgba([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn tonemap_maps_black_to_black_and_clamps_alpha() {
        let result = tonemap(Rgba::new(0.0, 0.0, 0.0, 2.0), 1.0);
        assert!(result.r == 0.0 && result.g == 0.0 && result.b == 0.0);
        assert!(result.a == 1.0);
    }

    #[test]
    fn tonemap_approaches_white_for_bright_input() {
        let result = tonemap(Rgba::new(100.0, 100.0, 100.0, 1.0), 1.0);
        assert!(result.r > 0.99 && result.g > 0.99 && result.b > 0.99);
    }

    #[test]
    fn color_to_image_rounds_and_clamps() {
        let pixel = color_to_image(Rgba::new(-1.0, 0.5, 2.0, 1.0));
        assert!(pixel.0[0] == 0);
        assert!(pixel.0[1] == 128);
        assert!(pixel.0[2] == 255);
    }
}
