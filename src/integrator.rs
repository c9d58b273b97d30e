use arrayvec::ArrayVec;
use rand::Rng;

use crate::bsdf;
use crate::geometry::{EPSILON, Ray};
use crate::scene::Scene;
use crate::util::Rgba;

/// Hard cap on path length. [`crate::renderer::RenderSettings::max_bounces`]
/// is validated to never exceed this.
pub const MAX_BOUNCES: usize = 32;

/// Selects which light-transport approximation a render uses. `Path` is the
/// physically based one; the others are debugging aids.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Integrator {
    #[default]
    Path,
    Normals,
    Fresnel,
    AmbientOcclusion,
}

impl Integrator {
    /// Estimates the radiance arriving back along `ray`.
    pub fn gather(&self, scene: &Scene, ray: &Ray, max_bounces: u32, rng: &mut impl Rng) -> Rgba {
        match self {
            Integrator::Path => path_trace(scene, ray, max_bounces, rng),
            Integrator::Normals => normals(scene, ray),
            Integrator::Fresnel => fresnel(scene, ray),
            Integrator::AmbientOcclusion => ambient_occlusion(scene, ray, rng),
        }
    }
}

/// One step of the light-transport recurrence, folded from the far end of
/// the path back toward the camera: `radiance = scale * next_radiance + add`.
struct Bounce {
    scale: Rgba,
    add: Rgba,
}

fn path_trace(scene: &Scene, ray: &Ray, max_bounces: u32, rng: &mut impl Rng) -> Rgba {
    if max_bounces == 0 {
        return black();
    }

    let mut bounces: ArrayVec<Bounce, MAX_BOUNCES> = ArrayVec::new();
    let mut current_ray = *ray;

    for _ in 0..(max_bounces as usize).min(MAX_BOUNCES) {
        let Some(hit) = scene.intersect(&current_ray) else {
            bounces.push(Bounce {
                scale: black(),
                add: scene.environment.sample_in_direction(current_ray.direction.as_ref()),
            });
            break;
        };

        let material = scene.material(hit.triangle_index);
        let normal = scene.shading_normal(&hit);
        let incidence = *current_ray.direction.as_ref();

        let sample = bsdf::sample(material, &incidence, &normal, rng);
        // Offsetting along the side `wo` actually leaves on keeps the next
        // ray clear of the surface for both reflection and transmission.
        let cosine = normal.dot(&sample.direction).abs();
        let weight = (sample.brdf * cosine).min(1.0);

        bounces.push(Bounce {
            scale: scale_color(sample.color, weight),
            add: material.emissive(),
        });

        let offset = normal * (EPSILON * normal.dot(&sample.direction).signum());
        current_ray = Ray::new(hit.point + offset, sample.direction);
    }

    fold(&bounces)
}

fn fold(bounces: &[Bounce]) -> Rgba {
    let mut result = black();
    for bounce in bounces.iter().rev() {
        result = mul_colors(result, bounce.scale) + bounce.add;
    }
    result
}

/// Visualizes shading normals as colors, remapped from `[-1,1]` to `[0,1]`.
fn normals(scene: &Scene, ray: &Ray) -> Rgba {
    let Some(hit) = scene.intersect(ray) else {
        return black();
    };
    let n = scene.shading_normal(&hit);
    Rgba::new(0.5 * n.x + 0.5, 0.5 * n.y + 0.5, 0.5 * n.z + 0.5, 1.0)
}

/// Visualizes Fresnel reflectance at the first hit as a grayscale value.
fn fresnel(scene: &Scene, ray: &Ray) -> Rgba {
    let Some(hit) = scene.intersect(ray) else {
        return black();
    };
    let material = scene.material(hit.triangle_index);
    let normal = scene.shading_normal(&hit);
    let incidence = *ray.direction.as_ref();
    let f = bsdf::fresnel_reflectance(material, &incidence, &normal);
    Rgba::new(f, f, f, 1.0)
}

/// Casts a single cosine-weighted secondary ray from the first hit and
/// reports whether it escapes to the environment (white) or is occluded
/// (black).
fn ambient_occlusion(scene: &Scene, ray: &Ray, rng: &mut impl Rng) -> Rgba {
    let Some(hit) = scene.intersect(ray) else {
        return white();
    };
    let normal = scene.shading_normal(&hit);
    let material = scene.material(hit.triangle_index);
    let incidence = *ray.direction.as_ref();

    let sample = bsdf::sample(material, &incidence, &normal, rng);
    let secondary = Ray::new(hit.point, sample.direction);

    if scene.intersect(&secondary).is_some() {
        black()
    } else {
        white()
    }
}

fn black() -> Rgba {
    Rgba::new(0.0, 0.0, 0.0, 0.0)
}

fn white() -> Rgba {
    Rgba::new(1.0, 1.0, 1.0, 1.0)
}

fn mul_colors(a: Rgba, b: Rgba) -> Rgba {
    Rgba::new(a.r * b.r, a.g * b.g, a.b * b.b, a.a * b.a)
}

fn scale_color(color: Rgba, factor: f32) -> Rgba {
    Rgba::new(color.r * factor, color.g * factor, color.b * factor, color.a)
}
