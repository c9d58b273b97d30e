use std::f32::consts::PI;

use rand::Rng;

use crate::geometry::WorldVector;
use crate::material::Material;
use crate::util::Rgba;

/// Result of sampling a material's BSDF for a single incident direction:
/// the chosen outgoing direction, the material's color contribution along
/// that direction, and the BRDF weight for it. `brdf` does not include the
/// `n . wo` shading-cosine factor; callers apply that themselves.
pub struct BsdfSample {
    pub direction: WorldVector,
    pub color: Rgba,
    pub brdf: f32,
}

/// Picks an axis-independent vector perpendicular to `normal` (which must be
/// normalized), used as a tangent for hemisphere sampling.
fn perpendicular_vector(normal: &WorldVector) -> WorldVector {
    let (nx2, ny2, nz2) = (normal.x * normal.x, normal.y * normal.y, normal.z * normal.z);

    if nx2 > 0.5 {
        let scale = (nz2 + nx2).sqrt();
        WorldVector::new(normal.z / scale, 0.0, -normal.x / scale)
    } else if ny2 > 0.5 {
        let scale = (ny2 + nx2).sqrt();
        WorldVector::new(-normal.y / scale, normal.x / scale, 0.0)
    } else {
        let scale = (nz2 + ny2).sqrt();
        WorldVector::new(0.0, -normal.z / scale, normal.y / scale)
    }
}

/// Samples a direction uniformly cosine-weighted over the hemisphere around `normal`.
fn cosine_weighted_hemisphere(normal: &WorldVector, rng: &mut impl Rng) -> WorldVector {
    let phi = rng.random_range(0.0..2.0 * PI);
    let xi2: f32 = rng.random_range(0.0..1.0);
    let r = xi2.sqrt();

    let tangent = perpendicular_vector(normal);
    let bitangent = tangent.cross(normal);

    let result = tangent * (r * phi.cos()) + bitangent * (r * phi.sin()) + normal * (1.0 - xi2).sqrt();
    result.normalize()
}

/// Samples a direction inside a cone around `axis`, with cone half-angle
/// `sin(halfPi * roughness)`. At `roughness == 0` this always returns `axis`.
fn glossy_cone(axis: &WorldVector, roughness: f32, rng: &mut impl Rng) -> WorldVector {
    let phi = rng.random_range(0.0..2.0 * PI);
    let distribution = (PI / 2.0 * roughness).sin().clamp(0.0, 1.0);
    let theta = if distribution > 0.0 {
        rng.random_range(0.0..distribution)
    } else {
        0.0
    };

    let tangent = perpendicular_vector(axis);
    let bitangent = tangent.cross(axis);

    let result =
        (tangent * phi.cos() + bitangent * phi.sin()) * theta.sqrt() + axis * (1.0 - theta).sqrt();
    result.normalize()
}

fn reflect(incidence: &WorldVector, normal: &WorldVector) -> WorldVector {
    incidence - normal * (2.0 * normal.dot(incidence))
}

fn refract(incidence: &WorldVector, normal: &WorldVector, eta: f32, k: f32) -> WorldVector {
    (incidence * eta) - normal * (eta * normal.dot(incidence) + k.sqrt())
}

fn phong_brdf(ideal_direction: &WorldVector, sampled_direction: &WorldVector, exponent: f32) -> f32 {
    let s = ideal_direction.dot(sampled_direction);
    if s <= 0.0 { 0.0 } else { s.powf(exponent) }
}

/// Cook-Torrance-style microfacet term (Beckmann-ish GGX distribution) used
/// as the conductor BRDF weight.
fn cooktorrance_brdf(
    normal: &WorldVector,
    incidence: &WorldVector,
    out: &WorldVector,
    roughness: f32,
) -> f32 {
    let half = (out - incidence).normalize();
    let n_dot_h = normal.dot(&half).max(0.0);
    let alpha = (roughness * roughness).max(1e-3);
    let alpha2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (alpha2 - 1.0) + 1.0;
    (alpha2 / (PI * denom * denom).max(1e-6)).max(0.0)
}

/// Fresnel reflectance term. Grounded on the original raytracer's
/// (non-Schlick) formula: `eta2 = (ior * cos_i)^2`, `beta = 1 - ior^2`,
/// `result = 1 + 2*(eta2 + ior*cos_i*sqrt(beta + eta2)) / beta`, clamped
/// `result^2` to `[0,1]`.
///
/// `beta == 0` (ior exactly 1, i.e. no index mismatch) is special-cased to
/// zero reflectance, since there is no interface to reflect from.
fn fresnel_term(ior: f32, cos_i: f32) -> f32 {
    let beta = 1.0 - ior * ior;
    if beta.abs() < 1e-6 {
        return 0.0;
    }
    let eta = ior * cos_i;
    let eta2 = eta * eta;
    let result = 1.0 + 2.0 * (eta2 + eta * (beta + eta2).max(0.0).sqrt()) / beta;
    (result * result).clamp(0.0, 1.0)
}

/// Fresnel reflectance at the given incidence, for use by the standalone
/// `fresnel` integrator variant (not tied to a sampled direction).
pub fn fresnel_reflectance(material: &Material, incidence: &WorldVector, normal: &WorldVector) -> f32 {
    match material {
        Material::Diffuse { .. } => 0.0,
        Material::Conductor { .. } => fresnel_term(0.0, incidence.dot(normal)),
        Material::Dielectric { ior, .. } => {
            let eta = if *ior > 1.0 { 1.0 / ior } else { *ior };
            fresnel_term(eta, incidence.dot(normal))
        }
    }
}

/// Samples an outgoing direction, color, and BRDF weight for a ray hitting
/// `material` with surface normal `normal` (facing the side the ray came
/// from) and incident direction `incidence` (pointing along the ray, away
/// from its origin).
pub fn sample(
    material: &Material,
    incidence: &WorldVector,
    normal: &WorldVector,
    rng: &mut impl Rng,
) -> BsdfSample {
    match material {
        Material::Diffuse { diffuse, .. } => {
            // Cosine-weighted sampling already cancels the shading cosine term
            // against its own pdf, so the BRDF weight here is just the albedo;
            // the caller still applies the uniform `n . wo` factor on top.
            let direction = cosine_weighted_hemisphere(normal, rng);
            BsdfSample {
                direction,
                color: *diffuse,
                brdf: 1.0,
            }
        }

        Material::Conductor {
            specular,
            roughness,
            ..
        } => {
            let ideal = reflect(incidence, normal);
            let direction = glossy_cone(&ideal, *roughness, rng);
            let brdf = cooktorrance_brdf(normal, incidence, &direction, *roughness);
            BsdfSample {
                direction,
                color: *specular,
                brdf,
            }
        }

        Material::Dielectric {
            diffuse,
            specular,
            roughness,
            ior,
            specular_exponent,
            ..
        } => dielectric_sample(
            incidence,
            normal,
            *diffuse,
            *specular,
            *roughness,
            *ior,
            *specular_exponent,
            rng,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn dielectric_sample(
    incidence: &WorldVector,
    normal: &WorldVector,
    diffuse: Rgba,
    specular: Rgba,
    roughness: f32,
    ior: f32,
    specular_exponent: f32,
    rng: &mut impl Rng,
) -> BsdfSample {
    let entering = normal.dot(incidence) < 0.0;
    let target_normal = if entering { *normal } else { -*normal };
    let eta = if entering { 1.0 / ior } else { ior };
    let cos_i = target_normal.dot(incidence);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);

    if k < 0.0 {
        // Total internal reflection: behave as a conductor off the (flipped) surface.
        let ideal = reflect(incidence, &target_normal);
        let direction = glossy_cone(&ideal, roughness, rng);
        let brdf = phong_brdf(&ideal, &direction, specular_exponent);
        return BsdfSample {
            direction,
            color: specular,
            brdf,
        };
    }

    let fresnel = fresnel_term(eta, cos_i);
    if rng.random_range(0.0..1.0f32) <= fresnel {
        let ideal = reflect(incidence, &target_normal);
        let direction = glossy_cone(&ideal, roughness, rng);
        let brdf = phong_brdf(&ideal, &direction, specular_exponent);
        BsdfSample {
            direction,
            color: specular,
            brdf,
        }
    } else {
        let ideal = refract(incidence, &target_normal, eta, k);
        let direction = glossy_cone(&ideal, roughness, rng);
        let brdf = phong_brdf(&ideal, &direction, specular_exponent);
        BsdfSample {
            direction,
            color: diffuse,
            brdf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn diffuse_samples_stay_in_hemisphere() {
        let mut rng = SmallRng::seed_from_u64(1);
        let normal = WorldVector::new(0.0, 0.0, 1.0);
        let mat = Material::diffuse(Rgba::new(1.0, 1.0, 1.0, 1.0), Rgba::new(0.0, 0.0, 0.0, 0.0));
        for _ in 0..200 {
            let s = sample(&mat, &WorldVector::new(0.0, 0.0, -1.0), &normal, &mut rng);
            assert!(s.direction.dot(&normal) >= -1e-5);
            assert!(s.brdf >= 0.0);
        }
    }

    #[test]
    fn mirror_conductor_with_zero_roughness_reflects_exactly() {
        let mut rng = SmallRng::seed_from_u64(2);
        let normal = WorldVector::new(0.0, 0.0, 1.0);
        let incidence = WorldVector::new(1.0, 0.0, -1.0).normalize();
        let mat = Material::mirror(Rgba::new(1.0, 1.0, 1.0, 1.0), 0.0);
        let s = sample(&mat, &incidence, &normal, &mut rng);
        let expected = reflect(&incidence, &normal);
        assert!((s.direction - expected).norm() < 1e-4);
    }

    #[test]
    fn fresnel_is_clamped_to_unit_range() {
        for i in -10..=10 {
            let cos_i = i as f32 / 10.0;
            let f = fresnel_term(1.5, cos_i);
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn dielectric_grazing_angle_total_internal_reflection_has_no_nan() {
        let mut rng = SmallRng::seed_from_u64(3);
        let normal = WorldVector::new(0.0, 0.0, 1.0);
        // Ray travelling almost parallel to the surface from inside a denser medium.
        let incidence = WorldVector::new(0.999, 0.0, 0.05).normalize();
        let mat = Material::Dielectric {
            diffuse: Rgba::new(0.8, 0.8, 0.8, 1.0),
            specular: Rgba::new(1.0, 1.0, 1.0, 1.0),
            emissive: Rgba::new(0.0, 0.0, 0.0, 0.0),
            roughness: 0.0,
            ior: 1.5,
            specular_exponent: 64.0,
        };
        let s = sample(&mat, &incidence, &normal, &mut rng);
        assert!(s.direction.x.is_finite() && s.direction.y.is_finite() && s.direction.z.is_finite());
        assert!((s.direction.norm() - 1.0).abs() < 1e-3);
    }
}
