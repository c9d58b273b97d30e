use std::f32::consts::PI;

use thiserror::Error;

use crate::geometry::WorldVector;
use crate::util::Rgba;

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("environment image has {expected} texels expected from its dimensions but {got} were supplied")]
    SizeMismatch { expected: usize, got: usize },
    #[error("environment image dimensions must be non-zero")]
    ZeroSized,
}

/// An equirectangular HDR environment map, or a constant ambient fallback
/// when no image is available.
#[derive(Clone, Debug)]
pub struct Environment {
    image: Option<EquirectangularImage>,
    /// Used as a tint on the environment image, or as the flat ambient color
    /// when no image is present.
    ambient: Rgba,
}

#[derive(Clone, Debug)]
struct EquirectangularImage {
    width: u32,
    height: u32,
    texels: Vec<Rgba>,
}

impl Environment {
    /// Constant ambient environment with no image.
    pub fn ambient(color: Rgba) -> Self {
        Environment {
            image: None,
            ambient: color,
        }
    }

    /// Equirectangular RGBA32F image, tinted by `tint`.
    pub fn with_image(
        width: u32,
        height: u32,
        texels: Vec<Rgba>,
        tint: Rgba,
    ) -> Result<Self, EnvironmentError> {
        if width == 0 || height == 0 {
            return Err(EnvironmentError::ZeroSized);
        }
        let expected = (width as usize) * (height as usize);
        if texels.len() != expected {
            return Err(EnvironmentError::SizeMismatch {
                expected,
                got: texels.len(),
            });
        }

        Ok(Environment {
            image: Some(EquirectangularImage {
                width,
                height,
                texels,
            }),
            ambient: tint,
        })
    }

    /// Re-checks the backing image's dimensions against its texel count.
    /// `with_image` already enforces this at construction; this is the hook
    /// a render-start check (`render()`) re-runs it through, in case an
    /// `Environment` ever reaches that point without having gone through
    /// `with_image`.
    pub fn validate(&self) -> Result<(), EnvironmentError> {
        let Some(image) = &self.image else {
            return Ok(());
        };
        if image.width == 0 || image.height == 0 {
            return Err(EnvironmentError::ZeroSized);
        }
        let expected = (image.width as usize) * (image.height as usize);
        if image.texels.len() != expected {
            return Err(EnvironmentError::SizeMismatch {
                expected,
                got: image.texels.len(),
            });
        }
        Ok(())
    }

    /// Samples the environment's radiance in a given (normalized) direction.
    pub fn sample_in_direction(&self, direction: &WorldVector) -> Rgba {
        let Some(image) = &self.image else {
            return self.ambient;
        };

        let phi = 0.5 + direction.z.atan2(direction.x) / (2.0 * PI);
        let theta = 0.5 + direction.y.clamp(-1.0, 1.0).asin() / PI;

        let tc_x = phi * image.width as f32;
        let tc_y = theta * image.height as f32;

        let base_x = tc_x.floor() as i64;
        let base_y = tc_y.floor() as i64;

        let du = tc_x - tc_x.floor();
        let dv = tc_y - tc_y.floor();

        let c00 = image.sample(base_x, base_y);
        let c10 = image.sample(base_x + 1, base_y);
        let c01 = image.sample(base_x, base_y + 1);
        let c11 = image.sample(base_x + 1, base_y + 1);

        let top = lerp(c00, c10, du);
        let bottom = lerp(c01, c11, du);

        mul(lerp(top, bottom, dv), self.ambient)
    }
}

impl EquirectangularImage {
    fn sample(&self, x: i64, y: i64) -> Rgba {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.texels[x + y * self.width as usize]
    }
}

fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
    Rgba::new(
        a.r + (b.r - a.r) * t,
        a.g + (b.g - a.g) * t,
        a.b + (b.b - a.b) * t,
        a.a + (b.a - a.a) * t,
    )
}

fn mul(a: Rgba, b: Rgba) -> Rgba {
    Rgba::new(a.r * b.r, a.g * b.g, a.b * b.b, a.a * b.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn ambient_fallback_ignores_direction() {
        let env = Environment::ambient(Rgba::new(0.5, 0.5, 0.5, 1.0));
        let a = env.sample_in_direction(&WorldVector::new(1.0, 0.0, 0.0));
        let b = env.sample_in_direction(&WorldVector::new(0.0, 1.0, 0.0));
        assert!(a.r == b.r && a.g == b.g && a.b == b.b);
    }

    #[test]
    fn validate_accepts_a_properly_constructed_image() {
        let env = Environment::with_image(4, 2, vec![Rgba::new(0.0, 0.0, 0.0, 1.0); 8], Rgba::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        assert!(env.validate().is_ok());
    }

    #[test]
    fn validate_accepts_ambient_only() {
        assert!(Environment::ambient(Rgba::new(0.5, 0.5, 0.5, 1.0)).validate().is_ok());
    }

    #[test]
    fn size_mismatch_rejected() {
        let err = Environment::with_image(2, 2, vec![Rgba::new(0.0, 0.0, 0.0, 1.0); 3], Rgba::new(1.0, 1.0, 1.0, 1.0));
        assert!(err.is_err());
    }

    #[test]
    fn constant_image_returns_constant_color() {
        let color = Rgba::new(0.25, 0.5, 0.75, 1.0);
        let env = Environment::with_image(4, 2, vec![color; 8], Rgba::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        let sample = env.sample_in_direction(&WorldVector::new(0.3, 0.6, -0.2).normalize());
        assert!((sample.r - color.r).abs() < 1e-5);
        assert!((sample.g - color.g).abs() < 1e-5);
        assert!((sample.b - color.b).abs() < 1e-5);
    }

    #[test]
    fn sampling_wraps_around_x_axis() {
        // Two directions related by a 2*pi rotation around Y must sample identically.
        let color_a = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let color_b = Rgba::new(0.0, 1.0, 0.0, 1.0);
        let mut texels = vec![color_a; 16];
        texels[8] = color_b;
        let env = Environment::with_image(8, 2, texels, Rgba::new(1.0, 1.0, 1.0, 1.0)).unwrap();

        let dir = WorldVector::new(1.0, 0.1, 0.0).normalize();
        let rotated = WorldVector::new(-dir.x, dir.y, -dir.z); // +2*pi equivalent via +pi twice on x/z plane
        let s1 = env.sample_in_direction(&dir);
        let s2 = env.sample_in_direction(&(-rotated));
        assert!((s1.r - s2.r).abs() < 1e-4);
    }
}
