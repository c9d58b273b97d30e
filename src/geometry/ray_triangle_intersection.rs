use crate::geometry::{BarycentricCoordinates, EPSILON, Ray, WorldPoint};

/// Result of a hit test between a ray and a single triangle.
#[derive(Copy, Clone, Debug)]
pub struct TriangleHit {
    pub t: f32,
    pub point: WorldPoint,
    pub barycentric: BarycentricCoordinates,
}

/// Calculates ray/triangle intersection using the Moller-Trumbore algorithm.
/// Triangle is double sided. Returns `None` if the ray misses, is parallel to
/// the triangle's plane, or hits behind its origin.
/// Adapted from <https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation>
pub fn ray_triangle_intersection(
    ray: &Ray,
    v0: &WorldPoint,
    e1: &nalgebra::Vector3<f32>,
    e2: &nalgebra::Vector3<f32>,
) -> Option<TriangleHit> {
    let direction = ray.direction.as_ref();

    let ray_cross_e2 = direction.cross(e2);
    let det = e1.dot(&ray_cross_e2);

    if det * det < EPSILON * EPSILON {
        return None; // Ray is parallel to the triangle.
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - v0;
    let u = inv_det * s.dot(&ray_cross_e2);
    if u < -EPSILON || u > 1.0 + EPSILON {
        return None;
    }

    let s_cross_e1 = s.cross(e1);
    let v = inv_det * direction.dot(&s_cross_e1);
    if v < -EPSILON || u + v > 1.0 + EPSILON {
        return None;
    }

    let t = inv_det * e2.dot(&s_cross_e1);
    if t < EPSILON {
        return None; // Triangle is behind the ray origin (or at it).
    }

    Some(TriangleHit {
        t,
        point: ray.point_at(t),
        barycentric: BarycentricCoordinates {
            w: 1.0 - u - v,
            u,
            v,
        },
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::WorldVector;
    use assert2::assert;

    fn triangle() -> (WorldPoint, WorldVector, WorldVector) {
        let v0 = WorldPoint::new(0.0, 0.0, 0.0);
        let v1 = WorldPoint::new(1.0, 0.0, 0.0);
        let v2 = WorldPoint::new(0.0, 1.0, 0.0);
        (v0, v1 - v0, v2 - v0)
    }

    #[test]
    fn hits_center() {
        let (v0, e1, e2) = triangle();
        let ray = Ray::new(
            WorldPoint::new(0.25, 0.25, 1.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        let hit = ray_triangle_intersection(&ray, &v0, &e1, &e2).expect("should hit");
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.barycentric.w + hit.barycentric.u + hit.barycentric.v - 1.0).abs() < 1e-4);
    }

    #[test]
    fn misses_outside_triangle() {
        let (v0, e1, e2) = triangle();
        let ray = Ray::new(
            WorldPoint::new(5.0, 5.0, 1.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        assert!(ray_triangle_intersection(&ray, &v0, &e1, &e2).is_none());
    }

    #[test]
    fn misses_parallel_ray() {
        let (v0, e1, e2) = triangle();
        let ray = Ray::new(
            WorldPoint::new(0.1, 0.1, 1.0),
            WorldVector::new(1.0, 0.0, 0.0),
        );
        assert!(ray_triangle_intersection(&ray, &v0, &e1, &e2).is_none());
    }

    #[test]
    fn misses_behind_origin() {
        let (v0, e1, e2) = triangle();
        let ray = Ray::new(
            WorldPoint::new(0.25, 0.25, -1.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        assert!(ray_triangle_intersection(&ray, &v0, &e1, &e2).is_none());
    }
}
