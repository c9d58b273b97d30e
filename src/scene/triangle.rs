use crate::geometry::{AABB, BarycentricCoordinates, Triangle, WorldBox, WorldPoint, WorldVector};

/// A scene-space triangle with precomputed edge vectors, ready for fast ray
/// intersection and KD-tree building.
#[derive(Clone, Debug)]
pub struct SceneTriangle {
    pub positions: Triangle<WorldPoint>,
    pub normals: Triangle<WorldVector>,
    pub material: u32,

    pub edge1: WorldVector,
    pub edge2: WorldVector,
    pub area: f32,

    // Precomputed barycentric-projection constants (see `barycentric_of`
    // below), so per-ray hit-point barycentrics are a handful of dot
    // products rather than a full linear solve each time.
    d00: f32,
    d01: f32,
    d11: f32,
    inv_denom: f32,
}

impl SceneTriangle {
    pub fn new(positions: Triangle<WorldPoint>, normals: Triangle<WorldVector>, material: u32) -> Self {
        let [edge1, edge2] = positions.edges();
        let area = 0.5 * edge1.cross(&edge2).norm();

        let d00 = edge1.dot(&edge1);
        let d01 = edge1.dot(&edge2);
        let d11 = edge2.dot(&edge2);
        let denom = d00 * d11 - d01 * d01;
        let inv_denom = if denom.abs() > 1e-12 { 1.0 / denom } else { 0.0 };

        SceneTriangle {
            positions,
            normals,
            material,
            edge1,
            edge2,
            area,
            d00,
            d01,
            d11,
            inv_denom,
        }
    }

    /// Barycentric coordinates of an arbitrary point `p` relative to this
    /// triangle, via the standard edge-dot-product projection (grounded on
    /// `raytraceobjects.h`'s `barycentric()`). `p` need not lie in the
    /// triangle's plane; it is projected onto it first.
    pub fn barycentric_of(&self, p: &WorldPoint) -> BarycentricCoordinates {
        let v2 = p - self.positions[0];
        let d20 = v2.dot(&self.edge1);
        let d21 = v2.dot(&self.edge2);
        let v = (self.d11 * d20 - self.d01 * d21) * self.inv_denom;
        let w = (self.d00 * d21 - self.d01 * d20) * self.inv_denom;
        let u = 1.0 - v - w;
        BarycentricCoordinates { w: u, u: v, v: w }
    }

    /// Triangle with a single flat normal taken from its geometric face normal,
    /// used when the source mesh carries no per-vertex normals.
    pub fn flat(positions: Triangle<WorldPoint>, material: u32) -> Self {
        let [edge1, edge2] = positions.edges();
        let normal = edge1.cross(&edge2).normalize();
        Self::new(positions, Triangle::new(normal, normal, normal), material)
    }

    pub fn bounding_box(&self) -> WorldBox {
        AABB::from_points(self.positions.iter().copied()).expect("a triangle always has 3 vertices")
    }

    /// Interpolated, renormalized shading normal at the given barycentric coordinates.
    pub fn shading_normal(&self, barycentric: &BarycentricCoordinates) -> WorldVector {
        barycentric.interpolate_triangle(&self.normals).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    fn unit_triangle() -> SceneTriangle {
        let positions = Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 0.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        );
        SceneTriangle::flat(positions, 0)
    }

    #[test]
    fn flat_triangle_has_face_normal_at_every_vertex() {
        let tri = unit_triangle();
        let bary = BarycentricCoordinates {
            w: 0.2,
            u: 0.3,
            v: 0.5,
        };
        let n = tri.shading_normal(&bary);
        assert!((n - WorldVector::new(0.0, 0.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn barycentric_of_vertices_is_one_hot() {
        let tri = unit_triangle();
        let b0 = tri.barycentric_of(&tri.positions[0]);
        assert!((b0.w - 1.0).abs() < 1e-5 && b0.u.abs() < 1e-5 && b0.v.abs() < 1e-5);

        let b1 = tri.barycentric_of(&tri.positions[1]);
        assert!((b1.u - 1.0).abs() < 1e-5 && b1.w.abs() < 1e-5 && b1.v.abs() < 1e-5);
    }

    #[test]
    fn barycentric_of_centroid_is_uniform() {
        let tri = unit_triangle();
        let centroid = tri.positions[0]
            + (tri.positions[1] - tri.positions[0]) / 3.0
            + (tri.positions[2] - tri.positions[0]) / 3.0;
        let b = tri.barycentric_of(&centroid);
        assert!((b.w - 1.0 / 3.0).abs() < 1e-5);
        assert!((b.u - 1.0 / 3.0).abs() < 1e-5);
        assert!((b.v - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn area_of_unit_right_triangle_is_one_half() {
        let tri = unit_triangle();
        assert!((tri.area - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bounding_box_covers_all_vertices() {
        let tri = unit_triangle();
        let bb = tri.bounding_box();
        assert!(bb.min.x <= 0.0 && bb.min.y <= 0.0);
        assert!(bb.max.x >= 1.0 && bb.max.y >= 1.0);
    }
}
