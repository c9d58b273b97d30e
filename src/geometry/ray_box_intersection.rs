use crate::geometry::{Ray, WorldBox};

pub trait RayIntersectionExt {
    /// Calculate first and last ray intersection with the box.
    /// Returns minimum and maximum distance along the ray; ray intersects iff min <= max.
    fn intersect(&self, ray: &Ray) -> (f32, f32);
}

impl RayIntersectionExt for WorldBox {
    fn intersect(&self, ray: &Ray) -> (f32, f32) {
        // Componentwise distances along the ray to the box's min and max corners.
        // The multiplication is NaN if the ray starts exactly on the slab boundary
        // and is parallel to it; blend those lanes to +-infinity so the range becomes
        // infinite along that axis instead of collapsing to NaN.
        let to_min = (self.min - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { f32::NEG_INFINITY } else { x });
        let to_max = (self.max - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { f32::INFINITY } else { x });

        let min_t = to_min.zip_map(&to_max, |a, b| a.min(b));
        let max_t = to_min.zip_map(&to_max, |a, b| a.max(b));

        let t_near = min_t.x.max(min_t.y).max(min_t.z);
        let t_far = max_t.x.min(max_t.y).min(max_t.z);

        (t_near, t_far)
    }
}
