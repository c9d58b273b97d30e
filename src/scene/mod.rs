mod kdtree;
mod triangle;

use std::{fs, path::Path};

use indexmap::IndexMap;
use thiserror::Error;

use crate::environment::Environment;
use crate::geometry::{Intersection, Ray, Triangle as GeometryTriangle, TexturePoint, WorldBox, WorldPoint, WorldVector};
use crate::material::Material;

use kdtree::KdTree;
pub use triangle::SceneTriangle;

/// A collection of triangles, their materials, a spatial index over them,
/// and the environment rays see when they escape the scene entirely.
#[derive(Clone, Debug)]
pub struct Scene {
    triangles: Vec<SceneTriangle>,
    materials: Vec<Material>,
    kdtree: KdTree,
    pub environment: Environment,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read mesh file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse mesh file: {0}")]
    Parse(#[from] wavefront_obj::ParseError),
}

impl Scene {
    pub fn new(triangles: Vec<SceneTriangle>, materials: Vec<Material>, environment: Environment) -> Self {
        let kdtree = KdTree::build(&triangles);
        Scene {
            triangles,
            materials,
            kdtree,
            environment,
        }
    }

    /// Loads a single-material triangle mesh from a Wavefront OBJ file. Every
    /// triangle is assigned `material`; `.mtl` material libraries are not
    /// consulted.
    pub fn from_obj(
        path: impl AsRef<Path>,
        material: Material,
        environment: Environment,
    ) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path)?;
        let parsed = wavefront_obj::obj::parse(content)?;
        let triangles = load_obj_triangles(parsed);
        Ok(Self::new(triangles, vec![material], environment))
    }

    pub fn bounding_box(&self) -> WorldBox {
        self.triangles
            .iter()
            .map(|t| t.bounding_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(WorldBox::empty)
    }

    /// Finds the closest intersection between `ray` and the scene's geometry.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let hit = self.kdtree.intersect(ray, &self.triangles)?;
        Some(Intersection {
            t: hit.t,
            point: ray.point_at(hit.t),
            triangle_index: hit.triangle_index,
            barycentric: hit.barycentric,
        })
    }

    pub fn material(&self, triangle_index: u32) -> &Material {
        let index = self.triangles[triangle_index as usize].material as usize;
        &self.materials[index]
    }

    pub fn shading_normal(&self, intersection: &Intersection) -> WorldVector {
        self.triangles[intersection.triangle_index as usize].shading_normal(&intersection.barycentric)
    }
}

fn load_obj_triangles(obj: wavefront_obj::obj::ObjSet) -> Vec<SceneTriangle> {
    let mut triangles = Vec::new();

    for object in obj.objects {
        let mut vertex_cache: IndexMap<(usize, Option<usize>, Option<usize>), VertexData> =
            IndexMap::new();

        let mut resolve = |key: (usize, Option<usize>, Option<usize>)| -> VertexData {
            *vertex_cache.entry(key).or_insert_with(|| {
                let v = &object.vertices[key.0];
                let tex = key.1.map(|i| &object.tex_vertices[i]);
                let normal = key.2.map(|i| &object.normals[i]);
                VertexData {
                    pos: WorldPoint::new(v.x as f32, v.y as f32, v.z as f32),
                    tex: tex.map_or_else(TexturePoint::origin, |t| TexturePoint::new(t.u as f32, t.v as f32)),
                    normal: normal.map(|n| WorldVector::new(n.x as f32, n.y as f32, n.z as f32).normalize()),
                }
            })
        };

        for geometry in object.geometry {
            for shape in geometry.shapes {
                let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive else {
                    tracing::debug!("skipping non-triangle primitive while loading mesh");
                    continue;
                };

                let [va, vb, vc] = [resolve(a), resolve(b), resolve(c)];
                let positions = GeometryTriangle::new(va.pos, vb.pos, vc.pos);

                let triangle = match (va.normal, vb.normal, vc.normal) {
                    (Some(na), Some(nb), Some(nc)) => {
                        SceneTriangle::new(positions, GeometryTriangle::new(na, nb, nc), 0)
                    }
                    _ => SceneTriangle::flat(positions, 0),
                };
                triangles.push(triangle);
            }
        }
    }

    triangles
}

struct VertexData {
    pos: WorldPoint,
    tex: TexturePoint,
    normal: Option<WorldVector>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WorldVector as Vec3;
    use assert2::assert;

    fn single_triangle_scene() -> Scene {
        let positions = GeometryTriangle::new(
            WorldPoint::new(-1.0, -1.0, 0.0),
            WorldPoint::new(1.0, -1.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        );
        let triangle = SceneTriangle::flat(positions, 0);
        Scene::new(
            vec![triangle],
            vec![Material::diffuse(
                crate::util::Rgba::new(1.0, 1.0, 1.0, 1.0),
                crate::util::Rgba::new(0.0, 0.0, 0.0, 0.0),
            )],
            Environment::ambient(crate::util::Rgba::new(0.1, 0.1, 0.1, 1.0)),
        )
    }

    #[test]
    fn intersects_the_one_triangle_it_contains() {
        let scene = single_triangle_scene();
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.intersect(&ray).expect("should hit the triangle");
        assert!((hit.t - 5.0).abs() < 1e-4);
        assert!(hit.triangle_index == 0);
    }

    #[test]
    fn misses_when_ray_passes_beside_triangle() {
        let scene = single_triangle_scene();
        let ray = Ray::new(WorldPoint::new(10.0, 10.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray).is_none());
    }

    #[test]
    fn material_lookup_resolves_through_triangle_index() {
        let scene = single_triangle_scene();
        match scene.material(0) {
            Material::Diffuse { .. } => {}
            _ => panic!("expected a diffuse material"),
        }
    }
}
