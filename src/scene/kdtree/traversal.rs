use arrayvec::ArrayVec;

use crate::geometry::{Ray, RayIntersectionExt as _, ray_triangle_intersection};
use crate::scene::triangle::SceneTriangle;

use super::{KdTree, KdTreeHit, NodeLink, TRAVERSAL_STACK_SIZE};

impl KdTree {
    /// Finds the closest triangle `ray` hits, if any. `triangles` must be the
    /// same slice (by index) the tree was [`built`](KdTree::build) from.
    ///
    /// Traversal walks a single split plane per inner node (the classic
    /// KD-tree algorithm): the plane at `split_axis`/`split_pos` cuts the
    /// current `[t_min, t_max]` ray interval into a near sub-range and a far
    /// sub-range, the near child is visited first, and the far child is
    /// pushed on the stack only when the ray's interval actually straddles
    /// the plane.
    pub fn intersect(&self, ray: &Ray, triangles: &[SceneTriangle]) -> Option<KdTreeHit> {
        let (root_t_near, root_t_far) = self.bounding_box.intersect(ray);
        if root_t_near > root_t_far || root_t_far < 0.0 {
            return None;
        }

        let mut stack: ArrayVec<(NodeLink, f32, f32), TRAVERSAL_STACK_SIZE> = ArrayVec::new();
        let mut current = (self.root, root_t_near.max(0.0), root_t_far);
        let mut best: Option<KdTreeHit> = None;

        loop {
            let (link, t_min, t_max) = current;

            if best.as_ref().is_some_and(|hit| t_min > hit.t) {
                // Nothing inside this node's ray interval can beat the best hit so far.
            } else if link.is_leaf() {
                let leaf = &self.leaves[link.index()];
                for &idx in &leaf.triangle_indices {
                    let tri = &triangles[idx as usize];
                    let Some(hit) =
                        ray_triangle_intersection(ray, &tri.positions[0], &tri.edge1, &tri.edge2)
                    else {
                        continue;
                    };

                    if best.as_ref().is_none_or(|b| hit.t < b.t) {
                        best = Some(KdTreeHit {
                            t: hit.t,
                            triangle_index: idx,
                            barycentric: hit.barycentric,
                        });
                    }
                }
            } else {
                let node = &self.inner_nodes[link.index()];
                let axis = node.split_axis;
                let t_split = (node.split_pos - ray.origin[axis]) * ray.inv_direction[axis];

                let (near, far) = if ray.origin[axis] < node.split_pos {
                    (node.left, node.right)
                } else {
                    (node.right, node.left)
                };

                if t_split.is_nan() || t_split > t_max || t_split <= 0.0 {
                    current = (near, t_min, t_max);
                    continue;
                } else if t_split < t_min {
                    current = (far, t_min, t_max);
                    continue;
                } else {
                    stack.try_push((far, t_split, t_max)).ok();
                    current = (near, t_min, t_split);
                    continue;
                }
            }

            match stack.pop() {
                Some(next) => current = next,
                None => break,
            }
        }

        best
    }
}
