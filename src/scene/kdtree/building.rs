use crate::geometry::{AABB, WorldBox};
use crate::scene::triangle::SceneTriangle;

use super::{INTERSECTION_COST, InnerNode, KdTree, LEAF_THRESHOLD, Leaf, NodeLink, TRAVERSAL_COST};

impl KdTree {
    /// Builds a tree over `triangles`, indexed by position in the slice.
    /// The returned tree borrows nothing; triangle indices are plain `u32`s
    /// into whatever slice the caller keeps around (see [`crate::scene::Scene`]).
    pub fn build(triangles: &[SceneTriangle]) -> KdTree {
        let bounding_box = AABB::from_points(
            triangles
                .iter()
                .flat_map(|t| t.positions.iter().copied()),
        )
        .unwrap_or_else(AABB::empty);

        let indices: Vec<u32> = (0..triangles.len() as u32).collect();
        let depth_budget = max_depth(triangles.len());

        let mut tree = KdTree {
            bounding_box,
            root: NodeLink::new_leaf(0),
            inner_nodes: Vec::new(),
            inner_boxes: Vec::new(),
            leaves: Vec::new(),
            leaf_boxes: Vec::new(),
        };
        tree.root = tree.build_recursive(triangles, indices, &bounding_box, 0, depth_budget);
        tree
    }

    fn build_recursive(
        &mut self,
        triangles: &[SceneTriangle],
        indices: Vec<u32>,
        bbox: &WorldBox,
        depth: u32,
        depth_budget: u32,
    ) -> NodeLink {
        if indices.len() <= LEAF_THRESHOLD || depth >= depth_budget {
            return self.push_leaf(indices, bbox);
        }

        let Some(split) = find_best_split(triangles, &indices, bbox) else {
            return self.push_leaf(indices, bbox);
        };

        let (left_indices, right_indices) = partition(triangles, &indices, split.axis, split.pos);
        if left_indices.is_empty() || right_indices.is_empty() {
            // Degenerate geometry (e.g. coincident triangles) that the SAH search
            // couldn't actually separate. Stop splitting rather than recurse forever.
            return self.push_leaf(indices, bbox);
        }

        let left_box = bbox.clipped(split.axis, split.pos, false);
        let right_box = bbox.clipped(split.axis, split.pos, true);

        let node_index = self.inner_nodes.len();
        self.inner_nodes.push(InnerNode {
            split_axis: split.axis,
            split_pos: split.pos,
            left: NodeLink::new_leaf(0),
            right: NodeLink::new_leaf(0),
        });
        self.inner_boxes.push(*bbox);

        let left = self.build_recursive(triangles, left_indices, &left_box, depth + 1, depth_budget);
        let right =
            self.build_recursive(triangles, right_indices, &right_box, depth + 1, depth_budget);

        self.inner_nodes[node_index].left = left;
        self.inner_nodes[node_index].right = right;

        NodeLink::new_inner(node_index)
    }

    fn push_leaf(&mut self, indices: Vec<u32>, bbox: &WorldBox) -> NodeLink {
        let link = NodeLink::new_leaf(self.leaves.len());
        self.leaves.push(Leaf {
            triangle_indices: indices,
        });
        self.leaf_boxes.push(*bbox);
        link
    }
}

/// Target maximum tree depth, following the common rule of thumb used by
/// SAH-based KD-tree builders: roughly `8 + 1.3*log2(n)` levels.
fn max_depth(triangle_count: usize) -> u32 {
    if triangle_count == 0 {
        return 0;
    }
    (8.0 + 1.3 * (triangle_count as f32).log2()).round().max(0.0) as u32
}

struct Split {
    axis: usize,
    pos: f32,
}

/// Evaluates every triangle-bounding-box face on each axis as a candidate
/// split plane and keeps the one with the lowest surface-area-heuristic
/// cost, provided it beats the cost of just leaving the node as a leaf.
/// Straddling triangles are counted on both sides of a candidate plane.
fn find_best_split(triangles: &[SceneTriangle], indices: &[u32], bbox: &WorldBox) -> Option<Split> {
    let parent_area = bbox.surface_area();
    if parent_area <= 0.0 {
        return None;
    }

    let mut best: Option<(Split, f32)> = None;

    for axis in 0..3 {
        for &idx in indices {
            let tri_box = triangles[idx as usize].bounding_box();
            for pos in [tri_box.min[axis], tri_box.max[axis]] {
                if pos <= bbox.min[axis] || pos >= bbox.max[axis] {
                    continue;
                }

                let mut left_count = 0u32;
                let mut right_count = 0u32;
                for &other in indices {
                    let other_box = triangles[other as usize].bounding_box();
                    if other_box.min[axis] < pos {
                        left_count += 1;
                    }
                    if other_box.max[axis] > pos {
                        right_count += 1;
                    }
                }

                let left_box = bbox.clipped(axis, pos, false);
                let right_box = bbox.clipped(axis, pos, true);
                let cost = TRAVERSAL_COST
                    + INTERSECTION_COST
                        * (left_box.surface_area() / parent_area * left_count as f32
                            + right_box.surface_area() / parent_area * right_count as f32);

                if best.as_ref().is_none_or(|(_, best_cost)| cost < *best_cost) {
                    best = Some((Split { axis, pos }, cost));
                }
            }
        }
    }

    let (split, cost) = best?;
    let leaf_cost = INTERSECTION_COST * indices.len() as f32;
    (cost < leaf_cost).then_some(split)
}

fn partition(
    triangles: &[SceneTriangle],
    indices: &[u32],
    axis: usize,
    pos: f32,
) -> (Vec<u32>, Vec<u32>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for &idx in indices {
        let bb = triangles[idx as usize].bounding_box();
        let in_left = bb.min[axis] < pos;
        let in_right = bb.max[axis] > pos;

        if in_left {
            left.push(idx);
        }
        if in_right {
            right.push(idx);
        }
        if !in_left && !in_right {
            // Zero-width box exactly on the plane: keep it somewhere.
            left.push(idx);
        }
    }

    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Triangle, WorldPoint};
    use assert2::assert;

    fn triangle_at(x: f32) -> SceneTriangle {
        SceneTriangle::flat(
            Triangle::new(
                WorldPoint::new(x, 0.0, 0.0),
                WorldPoint::new(x + 1.0, 0.0, 0.0),
                WorldPoint::new(x, 1.0, 0.0),
            ),
            0,
        )
    }

    #[test]
    fn empty_scene_builds_empty_leaf_root() {
        let tree = KdTree::build(&[]);
        assert!(tree.root.is_leaf());
        assert!(tree.inner_nodes.is_empty());
        assert!(tree.leaves[tree.root.index()].triangle_indices.is_empty());
    }

    #[test]
    fn single_triangle_is_a_leaf() {
        let triangles = vec![triangle_at(0.0)];
        let tree = KdTree::build(&triangles);
        assert!(tree.root.is_leaf());
        assert!(tree.leaves[tree.root.index()].triangle_indices == vec![0]);
    }

    #[test]
    fn many_spread_out_triangles_build_an_inner_node() {
        let triangles: Vec<_> = (0..64).map(|i| triangle_at(i as f32 * 10.0)).collect();
        let tree = KdTree::build(&triangles);
        assert!(!tree.root.is_leaf());
        assert!(!tree.inner_nodes.is_empty());
        assert!(tree.inner_nodes.len() == tree.inner_boxes.len());
        assert!(tree.leaves.len() == tree.leaf_boxes.len());
    }

    #[test]
    fn tree_covers_every_triangle_exactly_once_in_unsplit_leaves() {
        let triangles: Vec<_> = (0..20).map(|i| triangle_at(i as f32)).collect();
        let tree = KdTree::build(&triangles);

        let mut seen = vec![0u32; triangles.len()];
        let mut stack = vec![tree.root];
        while let Some(link) = stack.pop() {
            if link.is_leaf() {
                for &idx in &tree.leaves[link.index()].triangle_indices {
                    seen[idx as usize] += 1;
                }
            } else {
                let node = &tree.inner_nodes[link.index()];
                stack.push(node.left);
                stack.push(node.right);
            }
        }

        assert!(seen.iter().all(|&count| count >= 1));
    }

    #[test]
    fn every_inner_node_splits_within_its_own_box() {
        let triangles: Vec<_> = (0..64).map(|i| triangle_at(i as f32 * 10.0)).collect();
        let tree = KdTree::build(&triangles);

        for (node, node_box) in tree.inner_nodes.iter().zip(tree.inner_boxes.iter()) {
            assert!(node.split_pos >= node_box.min[node.split_axis]);
            assert!(node.split_pos <= node_box.max[node.split_axis]);
        }
    }
}
