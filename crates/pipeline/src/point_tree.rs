use std::collections::HashMap;

use brep_geometry::{BoundingBox, Point3d};
use brep_mesh::PointIndex;

use crate::errors::MeshingError;

const MAX_DEPTH: usize = 24;
const LEAF_CAPACITY: usize = 8;

/// A bounded axis-aligned-box search tree.
#[derive(Debug, Clone)]
pub struct BoxTree {
    root: BoxNode,
}

#[derive(Debug, Clone)]
struct BoxNode {
    center: Point3d,
    half: f64,
    items: Vec<(BoundingBox, usize)>,
    /// Empty (leaf) or exactly 8 octants.
    children: Vec<BoxNode>,
}

impl BoxNode {
    fn new(center: Point3d, half: f64) -> Self {
        Self {
            center,
            half,
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Octant index if the box lies strictly on one side of every center
    /// plane, otherwise `None` (the box straddles this node).
    fn octant_of(&self, b: &BoundingBox) -> Option<usize> {
        let side = |lo: f64, hi: f64, c: f64| -> Option<usize> {
            if hi <= c {
                Some(0)
            } else if lo > c {
                Some(1)
            } else {
                None
            }
        };
        let sx = side(b.min.x, b.max.x, self.center.x)?;
        let sy = side(b.min.y, b.max.y, self.center.y)?;
        let sz = side(b.min.z, b.max.z, self.center.z)?;
        Some(sx | (sy << 1) | (sz << 2))
    }

    fn child_center(&self, oct: usize) -> Point3d {
        let h = self.half * 0.5;
        Point3d::new(
            self.center.x + if oct & 1 != 0 { h } else { -h },
            self.center.y + if oct & 2 != 0 { h } else { -h },
            self.center.z + if oct & 4 != 0 { h } else { -h },
        )
    }

    fn insert(&mut self, b: BoundingBox, id: usize, depth_budget: usize) {
        if self.children.is_empty() {
            if self.items.len() < LEAF_CAPACITY || depth_budget == 0 {
                self.items.push((b, id));
                return;
            }
            // split, pushing down everything that fits a single octant
            for oct in 0..8 {
                self.children
                    .push(BoxNode::new(self.child_center(oct), self.half * 0.5));
            }
            for (bb, bid) in std::mem::take(&mut self.items) {
                match self.octant_of(&bb) {
                    Some(oct) => self.children[oct].insert(bb, bid, depth_budget - 1),
                    None => self.items.push((bb, bid)),
                }
            }
        }
        match self.octant_of(&b) {
            Some(oct) => self.children[oct].insert(b, id, depth_budget - 1),
            None => self.items.push((b, id)),
        }
    }

    fn cube_intersects(&self, b: &BoundingBox) -> bool {
        b.min.x <= self.center.x + self.half
            && b.max.x >= self.center.x - self.half
            && b.min.y <= self.center.y + self.half
            && b.max.y >= self.center.y - self.half
            && b.min.z <= self.center.z + self.half
            && b.max.z >= self.center.z - self.half
    }

    fn get_intersecting(&self, b: &BoundingBox, out: &mut Vec<usize>) {
        for (bb, id) in &self.items {
            if bb.intersects(b) {
                out.push(*id);
            }
        }
        for child in &self.children {
            if child.cube_intersects(b) {
                child.get_intersecting(b, out);
            }
        }
    }
}

impl BoxTree {
    pub fn new(bbox: &BoundingBox) -> Self {
        let size = bbox.max - bbox.min;
        let half = 0.5 * size.x.max(size.y).max(size.z).max(1e-10);
        Self {
            root: BoxNode::new(bbox.center(), half),
        }
    }

    pub fn insert(&mut self, b: BoundingBox, id: usize) {
        self.root.insert(b, id, MAX_DEPTH);
    }

    pub fn get_intersecting(&self, b: &BoundingBox) -> Vec<usize> {
        let mut out = Vec::new();
        self.root.get_intersecting(b, &mut out);
        out
    }
}

/// Point lookup structure partitioned by a tag (an edge index, or -1 for
/// untagged points). Points are stored as degenerate boxes; lookups use a
/// tolerance box scaled to the model size.
pub struct PointTree {
    bounding_box: BoundingBox,
    eps: f64,
    trees: HashMap<i64, BoxTree>,
}

impl PointTree {
    pub fn new(bounding_box: BoundingBox) -> Self {
        let eps = 1e-8 * bounding_box.diam().max(1e-10);
        Self {
            bounding_box,
            eps,
            trees: HashMap::new(),
        }
    }

    /// Insert `p` under `tag`. Idempotent in `(p, id)`: re-inserting the
    /// same point with the same id is a no-op.
    pub fn insert(&mut self, p: Point3d, id: PointIndex, tag: i64) {
        let bbox = self.bounding_box;
        let tree = self
            .trees
            .entry(tag)
            .or_insert_with(|| BoxTree::new(&bbox));
        let probe = BoundingBox::new(
            Point3d::new(p.x - self.eps, p.y - self.eps, p.z - self.eps),
            Point3d::new(p.x + self.eps, p.y + self.eps, p.z + self.eps),
        );
        if tree.get_intersecting(&probe).contains(&id) {
            return;
        }
        tree.insert(BoundingBox::new(p, p), id);
    }

    /// First id stored at `p` under `tag`.
    pub fn find(&self, p: Point3d, tag: i64) -> Result<PointIndex, MeshingError> {
        let probe = BoundingBox::new(
            Point3d::new(p.x - self.eps, p.y - self.eps, p.z - self.eps),
            Point3d::new(p.x + self.eps, p.y + self.eps, p.z + self.eps),
        );
        self.trees
            .get(&tag)
            .map(|tree| tree.get_intersecting(&probe))
            .and_then(|hits| hits.first().copied())
            .ok_or(MeshingError::NotFound { point: p, tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bbox() -> BoundingBox {
        BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_find_inserted_point() {
        let mut tree = PointTree::new(unit_bbox());
        let p = Point3d::new(0.25, 0.5, 0.75);
        tree.insert(p, 7, -1);
        assert_eq!(tree.find(p, -1).unwrap(), 7);
    }

    #[test]
    fn test_find_respects_tags() {
        let mut tree = PointTree::new(unit_bbox());
        let p = Point3d::new(0.5, 0.5, 0.5);
        tree.insert(p, 3, 0);
        assert!(tree.find(p, 1).is_err());
        assert_eq!(tree.find(p, 0).unwrap(), 3);
    }

    #[test]
    fn test_missing_point_is_not_found() {
        let mut tree = PointTree::new(unit_bbox());
        tree.insert(Point3d::ORIGIN, 0, -1);
        let err = tree.find(Point3d::new(0.9, 0.9, 0.9), -1).unwrap_err();
        assert!(matches!(err, MeshingError::NotFound { .. }));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut tree = PointTree::new(unit_bbox());
        let p = Point3d::new(0.1, 0.2, 0.3);
        tree.insert(p, 4, -1);
        tree.insert(p, 4, -1);
        // a second distinct id at the same location is kept
        tree.insert(p, 9, -1);
        assert_eq!(tree.find(p, -1).unwrap(), 4);
    }

    #[test]
    fn test_box_tree_handles_many_boxes() {
        let mut tree = BoxTree::new(&unit_bbox());
        for i in 0..200 {
            let t = i as f64 / 199.0;
            let p = Point3d::new(t, t, t);
            tree.insert(BoundingBox::new(p, p), i);
        }
        let probe = BoundingBox::new(Point3d::new(0.4, 0.4, 0.4), Point3d::new(0.6, 0.6, 0.6));
        let hits = tree.get_intersecting(&probe);
        assert!(!hits.is_empty());
        assert!(hits.len() < 200);
    }
}
