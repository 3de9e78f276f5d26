use serde::{Deserialize, Serialize};

use brep_geometry::{BoundingBox, Point3d};

const LEAF_CAPACITY: usize = 16;
const MAX_DEPTH: usize = 24;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Restriction {
    p: Point3d,
    h: f64,
    layer: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    center: Point3d,
    half: f64,
    items: Vec<Restriction>,
    /// Either empty (leaf) or exactly 8 octants.
    children: Vec<Node>,
    /// Minimum restriction value in this subtree, for pruning.
    min_h: f64,
}

impl Node {
    fn new(center: Point3d, half: f64) -> Self {
        Self {
            center,
            half,
            items: Vec::new(),
            children: Vec::new(),
            min_h: f64::INFINITY,
        }
    }

    fn octant_of(&self, p: &Point3d) -> usize {
        (usize::from(p.x > self.center.x))
            | (usize::from(p.y > self.center.y) << 1)
            | (usize::from(p.z > self.center.z) << 2)
    }

    fn split(&mut self) {
        let h = self.half * 0.5;
        for oct in 0..8 {
            let dx = if oct & 1 != 0 { h } else { -h };
            let dy = if oct & 2 != 0 { h } else { -h };
            let dz = if oct & 4 != 0 { h } else { -h };
            self.children.push(Node::new(
                Point3d::new(self.center.x + dx, self.center.y + dy, self.center.z + dz),
                h,
            ));
        }
        for item in std::mem::take(&mut self.items) {
            let oct = self.octant_of(&item.p);
            self.children[oct].insert(item, MAX_DEPTH);
        }
    }

    fn insert(&mut self, item: Restriction, depth_budget: usize) {
        self.min_h = self.min_h.min(item.h);
        if self.children.is_empty() {
            if self.items.len() < LEAF_CAPACITY || depth_budget == 0 {
                self.items.push(item);
                return;
            }
            self.split();
        }
        let oct = self.octant_of(&item.p);
        self.children[oct].insert(item, depth_budget - 1);
    }

    /// Distance from `p` to this node's cube.
    fn dist_to_box(&self, p: &Point3d) -> f64 {
        let dx = ((p.x - self.center.x).abs() - self.half).max(0.0);
        let dy = ((p.y - self.center.y).abs() - self.half).max(0.0);
        let dz = ((p.z - self.center.z).abs() - self.half).max(0.0);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn query(&self, p: &Point3d, layer: i32, grading: f64, best: &mut f64) {
        if self.min_h + grading * self.dist_to_box(p) >= *best {
            return;
        }
        for item in &self.items {
            if item.layer != layer {
                continue;
            }
            let candidate = item.h + grading * item.p.distance_to(p);
            if candidate < *best {
                *best = candidate;
            }
        }
        for child in &self.children {
            child.query(p, layer, grading, best);
        }
    }
}

/// The local mesh-size field: an octree of point restrictions over the
/// model bounding box. A restriction `(p, h)` bounds the field by
/// `h + grading * |x - p|` around `p`, so composing restrictions by
/// minimum keeps the field Lipschitz with constant `grading` and makes
/// the result independent of insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalH {
    root: Node,
    grading: f64,
}

impl LocalH {
    pub fn new(bbox: &BoundingBox, grading: f64) -> Self {
        let center = bbox.center();
        let size = bbox.max - bbox.min;
        let half = 0.5 * size.x.max(size.y).max(size.z).max(1e-10);
        Self {
            root: Node::new(center, half),
            grading,
        }
    }

    pub fn grading(&self) -> f64 {
        self.grading
    }

    /// Restrict the field to at most `h` at `p` on the given layer.
    pub fn restrict(&mut self, p: Point3d, h: f64, layer: i32) {
        self.root.insert(Restriction { p, h, layer }, MAX_DEPTH);
    }

    /// Smallest restricted size at `p`, or `upper` if no restriction
    /// undercuts it.
    pub fn get_h(&self, p: &Point3d, layer: i32, upper: f64) -> f64 {
        let mut best = upper;
        self.root.query(p, layer, self.grading, &mut best);
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_field() -> LocalH {
        let bbox = BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0));
        LocalH::new(&bbox, 0.3)
    }

    #[test]
    fn test_unrestricted_returns_upper() {
        let field = unit_field();
        assert_eq!(field.get_h(&Point3d::new(0.5, 0.5, 0.5), 1, 2.0), 2.0);
    }

    #[test]
    fn test_restriction_applies_at_point() {
        let mut field = unit_field();
        field.restrict(Point3d::new(0.5, 0.5, 0.5), 0.1, 1);
        let h = field.get_h(&Point3d::new(0.5, 0.5, 0.5), 1, 2.0);
        assert!((h - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_grading_growth_away_from_restriction() {
        let mut field = unit_field();
        field.restrict(Point3d::ORIGIN, 0.1, 1);
        let h = field.get_h(&Point3d::new(1.0, 0.0, 0.0), 1, 2.0);
        assert!((h - (0.1 + 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_minimum_composition() {
        let mut field = unit_field();
        let q = Point3d::new(0.5, 0.5, 0.5);
        field.restrict(q, 0.4, 1);
        field.restrict(q, 0.2, 1);
        field.restrict(q, 0.3, 1);
        assert!((field.get_h(&q, 1, 2.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_layers_are_independent() {
        let mut field = unit_field();
        let q = Point3d::new(0.5, 0.5, 0.5);
        field.restrict(q, 0.1, 2);
        assert_eq!(field.get_h(&q, 1, 2.0), 2.0);
        assert!((field.get_h(&q, 2, 2.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_many_restrictions_split_leaves() {
        let mut field = unit_field();
        for i in 0..500 {
            let t = i as f64 / 499.0;
            field.restrict(Point3d::new(t, t * 0.5, 0.0), 0.5 + t, 1);
        }
        let h = field.get_h(&Point3d::ORIGIN, 1, 10.0);
        assert!((h - 0.5).abs() < 1e-12);
    }
}
