//! Region quadtree over enemy bounding boxes
//!
//! Rebuilt from scratch every tick around the player. Nodes live in a flat
//! arena so clearing keeps the allocation for the next rebuild.

use glam::Vec2;

use crate::consts::QUADTREE_CAPACITY;

/// Deepest subdivision level (stacked enemies would otherwise split forever)
const MAX_DEPTH: u32 = 8;

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning `center ± half`
    pub fn centered(center: Vec2, half: Vec2) -> Self {
        Self::new(center.x - half.x, center.y - half.y, half.x * 2.0, half.y * 2.0)
    }

    /// Square box around a circle
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::centered(center, Vec2::splat(radius))
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Whether `other` lies fully inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    fn quadrants(&self) -> [Rect; 4] {
        let hw = self.w / 2.0;
        let hh = self.h / 2.0;
        [
            Rect::new(self.x + hw, self.y, hw, hh),
            Rect::new(self.x, self.y, hw, hh),
            Rect::new(self.x, self.y + hh, hw, hh),
            Rect::new(self.x + hw, self.y + hh, hw, hh),
        ]
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    bounds: Rect,
    depth: u32,
    items: Vec<(Rect, T)>,
    /// Index of the first of four consecutive children
    children: Option<usize>,
}

impl<T> Node<T> {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }
}

/// Quadtree answering rectangle range queries
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    nodes: Vec<Node<T>>,
    len: usize,
}

impl<T: Copy> SpatialIndex<T> {
    pub fn new(bounds: Rect) -> Self {
        Self {
            nodes: vec![Node::new(bounds, 0)],
            len: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.nodes[0].bounds
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry and keep the current root bounds
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].items.clear();
        self.nodes[0].children = None;
        self.len = 0;
    }

    /// Drop every entry and move the root to `bounds`
    pub fn reset(&mut self, bounds: Rect) {
        self.clear();
        self.nodes[0].bounds = bounds;
    }

    /// Insert an entry. Returns false (and stores nothing) if the box misses the root.
    pub fn insert(&mut self, rect: Rect, payload: T) -> bool {
        if !self.nodes[0].bounds.intersects(&rect) {
            return false;
        }

        let mut node = 0;
        while let Some(child) = self.child_for(node, &rect) {
            node = child;
        }

        self.nodes[node].items.push((rect, payload));
        self.len += 1;

        let n = &self.nodes[node];
        if n.children.is_none() && n.items.len() > QUADTREE_CAPACITY && n.depth < MAX_DEPTH {
            self.subdivide(node);
        }
        true
    }

    /// Child quadrant that fully contains `rect`, if the node is split
    fn child_for(&self, node: usize, rect: &Rect) -> Option<usize> {
        let first = self.nodes[node].children?;
        (first..first + 4).find(|&c| self.nodes[c].bounds.contains(rect))
    }

    fn subdivide(&mut self, node: usize) {
        let first = self.nodes.len();
        let depth = self.nodes[node].depth + 1;
        let quads = self.nodes[node].bounds.quadrants();
        for quad in quads {
            self.nodes.push(Node::new(quad, depth));
        }
        self.nodes[node].children = Some(first);

        // Push down whatever fits entirely in one quadrant; straddlers stay
        let items = std::mem::take(&mut self.nodes[node].items);
        for (rect, payload) in items {
            match self.child_for(node, &rect) {
                Some(child) => self.nodes[child].items.push((rect, payload)),
                None => self.nodes[node].items.push((rect, payload)),
            }
        }
    }

    /// Append every payload whose box intersects `range`
    pub fn query_into(&self, range: &Rect, out: &mut Vec<T>) {
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            // Root items may poke outside the root bounds, so never prune the root
            if idx != 0 && !node.bounds.intersects(range) {
                continue;
            }
            out.extend(node.items.iter().filter(|(r, _)| r.intersects(range)).map(|(_, p)| *p));
            if let Some(first) = node.children {
                stack.extend(first..first + 4);
            }
        }
    }

    pub fn query(&self, range: &Rect) -> Vec<T> {
        let mut out = Vec::new();
        self.query_into(range, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world() -> Rect {
        Rect::new(-500.0, -500.0, 1000.0, 1000.0)
    }

    #[test]
    fn test_insert_outside_root_is_rejected() {
        let mut tree: SpatialIndex<usize> = SpatialIndex::new(world());
        assert!(!tree.insert(Rect::new(900.0, 900.0, 10.0, 10.0), 0));
        assert!(tree.is_empty());
        assert!(tree.insert(Rect::new(495.0, 0.0, 10.0, 10.0), 1));
        assert_eq!(tree.query(&Rect::new(502.0, 2.0, 2.0, 2.0)), vec![1]);
    }

    #[test]
    fn test_subdivides_past_capacity() {
        let mut tree = SpatialIndex::new(world());
        for i in 0..20 {
            let p = Vec2::new(-400.0 + i as f32 * 40.0, 100.0);
            tree.insert(Rect::around(p, 5.0), i);
        }
        assert_eq!(tree.len(), 20);
        assert!(tree.nodes.len() > 1);

        let hits = tree.query(&Rect::around(Vec2::new(-400.0, 100.0), 10.0));
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_straddler_stays_in_parent() {
        let mut tree = SpatialIndex::new(world());
        for i in 0..5 {
            tree.insert(Rect::around(Vec2::new(200.0 + i as f32, 200.0), 2.0), i);
        }
        // Sits on the vertical split line
        tree.insert(Rect::around(Vec2::new(0.0, 200.0), 8.0), 99);
        assert!(tree.nodes[0].items.iter().any(|(_, p)| *p == 99));
        assert_eq!(tree.query(&Rect::around(Vec2::new(3.0, 200.0), 1.0)), vec![99]);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut tree = SpatialIndex::new(world());
        for i in 0..10 {
            tree.insert(Rect::around(Vec2::new(i as f32 * 10.0, 0.0), 2.0), i);
        }
        tree.reset(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(tree.is_empty());
        assert!(tree.query(&world()).is_empty());
        assert!(!tree.insert(Rect::around(Vec2::new(-50.0, -50.0), 2.0), 0));
    }

    #[test]
    fn test_identical_boxes_do_not_split_forever() {
        let mut tree = SpatialIndex::new(world());
        for i in 0..200 {
            tree.insert(Rect::around(Vec2::new(10.0, 10.0), 1.0), i);
        }
        assert_eq!(tree.query(&Rect::around(Vec2::new(10.0, 10.0), 1.0)).len(), 200);
    }

    proptest! {
        #[test]
        fn prop_query_has_no_false_negatives(
            boxes in prop::collection::vec((-520.0f32..520.0, -520.0f32..520.0, 1.0f32..60.0), 0..120),
            q in (-520.0f32..520.0, -520.0f32..520.0, 1.0f32..300.0, 1.0f32..300.0),
        ) {
            let mut tree = SpatialIndex::new(world());
            let mut stored = Vec::new();
            for (i, (x, y, s)) in boxes.iter().enumerate() {
                let rect = Rect::new(*x, *y, *s, *s);
                if tree.insert(rect, i) {
                    stored.push((rect, i));
                }
            }

            let range = Rect::new(q.0, q.1, q.2, q.3);
            let mut got = tree.query(&range);
            got.sort_unstable();
            let mut expected: Vec<usize> = stored
                .iter()
                .filter(|(r, _)| r.intersects(&range))
                .map(|(_, i)| *i)
                .collect();
            expected.sort_unstable();
            prop_assert_eq!(got, expected);
        }
    }
}
