use std::collections::VecDeque;
use std::io::{self, Write};

use tabled::{Table, Tabled};

use crate::geometry::primitives::Aabb;

/// One node of a [`Bvh`].
///
/// A node is either a leaf, owning the object indices it bounds, or an
/// internal node, owning its two children. The enum itself rules out the
/// "mixed" node (objects *and* children, or neither) that a raw-pointer
/// representation has to check for at runtime.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf {
        bv: Aabb,
        objects: Vec<u32>,
    },
    Internal {
        bv: Aabb,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    #[inline]
    pub fn bv(&self) -> &Aabb {
        match self {
            Node::Leaf { bv, .. } => bv,
            Node::Internal { bv, .. } => bv,
        }
    }

    /// Object indices stored at this node, or `None` if it is an internal node.
    #[inline]
    pub fn objects(&self) -> Option<&[u32]> {
        match self {
            Node::Leaf { objects, .. } => Some(objects),
            Node::Internal { .. } => None,
        }
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        match self {
            Node::Leaf { objects, .. } => objects.len(),
            Node::Internal { .. } => 0,
        }
    }

    /// The two children of this node, or `None` if it is a leaf.
    #[inline]
    pub fn children(&self) -> Option<(&Node, &Node)> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { left, right, .. } => Some((left, right)),
        }
    }

    /// 0 at a leaf, `1 + max(child depths)` at an internal node.
    pub fn depth(&self) -> u32 {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Number of *nodes* (not objects) in the subtree rooted here, this node included.
    pub fn size(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => 1 + left.size() + right.size(),
        }
    }
}

/// Indexed bounding volume hierarchy over a caller-owned slice of [`Aabb`]s.
///
/// A `Bvh` does not own the objects it indexes, only a tree of [`Node`]s
/// referencing them by `u32` index. It supports three independent ways of
/// building/growing that tree: [`build_top_down`](Bvh::build_top_down),
/// [`build_bottom_up`](Bvh::build_bottom_up) and [`insert`](Bvh::insert).
///
/// ## Example
/// ```ignore
/// let mut bvh = Bvh::new();
/// bvh.build_top_down(&boxes, Bvh::UNBOUNDED_DEPTH);
/// bvh.traverse_level_order(|node| println!("{:?}", node.bv()));
/// ```
#[derive(Debug, Default)]
pub struct Bvh {
    root: Option<Node>,
}

impl Bvh {
    /// Passed as `max_depth` to disable the depth cap entirely.
    pub const UNBOUNDED_DEPTH: u32 = u32::MAX;

    pub fn new() -> Self {
        Self { root: None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Releases the tree, restoring the empty state.
    pub fn clear(&mut self) {
        self.root = None;
    }

    #[inline]
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// `-1` on an empty tree, else `root.depth()`.
    pub fn depth(&self) -> i64 {
        match &self.root {
            None => -1,
            Some(root) => root.depth() as i64,
        }
    }

    /// `0` on an empty tree, else `root.size()` (node count, not object count).
    pub fn size(&self) -> usize {
        match &self.root {
            None => 0,
            Some(root) => root.size(),
        }
    }

    ///
    /// Builds the tree from scratch using recursive top-down partitioning:
    /// split on the longest axis of the current bounding volume at its
    /// centroid, falling back to a median split (and finally a positional
    /// split) when every centroid lands on the same side. See `SPEC_FULL.md`
    /// §4.2 for the exact algorithm.
    ///
    /// Replaces any tree already present. `max_depth` bounds recursion depth;
    /// pass [`Bvh::UNBOUNDED_DEPTH`] for no cap. `bvs` may be empty, in which
    /// case the tree is left empty.
    ///
    pub fn build_top_down(&mut self, bvs: &[Aabb], max_depth: u32) {
        self.clear();

        if bvs.is_empty() {
            return;
        }

        let indices: Vec<u32> = (0..bvs.len() as u32).collect();
        self.root = Some(build_top_down_node(bvs, indices, 0, max_depth));
    }

    ///
    /// Builds the tree by repeatedly merging the pair of subtrees whose
    /// combined surface area is smallest, until a single root remains. See
    /// `SPEC_FULL.md` §4.3.
    ///
    /// Replaces any tree already present. There is no depth cap: the
    /// resulting depth falls out of the merge order. `bvs` may be empty.
    ///
    pub fn build_bottom_up(&mut self, bvs: &[Aabb]) {
        self.clear();

        if bvs.is_empty() {
            return;
        }

        let mut working: Vec<Node> = (0..bvs.len())
            .map(|i| Node::Leaf {
                bv: bvs[i],
                objects: vec![i as u32],
            })
            .collect();

        while working.len() > 1 {
            let (best_i, best_j) = cheapest_pair(&working);

            // Remove the higher index first so the lower one's position is unaffected.
            let b = working.remove(best_j);
            let a = working.remove(best_i);
            let bv = a.bv().union(b.bv());

            working.push(Node::Internal {
                bv,
                left: Box::new(a),
                right: Box::new(b),
            });
        }

        self.root = working.pop();
    }

    ///
    /// Adds one object to the tree, growing it by at most one internal node
    /// and one leaf. Descends by least bounding-volume enlargement, stopping
    /// at a leaf or at `max_depth`, then splits there and refits every
    /// ancestor on the way back up. See `SPEC_FULL.md` §4.4.
    ///
    /// If the tree was empty, the result is a single leaf holding `id`.
    ///
    pub fn insert(&mut self, bv: Aabb, id: u32, max_depth: u32) {
        self.root = Some(match self.root.take() {
            None => Node::Leaf {
                bv,
                objects: vec![id],
            },
            Some(root) => insert_into(root, bv, id, 0, max_depth),
        });
    }

    /// Visits every node of the whole tree in breadth-first order, parent
    /// before children, left child before right. No-op on an empty tree.
    pub fn traverse_level_order<F: FnMut(&Node)>(&self, visit: F) {
        if let Some(root) = &self.root {
            Self::traverse_from(root, visit);
        }
    }

    /// Breadth-first traversal starting at an arbitrary subtree, e.g. one
    /// obtained from [`Node::children`].
    pub fn traverse_from<F: FnMut(&Node)>(start: &Node, mut visit: F) {
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            visit(node);

            if let Some((left, right)) = node.children() {
                queue.push_back(left);
                queue.push_back(right);
            }
        }
    }

    /// Writes a human-readable, level-by-level dump of the tree to `sink`.
    /// Debugging aid only; the format is not normative.
    pub fn dump_info<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let root = match &self.root {
            None => return writeln!(sink, "(empty tree)"),
            Some(root) => root,
        };

        let mut rows = Vec::with_capacity(self.size());
        let mut queue = VecDeque::new();
        queue.push_back((root, 0usize));

        while let Some((node, level)) = queue.pop_front() {
            let bv = node.bv();

            rows.push(DumpRow {
                level,
                kind: if node.is_leaf() { "leaf" } else { "internal" },
                min: format!("{:?}", bv.get_min()),
                max: format!("{:?}", bv.get_max()),
                object_count: node.object_count(),
                objects: node
                    .objects()
                    .map(|objects| format!("{objects:?}"))
                    .unwrap_or_default(),
            });

            if let Some((left, right)) = node.children() {
                queue.push_back((left, level + 1));
                queue.push_back((right, level + 1));
            }
        }

        writeln!(sink, "{}", Table::new(rows))
    }
}

#[derive(Tabled)]
struct DumpRow {
    level: usize,
    kind: &'static str,
    min: String,
    max: String,
    object_count: usize,
    objects: String,
}

// --- top-down builder -------------------------------------------------------

fn build_top_down_node(bvs: &[Aabb], indices: Vec<u32>, depth: u32, max_depth: u32) -> Node {
    let bv = Aabb::union_indexed(bvs, &indices);

    if indices.len() <= 1 || depth == max_depth {
        return Node::Leaf { bv, objects: indices };
    }

    let axis = bv.longest_axis();
    let pivot = bv.centroid()[axis];

    let mut left = Vec::new();
    let mut right = Vec::new();

    for &i in &indices {
        if bvs[i as usize].centroid()[axis] <= pivot {
            left.push(i);
        } else {
            right.push(i);
        }
    }

    if left.is_empty() || right.is_empty() {
        let (median_left, median_right) = split_by_median_centroid(bvs, &indices, axis);
        left = median_left;
        right = median_right;

        if left.is_empty() || right.is_empty() {
            // Every centroid tied even after sorting; fall back to splitting
            // by position in the original working set.
            let mid = indices.len() / 2;
            left = indices[..mid].to_vec();
            right = indices[mid..].to_vec();
        }
    }

    let left_node = build_top_down_node(bvs, left, depth + 1, max_depth);
    let right_node = build_top_down_node(bvs, right, depth + 1, max_depth);
    let bv = left_node.bv().union(right_node.bv());

    Node::Internal {
        bv,
        left: Box::new(left_node),
        right: Box::new(right_node),
    }
}

fn split_by_median_centroid(bvs: &[Aabb], indices: &[u32], axis: usize) -> (Vec<u32>, Vec<u32>) {
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&a, &b| {
        let ca = bvs[a as usize].centroid()[axis];
        let cb = bvs[b as usize].centroid()[axis];
        ca.partial_cmp(&cb).unwrap()
    });

    let right = sorted.split_off(sorted.len() / 2);
    (sorted, right)
}

// --- bottom-up builder -------------------------------------------------------

/// Naive O(M^2) scan over the current working set for the pair with the
/// smallest merge cost, breaking ties by earliest `(i, j)` in ascending order.
fn cheapest_pair(working: &[Node]) -> (usize, usize) {
    let mut best = (0, 1, f32::INFINITY);

    for i in 0..working.len() {
        for j in (i + 1)..working.len() {
            let cost = working[i].bv().union(working[j].bv()).surface_area();

            if cost < best.2 {
                best = (i, j, cost);
            }
        }
    }

    (best.0, best.1)
}

// --- incremental inserter -------------------------------------------------------

fn insert_into(node: Node, bv: Aabb, id: u32, depth: u32, max_depth: u32) -> Node {
    match node {
        Node::Leaf { .. } => split_node(node, bv, id),
        Node::Internal { .. } if depth == max_depth => split_node(node, bv, id),
        Node::Internal { left, right, .. } => {
            let descend_left = choose_child(&left, &right, &bv);

            let (new_left, new_right) = if descend_left {
                (insert_into(*left, bv, id, depth + 1, max_depth), *right)
            } else {
                (*left, insert_into(*right, bv, id, depth + 1, max_depth))
            };

            let merged = new_left.bv().union(new_right.bv());

            Node::Internal {
                bv: merged,
                left: Box::new(new_left),
                right: Box::new(new_right),
            }
        }
    }
}

fn split_node(node: Node, bv: Aabb, id: u32) -> Node {
    let merged = node.bv().union(&bv);
    let sibling = Node::Leaf {
        bv,
        objects: vec![id],
    };

    Node::Internal {
        bv: merged,
        left: Box::new(node),
        right: Box::new(sibling),
    }
}

/// `true` to descend into `left`, per the least-enlargement heuristic: ties
/// broken by smaller current surface area, then by child index (left first).
fn choose_child(left: &Node, right: &Node, bv: &Aabb) -> bool {
    let left_enlargement = left.bv().union(bv).surface_area() - left.bv().surface_area();
    let right_enlargement = right.bv().union(bv).surface_area() - right.bv().surface_area();

    if left_enlargement != right_enlargement {
        return left_enlargement < right_enlargement;
    }

    let left_area = left.bv().surface_area();
    let right_area = right.bv().surface_area();

    if left_area != right_area {
        return left_area < right_area;
    }

    true
}
