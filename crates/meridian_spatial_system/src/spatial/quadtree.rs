//! Region quadtree over pooled index entries.
//!
//! Nodes live in an arena addressed by integer handles and are rebuilt from
//! scratch every cadence cycle; there is no incremental maintenance of a
//! live tree. "No children yet" is a type-level state ([`NodeKind::Leaf`])
//! rather than a null check, and objects whose bounds straddle a midline
//! stay at the ancestor level instead of being duplicated into children.

use super::defaults;
use super::pool::{EntryId, ObjectPool};
use super::query::QueryResult;
use crate::types::{Aabb, ObjectId, Vec2};
use crate::SpatialError;
use std::collections::HashSet;
use tracing::warn;

/// Handle to a node in the current cycle's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The root is always the first node pushed after a clear.
const ROOT: NodeId = NodeId(0);

/// One of the four equal quadrants of a node's territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    /// Top-left
    NorthWest = 0,
    /// Top-right
    NorthEast = 1,
    /// Bottom-left
    SouthWest = 2,
    /// Bottom-right
    SouthEast = 3,
}

impl Quadrant {
    /// All quadrants in child-slot order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    /// Child-slot index for this quadrant.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The territory this quadrant covers within `parent`.
    pub fn child_bounds(self, parent: Aabb) -> Aabb {
        let mid = parent.center();
        match self {
            Quadrant::NorthWest => {
                Aabb::new(Vec2::new(parent.min.x, mid.y), Vec2::new(mid.x, parent.max.y))
            }
            Quadrant::NorthEast => Aabb::new(mid, parent.max),
            Quadrant::SouthWest => Aabb::new(parent.min, mid),
            Quadrant::SouthEast => {
                Aabb::new(Vec2::new(mid.x, parent.min.y), Vec2::new(parent.max.x, mid.y))
            }
        }
    }

    /// The single quadrant of `parent` that fully contains `aabb`, or `None`
    /// when the box spans a midline or lies outside `parent` entirely.
    ///
    /// `None` is the "no single quadrant" sentinel: callers keep the object
    /// at the current level. It is never an error.
    pub fn containing(parent: Aabb, aabb: Aabb) -> Option<Quadrant> {
        Self::ALL
            .into_iter()
            .find(|quadrant| quadrant.child_bounds(parent).contains(aabb))
    }
}

/// Leaf-versus-internal state of a node.
#[derive(Debug)]
enum NodeKind {
    /// Undivided node holding its objects directly.
    Leaf { objects: Vec<EntryId> },
    /// Subdivided node: four child handles plus the objects that straddle
    /// its midlines and therefore fit no single child.
    Internal {
        children: [NodeId; 4],
        straddlers: Vec<EntryId>,
    },
}

/// A node in the region tree.
#[derive(Debug)]
struct RegionNode {
    depth: u8,
    bounds: Aabb,
    kind: NodeKind,
}

impl RegionNode {
    fn leaf(depth: u8, bounds: Aabb) -> Self {
        Self {
            depth,
            bounds,
            kind: NodeKind::Leaf {
                objects: Vec::new(),
            },
        }
    }
}

/// Structural statistics for the current tree.
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    /// Objects held across every node
    pub total_objects: usize,
    /// Deepest node level present
    pub max_depth: u8,
    /// Nodes without children
    pub leaf_nodes: usize,
    /// Subdivided nodes
    pub internal_nodes: usize,
}

/// The region tree facade: owns the node arena, the pooled entry allocator,
/// and the world bounds.
///
/// Rebuilt wholesale by its owning service every cadence interval — callers
/// [`clear`](RegionIndex::clear) it, re-[`insert`](RegionIndex::insert)
/// every active object, and then run read-only queries against the result.
///
/// # Examples
///
/// ```rust
/// use meridian_spatial_system::{Aabb, ObjectId, ObjectPool, RegionIndex, Vec2};
///
/// let bounds = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 1000.0));
/// let mut index = RegionIndex::new(bounds, ObjectPool::prewarmed())?;
///
/// let id = ObjectId::new();
/// let position = Vec2::new(250.0, 250.0);
/// index.insert(id, position, Aabb::enclosing_circle(position, 1.0));
///
/// let hits = index.query_radius(Vec2::new(250.0, 250.0), 5.0);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].id, id);
/// # Ok::<(), meridian_spatial_system::SpatialError>(())
/// ```
#[derive(Debug)]
pub struct RegionIndex {
    bounds: Aabb,
    nodes: Vec<RegionNode>,
    pool: ObjectPool,
}

impl RegionIndex {
    /// Creates an index covering `bounds`, taking ownership of the injected
    /// entry pool.
    ///
    /// Zero or negative world extent is the one fatal configuration error in
    /// the system and is surfaced here.
    pub fn new(bounds: Aabb, pool: ObjectPool) -> Result<Self, SpatialError> {
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            return Err(SpatialError::InvalidWorldBounds {
                width: bounds.width(),
                height: bounds.height(),
            });
        }
        Ok(Self {
            bounds,
            nodes: vec![RegionNode::leaf(0, bounds)],
            pool,
        })
    }

    /// The world bounds this index covers.
    pub fn world_bounds(&self) -> Aabb {
        self.bounds
    }

    /// Discards the node tree and releases every pooled entry.
    ///
    /// Arena and pool storage are retained, so steady-state rebuild cycles
    /// reuse the previous cycle's allocations wholesale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(RegionNode::leaf(0, self.bounds));
        self.pool.release_all();
    }

    /// Pulls a pooled entry for the object and inserts it into the tree.
    ///
    /// Objects whose bounds fall outside the world never fit a child
    /// quadrant and accumulate at the root instead of being dropped; every
    /// query visits the root's own list, so they remain reachable.
    pub fn insert(&mut self, id: ObjectId, position: Vec2, aabb: Aabb) {
        let entry = self.pool.acquire(id, position, aabb);
        self.insert_at(ROOT, entry);
    }

    fn insert_at(&mut self, start: NodeId, entry: EntryId) {
        let aabb = self.pool.get(entry).aabb;
        let mut node_id = start;
        loop {
            let node = &mut self.nodes[node_id.index()];
            let bounds = node.bounds;
            let depth = node.depth;
            match &mut node.kind {
                NodeKind::Internal {
                    children,
                    straddlers,
                } => {
                    if let Some(quadrant) = Quadrant::containing(bounds, aabb) {
                        node_id = children[quadrant.index()];
                    } else {
                        straddlers.push(entry);
                        return;
                    }
                }
                NodeKind::Leaf { objects } => {
                    objects.push(entry);
                    let count = objects.len();
                    if count > defaults::NODE_CAPACITY && depth < defaults::MAX_TREE_DEPTH {
                        self.split(node_id);
                    }
                    return;
                }
            }
        }
    }

    /// Converts a leaf into an internal node with four children covering its
    /// equal quadrants, then redistributes every held object that now fits
    /// cleanly into one child. Redistribution re-enters the insertion path,
    /// so an overfull child splits in turn until the depth limit.
    fn split(&mut self, node_id: NodeId) {
        let (bounds, depth) = {
            let node = &self.nodes[node_id.index()];
            (node.bounds, node.depth)
        };

        let mut children = [ROOT; 4];
        for quadrant in Quadrant::ALL {
            let child = NodeId(self.nodes.len() as u32);
            self.nodes
                .push(RegionNode::leaf(depth + 1, quadrant.child_bounds(bounds)));
            children[quadrant.index()] = child;
        }

        let node = &mut self.nodes[node_id.index()];
        debug_assert!(matches!(node.kind, NodeKind::Leaf { .. }));
        let previous = std::mem::replace(
            &mut node.kind,
            NodeKind::Internal {
                children,
                straddlers: Vec::new(),
            },
        );
        if let NodeKind::Leaf { objects } = previous {
            for entry in objects {
                self.insert_at(node_id, entry);
            }
        }
    }

    fn retrieve_into(&self, node_id: NodeId, query: Aabb, out: &mut Vec<EntryId>) {
        let node = &self.nodes[node_id.index()];
        match &node.kind {
            NodeKind::Leaf { objects } => out.extend_from_slice(objects),
            NodeKind::Internal {
                children,
                straddlers,
            } => {
                // Straddlers are appended without a per-object overlap test;
                // the candidate set is a superset, never a subset.
                out.extend_from_slice(straddlers);
                for &child in children {
                    if self.nodes[child.index()].bounds.intersects(query) {
                        self.retrieve_into(child, query, out);
                    }
                }
            }
        }
    }

    /// Rectangle query with candidate-superset semantics.
    ///
    /// Guarantees no false negatives: any object whose bounding box is
    /// covered by `query` appears in the result. The candidate set is the
    /// union of every visited node's list and is not post-filtered, so it
    /// may also include objects that merely share a node with the query
    /// area.
    pub fn query(&self, query: Aabb) -> Vec<ObjectId> {
        let mut candidates = Vec::new();
        self.retrieve_into(ROOT, query, &mut candidates);
        candidates
            .into_iter()
            .map(|entry| self.pool.get(entry).id)
            .collect()
    }

    /// Radius query with exact circular membership.
    ///
    /// Prefilters through the enclosing square of the circle, then keeps
    /// only candidates whose position lies within `radius` of `center`:
    /// zero false positives and zero false negatives. A non-positive radius
    /// yields an empty result rather than a fault.
    pub fn query_radius(&self, center: Vec2, radius: f64) -> Vec<QueryResult> {
        if radius <= 0.0 {
            return Vec::new();
        }
        if radius.is_infinite() {
            warn!("unbounded radius query will scan the entire index");
        }

        let mut candidates = Vec::new();
        self.retrieve_into(ROOT, Aabb::enclosing_circle(center, radius), &mut candidates);

        let radius_sq = radius * radius;
        let mut results = Vec::with_capacity(candidates.len());
        for entry in candidates {
            let object = self.pool.get(entry);
            let distance_sq = object.position.distance_squared(center);
            if distance_sq <= radius_sq {
                results.push(QueryResult {
                    id: object.id,
                    position: object.position,
                    distance: distance_sq.sqrt(),
                });
            }
        }
        results
    }

    /// The single object within `max_radius` of `point` minimizing Euclidean
    /// distance, or `None` when no candidate qualifies.
    pub fn find_nearest(&self, point: Vec2, max_radius: f64) -> Option<QueryResult> {
        self.find_nearest_matching(point, max_radius, |_| true)
    }

    /// Like [`RegionIndex::find_nearest`] with a caller predicate applied
    /// before the distance comparison. Non-matching candidates are skipped,
    /// never treated as errors.
    pub fn find_nearest_matching<F>(
        &self,
        point: Vec2,
        max_radius: f64,
        predicate: F,
    ) -> Option<QueryResult>
    where
        F: Fn(ObjectId) -> bool,
    {
        let mut best: Option<QueryResult> = None;
        for candidate in self.query_radius(point, max_radius) {
            if !predicate(candidate.id) {
                continue;
            }
            match &best {
                Some(current) if candidate.distance >= current.distance => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// Approximate ray query: marches sample points along the ray at a fixed
    /// step and unions a radius probe at each sample, deduplicating by id in
    /// march order.
    ///
    /// Probes are tangent along the ray, so a thin object sitting between
    /// two samples can be missed (tunneling). That is the documented
    /// contract of this query, not a defect; callers needing exact
    /// line-of-sight must run their own narrow test on the results. A zero
    /// direction or a distance that is not a positive finite number yields
    /// an empty result.
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f64) -> Vec<ObjectId> {
        let mut hits = Vec::new();
        if max_distance <= 0.0 || !max_distance.is_finite() {
            return hits;
        }
        let Some(dir) = direction.normalized() else {
            return hits;
        };

        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut travelled = 0.0;
        loop {
            let sample = Vec2::new(
                origin.x + dir.x * travelled,
                origin.y + dir.y * travelled,
            );
            for result in self.query_radius(sample, defaults::RAY_PROBE_RADIUS) {
                if seen.insert(result.id) {
                    hits.push(result.id);
                }
            }
            if travelled >= max_distance {
                break;
            }
            travelled = (travelled + defaults::RAY_MARCH_STEP).min(max_distance);
        }
        hits
    }

    /// Recursive object count across the whole tree.
    ///
    /// Used to verify that a rebuild dropped nothing: after inserting N
    /// objects this always reports N, regardless of insertion order.
    pub fn total_object_count(&self) -> usize {
        self.count_at(ROOT)
    }

    fn count_at(&self, node_id: NodeId) -> usize {
        let node = &self.nodes[node_id.index()];
        match &node.kind {
            NodeKind::Leaf { objects } => objects.len(),
            NodeKind::Internal {
                children,
                straddlers,
            } => {
                let mut count = straddlers.len();
                for &child in children {
                    count += self.count_at(child);
                }
                count
            }
        }
    }

    /// Structural statistics for the current tree.
    pub fn node_stats(&self) -> NodeStats {
        let mut stats = NodeStats::default();
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Leaf { objects } => {
                    stats.leaf_nodes += 1;
                    stats.total_objects += objects.len();
                }
                NodeKind::Internal { straddlers, .. } => {
                    stats.internal_nodes += 1;
                    stats.total_objects += straddlers.len();
                }
            }
            stats.max_depth = stats.max_depth.max(node.depth);
        }
        stats
    }

    /// Bounds of every live node, for debug visualization overlays.
    pub fn node_boundaries(&self) -> Vec<Aabb> {
        self.nodes.iter().map(|node| node.bounds).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Aabb {
        Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 1000.0))
    }

    fn index() -> RegionIndex {
        RegionIndex::new(world(), ObjectPool::prewarmed()).unwrap()
    }

    fn point_aabb(position: Vec2) -> Aabb {
        Aabb::new(position, position)
    }

    #[test]
    fn test_invalid_world_bounds_rejected() {
        let degenerate = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 100.0));
        assert!(RegionIndex::new(degenerate, ObjectPool::prewarmed()).is_err());

        let inverted = Aabb::new(Vec2::new(100.0, 100.0), Vec2::new(0.0, 0.0));
        assert!(RegionIndex::new(inverted, ObjectPool::prewarmed()).is_err());
    }

    #[test]
    fn test_capacity_alone_does_not_split() {
        let mut index = index();
        let position = Vec2::new(100.0, 100.0);
        for _ in 0..defaults::NODE_CAPACITY {
            index.insert(ObjectId::new(), position, point_aabb(position));
        }

        let stats = index.node_stats();
        assert_eq!(stats.internal_nodes, 0, "8 objects must not trigger a split");
        assert_eq!(stats.leaf_nodes, 1);
    }

    #[test]
    fn test_overfull_node_splits_and_keeps_every_object() {
        // Scenario A: nine zero-size objects at the same point.
        let mut index = index();
        let position = Vec2::new(100.0, 100.0);
        let ids: Vec<ObjectId> = (0..9).map(|_| ObjectId::new()).collect();
        for &id in &ids {
            index.insert(id, position, point_aabb(position));
        }

        let stats = index.node_stats();
        assert!(stats.internal_nodes > 0, "a split must have occurred");

        let found = index.query(world());
        assert_eq!(found.len(), 9);
        for id in ids {
            assert!(found.contains(&id));
        }
    }

    #[test]
    fn test_split_cascades_stop_at_max_depth() {
        let mut index = index();
        let position = Vec2::new(3.0, 3.0);
        for _ in 0..50 {
            index.insert(ObjectId::new(), position, point_aabb(position));
        }

        let stats = index.node_stats();
        assert_eq!(stats.max_depth, defaults::MAX_TREE_DEPTH);
        // The deepest leaf holds far more than capacity and never splits.
        assert_eq!(index.total_object_count(), 50);
    }

    #[test]
    fn test_conservation_across_insertion_orders() {
        let positions: Vec<Vec2> = (0..40)
            .map(|i| Vec2::new((i * 97 % 1000) as f64, (i * 31 % 1000) as f64))
            .collect();

        let mut forward = index();
        for &p in &positions {
            forward.insert(ObjectId::new(), p, Aabb::enclosing_circle(p, 2.0));
        }
        let mut reverse = index();
        for &p in positions.iter().rev() {
            reverse.insert(ObjectId::new(), p, Aabb::enclosing_circle(p, 2.0));
        }

        assert_eq!(forward.total_object_count(), positions.len());
        assert_eq!(reverse.total_object_count(), positions.len());
    }

    #[test]
    fn test_range_query_has_no_false_negatives() {
        let mut index = index();
        let mut inside = Vec::new();
        for i in 0..30 {
            let p = Vec2::new((i * 53 % 1000) as f64, (i * 211 % 1000) as f64);
            let id = ObjectId::new();
            index.insert(id, p, Aabb::enclosing_circle(p, 1.0));
            if p.x >= 200.0 && p.x <= 800.0 && p.y >= 200.0 && p.y <= 800.0 {
                inside.push(id);
            }
        }

        let query = Aabb::new(Vec2::new(199.0, 199.0), Vec2::new(801.0, 801.0));
        let found = index.query(query);
        for id in inside {
            assert!(found.contains(&id), "object fully inside the query rect was missed");
        }
    }

    #[test]
    fn test_radius_query_exact_membership() {
        // Scenario B: distance 99 is in, distance 101 is out.
        let mut index = index();
        let center = Vec2::new(500.0, 500.0);
        let near = ObjectId::new();
        let far = ObjectId::new();
        index.insert(near, Vec2::new(599.0, 500.0), point_aabb(Vec2::new(599.0, 500.0)));
        index.insert(far, Vec2::new(601.0, 500.0), point_aabb(Vec2::new(601.0, 500.0)));

        let results = index.query_radius(center, 100.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, near);
        assert!((results[0].distance - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_query_never_returns_beyond_radius() {
        let mut index = index();
        for i in 0..60 {
            let p = Vec2::new((i * 17 % 1000) as f64, (i * 73 % 1000) as f64);
            index.insert(ObjectId::new(), p, Aabb::enclosing_circle(p, 3.0));
        }

        let center = Vec2::new(480.0, 480.0);
        for result in index.query_radius(center, 150.0) {
            assert!(result.distance <= 150.0);
            assert!(result.position.distance(center) <= 150.0);
        }
    }

    #[test]
    fn test_non_positive_radius_yields_empty() {
        let mut index = index();
        let p = Vec2::new(500.0, 500.0);
        index.insert(ObjectId::new(), p, point_aabb(p));

        assert!(index.query_radius(p, 0.0).is_empty());
        assert!(index.query_radius(p, -5.0).is_empty());
        assert!(index.find_nearest(p, 0.0).is_none());
    }

    #[test]
    fn test_straddler_stays_at_ancestor_level() {
        let mut index = index();
        // Force a subdivision in one corner first.
        let corner = Vec2::new(100.0, 100.0);
        for _ in 0..9 {
            index.insert(ObjectId::new(), corner, point_aabb(corner));
        }

        // This box spans the vertical and horizontal midlines of the world.
        let straddler = ObjectId::new();
        let center = Vec2::new(500.0, 500.0);
        index.insert(straddler, center, Aabb::enclosing_circle(center, 10.0));

        // A query nowhere near the straddler still sees it, because it sits
        // in the root's own list which every query scans.
        let far_corner = Aabb::new(Vec2::new(990.0, 990.0), Vec2::new(999.0, 999.0));
        assert!(index.query(far_corner).contains(&straddler));
        assert_eq!(index.total_object_count(), 10);
    }

    #[test]
    fn test_out_of_bounds_objects_are_never_dropped() {
        let mut index = index();
        let outside = Vec2::new(5000.0, 5000.0);
        let id = ObjectId::new();
        index.insert(id, outside, Aabb::enclosing_circle(outside, 1.0));

        assert_eq!(index.total_object_count(), 1);
        let query = Aabb::new(Vec2::new(4000.0, 4000.0), Vec2::new(6000.0, 6000.0));
        assert!(index.query(query).contains(&id));
    }

    #[test]
    fn test_find_nearest_minimizes_distance() {
        let mut index = index();
        let ids: Vec<(ObjectId, f64)> = [30.0, 10.0, 20.0]
            .iter()
            .map(|&x| {
                let id = ObjectId::new();
                let p = Vec2::new(x, 0.0);
                index.insert(id, p, point_aabb(p));
                (id, x)
            })
            .collect();

        let nearest = index.find_nearest(Vec2::new(0.0, 0.0), 100.0).unwrap();
        assert_eq!(nearest.id, ids[1].0);
        assert!((nearest.distance - 10.0).abs() < 1e-9);

        // Out of range of every candidate.
        assert!(index.find_nearest(Vec2::new(0.0, 500.0), 50.0).is_none());
    }

    #[test]
    fn test_find_nearest_matching_applies_predicate() {
        let mut index = index();
        let close = ObjectId::new();
        let farther = ObjectId::new();
        index.insert(close, Vec2::new(10.0, 0.0), point_aabb(Vec2::new(10.0, 0.0)));
        index.insert(farther, Vec2::new(25.0, 0.0), point_aabb(Vec2::new(25.0, 0.0)));

        let result = index
            .find_nearest_matching(Vec2::new(0.0, 0.0), 100.0, |id| id != close)
            .unwrap();
        assert_eq!(result.id, farther);

        assert!(index
            .find_nearest_matching(Vec2::new(0.0, 0.0), 100.0, |_| false)
            .is_none());
    }

    #[test]
    fn test_clear_releases_entries_and_resets_tree() {
        let mut index = index();
        for i in 0..20 {
            let p = Vec2::new((i * 47 % 1000) as f64, (i * 13 % 1000) as f64);
            index.insert(ObjectId::new(), p, Aabb::enclosing_circle(p, 1.0));
        }
        assert_eq!(index.total_object_count(), 20);

        index.clear();
        assert_eq!(index.total_object_count(), 0);
        assert!(index.query(world()).is_empty());

        let stats = index.node_stats();
        assert_eq!(stats.leaf_nodes, 1);
        assert_eq!(stats.internal_nodes, 0);
    }

    #[test]
    fn test_unbounded_radius_scans_everything() {
        let mut index = index();
        for i in 0..15 {
            let p = Vec2::new((i * 61 % 1000) as f64, (i * 149 % 1000) as f64);
            index.insert(ObjectId::new(), p, Aabb::enclosing_circle(p, 1.0));
        }

        let results = index.query_radius(Vec2::new(500.0, 500.0), f64::INFINITY);
        assert_eq!(results.len(), 15);
    }

    #[test]
    fn test_node_boundaries_cover_subdivisions() {
        let mut index = index();
        assert_eq!(index.node_boundaries().len(), 1);

        let position = Vec2::new(100.0, 100.0);
        for _ in 0..9 {
            index.insert(ObjectId::new(), position, point_aabb(position));
        }
        let boundaries = index.node_boundaries();
        assert!(boundaries.len() > 1);
        assert_eq!(boundaries[0], world());
    }
}
