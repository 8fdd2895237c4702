//! Tick-driven ownership of the region index.
//!
//! [`SpatialIndexService`] is the sole API surface other systems see. It
//! rebuilds the index on a fixed cadence rather than every tick, derives
//! deduplicated broad-phase collision candidate pairs, and exposes the
//! read-only query set. It owns no gameplay logic.

use super::defaults;
use super::pool::ObjectPool;
use super::quadtree::RegionIndex;
use super::query::QueryResult;
use super::SpatialStats;
use crate::types::{Aabb, ObjectId, ObjectState, Vec2};
use crate::SpatialError;
use std::collections::HashSet;
use tracing::debug;

/// Tick-driven owner of the spatial index.
///
/// Call [`update`](SpatialIndexService::update) once per simulation tick
/// with every active object's current state. Only every Kth tick (default
/// K = 10) triggers a full clear-and-reinsert rebuild; the other ticks are
/// no-ops for the index, so queries in between serve positions up to K−1
/// ticks stale. That staleness is a deliberate CPU-versus-freshness
/// tradeoff, not an oversight.
///
/// # Examples
///
/// ```rust
/// use meridian_spatial_system::{Aabb, ObjectId, ObjectState, SpatialIndexService, Vec2};
///
/// let bounds = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 1000.0));
/// let mut service = SpatialIndexService::new(bounds)?;
///
/// let objects = vec![ObjectState::new(ObjectId::new(), Vec2::new(10.0, 10.0))];
/// service.update(&objects);
///
/// assert_eq!(service.total_object_count(), 1);
/// # Ok::<(), meridian_spatial_system::SpatialError>(())
/// ```
#[derive(Debug)]
pub struct SpatialIndexService {
    index: RegionIndex,
    cadence: u64,
    ticks: u64,
    /// Object states captured at the last rebuild; pair extraction and the
    /// staleness contract both read from here, never from live positions.
    snapshot: Vec<ObjectState>,
    collidable: HashSet<ObjectId>,
    node_boundaries: Vec<Aabb>,
    stats: SpatialStats,
}

impl SpatialIndexService {
    /// Creates a service over `world_bounds` with the default rebuild
    /// cadence ([`defaults::REBUILD_CADENCE_TICKS`]).
    pub fn new(world_bounds: Aabb) -> Result<Self, SpatialError> {
        Self::with_cadence(world_bounds, defaults::REBUILD_CADENCE_TICKS)
    }

    /// Creates a service with an explicit rebuild cadence. A cadence of 0 is
    /// clamped to 1 (rebuild every tick).
    ///
    /// The entry pool is constructed here and injected into the index, which
    /// owns it from then on; nothing in the system reaches for ambient
    /// state.
    pub fn with_cadence(world_bounds: Aabb, cadence: u64) -> Result<Self, SpatialError> {
        let index = RegionIndex::new(world_bounds, ObjectPool::prewarmed())?;
        Ok(Self {
            index,
            cadence: cadence.max(1),
            ticks: 0,
            snapshot: Vec::new(),
            collidable: HashSet::new(),
            node_boundaries: Vec::new(),
            stats: SpatialStats::default(),
        })
    }

    /// Advances the service by one simulation tick.
    ///
    /// Rebuilds the index from `objects` when the tick counter lands on the
    /// cadence (tick 0 included); otherwise does nothing, leaving queries to
    /// serve the previous snapshot.
    pub fn update(&mut self, objects: &[ObjectState]) {
        let tick = self.ticks;
        self.ticks += 1;
        if tick % self.cadence == 0 {
            self.rebuild(tick, objects);
        }
    }

    fn rebuild(&mut self, tick: u64, objects: &[ObjectState]) {
        self.index.clear();
        self.collidable.clear();
        for state in objects {
            self.index.insert(state.id, state.position, state.aabb());
            if state.collidable {
                self.collidable.insert(state.id);
            }
        }
        self.snapshot.clear();
        self.snapshot.extend_from_slice(objects);
        self.node_boundaries = self.index.node_boundaries();

        let nodes = self.index.node_stats();
        self.stats.rebuild_count += 1;
        self.stats.last_rebuild_tick = tick;
        self.stats.objects_indexed = objects.len();
        self.stats.leaf_nodes = nodes.leaf_nodes;
        self.stats.internal_nodes = nodes.internal_nodes;
        self.stats.max_depth = nodes.max_depth;

        debug!(
            tick,
            objects = objects.len(),
            leaves = nodes.leaf_nodes,
            max_depth = nodes.max_depth,
            "rebuilt spatial index"
        );
    }

    /// Deduplicated broad-phase collision candidate pairs.
    ///
    /// For every collidable object in the last rebuild snapshot, queries its
    /// own bounding box and pairs it with every collidable candidate whose
    /// id is higher, yielding canonical (min, max) pairs with no self-pairs
    /// and no duplicates. The exact narrow-phase shape test is the
    /// consumer's responsibility.
    pub fn broad_phase_pairs(&self) -> Vec<(ObjectId, ObjectId)> {
        let mut pairs = Vec::new();
        let mut seen: HashSet<(ObjectId, ObjectId)> = HashSet::new();
        for state in self.snapshot.iter().filter(|state| state.collidable) {
            for candidate in self.index.query(state.aabb()) {
                if candidate <= state.id || !self.collidable.contains(&candidate) {
                    continue;
                }
                let pair = (state.id, candidate);
                if seen.insert(pair) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }

    /// Rectangle query against the last rebuild snapshot. See
    /// [`RegionIndex::query`].
    pub fn query(&self, bounds: Aabb) -> Vec<ObjectId> {
        self.index.query(bounds)
    }

    /// Radius query with exact circular membership. See
    /// [`RegionIndex::query_radius`].
    pub fn query_radius(&self, center: Vec2, radius: f64) -> Vec<QueryResult> {
        self.index.query_radius(center, radius)
    }

    /// Nearest object within `max_radius`, or `None`. See
    /// [`RegionIndex::find_nearest`].
    pub fn find_nearest(&self, point: Vec2, max_radius: f64) -> Option<QueryResult> {
        self.index.find_nearest(point, max_radius)
    }

    /// Nearest object satisfying `predicate` within `max_radius`, or
    /// `None`. See [`RegionIndex::find_nearest_matching`].
    pub fn find_nearest_matching<F>(
        &self,
        point: Vec2,
        max_radius: f64,
        predicate: F,
    ) -> Option<QueryResult>
    where
        F: Fn(ObjectId) -> bool,
    {
        self.index.find_nearest_matching(point, max_radius, predicate)
    }

    /// Approximate ray-march query. See [`RegionIndex::raycast`].
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f64) -> Vec<ObjectId> {
        self.index.raycast(origin, direction, max_distance)
    }

    /// Objects currently held by the index.
    pub fn total_object_count(&self) -> usize {
        self.index.total_object_count()
    }

    /// Rebuild cadence in ticks.
    pub fn rebuild_cadence(&self) -> u64 {
        self.cadence
    }

    /// Ticks observed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Aggregate statistics as of the last rebuild.
    pub fn stats(&self) -> &SpatialStats {
        &self.stats
    }

    /// Node boundaries captured at the last rebuild, for debug overlays.
    pub fn node_boundaries(&self) -> &[Aabb] {
        &self.node_boundaries
    }
}
