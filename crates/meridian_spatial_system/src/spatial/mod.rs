//! Spatial partitioning and querying for the Meridian simulation
//!
//! This module provides the region quadtree that answers "which simulated
//! objects are near this point/area?" in better than linear time, and the
//! tick-driven service that owns it. Collision detection, target
//! acquisition, area effects, and viewport culling all consume these
//! queries; none of them participate in the indexing algorithm itself.
//!
//! ## Rebuild model
//!
//! The tree is never maintained incrementally. Every cadence interval the
//! service discards the previous cycle's tree wholesale, re-inserts every
//! active object at its current position, and serves read-only queries
//! against that immutable snapshot until the next rebuild. Between rebuilds
//! query results are deliberately stale, trading freshness for CPU.

mod pool;
mod quadtree;
mod query;
mod service;

// Re-export public types and functions
pub use pool::{IndexedObject, ObjectPool};
pub use quadtree::{NodeStats, Quadrant, RegionIndex};
pub use query::QueryResult;
pub use service::SpatialIndexService;

/// Tuning constants for the spatial index.
///
/// These are the values the simulation ships with; tests construct trees
/// against them directly, so changing one is a behavioral change, not a
/// cosmetic one.
pub mod defaults {
    /// Maximum number of objects a leaf holds before it splits.
    pub const NODE_CAPACITY: usize = 8;

    /// Maximum subdivision depth. Leaves at this depth never split again;
    /// their object lists may grow without bound.
    pub const MAX_TREE_DEPTH: u8 = 8;

    /// Number of simulation ticks between full index rebuilds.
    pub const REBUILD_CADENCE_TICKS: u64 = 10;

    /// Distance between ray-march samples, in world units.
    pub const RAY_MARCH_STEP: f64 = 10.0;

    /// Probe radius around each ray-march sample. Probes at half the march
    /// step are tangent along the ray, so thin objects between two samples
    /// can be missed (tunneling).
    pub const RAY_PROBE_RADIUS: f64 = RAY_MARCH_STEP / 2.0;

    /// Number of pooled index entries pre-allocated at startup.
    pub const POOL_PREWARM: usize = 256;

    /// Half-extent used for objects that report no collision extent.
    pub const DEFAULT_HALF_EXTENT: f64 = 0.5;
}

/// Aggregate statistics for the spatial index service.
///
/// Refreshed at every rebuild boundary; serializable so debug overlays and
/// external tooling can consume it directly.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SpatialStats {
    /// Total full rebuilds performed since the service was created
    pub rebuild_count: u64,
    /// Tick at which the last rebuild happened
    pub last_rebuild_tick: u64,
    /// Number of objects indexed by the last rebuild
    pub objects_indexed: usize,
    /// Leaf nodes in the current tree
    pub leaf_nodes: usize,
    /// Internal (subdivided) nodes in the current tree
    pub internal_nodes: usize,
    /// Deepest node level in the current tree
    pub max_depth: u8,
}
