//! # Meridian Spatial System
//!
//! Spatial indexing and proximity queries for the Meridian simulation
//! ecosystem. This crate owns the recursive 2D region tree that answers
//! "which simulated objects are near this point/area?" in better than
//! linear time, and the tick-driven service every other system queries
//! through.
//!
//! ## Architecture
//!
//! The system is built leaf-first from four pieces:
//!
//! - [`IndexedObject`] - pooled record pairing an object id with the
//!   position and bounding box it had at the last rebuild
//! - `RegionNode` - arena-allocated tree node implementing insertion,
//!   splitting, and region retrieval (internal to [`RegionIndex`])
//! - [`RegionIndex`] - the tree facade: range, radius, nearest-neighbor,
//!   nearest-matching, and ray-march queries
//! - [`SpatialIndexService`] - the tick-driven owner: cadence rebuilds,
//!   broad-phase pair extraction, debug accounting
//!
//! ## Rebuild-over-maintenance
//!
//! The tree is rebuilt wholesale on a fixed tick cadence instead of being
//! maintained incrementally. Every rebuild clears the index (returning
//! pooled entries), re-inserts every active object, and then serves
//! read-only queries until the next rebuild. Queries between rebuilds are
//! deliberately stale by up to one cadence interval.
//!
//! ## Quick Start
//!
//! ```rust
//! use meridian_spatial_system::{Aabb, ObjectId, ObjectState, SpatialIndexService, Vec2};
//!
//! // One service per simulated world, sized to its bounds.
//! let bounds = Aabb::new(Vec2::new(-500.0, -500.0), Vec2::new(500.0, 500.0));
//! let mut service = SpatialIndexService::new(bounds)?;
//!
//! // Each tick, hand the service every active object's current state.
//! let objects = vec![
//!     ObjectState::new(ObjectId::new(), Vec2::new(10.0, 20.0)),
//!     ObjectState::new(ObjectId::new(), Vec2::new(-40.0, 7.5)),
//! ];
//! service.update(&objects);
//!
//! // Consumers query through the service.
//! let nearby = service.query_radius(Vec2::new(0.0, 0.0), 50.0);
//! let pairs = service.broad_phase_pairs();
//! assert!(nearby.len() <= 2);
//! assert!(pairs.len() <= 1);
//! # Ok::<(), meridian_spatial_system::SpatialError>(())
//! ```
//!
//! ## What this crate is not
//!
//! No 3D indexing, no incremental tree maintenance, no swept-volume
//! collision, and no thread-safe concurrent mutation: the service is
//! single-threaded and synchronous, driven by one simulation tick loop.
//! Rendering, AI decisions, economy, and persistence consume query results
//! but live elsewhere.

pub mod spatial;
pub mod types;

pub use spatial::{
    defaults, IndexedObject, NodeStats, ObjectPool, Quadrant, QueryResult, RegionIndex,
    SpatialIndexService, SpatialStats,
};
pub use types::{Aabb, ObjectId, ObjectState, Vec2};

/// Errors that can occur while configuring the spatial system.
///
/// Query paths never produce errors: absence of results is an empty
/// collection or `None`. The only fatal condition is a world configured
/// with no usable area, surfaced at index construction.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// World bounds with zero or negative extent cannot host a region tree
    #[error("invalid world bounds: {width}x{height} extent must be positive")]
    InvalidWorldBounds {
        /// East-west extent of the rejected bounds
        width: f64,
        /// North-south extent of the rejected bounds
        height: f64,
    },
}
