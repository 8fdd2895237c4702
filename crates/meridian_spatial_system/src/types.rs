//! # Core Type Definitions
//!
//! This module contains the fundamental types used throughout the Meridian
//! Spatial System. These types provide the building blocks for world-space
//! geometry, object identity, and the per-tick object descriptions handed to
//! the indexing service.
//!
//! ## Key Types
//!
//! - [`ObjectId`] - Unique identifier for simulated objects
//! - [`Vec2`] - 2D world-space position with double precision
//! - [`Aabb`] - Axis-aligned bounding box used as a cheap overlap proxy
//! - [`ObjectState`] - Per-tick description of one active simulation object
//!
//! ## Design Principles
//!
//! - **Type Safety**: The id wrapper prevents confusion with other id kinds
//! - **Precision**: Double-precision floats for accurate large-world positioning
//! - **Serialization**: All types support JSON serialization for tooling and
//!   debug visualization exports
//! - **Geometry Only**: Nothing in this module knows about object semantics

use crate::spatial::defaults;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Unique identifier for a simulated object.
///
/// This is a wrapper around UUID that provides type safety and a total order,
/// which the broad-phase pair extraction relies on for canonical
/// (min, max) pair identity.
///
/// # Examples
///
/// ```rust
/// use meridian_spatial_system::ObjectId;
///
/// // Create a new random object ID
/// let object_id = ObjectId::new();
///
/// // Convert to string for logging/display
/// println!("Object ID: {}", object_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Creates a new random object ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an object ID from a string representation.
    ///
    /// Returns `Err(uuid::Error)` with details about the parsing failure when
    /// the string is not a valid UUID.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Represents a 2D position in the simulated world.
///
/// Uses double-precision floating point for maximum accuracy in position
/// calculations. This is essential for large worlds where single-precision
/// would introduce noticeable errors far from the origin.
///
/// # Examples
///
/// ```rust
/// use meridian_spatial_system::Vec2;
///
/// let origin = Vec2::new(0.0, 0.0);
/// let target = Vec2::new(100.5, -200.25);
/// let d = origin.distance(target);
/// assert!(d > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate (east-west axis)
    pub x: f64,
    /// Y coordinate (north-south axis)
    pub y: f64,
}

impl Vec2 {
    /// Creates a new position with the specified coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: Vec2) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance to another position.
    ///
    /// Prefer this over [`Vec2::distance`] in hot filtering loops; comparing
    /// squared distances against a squared radius avoids the square root.
    pub fn distance_squared(&self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Vector length.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns the unit-length vector pointing the same way, or `None` for a
    /// zero-length vector.
    pub fn normalized(&self) -> Option<Vec2> {
        let len = self.length();
        if len > 0.0 {
            Some(Vec2::new(self.x / len, self.y / len))
        } else {
            None
        }
    }
}

/// Axis-aligned bounding box in world space.
///
/// Used as a cheap overlap proxy throughout the spatial index: node
/// territories, object extents, and query rectangles are all `Aabb`s.
/// Overlap and containment tests treat edges as inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner (west/south boundary)
    pub min: Vec2,
    /// Maximum corner (east/north boundary)
    pub max: Vec2,
}

impl Aabb {
    /// Creates a bounding box from its minimum and maximum corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box centered on `center` extending `half_extent`
    /// in each direction.
    pub fn from_center_half_extents(center: Vec2, half_extent: Vec2) -> Self {
        Self {
            min: Vec2::new(center.x - half_extent.x, center.y - half_extent.y),
            max: Vec2::new(center.x + half_extent.x, center.y + half_extent.y),
        }
    }

    /// The smallest box enclosing a circle. With an infinite radius this
    /// produces an infinite box that intersects everything, which is how an
    /// unbounded radius query degrades to a full scan.
    pub fn enclosing_circle(center: Vec2, radius: f64) -> Self {
        Self::from_center_half_extents(center, Vec2::new(radius, radius))
    }

    /// Box width (east-west extent).
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Box height (north-south extent).
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center point of the box.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Edge-inclusive overlap test against another box.
    pub fn intersects(&self, other: Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Edge-inclusive test for whether this box fully contains another.
    pub fn contains(&self, other: Aabb) -> bool {
        self.min.x <= other.min.x
            && self.max.x >= other.max.x
            && self.min.y <= other.min.y
            && self.max.y >= other.max.y
    }

    /// Edge-inclusive test for whether a point lies inside this box.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

// ============================================================================
// Service Input
// ============================================================================

/// Per-tick description of one active simulation object.
///
/// Gameplay systems hand a slice of these to
/// [`SpatialIndexService::update`](crate::SpatialIndexService::update) every
/// tick; the service snapshots them at rebuild boundaries. The index itself
/// never inspects anything beyond identity and geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    /// Identity of the simulated object
    pub id: ObjectId,
    /// Current world-space position
    pub position: Vec2,
    /// Collision half-extent; `None` falls back to a small default box
    pub half_extent: Option<Vec2>,
    /// Whether this object participates in broad-phase pair extraction
    pub collidable: bool,
}

impl ObjectState {
    /// Creates a collidable object state with the default extent.
    pub fn new(id: ObjectId, position: Vec2) -> Self {
        Self {
            id,
            position,
            half_extent: None,
            collidable: true,
        }
    }

    /// The world-space bounding box for this object, derived from its
    /// collision extent or the default when none was provided.
    pub fn aabb(&self) -> Aabb {
        let half = self.half_extent.unwrap_or(Vec2::new(
            defaults::DEFAULT_HALF_EXTENT,
            defaults::DEFAULT_HALF_EXTENT,
        ));
        Aabb::from_center_half_extents(self.position, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap_is_edge_inclusive() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        let c = Aabb::new(Vec2::new(10.1, 10.1), Vec2::new(20.0, 20.0));

        assert!(a.intersects(b));
        assert!(!a.intersects(c));
    }

    #[test]
    fn test_enclosing_circle_box() {
        let probe = Aabb::enclosing_circle(Vec2::new(5.0, 5.0), 3.0);
        assert_eq!(probe.min, Vec2::new(2.0, 2.0));
        assert_eq!(probe.max, Vec2::new(8.0, 8.0));

        let unbounded = Aabb::enclosing_circle(Vec2::new(0.0, 0.0), f64::INFINITY);
        assert!(unbounded.intersects(Aabb::new(
            Vec2::new(1e9, 1e9),
            Vec2::new(2e9, 2e9)
        )));
    }

    #[test]
    fn test_normalized_rejects_zero_vector() {
        assert!(Vec2::new(0.0, 0.0).normalized().is_none());
        let unit = Vec2::new(3.0, 4.0).normalized().unwrap();
        assert!((unit.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_object_state_default_extent() {
        let state = ObjectState::new(ObjectId::new(), Vec2::new(10.0, 10.0));
        let aabb = state.aabb();
        assert!(aabb.width() > 0.0);
        assert!(aabb.contains_point(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn test_object_id_ordering_is_total() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.min(b), b.min(a));
    }
}
