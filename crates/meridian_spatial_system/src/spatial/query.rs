//! Query result types shared by the index and the service.

use crate::types::{ObjectId, Vec2};
use serde::{Deserialize, Serialize};

/// A single match from a radius or nearest-neighbor query.
///
/// Carries the position and distance the index computed during filtering so
/// callers ranking candidates do not recompute them. The id refers to the
/// simulation object as of the last rebuild; callers must re-check liveness
/// before acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Identity of the matched object
    pub id: ObjectId,
    /// Object position at the last rebuild
    pub position: Vec2,
    /// Euclidean distance from the query point
    pub distance: f64,
}
