//! Spherical projection and proximity search over the measurement set.

pub mod index;
pub mod projection;

pub use index::ProximityIndex;
pub use projection::{chord_distance, project, project_all, EARTH_RADIUS_M};
