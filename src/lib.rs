//! Indexed bounding volume hierarchy over axis-aligned bounding boxes.
//!
//! See [`spatial_partitioning::bvh`] for the tree itself.

pub mod geometry;
pub mod spatial_partitioning;

mod helpers;
