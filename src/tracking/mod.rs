//! Gyro-aided feature matching.
//!
//! The pipeline for one frame pair:
//! - predict each frame-k keypoint's position in frame k+1 from the gyro
//!   rotation (back-project, rotate, re-project)
//! - index the frame-(k+1) keypoints by image row
//! - run a narrow-then-wide windowed search per source keypoint, scoring
//!   candidates by descriptor Hamming distance and claiming each target at
//!   most once

pub mod descriptor;
pub mod matcher;
pub mod prediction;
pub mod spatial_index;
pub mod tracker;

pub use descriptor::{MAX_DESCRIPTOR_BITS, hamming_distance};
pub use matcher::MatchWithScore;
pub use prediction::predict_keypoint_positions;
pub use spatial_index::{KeypointData, SpatialIndex};
pub use tracker::{FeatureTracker, GyroTracker, GyroTrackerConfig};
