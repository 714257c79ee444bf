//! Matching core of a gyroscope-aided visual feature tracker.
//!
//! Given the camera rotation between two frames (typically integrated from
//! a gyroscope) and the keypoints/descriptors extracted in each, the
//! tracker establishes one-to-one correspondences between the frames. It
//! performs no image processing, feature detection or attitude estimation;
//! those live behind the [`camera::Camera`] and [`frame::VisualFrame`]
//! interfaces.

pub mod camera;
pub mod frame;
pub mod stats;
pub mod tracking;

pub use camera::{Camera, CameraId, PinholeCamera};
pub use frame::{DescriptorStore, VisualFrame};
pub use stats::{NullStats, SampleStats, StatsSink};
pub use tracking::{FeatureTracker, GyroTracker, GyroTrackerConfig, MatchWithScore};
