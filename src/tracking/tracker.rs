//! Gyro-aided tracker facade.
//!
//! `GyroTracker` validates a frame pair, predicts keypoint positions under
//! the supplied rotation, builds the row index over the target frame and
//! delegates to the windowed matcher. It holds no state across calls; two
//! calls on distinct frame pairs are independent.

use std::sync::Arc;

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::Camera;
use crate::frame::VisualFrame;
use crate::stats::StatsSink;
use crate::tracking::descriptor::MAX_DESCRIPTOR_BITS;
use crate::tracking::matcher::{MatchWithScore, match_features};
use crate::tracking::prediction::predict_keypoint_positions;
use crate::tracking::spatial_index::SpatialIndex;

/// Matching configuration. All distances are in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GyroTrackerConfig {
    /// Search window half-width tried first around the predicted position.
    pub small_search_distance_px: u32,
    /// Fallback window half-width when the small window yields no match.
    pub large_search_distance_px: u32,
    /// Fraction of the descriptor bit width a candidate's score must
    /// strictly exceed to be accepted.
    pub matching_threshold_bits_ratio: f64,
}

impl Default for GyroTrackerConfig {
    fn default() -> Self {
        Self {
            small_search_distance_px: 10,
            large_search_distance_px: 20,
            matching_threshold_bits_ratio: 0.8,
        }
    }
}

/// Frame-to-frame feature matching, the seam the rest of a VIO front end
/// consumes. Implementations establish correspondences from `frame_k` to
/// `frame_kp1` given the camera rotation between the two.
pub trait FeatureTracker {
    /// Clears `matches` and fills it with correspondences. Source keypoints
    /// without an acceptable candidate are absent from the output; that is
    /// a normal outcome, not an error.
    fn track(
        &self,
        q_ckp1_ck: &UnitQuaternion<f64>,
        frame_k: &VisualFrame,
        frame_kp1: &VisualFrame,
        matches: &mut Vec<MatchWithScore>,
        stats: &mut dyn StatsSink,
    );
}

/// Rotation-aided greedy matcher over a single camera.
pub struct GyroTracker {
    camera: Arc<dyn Camera>,
    config: GyroTrackerConfig,
}

impl GyroTracker {
    pub fn new(camera: Arc<dyn Camera>) -> Self {
        Self::with_config(camera, GyroTrackerConfig::default())
    }

    pub fn with_config(camera: Arc<dyn Camera>, config: GyroTrackerConfig) -> Self {
        assert!(
            config.large_search_distance_px > config.small_search_distance_px,
            "large search distance must exceed the small one"
        );
        assert!(
            config.matching_threshold_bits_ratio > 0.0
                && config.matching_threshold_bits_ratio <= 1.0,
            "matching threshold ratio must be in (0, 1]"
        );
        Self { camera, config }
    }

    pub fn config(&self) -> &GyroTrackerConfig {
        &self.config
    }

    /// Caller-contract checks. Violations are programming errors in the
    /// surrounding pipeline and abort loudly.
    fn validate_frames(&self, frame_k: &VisualFrame, frame_kp1: &VisualFrame) {
        assert!(frame_k.has_track_ids(), "frame k carries no track ids");
        assert!(frame_kp1.has_track_ids(), "frame k+1 carries no track ids");
        assert!(frame_k.has_descriptors(), "frame k carries no descriptors");
        assert!(
            frame_kp1.has_descriptors(),
            "frame k+1 carries no descriptors"
        );
        assert_eq!(
            frame_k.camera_id(),
            self.camera.id(),
            "frame k was captured by a different camera"
        );
        assert_eq!(
            frame_kp1.camera_id(),
            self.camera.id(),
            "frame k+1 was captured by a different camera"
        );
        assert!(
            frame_kp1.timestamp_ns() > frame_k.timestamp_ns(),
            "frames out of temporal order: {} >= {}",
            frame_k.timestamp_ns(),
            frame_kp1.timestamp_ns()
        );
        assert_eq!(
            frame_k.descriptor_size_bytes(),
            frame_kp1.descriptor_size_bytes(),
            "descriptor widths differ between frames"
        );
        assert!(
            frame_kp1.descriptor_size_bytes() * 8 <= MAX_DESCRIPTOR_BITS,
            "descriptor width {} bits exceeds the supported {} bits",
            frame_kp1.descriptor_size_bytes() * 8,
            MAX_DESCRIPTOR_BITS
        );
    }
}

impl FeatureTracker for GyroTracker {
    fn track(
        &self,
        q_ckp1_ck: &UnitQuaternion<f64>,
        frame_k: &VisualFrame,
        frame_kp1: &VisualFrame,
        matches: &mut Vec<MatchWithScore>,
        stats: &mut dyn StatsSink,
    ) {
        self.validate_frames(frame_k, frame_kp1);
        matches.clear();

        let predicted = predict_keypoint_positions(self.camera.as_ref(), q_ckp1_ck, frame_k);
        let index = SpatialIndex::build(frame_kp1, self.camera.image_height());
        match_features(
            &self.config,
            frame_k,
            frame_kp1,
            &predicted,
            &index,
            matches,
            stats,
        );
        debug!(
            timestamp_k = frame_k.timestamp_ns(),
            timestamp_kp1 = frame_kp1.timestamp_ns(),
            num_matches = matches.len(),
            "tracked frame pair"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraId, PinholeCamera};
    use crate::frame::DescriptorStore;
    use crate::stats::{MATCH_BITS, NullStats, SampleStats};
    use nalgebra::Vector2;

    const DESC_BYTES: usize = 32;

    fn camera() -> Arc<dyn Camera> {
        Arc::new(PinholeCamera::new(
            450.0,
            450.0,
            320.0,
            240.0,
            640,
            480,
            CameraId(7),
        ))
    }

    fn distinct_descriptor(seed: usize) -> Vec<u8> {
        (0..DESC_BYTES)
            .map(|b| (seed.wrapping_mul(31).wrapping_add(b * 97) % 251) as u8)
            .collect()
    }

    fn test_frame(
        keypoints: Vec<Vector2<f64>>,
        timestamp_ns: i64,
        camera_id: CameraId,
    ) -> VisualFrame {
        let data: Vec<u8> = (0..keypoints.len()).flat_map(distinct_descriptor).collect();
        let track_ids = vec![-1; keypoints.len()];
        VisualFrame::new(
            keypoints,
            Some(DescriptorStore::new(data, DESC_BYTES)),
            Some(track_ids),
            timestamp_ns,
            camera_id,
        )
    }

    fn spread_keypoints(n: usize) -> Vec<Vector2<f64>> {
        (0..n)
            .map(|i| Vector2::new(80.0 + 45.0 * i as f64, 60.0 + 37.0 * i as f64))
            .collect()
    }

    #[test]
    fn test_identity_rotation_matches_every_keypoint_to_itself() {
        let tracker = GyroTracker::new(camera());
        let frame_k = test_frame(spread_keypoints(8), 1_000, CameraId(7));
        let frame_kp1 = test_frame(spread_keypoints(8), 2_000, CameraId(7));

        let mut matches = Vec::new();
        let mut stats = SampleStats::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &frame_k,
            &frame_kp1,
            &mut matches,
            &mut stats,
        );

        assert_eq!(matches.len(), 8);
        for m in &matches {
            assert_eq!(m.keypoint_index_kp1, m.keypoint_index_k);
        }
        // Identical descriptors: every accepted score is the full width.
        let bits = stats.summary(MATCH_BITS).unwrap();
        assert_eq!(bits.min, (DESC_BYTES * 8) as f64);
        assert_eq!(bits.max, (DESC_BYTES * 8) as f64);
    }

    #[test]
    fn test_match_count_bounded_by_smaller_frame() {
        let tracker = GyroTracker::new(camera());
        let frame_k = test_frame(spread_keypoints(8), 1_000, CameraId(7));
        let frame_kp1 = test_frame(spread_keypoints(3), 2_000, CameraId(7));

        let mut matches = Vec::new();
        let mut stats = SampleStats::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &frame_k,
            &frame_kp1,
            &mut matches,
            &mut stats,
        );
        assert!(matches.len() <= 3);
    }

    #[test]
    fn test_output_container_is_cleared() {
        let tracker = GyroTracker::new(camera());
        let frame_k = test_frame(spread_keypoints(2), 1_000, CameraId(7));
        let frame_kp1 = test_frame(spread_keypoints(2), 2_000, CameraId(7));

        let mut matches = vec![MatchWithScore {
            keypoint_index_kp1: 99,
            keypoint_index_k: 99,
            score: 1.0,
        }];
        let mut stats = SampleStats::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &frame_k,
            &frame_kp1,
            &mut matches,
            &mut stats,
        );
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.keypoint_index_k < 2));
    }

    #[test]
    #[should_panic(expected = "temporal order")]
    fn test_rejects_non_monotonic_timestamps() {
        let tracker = GyroTracker::new(camera());
        let frame_k = test_frame(spread_keypoints(2), 2_000, CameraId(7));
        let frame_kp1 = test_frame(spread_keypoints(2), 1_000, CameraId(7));
        let mut matches = Vec::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &frame_k,
            &frame_kp1,
            &mut matches,
            &mut NullStats,
        );
    }

    #[test]
    #[should_panic(expected = "different camera")]
    fn test_rejects_mismatched_camera_id() {
        let tracker = GyroTracker::new(camera());
        let frame_k = test_frame(spread_keypoints(2), 1_000, CameraId(8));
        let frame_kp1 = test_frame(spread_keypoints(2), 2_000, CameraId(7));
        let mut matches = Vec::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &frame_k,
            &frame_kp1,
            &mut matches,
            &mut NullStats,
        );
    }

    #[test]
    #[should_panic(expected = "no descriptors")]
    fn test_rejects_frames_without_descriptors() {
        let tracker = GyroTracker::new(camera());
        let keypoints = spread_keypoints(2);
        let frame_k = VisualFrame::new(
            keypoints.clone(),
            None,
            Some(vec![-1; 2]),
            1_000,
            CameraId(7),
        );
        let frame_kp1 = test_frame(keypoints, 2_000, CameraId(7));
        let mut matches = Vec::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &frame_k,
            &frame_kp1,
            &mut matches,
            &mut NullStats,
        );
    }

    #[test]
    #[should_panic(expected = "exceeds the supported")]
    fn test_rejects_oversized_descriptors() {
        let tracker = GyroTracker::new(camera());
        let wide = 128usize; // 1024 bits
        let make = |ts| {
            VisualFrame::new(
                spread_keypoints(1),
                Some(DescriptorStore::new(vec![0u8; wide], wide)),
                Some(vec![-1]),
                ts,
                CameraId(7),
            )
        };
        let mut matches = Vec::new();
        tracker.track(
            &UnitQuaternion::identity(),
            &make(1_000),
            &make(2_000),
            &mut matches,
            &mut NullStats,
        );
    }

    #[test]
    #[should_panic(expected = "large search distance")]
    fn test_rejects_inverted_search_radii() {
        GyroTracker::with_config(
            camera(),
            GyroTrackerConfig {
                small_search_distance_px: 20,
                large_search_distance_px: 10,
                matching_threshold_bits_ratio: 0.8,
            },
        );
    }
}
