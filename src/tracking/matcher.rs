//! Two-tier windowed feature matching.
//!
//! For each source keypoint the matcher searches a small window around its
//! predicted position first and widens the search only when the small
//! window yields nothing. Accepted target keypoints are claimed for the
//! rest of the call, so matching is greedy and one-to-one: the first source
//! keypoint with a sufficiently good score wins a contested candidate.
//! Processing in ascending source index is the normative order; the outcome
//! depends on it.

use nalgebra::Vector2;
use tracing::debug;

use crate::frame::VisualFrame;
use crate::stats::{MATCH_BITS, NO_MATCH_CANDIDATES_CHECKED, StatsSink};
use crate::tracking::descriptor::hamming_distance;
use crate::tracking::spatial_index::SpatialIndex;
use crate::tracking::tracker::GyroTrackerConfig;

/// A single correspondence: keypoint `keypoint_index_kp1` of frame k+1
/// matches keypoint `keypoint_index_k` of frame k.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWithScore {
    pub keypoint_index_kp1: usize,
    pub keypoint_index_k: usize,
    pub score: f64,
}

/// Matches every keypoint of `frame_k` against `frame_kp1` using the
/// predicted positions and the row index built over `frame_kp1`.
///
/// `matches` is cleared and repopulated. Source keypoints without an
/// acceptable candidate are simply absent from the output; their examined
/// candidate counts go to the stats sink.
#[allow(clippy::too_many_arguments)]
pub fn match_features(
    config: &GyroTrackerConfig,
    frame_k: &VisualFrame,
    frame_kp1: &VisualFrame,
    predicted_positions: &[Option<Vector2<f64>>],
    index: &SpatialIndex,
    matches: &mut Vec<MatchWithScore>,
    stats: &mut dyn StatsSink,
) {
    let num_points_kp1 = frame_kp1.num_keypoints();
    let descriptor_size_bits = (frame_kp1.descriptor_size_bytes() * 8) as i32;
    let small = config.small_search_distance_px as f64;
    let large = config.large_search_distance_px as f64;

    matches.clear();
    matches.reserve(frame_k.num_keypoints());

    // Target keypoints claimed by an earlier source keypoint stay claimed
    // for the rest of the call.
    let mut is_claimed = vec![false; num_points_kp1];

    for (i, predicted) in predicted_positions.iter().enumerate() {
        // Keypoints whose prediction left the field of view take no part in
        // matching.
        let Some(predicted) = predicted else {
            continue;
        };
        let descriptor_k = frame_k.descriptor(i);

        let narrow = index.row_range(
            (predicted.y + 0.5 - small) as i32,
            (predicted.y + 0.5 + small) as i32,
        );
        let wide = index.row_range(
            (predicted.y + 0.5 - large) as i32,
            (predicted.y + 0.5 + large) as i32,
        );

        // The threshold is the initial score to beat, so a candidate scoring
        // exactly at it never qualifies.
        let mut best_score =
            (descriptor_size_bits as f64 * config.matching_threshold_bits_ratio) as i32;
        let mut best: Option<usize> = None;
        let mut num_checked = 0usize;

        // Candidates examined for this source keypoint, so the wide pass
        // skips what the narrow pass already scored. Fresh per keypoint.
        let mut processed = vec![false; num_points_kp1];

        let bound_left_narrow = predicted.x - small;
        let bound_right_narrow = predicted.x + small;
        for entry in &index.entries()[narrow] {
            if entry.measurement.x < bound_left_narrow || entry.measurement.x > bound_right_narrow
            {
                continue;
            }
            if is_claimed[entry.index] {
                continue;
            }
            debug_assert!(entry.index < num_points_kp1);

            let score = descriptor_size_bits
                - hamming_distance(descriptor_k, frame_kp1.descriptor(entry.index)) as i32;
            debug_assert!(score <= descriptor_size_bits);
            if score > best_score {
                best_score = score;
                best = Some(entry.index);
                debug_assert!((predicted - entry.measurement).norm() < small * 2.0);
            }
            processed[entry.index] = true;
            num_checked += 1;
        }

        // Nothing acceptable nearby: widen the window and search again.
        if best.is_none() {
            let bound_left_wide = predicted.x - large;
            let bound_right_wide = predicted.x + large;
            for entry in &index.entries()[wide] {
                if processed[entry.index] || is_claimed[entry.index] {
                    continue;
                }
                if entry.measurement.x < bound_left_wide || entry.measurement.x > bound_right_wide
                {
                    continue;
                }
                debug_assert!(entry.index < num_points_kp1);

                let score = descriptor_size_bits
                    - hamming_distance(descriptor_k, frame_kp1.descriptor(entry.index)) as i32;
                debug_assert!(score <= descriptor_size_bits);
                if score > best_score {
                    best_score = score;
                    best = Some(entry.index);
                    debug_assert!((predicted - entry.measurement).norm() < large * 2.0);
                }
                processed[entry.index] = true;
                num_checked += 1;
            }
        }

        if let Some(best_index) = best {
            is_claimed[best_index] = true;
            // TODO: carry the descriptor bit score in the match record once
            // downstream consumers stop expecting the placeholder.
            matches.push(MatchWithScore {
                keypoint_index_kp1: best_index,
                keypoint_index_k: i,
                score: 0.0,
            });
            stats.add_sample(MATCH_BITS, best_score as f64);
        } else {
            stats.add_sample(NO_MATCH_CANDIDATES_CHECKED, num_checked as f64);
        }
    }

    debug!(
        num_source_keypoints = frame_k.num_keypoints(),
        num_matches = matches.len(),
        "windowed matching done"
    );
}
