//! Rotation-based keypoint position prediction.
//!
//! Given the camera rotation between two frames, each keypoint of frame k
//! is back-projected to a bearing vector, rotated into the frame-(k+1)
//! optical frame, and re-projected. This gives the matcher a search center
//! that already accounts for the rotational part of the camera motion.

use nalgebra::{UnitQuaternion, Vector2};
use tracing::trace;

use crate::camera::Camera;
use crate::frame::VisualFrame;

/// Predicts, for every keypoint of `frame_k`, its pixel position in frame
/// k+1 under the rotation `q_ckp1_ck`.
///
/// `None` entries mark keypoints whose back-projection or re-projection is
/// invalid (e.g. the rotated bearing leaves the field of view); they take no
/// further part in matching.
pub fn predict_keypoint_positions(
    camera: &dyn Camera,
    q_ckp1_ck: &UnitQuaternion<f64>,
    frame_k: &VisualFrame,
) -> Vec<Option<Vector2<f64>>> {
    let mut predicted = Vec::with_capacity(frame_k.num_keypoints());
    let mut num_invalid = 0usize;
    for keypoint in frame_k.keypoints() {
        let position = camera
            .back_project(keypoint)
            .map(|bearing| q_ckp1_ck * bearing)
            .and_then(|rotated| camera.project(&rotated));
        if position.is_none() {
            num_invalid += 1;
        }
        predicted.push(position);
    }
    trace!(
        num_keypoints = predicted.len(),
        num_invalid,
        "predicted keypoint positions"
    );
    predicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraId, PinholeCamera};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn camera() -> PinholeCamera {
        PinholeCamera::new(450.0, 450.0, 320.0, 240.0, 640, 480, CameraId(0))
    }

    fn frame(keypoints: Vec<Vector2<f64>>) -> VisualFrame {
        VisualFrame::new(keypoints, None, None, 0, CameraId(0))
    }

    #[test]
    fn test_identity_rotation_predicts_same_position() {
        let cam = camera();
        let frame_k = frame(vec![Vector2::new(100.0, 200.0), Vector2::new(320.0, 240.0)]);
        let predicted =
            predict_keypoint_positions(&cam, &UnitQuaternion::identity(), &frame_k);

        assert_eq!(predicted.len(), 2);
        for (pred, kp) in predicted.iter().zip(frame_k.keypoints()) {
            assert_relative_eq!(pred.unwrap(), *kp, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotation_shifts_prediction() {
        let cam = camera();
        let frame_k = frame(vec![Vector2::new(320.0, 240.0)]);
        // Small rotation about the camera y axis pans the view horizontally.
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.02);
        let predicted = predict_keypoint_positions(&cam, &q, &frame_k);

        let pos = predicted[0].unwrap();
        assert!((pos.x - 320.0).abs() > 1.0, "expected a horizontal shift");
        assert_relative_eq!(pos.y, 240.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_out_of_view_is_excluded() {
        let cam = camera();
        let frame_k = frame(vec![Vector2::new(630.0, 240.0)]);
        // Rotating the bearing behind the image plane leaves no valid
        // projection.
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.2);
        let predicted = predict_keypoint_positions(&cam, &q, &frame_k);
        assert_eq!(predicted, vec![None]);
    }
}
