use std::sync::Arc;

use anyhow::Result;
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gyro_tracker::camera::{Camera, CameraId, PinholeCamera};
use gyro_tracker::frame::{DescriptorStore, VisualFrame};
use gyro_tracker::stats::{MATCH_BITS, NO_MATCH_CANDIDATES_CHECKED, SampleStats};
use gyro_tracker::tracking::{FeatureTracker, GyroTracker};

const NUM_KEYPOINTS: usize = 300;
const DESC_BYTES: usize = 32;

/// Synthetic gyro-tracking run: frame k+1 is frame k seen under a small
/// known rotation, with pixel noise and a few descriptor bits flipped.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let camera = Arc::new(PinholeCamera::new(
        458.654,
        457.296,
        367.215,
        248.375,
        752,
        480,
        CameraId(0),
    ));
    let q_ckp1_ck = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.015)
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -0.008);

    let mut rng = StdRng::seed_from_u64(42);

    // Frame k: uniformly scattered keypoints with random binary descriptors.
    let keypoints_k: Vec<Vector2<f64>> = (0..NUM_KEYPOINTS)
        .map(|_| {
            Vector2::new(
                rng.gen_range(20.0..(camera.image_width() as f64 - 20.0)),
                rng.gen_range(20.0..(camera.image_height() as f64 - 20.0)),
            )
        })
        .collect();
    let descriptors_k: Vec<Vec<u8>> = (0..NUM_KEYPOINTS)
        .map(|_| (0..DESC_BYTES).map(|_| rng.gen::<u8>()).collect())
        .collect();

    // Frame k+1: the same scene points under the rotation, observed with a
    // pixel of noise and up to four flipped descriptor bits. Points rotated
    // out of view are dropped.
    let mut keypoints_kp1 = Vec::new();
    let mut descriptors_kp1 = Vec::new();
    for (keypoint, descriptor) in keypoints_k.iter().zip(&descriptors_k) {
        let Some(bearing) = camera.back_project(keypoint) else {
            continue;
        };
        let Some(projected) = camera.project(&(q_ckp1_ck * bearing)) else {
            continue;
        };
        let noisy = projected + Vector2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));

        let mut desc = descriptor.clone();
        for _ in 0..rng.gen_range(0..=4) {
            let bit = rng.gen_range(0..DESC_BYTES * 8);
            desc[bit / 8] ^= 1 << (bit % 8);
        }
        keypoints_kp1.push(noisy);
        descriptors_kp1.push(desc);
    }
    let num_visible = keypoints_kp1.len();

    let frame_k = VisualFrame::new(
        keypoints_k,
        Some(DescriptorStore::new(
            descriptors_k.into_iter().flatten().collect(),
            DESC_BYTES,
        )),
        Some(vec![-1; NUM_KEYPOINTS]),
        1_000_000_000,
        camera.id(),
    );
    let frame_kp1 = VisualFrame::new(
        keypoints_kp1,
        Some(DescriptorStore::new(
            descriptors_kp1.into_iter().flatten().collect(),
            DESC_BYTES,
        )),
        Some(vec![-1; num_visible]),
        1_050_000_000,
        camera.id(),
    );

    let tracker = GyroTracker::new(camera);
    let mut matches = Vec::new();
    let mut stats = SampleStats::new();
    tracker.track(&q_ckp1_ck, &frame_k, &frame_kp1, &mut matches, &mut stats);

    println!(
        "{} source keypoints, {} visible in frame k+1, {} matched",
        NUM_KEYPOINTS,
        num_visible,
        matches.len()
    );
    if let Some(bits) = stats.summary(MATCH_BITS) {
        println!(
            "match bits: mean {:.1} / min {:.0} / max {:.0} over {} matches",
            bits.mean(),
            bits.min,
            bits.max,
            bits.count
        );
    }
    if let Some(checked) = stats.summary(NO_MATCH_CANDIDATES_CHECKED) {
        println!(
            "no-match keypoints: {} (mean {:.1} candidates checked)",
            checked.count,
            checked.mean()
        );
    }
    Ok(())
}
