//! Visual frame representation.
//!
//! A `VisualFrame` is the per-image output of the (external) detection and
//! description stage: keypoint measurements, binary descriptors, track ids
//! and a capture timestamp. Frames are immutable inputs to the tracker;
//! ownership stays with the caller for the duration of a tracking call.

use nalgebra::Vector2;

use crate::camera::CameraId;

/// Contiguous storage for fixed-width binary descriptors, one per keypoint.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    data: Vec<u8>,
    size_bytes: usize,
}

impl DescriptorStore {
    /// `data` holds `count` descriptors of `size_bytes` bytes each, packed
    /// back to back in keypoint order.
    pub fn new(data: Vec<u8>, size_bytes: usize) -> Self {
        assert!(size_bytes > 0, "descriptor size must be non-zero");
        assert_eq!(
            data.len() % size_bytes,
            0,
            "descriptor data length {} is not a multiple of descriptor size {}",
            data.len(),
            size_bytes
        );
        Self { data, size_bytes }
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.size_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn size_bits(&self) -> usize {
        self.size_bytes * 8
    }

    /// Borrowed fixed-length byte view of the `index`-th descriptor.
    pub fn descriptor(&self, index: usize) -> &[u8] {
        let start = index * self.size_bytes;
        &self.data[start..start + self.size_bytes]
    }
}

/// Keypoints, descriptors and track ids of a single camera image.
///
/// Descriptors and track ids are optional channels: frames coming out of a
/// bare detector may not carry them yet. The tracker asserts their presence
/// at its boundary.
#[derive(Debug, Clone)]
pub struct VisualFrame {
    keypoints: Vec<Vector2<f64>>,
    descriptors: Option<DescriptorStore>,
    track_ids: Option<Vec<i64>>,
    timestamp_ns: i64,
    camera_id: CameraId,
}

impl VisualFrame {
    pub fn new(
        keypoints: Vec<Vector2<f64>>,
        descriptors: Option<DescriptorStore>,
        track_ids: Option<Vec<i64>>,
        timestamp_ns: i64,
        camera_id: CameraId,
    ) -> Self {
        if let Some(descriptors) = &descriptors {
            assert_eq!(
                descriptors.len(),
                keypoints.len(),
                "descriptor count must equal keypoint count"
            );
        }
        if let Some(track_ids) = &track_ids {
            assert_eq!(
                track_ids.len(),
                keypoints.len(),
                "track id count must equal keypoint count"
            );
        }
        Self {
            keypoints,
            descriptors,
            track_ids,
            timestamp_ns,
            camera_id,
        }
    }

    pub fn num_keypoints(&self) -> usize {
        self.keypoints.len()
    }

    pub fn keypoint(&self, index: usize) -> &Vector2<f64> {
        &self.keypoints[index]
    }

    pub fn keypoints(&self) -> &[Vector2<f64>] {
        &self.keypoints
    }

    pub fn has_descriptors(&self) -> bool {
        self.descriptors.is_some()
    }

    pub fn has_track_ids(&self) -> bool {
        self.track_ids.is_some()
    }

    /// Descriptor byte view for one keypoint. Panics if the frame carries no
    /// descriptors; callers go through the tracker, which validates presence
    /// up front.
    pub fn descriptor(&self, index: usize) -> &[u8] {
        self.descriptors
            .as_ref()
            .expect("frame has no descriptors")
            .descriptor(index)
    }

    pub fn descriptor_store(&self) -> Option<&DescriptorStore> {
        self.descriptors.as_ref()
    }

    pub fn descriptor_size_bytes(&self) -> usize {
        self.descriptors
            .as_ref()
            .map(DescriptorStore::size_bytes)
            .unwrap_or(0)
    }

    pub fn track_ids(&self) -> Option<&[i64]> {
        self.track_ids.as_deref()
    }

    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    pub fn camera_id(&self) -> CameraId {
        self.camera_id
    }
}
