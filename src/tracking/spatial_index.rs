//! Row-bucketed spatial index over a frame's keypoints.
//!
//! Matching repeatedly asks "which target keypoints lie in a horizontal
//! band around this predicted row?". Instead of a 2D grid, the index keeps
//! the keypoints sorted by row together with a per-row cumulative count
//! table, so a band query is two table lookups into the sorted sequence.

use std::ops::Range;

use nalgebra::Vector2;

use crate::frame::VisualFrame;

/// One keypoint of the indexed frame: its measurement plus its original
/// index into the frame, preserved across sorting.
#[derive(Debug, Clone, Copy)]
pub struct KeypointData {
    pub measurement: Vector2<f64>,
    pub index: usize,
}

/// Row-sorted keypoints plus a lookup table where `lut[r]` is the number of
/// keypoints whose row coordinate is strictly below `r`.
#[derive(Debug)]
pub struct SpatialIndex {
    sorted: Vec<KeypointData>,
    lut: Vec<usize>,
}

impl SpatialIndex {
    /// Builds the index over `frame`'s keypoints for an image of
    /// `image_height` rows. One sort plus one linear cursor pass.
    pub fn build(frame: &VisualFrame, image_height: u32) -> Self {
        assert!(image_height > 0, "image height must be positive");

        let mut sorted: Vec<KeypointData> = frame
            .keypoints()
            .iter()
            .enumerate()
            .map(|(index, measurement)| KeypointData {
                measurement: *measurement,
                index,
            })
            .collect();
        sorted.sort_by(|a, b| a.measurement.y.total_cmp(&b.measurement.y));

        let mut lut = Vec::with_capacity(image_height as usize);
        let mut cursor = 0usize;
        for row in 0..image_height {
            while cursor < sorted.len() && sorted[cursor].measurement.y < row as f64 {
                cursor += 1;
            }
            lut.push(cursor);
        }
        debug_assert_eq!(lut.len(), image_height as usize);

        Self { sorted, lut }
    }

    /// Half-open range into [`Self::entries`] covering the keypoints of rows
    /// `[top, bottom]`, both clamped to the image. An empty range is a valid
    /// result meaning no candidates in the band.
    pub fn row_range(&self, top: i32, bottom: i32) -> Range<usize> {
        let max_row = self.lut.len() as i32 - 1;
        let top = top.clamp(0, max_row);
        let bottom = bottom.clamp(0, max_row);
        debug_assert!(top <= bottom);

        let begin = self.lut[top as usize];
        let end = self.lut[(bottom + 1).min(max_row) as usize];
        debug_assert!(begin <= end);
        begin..end
    }

    /// Keypoints in ascending row order.
    pub fn entries(&self) -> &[KeypointData] {
        &self.sorted
    }

    pub fn lookup_table(&self) -> &[usize] {
        &self.lut
    }

    pub fn num_keypoints(&self) -> usize {
        self.sorted.len()
    }
}
