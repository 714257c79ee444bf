//! Camera geometry abstraction.
//!
//! The tracker never touches pixels; it only needs to map keypoint
//! measurements to bearing vectors and back. The `Camera` trait is the seam
//! through which the surrounding pipeline supplies its projection model.

use nalgebra::{Vector2, Vector3};

/// Stable identifier of a camera geometry, used to validate that both frames
/// of a tracking call were captured by the camera the tracker is configured
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub u64);

/// Projection model consumed by the tracker.
///
/// Both operations are fallible: a bearing vector behind the image plane has
/// no projection, and distortion models may have a limited valid domain.
/// Returning `None` marks the keypoint as unusable for this call; it is not
/// an error.
pub trait Camera: Send + Sync {
    fn id(&self) -> CameraId;

    fn image_width(&self) -> u32;

    fn image_height(&self) -> u32;

    /// Maps a pixel measurement to a unit bearing vector in the camera's
    /// optical frame.
    fn back_project(&self, keypoint: &Vector2<f64>) -> Option<Vector3<f64>>;

    /// Maps a bearing vector in the optical frame to pixel coordinates.
    /// `None` if the ray points behind the camera or projects outside the
    /// image bounds.
    fn project(&self, bearing: &Vector3<f64>) -> Option<Vector2<f64>>;
}

/// Undistorted pinhole model.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    width: u32,
    height: u32,
    id: CameraId,
}

impl PinholeCamera {
    pub fn new(
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        width: u32,
        height: u32,
        id: CameraId,
    ) -> Self {
        assert!(fx > 0.0 && fy > 0.0, "focal lengths must be positive");
        assert!(width > 0 && height > 0, "image dimensions must be positive");
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
            id,
        }
    }
}

impl Camera for PinholeCamera {
    fn id(&self) -> CameraId {
        self.id
    }

    fn image_width(&self) -> u32 {
        self.width
    }

    fn image_height(&self) -> u32 {
        self.height
    }

    fn back_project(&self, keypoint: &Vector2<f64>) -> Option<Vector3<f64>> {
        let x = (keypoint.x - self.cx) / self.fx;
        let y = (keypoint.y - self.cy) / self.fy;
        Some(Vector3::new(x, y, 1.0).normalize())
    }

    fn project(&self, bearing: &Vector3<f64>) -> Option<Vector2<f64>> {
        if bearing.z <= 0.0 {
            return None;
        }
        let u = self.fx * bearing.x / bearing.z + self.cx;
        let v = self.fy * bearing.y / bearing.z + self.cy;
        if u < 0.0 || v < 0.0 || u >= self.width as f64 || v >= self.height as f64 {
            return None;
        }
        Some(Vector2::new(u, v))
    }
}
