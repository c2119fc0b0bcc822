pub mod camera;
pub mod capture;
pub mod mapper;

pub use camera::{open_camera, CameraFeed};
pub use capture::{CaptureDevice, CaptureSession, VideoFrame};
pub use mapper::{compute_transform, CoordinateMapper, OverlayTransform, Rect};
