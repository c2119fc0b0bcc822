use tracing::info;

use crate::config::CameraSettings;
use crate::overlay::capture::{CaptureSession, VideoFrame};

/// Opens the kiosk camera for the lifetime of the returned session, or
/// `None` when the camera is disabled or unsupported in this build.
pub fn open_camera(settings: &CameraSettings) -> Option<CaptureSession> {
    if !settings.enabled {
        return None;
    }
    open_backend(settings)
}

/// Holds the camera exactly while the scene shows the feed.
///
/// Opening is tried once per activation. A camera that cannot be opened stays
/// closed until the feed is hidden and shown again.
pub struct CameraFeed {
    settings: CameraSettings,
    session: Option<CaptureSession>,
    attempted: bool,
}

impl CameraFeed {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            session: None,
            attempted: false,
        }
    }

    pub fn latest(&self) -> Option<VideoFrame> {
        self.session.as_ref().and_then(CaptureSession::latest)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Returns true when a session was released.
    pub fn sync(&mut self, wanted: bool) -> bool {
        self.sync_with(wanted, open_camera)
    }

    fn sync_with(
        &mut self,
        wanted: bool,
        open: impl FnOnce(&CameraSettings) -> Option<CaptureSession>,
    ) -> bool {
        if wanted {
            if !self.attempted {
                self.attempted = true;
                self.session = open(&self.settings);
                if let Some(session) = &self.session {
                    info!("Camera session {} started", session.id());
                }
            }
            return false;
        }

        self.attempted = false;
        match self.session.take() {
            Some(session) => {
                info!("Camera session {} released", session.id());
                true
            }
            None => false,
        }
    }
}

#[cfg(feature = "camera")]
fn open_backend(settings: &CameraSettings) -> Option<CaptureSession> {
    let settings = settings.clone();
    Some(CaptureSession::start(move || {
        native::NokhwaCamera::new(&settings)
    }))
}

#[cfg(not(feature = "camera"))]
fn open_backend(_settings: &CameraSettings) -> Option<CaptureSession> {
    tracing::warn!("Built without the `camera` feature, showing the scanner without a live feed");
    None
}

#[cfg(feature = "camera")]
mod native {
    use image::RgbImage;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;
    use tracing::{info, warn};

    use crate::config::CameraSettings;
    use crate::error::CaptureError;
    use crate::overlay::capture::CaptureDevice;

    fn device_error(e: nokhwa::NokhwaError) -> CaptureError {
        CaptureError::Device(e.to_string())
    }

    pub struct NokhwaCamera {
        preferred_label: String,
        fallback_index: usize,
        camera: Option<Camera>,
    }

    impl NokhwaCamera {
        pub fn new(settings: &CameraSettings) -> Self {
            Self {
                preferred_label: settings.preferred_label.to_lowercase(),
                fallback_index: settings.fallback_index as usize,
                camera: None,
            }
        }

        /// Labelled match first, then the fallback slot, then whatever is first.
        fn select_index(&self) -> Result<CameraIndex, CaptureError> {
            let cameras = nokhwa::query(ApiBackend::Auto).map_err(device_error)?;
            let preferred = cameras.iter().find(|info| {
                !self.preferred_label.is_empty()
                    && info
                        .human_name()
                        .to_lowercase()
                        .contains(&self.preferred_label)
            });
            let chosen = preferred
                .or_else(|| cameras.get(self.fallback_index))
                .or_else(|| cameras.first())
                .ok_or(CaptureError::NoDevice)?;
            info!("Selected camera {}", chosen.human_name());
            Ok(chosen.index().clone())
        }
    }

    impl CaptureDevice for NokhwaCamera {
        fn name(&self) -> String {
            "nokhwa camera".to_string()
        }

        fn open(&mut self) -> Result<(), CaptureError> {
            let index = self.select_index()?;
            let format =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
            let mut camera = Camera::new(index, format).map_err(device_error)?;
            camera.open_stream().map_err(device_error)?;
            self.camera = Some(camera);
            Ok(())
        }

        fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
            let camera = self.camera.as_mut().ok_or(CaptureError::NoDevice)?;
            let buffer = camera.frame().map_err(device_error)?;
            let decoded = buffer.decode_image::<RgbFormat>().map_err(device_error)?;
            let (width, height) = (decoded.width(), decoded.height());
            RgbImage::from_raw(width, height, decoded.into_raw())
                .ok_or_else(|| CaptureError::Device("frame buffer size mismatch".to_string()))
        }

        fn stop(&mut self) {
            if let Some(mut camera) = self.camera.take() {
                if let Err(e) = camera.stop_stream() {
                    warn!("Failed to stop camera stream: {}", e);
                }
            }
        }
    }
}
