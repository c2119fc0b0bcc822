use chrono::{DateTime, Utc};
use image::RgbImage;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::CaptureError;

/// How long `stop` waits for a capture thread stuck inside `read_frame`.
const STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// One decoded frame from the capture device.
#[derive(Clone)]
pub struct VideoFrame {
    session_id: Uuid,
    image: Arc<RgbImage>,
    captured_at: DateTime<Utc>,
}

impl VideoFrame {
    pub fn new(session_id: Uuid, image: RgbImage) -> Self {
        Self {
            session_id,
            image: Arc::new(image),
            captured_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Intrinsic frame size in source pixels.
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// A video source that must be released explicitly.
pub trait CaptureDevice {
    fn name(&self) -> String;
    fn open(&mut self) -> Result<(), CaptureError>;
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;
    fn stop(&mut self);
}

/// Stops an opened device when dropped, whichever way the capture loop ends.
struct DeviceGuard<D: CaptureDevice> {
    device: D,
    opened: bool,
}

impl<D: CaptureDevice> Drop for DeviceGuard<D> {
    fn drop(&mut self) {
        if self.opened {
            self.device.stop();
            info!("Released capture device {}", self.device.name());
        }
    }
}

/// Exclusive ownership of a capture device for as long as the session lives.
///
/// The device is built and driven on a dedicated thread; the newest frame is
/// published on a watch channel. Dropping or stopping the session cancels the
/// loop and waits briefly for it; a thread still blocked on the device after
/// that is detached and releases the device once its read returns.
pub struct CaptureSession {
    id: Uuid,
    cancel_token: CancellationToken,
    capture_thread: Option<JoinHandle<()>>,
    frame_rx: watch::Receiver<Option<VideoFrame>>,
}

impl CaptureSession {
    pub fn start<D, F>(make_device: F) -> Self
    where
        D: CaptureDevice,
        F: FnOnce() -> D + Send + 'static,
    {
        let id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();
        let (frame_tx, frame_rx) = watch::channel(None);
        let thread_token = cancel_token.clone();
        let capture_thread = std::thread::spawn(move || {
            run_capture(id, make_device(), frame_tx, thread_token);
        });
        Self {
            id,
            cancel_token,
            capture_thread: Some(capture_thread),
            frame_rx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn frames(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frame_rx.clone()
    }

    pub fn latest(&self) -> Option<VideoFrame> {
        self.frame_rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    pub fn stop(&mut self) {
        self.cancel_token.cancel();
        let Some(thread) = self.capture_thread.take() else {
            return;
        };
        let deadline = Instant::now() + STOP_TIMEOUT;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "Capture thread for session {} still blocked after {:?}, detaching it",
                    self.id, STOP_TIMEOUT
                );
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        if thread.join().is_err() {
            error!("Capture thread for session {} panicked", self.id);
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture<D: CaptureDevice>(
    id: Uuid,
    device: D,
    frame_tx: watch::Sender<Option<VideoFrame>>,
    cancel_token: CancellationToken,
) {
    let mut guard = DeviceGuard {
        device,
        opened: false,
    };
    let name = guard.device.name();
    if let Err(e) = guard.device.open() {
        error!("Failed to start camera {}: {}", name, e);
        return;
    }
    guard.opened = true;
    info!("Capture session {} acquired {}", id, name);

    while !cancel_token.is_cancelled() {
        match guard.device.read_frame() {
            Ok(image) => {
                frame_tx.send_replace(Some(VideoFrame::new(id, image)));
            }
            Err(e) => {
                warn!("Capture session {} lost {}: {}", id, name, e);
                break;
            }
        }
    }
}
