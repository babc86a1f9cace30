use log::{debug, info, warn};

use crate::error::FocusError;

use super::device::CameraDevice;
use super::frame::{encode_frame, FrameCapture};

/// Owns the camera for one controller. Only the controller acquires and releases it.
pub struct FrameSampler {
    // `None` only while the device is out on the blocking pool.
    device: Option<Box<dyn CameraDevice>>,
    acquired: bool,
}

impl FrameSampler {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device: Some(device),
            acquired: false,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub async fn acquire(&mut self) -> Result<(), FocusError> {
        if self.acquired {
            return Ok(());
        }

        let mut device = self
            .device
            .take()
            .ok_or_else(|| FocusError::DeviceUnavailable("camera is busy".into()))?;

        let (device, opened) = tokio::task::spawn_blocking(move || {
            let result = device.open();
            (device, result)
        })
        .await
        .map_err(|err| FocusError::DeviceUnavailable(format!("camera open worker failed: {err}")))?;

        let name = device.name().to_string();
        self.device = Some(device);

        match opened {
            Ok(()) => {
                self.acquired = true;
                info!("Camera '{name}' acquired");
                Ok(())
            }
            Err(err) => {
                warn!("Camera '{name}' unavailable: {err:#}");
                Err(FocusError::DeviceUnavailable(format!("{err:#}")))
            }
        }
    }

    /// Grab and encode the current frame. Reading the device and JPEG encoding run
    /// on the blocking pool.
    pub async fn capture_frame(&mut self) -> FrameCapture {
        if !self.acquired {
            return FrameCapture::NotReady;
        }
        let Some(mut device) = self.device.take() else {
            return FrameCapture::NotReady;
        };

        let joined = tokio::task::spawn_blocking(move || {
            let capture = grab_and_encode(&mut *device);
            (device, capture)
        })
        .await;

        match joined {
            Ok((device, capture)) => {
                self.device = Some(device);
                capture
            }
            Err(err) => {
                // The device went down with the worker; nothing left to release.
                warn!("Frame capture worker failed: {err}");
                self.acquired = false;
                FrameCapture::NotReady
            }
        }
    }

    pub fn release(&mut self) {
        if !self.acquired {
            return;
        }
        if let Some(device) = self.device.as_mut() {
            device.close();
            info!("Camera '{}' released", device.name());
        }
        self.acquired = false;
    }
}

fn grab_and_encode(device: &mut dyn CameraDevice) -> FrameCapture {
    let Some(img) = device.current_frame() else {
        debug!("Camera has no frame yet");
        return FrameCapture::NotReady;
    };
    if img.width() == 0 || img.height() == 0 {
        debug!("Camera frame has no dimensions yet");
        return FrameCapture::NotReady;
    }

    match encode_frame(&img) {
        Ok(frame) => FrameCapture::Ready(frame),
        Err(err) => {
            warn!("Dropping frame that failed to encode: {err:#}");
            FrameCapture::NotReady
        }
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.release();
    }
}
