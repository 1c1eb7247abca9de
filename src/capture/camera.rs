//! nokhwa capture backend
//!
//! The nokhwa camera handle is not `Send` on every platform, so each opened
//! device lives on its own thread and answers frame requests over channels.
//! Dropping the grabber closes the request channel, which stops the stream
//! and joins the thread.

use crossbeam_channel::{bounded, Receiver, Sender};
use image::{DynamicImage, RgbImage, RgbaImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use super::{CameraBackend, FrameGrabber};
use crate::config::CameraSettings;

/// Native capture devices through nokhwa
#[derive(Debug, Default)]
pub struct NokhwaBackend;

impl CameraBackend for NokhwaBackend {
    fn open(
        &self,
        device_index: u32,
        settings: &CameraSettings,
    ) -> Result<Box<dyn FrameGrabber>, String> {
        let (request_tx, request_rx) = bounded::<()>(1);
        let (frame_tx, frame_rx) = bounded::<Result<RgbaImage, String>>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let settings = settings.clone();

        let worker = std::thread::Builder::new()
            .name(format!("camera-{}", device_index))
            .spawn(move || {
                let mut camera = match open_camera(device_index, &settings) {
                    Ok(camera) => {
                        let _ = ready_tx.send(Ok(()));
                        camera
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while request_rx.recv().is_ok() {
                    if frame_tx.send(read_frame(&mut camera)).is_err() {
                        break;
                    }
                }

                if let Err(e) = camera.stop_stream() {
                    warn!("Failed to stop camera {} stream: {}", device_index, e);
                }
                debug!("Camera {} thread exiting", device_index);
            })
            .map_err(|e| format!("failed to spawn camera thread: {}", e))?;

        ready_rx
            .recv()
            .map_err(|_| "camera thread exited during startup".to_string())??;

        info!("Camera {} opened", device_index);
        Ok(Box::new(NokhwaGrabber {
            requests: Some(request_tx),
            frames: frame_rx,
            worker: Some(worker),
        }))
    }
}

struct NokhwaGrabber {
    requests: Option<Sender<()>>,
    frames: Receiver<Result<RgbaImage, String>>,
    worker: Option<JoinHandle<()>>,
}

impl FrameGrabber for NokhwaGrabber {
    fn grab(&mut self) -> Result<RgbaImage, String> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| "camera already released".to_string())?;
        requests
            .send(())
            .map_err(|_| "camera thread is gone".to_string())?;
        self.frames
            .recv()
            .map_err(|_| "camera thread is gone".to_string())?
    }
}

impl Drop for NokhwaGrabber {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn open_camera(device_index: u32, settings: &CameraSettings) -> Result<Camera, String> {
    let format = CameraFormat::new(
        Resolution::new(settings.frame_width, settings.frame_height),
        FrameFormat::MJPEG,
        settings.fps,
    );
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

    let mut camera =
        Camera::new(CameraIndex::Index(device_index), requested).map_err(|e| e.to_string())?;
    camera.open_stream().map_err(|e| e.to_string())?;
    Ok(camera)
}

fn read_frame(camera: &mut Camera) -> Result<RgbaImage, String> {
    let buffer = camera.frame().map_err(|e| e.to_string())?;
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| e.to_string())?;

    // nokhwa links its own `image` version, so rebuild the buffer from raw bytes
    let (width, height) = (decoded.width(), decoded.height());
    let rgb = RgbImage::from_raw(width, height, decoded.into_raw())
        .ok_or_else(|| "camera frame has inconsistent dimensions".to_string())?;

    Ok(DynamicImage::ImageRgb8(rgb).to_rgba8())
}
