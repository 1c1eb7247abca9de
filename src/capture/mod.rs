//! Frame Source
//!
//! Supplies the current raster in live mode. A capture device is opened
//! through a `CameraBackend`, then a recurring tokio task reads it on a fixed
//! interval and leaves the newest frame in a single slot. Device reads run on
//! the blocking pool, and the task only suspends on the tick or on a read, so a
//! cancellation from `stop()` is observed without waiting for the device.

pub mod frame;

#[cfg(feature = "camera")]
pub mod camera;

use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CameraSettings;
use crate::error::ScanError;

pub use frame::{load_image, FrameOrigin, Raster};

/// An open capture device
pub trait FrameGrabber: Send {
    /// Read the newest frame from the device
    fn grab(&mut self) -> Result<RgbaImage, String>;
}

/// Opens capture devices
pub trait CameraBackend: Send + Sync {
    fn open(
        &self,
        device_index: u32,
        settings: &CameraSettings,
    ) -> Result<Box<dyn FrameGrabber>, String>;
}

/// Backend used when the crate is built without camera support
#[derive(Debug, Default)]
pub struct UnavailableBackend;

impl CameraBackend for UnavailableBackend {
    fn open(&self, _: u32, _: &CameraSettings) -> Result<Box<dyn FrameGrabber>, String> {
        Err("camera support not compiled in (build with --features camera)".to_string())
    }
}

/// Camera backend for this build
pub fn default_backend() -> Arc<dyn CameraBackend> {
    #[cfg(feature = "camera")]
    {
        Arc::new(camera::NokhwaBackend)
    }
    #[cfg(not(feature = "camera"))]
    {
        Arc::new(UnavailableBackend)
    }
}

/// Live-mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Streaming { device_index: u32 },
}

impl CaptureState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, CaptureState::Streaming { .. })
    }
}

/// Latest output of the poll task, overwritten on every tick
#[derive(Debug, Default)]
struct FrameSlot {
    /// Newest frame not yet taken by `poll`
    frame: Option<Arc<Raster>>,
    /// Set once when the device stops delivering frames; the task has exited
    failure: Option<String>,
}

type SharedSlot = Arc<Mutex<FrameSlot>>;
type SharedDevice = Arc<Mutex<Option<Box<dyn FrameGrabber>>>>;

/// Camera frame source with an Idle/Streaming state machine
pub struct FrameSource {
    backend: Arc<dyn CameraBackend>,
    settings: CameraSettings,
    runtime: Handle,
    state: CaptureState,
    /// Device of the current stream; taken (and dropped) on stop
    device: Option<SharedDevice>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    slot: Option<SharedSlot>,
}

impl FrameSource {
    pub fn new(backend: Arc<dyn CameraBackend>, settings: CameraSettings, runtime: Handle) -> Self {
        Self {
            backend,
            settings,
            runtime,
            state: CaptureState::Idle,
            device: None,
            cancel: None,
            task: None,
            slot: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_streaming()
    }

    /// Poll interval used while streaming
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_interval_ms.max(1))
    }

    /// Open a capture device and begin polling it
    ///
    /// Starting while already streaming is a no-op that returns the current state.
    pub fn start(&mut self, device_index: u32) -> Result<CaptureState, ScanError> {
        if self.state.is_streaming() {
            debug!("Camera already streaming, ignoring start");
            return Ok(self.state);
        }

        info!("Opening camera {}", device_index);
        let grabber = self
            .backend
            .open(device_index, &self.settings)
            .map_err(|reason| {
                warn!("Camera {} unavailable: {}", device_index, reason);
                ScanError::DeviceUnavailable {
                    index: device_index,
                    reason,
                }
            })?;

        let device: SharedDevice = Arc::new(Mutex::new(Some(grabber)));
        let token = CancellationToken::new();
        let slot = SharedSlot::default();

        let task = self.runtime.spawn(poll_frames(
            device.clone(),
            token.clone(),
            slot.clone(),
            self.poll_interval(),
            device_index,
        ));

        self.device = Some(device);
        self.cancel = Some(token);
        self.task = Some(task);
        self.slot = Some(slot);
        self.state = CaptureState::Streaming { device_index };

        info!(
            "Camera {} streaming every {:?}",
            device_index,
            self.poll_interval()
        );
        Ok(self.state)
    }

    /// Stop polling and release the device
    ///
    /// Safe to call at any time, including when idle or before any start.
    /// Never waits on the device: if a read is in progress, the device is
    /// released as soon as that read returns.
    pub fn stop(&mut self) -> CaptureState {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(device) = self.device.take() {
            match device.try_lock() {
                Some(mut guard) => {
                    if guard.take().is_some() {
                        info!("Camera released");
                    }
                }
                None => info!("Camera read in progress, releasing when it returns"),
            }
        }
        self.slot = None;
        self.state = CaptureState::Idle;
        self.state
    }

    /// Take the newest frame published since the last call
    ///
    /// A read failure moves the source back to Idle and is returned as
    /// `CaptureReadFailure`.
    pub fn poll(&mut self) -> Result<Option<Arc<Raster>>, ScanError> {
        let Some(slot) = &self.slot else {
            return Ok(None);
        };
        let (frame, failure) = {
            let mut slot = slot.lock();
            (slot.frame.take(), slot.failure.take())
        };

        if let Some(reason) = failure {
            warn!("Camera read failed: {}", reason);
            self.stop();
            return Err(ScanError::CaptureReadFailure(reason));
        }

        Ok(frame)
    }

    /// Frames waiting to be taken by `poll`
    #[cfg(test)]
    fn pending_frames(&self) -> usize {
        self.slot
            .as_ref()
            .map_or(0, |slot| usize::from(slot.lock().frame.is_some()))
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Recurring poll task for one stream
async fn poll_frames(
    device: SharedDevice,
    token: CancellationToken,
    slot: SharedSlot,
    period: Duration,
    device_index: u32,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Reads block until the device answers
        let reader = device.clone();
        let read = tokio::task::spawn_blocking(move || {
            let grabbed = reader.lock().as_mut().map(|grabber| grabber.grab());
            grabbed
        });

        let grabbed = tokio::select! {
            _ = token.cancelled() => break,
            joined = read => match joined {
                Ok(Some(grabbed)) => grabbed,
                Ok(None) => break,
                Err(e) => Err(format!("camera read panicked: {}", e)),
            },
        };

        match grabbed {
            Ok(image) => {
                let raster = Arc::new(Raster::from_camera(image, device_index));
                slot.lock().frame = Some(raster);
            }
            Err(reason) => {
                device.lock().take();
                slot.lock().failure = Some(reason);
                break;
            }
        }
    }

    debug!("Camera {} poll task finished", device_index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    struct FakeGrabber {
        frames_left: Option<usize>,
        released: Arc<AtomicBool>,
    }

    impl FrameGrabber for FakeGrabber {
        fn grab(&mut self) -> Result<RgbaImage, String> {
            if let Some(left) = self.frames_left.as_mut() {
                if *left == 0 {
                    return Err("device unplugged".to_string());
                }
                *left -= 1;
            }
            Ok(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])))
        }
    }

    impl Drop for FakeGrabber {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        opens: Arc<AtomicUsize>,
        released: Arc<AtomicBool>,
        frames: Option<usize>,
        fail_open: bool,
    }

    impl CameraBackend for FakeBackend {
        fn open(&self, _: u32, _: &CameraSettings) -> Result<Box<dyn FrameGrabber>, String> {
            if self.fail_open {
                return Err("no such device".to_string());
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeGrabber {
                frames_left: self.frames,
                released: self.released.clone(),
            }))
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn settings() -> CameraSettings {
        CameraSettings {
            poll_interval_ms: 5,
            ..CameraSettings::default()
        }
    }

    fn wait_for<T>(mut f: impl FnMut() -> Option<T>) -> Option<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(value) = f() {
                return Some(value);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let rt = runtime();
        let mut source = FrameSource::new(Arc::new(FakeBackend::default()), settings(), rt.handle().clone());

        assert_eq!(source.stop(), CaptureState::Idle);
        assert_eq!(source.stop(), CaptureState::Idle);
        assert!(source.poll().unwrap().is_none());
    }

    #[test]
    fn test_start_failure_stays_idle() {
        let rt = runtime();
        let backend = FakeBackend {
            fail_open: true,
            ..FakeBackend::default()
        };
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());

        match source.start(3) {
            Err(ScanError::DeviceUnavailable { index, reason }) => {
                assert_eq!(index, 3);
                assert_eq!(reason, "no such device");
            }
            other => panic!("expected DeviceUnavailable, got {:?}", other),
        }
        assert_eq!(source.state(), CaptureState::Idle);
    }

    #[test]
    fn test_start_twice_opens_once() {
        let rt = runtime();
        let backend = FakeBackend::default();
        let opens = backend.opens.clone();
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());

        let first = source.start(0).unwrap();
        let second = source.start(0).unwrap();

        assert_eq!(first, CaptureState::Streaming { device_index: 0 });
        assert_eq!(second, first);
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        source.stop();
    }

    #[test]
    fn test_frames_are_published() {
        let rt = runtime();
        let mut source = FrameSource::new(Arc::new(FakeBackend::default()), settings(), rt.handle().clone());
        source.start(1).unwrap();

        let raster = wait_for(|| source.poll().unwrap()).expect("no frame arrived");
        assert_eq!(raster.dimensions(), (4, 3));
        assert_eq!(raster.origin, FrameOrigin::Camera(1));
        source.stop();
    }

    #[test]
    fn test_stop_releases_device() {
        let rt = runtime();
        let backend = FakeBackend::default();
        let released = backend.released.clone();
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());

        source.start(0).unwrap();
        assert!(!released.load(Ordering::SeqCst));

        assert_eq!(source.stop(), CaptureState::Idle);
        assert!(wait_for(|| released.load(Ordering::SeqCst).then_some(())).is_some());
        assert!(source.poll().unwrap().is_none());
    }

    /// Numbers its frames through their width
    struct CountingGrabber {
        grabs: Arc<AtomicUsize>,
    }

    impl FrameGrabber for CountingGrabber {
        fn grab(&mut self) -> Result<RgbaImage, String> {
            let seq = self.grabs.fetch_add(1, Ordering::SeqCst) as u32;
            Ok(RgbaImage::new(seq + 1, 1))
        }
    }

    struct CountingBackend {
        grabs: Arc<AtomicUsize>,
    }

    impl CameraBackend for CountingBackend {
        fn open(&self, _: u32, _: &CameraSettings) -> Result<Box<dyn FrameGrabber>, String> {
            Ok(Box::new(CountingGrabber {
                grabs: self.grabs.clone(),
            }))
        }
    }

    #[test]
    fn test_unpolled_frames_do_not_pile_up() {
        let rt = runtime();
        let grabs = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            grabs: grabs.clone(),
        };
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());
        source.start(0).unwrap();

        // Window not drawing: nobody polls while the camera keeps delivering
        assert!(wait_for(|| (grabs.load(Ordering::SeqCst) >= 20).then_some(())).is_some());
        assert!(source.pending_frames() <= 1);

        let produced = grabs.load(Ordering::SeqCst);
        let frame = source.poll().unwrap().expect("newest frame");
        let seq = frame.image.width() as usize - 1;
        assert!(seq + 2 >= produced, "got frame {} of {}", seq, produced);
        source.stop();
    }

    /// Blocks every read until the test opens the gate
    struct StuckGrabber {
        entered: Arc<AtomicBool>,
        gate: crossbeam_channel::Receiver<()>,
        released: Arc<AtomicBool>,
    }

    impl FrameGrabber for StuckGrabber {
        fn grab(&mut self) -> Result<RgbaImage, String> {
            self.entered.store(true, Ordering::SeqCst);
            let _ = self.gate.recv();
            Ok(RgbaImage::new(1, 1))
        }
    }

    impl Drop for StuckGrabber {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct StuckBackend {
        entered: Arc<AtomicBool>,
        gate: crossbeam_channel::Receiver<()>,
        released: Arc<AtomicBool>,
    }

    impl CameraBackend for StuckBackend {
        fn open(&self, _: u32, _: &CameraSettings) -> Result<Box<dyn FrameGrabber>, String> {
            Ok(Box::new(StuckGrabber {
                entered: self.entered.clone(),
                gate: self.gate.clone(),
                released: self.released.clone(),
            }))
        }
    }

    #[test]
    fn test_stop_does_not_wait_for_hung_read() {
        let rt = runtime();
        let (open_gate, gate) = crossbeam_channel::unbounded();
        let entered = Arc::new(AtomicBool::new(false));
        let released = Arc::new(AtomicBool::new(false));
        let backend = StuckBackend {
            entered: entered.clone(),
            gate,
            released: released.clone(),
        };
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());
        source.start(0).unwrap();
        assert!(wait_for(|| entered.load(Ordering::SeqCst).then_some(())).is_some());

        let started = Instant::now();
        assert_eq!(source.stop(), CaptureState::Idle);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!released.load(Ordering::SeqCst));

        // The device goes away once the read returns
        drop(open_gate);
        assert!(wait_for(|| released.load(Ordering::SeqCst).then_some(())).is_some());
    }

    #[test]
    fn test_read_failure_returns_to_idle() {
        let rt = runtime();
        let backend = FakeBackend {
            frames: Some(1),
            ..FakeBackend::default()
        };
        let released = backend.released.clone();
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());
        source.start(0).unwrap();

        let failure = wait_for(|| source.poll().err()).expect("read failure not reported");
        assert_eq!(
            failure,
            ScanError::CaptureReadFailure("device unplugged".to_string())
        );
        assert_eq!(source.state(), CaptureState::Idle);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_restart_after_stop() {
        let rt = runtime();
        let backend = FakeBackend::default();
        let opens = backend.opens.clone();
        let mut source = FrameSource::new(Arc::new(backend), settings(), rt.handle().clone());

        source.start(0).unwrap();
        source.stop();
        source.start(0).unwrap();

        assert!(source.is_streaming());
        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert!(wait_for(|| source.poll().unwrap()).is_some());
    }

    #[test]
    fn test_unavailable_backend() {
        let rt = runtime();
        let mut source = FrameSource::new(Arc::new(UnavailableBackend), settings(), rt.handle().clone());

        assert!(matches!(
            source.start(0),
            Err(ScanError::DeviceUnavailable { index: 0, .. })
        ));
        assert!(!source.is_streaming());
    }
}
