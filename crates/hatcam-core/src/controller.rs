//! Capture loop controller: owns the polling cycle that ties capture,
//! detection, and positioning together, and its start/stop lifecycle.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::adapter::{DetectionError, FaceDetectorAdapter, FaceEngine};
use crate::hats::HatKind;
use crate::media::{MediaAccess, MediaAccessError, MediaStream};
use crate::overlay::{self, OverlaySurface};
use crate::selector::DeviceSelector;
use crate::types::{CaptureDevice, StreamConstraints};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("media access: {0}")]
    Media(#[from] MediaAccessError),
}

/// Lifecycle states of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Acquiring,
    Running,
    Stopping,
}

/// Currently selected hat and capture device. Mutated only through
/// controller methods, read by the loop each tick.
#[derive(Debug, Clone)]
pub struct Selection {
    pub hat: HatKind,
    pub device: Option<String>,
}

/// One active capture session. The media stream lives inside the polling
/// task and is released when the task winds down; cancelling the token and
/// joining the task is a complete teardown.
struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives the detect-and-place cycle.
///
/// Invariant: at most one session (one stream, one timer) exists at any
/// time. Every stop path cancels the pending ticks, releases the stream
/// tracks, and hides the overlay before the stop call returns.
pub struct CaptureController<M: MediaAccess, E: FaceEngine, O: OverlaySurface> {
    media: Arc<M>,
    detector: Arc<FaceDetectorAdapter<E>>,
    overlay: Arc<O>,
    selector: DeviceSelector<M>,
    selection: Arc<Mutex<Selection>>,
    tick_interval: Duration,
    preferred_width: u32,
    preferred_height: u32,
    state: Arc<watch::Sender<LoopState>>,
    session: Mutex<Option<Session>>,
}

impl<M, E, O> CaptureController<M, E, O>
where
    M: MediaAccess,
    E: FaceEngine,
    O: OverlaySurface,
{
    pub fn new(
        media: Arc<M>,
        detector: FaceDetectorAdapter<E>,
        overlay: Arc<O>,
        tick_interval: Duration,
        constraints: StreamConstraints,
    ) -> Self {
        let selector = DeviceSelector::new(Arc::clone(&media));
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            media,
            detector: Arc::new(detector),
            overlay,
            selector,
            selection: Arc::new(Mutex::new(Selection {
                hat: HatKind::Tophat,
                device: constraints.device_id,
            })),
            tick_interval,
            preferred_width: constraints.width,
            preferred_height: constraints.height,
            state: Arc::new(state),
            session: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle transitions.
    pub fn watch_state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    pub async fn selection(&self) -> Selection {
        self.selection.lock().await.clone()
    }

    pub async fn enumerate_devices(&self) -> Vec<CaptureDevice> {
        self.selector.enumerate().await
    }

    /// Change the hat used for subsequent detections. Takes effect on the
    /// next successful detection without restarting the loop.
    pub async fn set_hat(&self, hat: HatKind) {
        self.selection.lock().await.hat = hat;
        tracing::info!(hat = hat.id(), "hat selected");
    }

    /// Record a capture device selection. The id is not validated here;
    /// an invalid id surfaces as a stream-acquisition failure. If a run is
    /// active it is stopped and restarted against the new device.
    pub async fn select_device(&self, id: impl Into<String>) -> Result<(), ControllerError> {
        let id = id.into();
        tracing::info!(device = %id, "device selected");
        self.selection.lock().await.device = Some(id);

        if self.state() == LoopState::Running {
            self.start().await?;
        }
        Ok(())
    }

    /// Start the polling loop against the currently selected device.
    ///
    /// Any prior run is torn down completely first, so at most one stream
    /// and one timer ever exist. Acquisition failure is logged and leaves
    /// the controller `Idle`.
    pub async fn start(&self) -> Result<(), ControllerError> {
        self.stop().await;

        // Default the device to the first enumerated one if none selected.
        {
            let mut selection = self.selection.lock().await;
            if selection.device.is_none() {
                selection.device = self.selector.default_device().await;
            }
        }

        self.state.send_replace(LoopState::Acquiring);
        let constraints = StreamConstraints {
            width: self.preferred_width,
            height: self.preferred_height,
            device_id: self.selection.lock().await.device.clone(),
        };

        let stream = match self.media.open_stream(&constraints) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, device = ?constraints.device_id, "stream acquisition failed");
                self.state.send_replace(LoopState::Idle);
                return Err(ControllerError::Media(e));
            }
        };
        tracing::info!(device = ?constraints.device_id, "capture stream acquired");

        self.state.send_replace(LoopState::Running);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            stream,
            Arc::clone(&self.detector),
            Arc::clone(&self.overlay),
            Arc::clone(&self.selection),
            self.tick_interval,
            cancel.clone(),
            Arc::clone(&self.state),
        ));
        *self.session.lock().await = Some(Session { cancel, task });
        Ok(())
    }

    /// Stop the active run, if any.
    ///
    /// By the time this returns, no further ticks fire, the stream tracks
    /// are released, and the overlay is hidden. Idempotent: stopping while
    /// idle only re-hides the overlay.
    pub async fn stop(&self) {
        let session = self.session.lock().await.take();
        let Some(session) = session else {
            self.overlay.hide();
            self.state.send_replace(LoopState::Idle);
            return;
        };

        session.cancel.cancel();
        if let Err(e) = session.task.await {
            tracing::warn!(error = %e, "polling task aborted");
            // The task died before its own teardown could run.
            self.overlay.hide();
            self.state.send_replace(LoopState::Idle);
        }
    }
}

/// The polling cycle. Runs until cancelled or until a tick fails with a
/// [`DetectionError`], then tears the session down: stream released,
/// overlay hidden, state back to `Idle`.
async fn poll_loop<S, E, O>(
    stream: S,
    detector: Arc<FaceDetectorAdapter<E>>,
    overlay: Arc<O>,
    selection: Arc<Mutex<Selection>>,
    tick_interval: Duration,
    cancel: CancellationToken,
    state: Arc<watch::Sender<LoopState>>,
) where
    S: MediaStream,
    E: FaceEngine,
    O: OverlaySurface,
{
    // Shared with the per-tick blocking grabs; teardown waits on the lock
    // for any grab still in flight before releasing the hardware.
    let stream = Arc::new(StdMutex::new(stream));

    let mut ticker = tokio::time::interval(tick_interval);
    // Skip missed ticks rather than bursting: at most one detection is
    // ever in flight.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    // A detection that races a stop is dropped here, so its
                    // result never reaches the overlay.
                    _ = cancel.cancelled() => break,
                    result = run_tick(&stream, &detector, overlay.as_ref(), &selection) => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "detection failed; stopping capture loop");
                            break;
                        }
                    }
                }
            }
        }
    }

    state.send_replace(LoopState::Stopping);
    match stream.lock() {
        Ok(mut stream) => stream.stop(),
        Err(poisoned) => poisoned.into_inner().stop(),
    }
    overlay.hide();
    state.send_replace(LoopState::Idle);
    tracing::info!("capture loop stopped");
}

/// One detection cycle: grab a frame, detect once, place the selected hat.
/// "No face" leaves the overlay exactly as it was.
async fn run_tick<S, E, O>(
    stream: &Arc<StdMutex<S>>,
    detector: &FaceDetectorAdapter<E>,
    overlay: &O,
    selection: &Mutex<Selection>,
) -> Result<(), DetectionError>
where
    S: MediaStream,
    E: FaceEngine,
    O: OverlaySurface,
{
    // The V4L2 dequeue blocks until the driver hands over a buffer, so it
    // runs on the blocking pool like the inference call does.
    let grabbed = {
        let stream = Arc::clone(stream);
        tokio::task::spawn_blocking(move || {
            let mut stream = match stream.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            stream.grab_frame()
        })
        .await
        .map_err(|e| DetectionError::FrameSource(format!("frame grab task join failed: {e}")))?
    };
    let frame = grabbed.map_err(|e| DetectionError::FrameSource(e.to_string()))?;

    let Some(face) = detector.detect_once(frame).await? else {
        return Ok(());
    };

    let hat = selection.lock().await.hat;
    let placement = overlay::position(hat, &face);
    tracing::debug!(
        hat = hat.id(),
        top = placement.top,
        left = placement.left,
        confidence = face.confidence,
        "face detected"
    );
    overlay.show(hat.glyph(), &placement, &face);
    Ok(())
}
