//! Capture session controller.
//!
//! Drives one camera/microphone recording through
//! `Idle -> Requesting -> Recording -> Stopped` (or `Denied`). Manual stops and
//! the duration cap both funnel into [`CaptureController::stop_with`], which is
//! the only place the device lease is released while a session is live.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blobs::BlobStore;
use super::device::{CaptureConstraints, MediaDevice, StreamLease};
use super::draft::VideoRef;

pub const MAX_RECORDING_SECONDS: u32 = 90;
pub const RECORDING_CONTENT_TYPE: &str = "video/webm";
pub const DENIED_MESSAGE: &str = "Camera or microphone access denied.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    #[default]
    Idle,
    Requesting,
    Recording,
    Stopped,
    Denied,
}

/// Why a recording ended. Both reasons release the device the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Manual,
    LimitReached,
}

impl StopReason {
    pub fn notice(self, limit_seconds: u32) -> Option<String> {
        match self {
            StopReason::Manual => None,
            StopReason::LimitReached => Some(format!(
                "Recording stopped: {limit_seconds} second limit reached."
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Requesting,
    Started { session_id: Uuid },
    Tick { elapsed_seconds: u32 },
    Stopped { reason: StopReason },
    Completed { session_id: Uuid, bytes: usize },
    Denied { message: String },
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub max_duration_seconds: u32,
    /// `None` leaves ticking to the caller via [`CaptureController::tick`].
    pub tick_interval: Option<Duration>,
    pub constraints: CaptureConstraints,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_duration_seconds: MAX_RECORDING_SECONDS,
            tick_interval: Some(Duration::from_secs(1)),
            constraints: CaptureConstraints::default(),
        }
    }
}

impl CaptureSettings {
    pub fn manual_ticks() -> Self {
        Self {
            tick_interval: None,
            ..Self::default()
        }
    }
}

/// A finished recording. Only the controller can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRecording {
    session_id: Uuid,
    duration_seconds: u32,
    stop_reason: StopReason,
    bytes: Arc<[u8]>,
}

impl CompletedRecording {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &'static str {
        RECORDING_CONTENT_TYPE
    }

    /// Parks the bytes in `blobs` and returns the handle the draft accepts.
    pub fn register(&self, blobs: &BlobStore) -> VideoRef {
        let blob = blobs.register(
            super::assembler::VIDEO_FILE_NAME,
            RECORDING_CONTENT_TYPE,
            self.bytes.clone(),
        );
        VideoRef::new(blob, self.session_id, self.duration_seconds)
    }
}

/// Resolves once the session's recorder has been finalized.
#[derive(Debug)]
pub struct RecordingCompletion {
    receiver: oneshot::Receiver<CompletedRecording>,
}

impl RecordingCompletion {
    /// `None` when the session ended without producing data.
    pub async fn wait(self) -> Option<CompletedRecording> {
        self.receiver.await.ok()
    }
}

/// Observable state of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub status: RecordingStatus,
    pub elapsed_seconds: u32,
    pub stream_held: bool,
    pub live_tracks: usize,
    pub preview_attached: bool,
    pub stop_reason: Option<StopReason>,
    pub message: Option<String>,
    pub has_recording: bool,
}

struct Recorder {
    chunks: Vec<Vec<u8>>,
    completion: Option<oneshot::Sender<CompletedRecording>>,
}

impl Recorder {
    fn new(completion: oneshot::Sender<CompletedRecording>) -> Self {
        Self {
            chunks: Vec::new(),
            completion: Some(completion),
        }
    }

    fn push(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    fn finalize(
        mut self,
        session_id: Uuid,
        duration_seconds: u32,
        stop_reason: StopReason,
    ) -> Option<CompletedRecording> {
        if self.chunks.is_empty() {
            return None;
        }
        let bytes: Vec<u8> = self.chunks.concat();
        let recording = CompletedRecording {
            session_id,
            duration_seconds,
            stop_reason,
            bytes: bytes.into(),
        };
        if let Some(sender) = self.completion.take() {
            let _ = sender.send(recording.clone());
        }
        Some(recording)
    }
}

#[derive(Default)]
struct Session {
    generation: u64,
    id: Option<Uuid>,
    status: RecordingStatus,
    elapsed_seconds: u32,
    lease: Option<StreamLease>,
    recorder: Option<Recorder>,
    ticker: Option<JoinHandle<()>>,
    completion: Option<oneshot::Receiver<CompletedRecording>>,
    stop_reason: Option<StopReason>,
    message: Option<String>,
    recording: Option<CompletedRecording>,
}

impl Session {
    /// Resets everything for a fresh attempt and returns its generation.
    fn begin(&mut self) -> u64 {
        self.release_resources();
        self.generation += 1;
        self.id = Some(Uuid::new_v4());
        self.status = RecordingStatus::Requesting;
        self.elapsed_seconds = 0;
        self.completion = None;
        self.stop_reason = None;
        self.message = None;
        self.recording = None;
        self.generation
    }

    fn release_resources(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(mut lease) = self.lease.take() {
            lease.release();
        }
        self.recorder = None;
    }
}

struct Inner {
    device: Arc<dyn MediaDevice>,
    settings: CaptureSettings,
    session: Mutex<Session>,
    events: broadcast::Sender<CaptureEvent>,
}

/// Cloneable handle to one capture session controller.
#[derive(Clone)]
pub struct CaptureController {
    inner: Arc<Inner>,
}

impl CaptureController {
    pub fn new(device: Arc<dyn MediaDevice>) -> Self {
        Self::with_settings(device, CaptureSettings::default())
    }

    pub fn with_settings(device: Arc<dyn MediaDevice>, settings: CaptureSettings) -> Self {
        let (events, _) = broadcast::channel(128);
        Self {
            inner: Arc::new(Inner {
                device,
                settings,
                session: Mutex::new(Session::default()),
                events,
            }),
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.inner.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> RecordingStatus {
        self.inner.session.lock().status
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.inner.session.lock().elapsed_seconds
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.inner.session.lock();
        SessionSnapshot {
            session_id: session.id,
            status: session.status,
            elapsed_seconds: session.elapsed_seconds,
            stream_held: session.lease.is_some(),
            live_tracks: session
                .lease
                .as_ref()
                .map(StreamLease::live_tracks)
                .unwrap_or(0),
            preview_attached: session
                .lease
                .as_ref()
                .map(StreamLease::preview_attached)
                .unwrap_or(false),
            stop_reason: session.stop_reason,
            message: session.message.clone(),
            has_recording: session.recording.is_some(),
        }
    }

    /// The finished recording of the current session, if it produced one.
    pub fn recording(&self) -> Option<CompletedRecording> {
        self.inner.session.lock().recording.clone()
    }

    /// Hands out the completion signal of the current session once.
    pub fn completion(&self) -> Option<RecordingCompletion> {
        self.inner
            .session
            .lock()
            .completion
            .take()
            .map(|receiver| RecordingCompletion { receiver })
    }

    /// Starts a new session. Never fails: a refused device lands in `Denied`.
    ///
    /// While a session is requesting or recording this is a no-op that returns
    /// the current status.
    pub async fn start(&self) -> RecordingStatus {
        let generation = {
            let mut session = self.inner.session.lock();
            if matches!(
                session.status,
                RecordingStatus::Requesting | RecordingStatus::Recording
            ) {
                debug!(status = ?session.status, "capture start ignored, session active");
                return session.status;
            }
            session.begin()
        };
        self.emit(CaptureEvent::Requesting);

        let acquired = self
            .inner
            .device
            .acquire(self.inner.settings.constraints)
            .await;

        let mut session = self.inner.session.lock();
        if session.generation != generation || session.status != RecordingStatus::Requesting {
            if let Ok(stream) = acquired {
                drop(StreamLease::new(stream));
            }
            debug!("capture session torn down while acquiring the device");
            return session.status;
        }

        match acquired {
            Ok(stream) => {
                let (sender, receiver) = oneshot::channel();
                session.lease = Some(StreamLease::new(stream));
                session.recorder = Some(Recorder::new(sender));
                session.completion = Some(receiver);
                session.status = RecordingStatus::Recording;
                if let Some(period) = self.inner.settings.tick_interval {
                    session.ticker = Some(spawn_ticker(
                        Arc::downgrade(&self.inner),
                        generation,
                        period,
                    ));
                }
                let session_id = session.id.unwrap_or_default();
                info!(%session_id, "capture session recording");
                self.emit(CaptureEvent::Started { session_id });
            }
            Err(err) => {
                warn!(error = %err, "capture device refused");
                session.status = RecordingStatus::Denied;
                session.message = Some(DENIED_MESSAGE.to_string());
                self.emit(CaptureEvent::Denied {
                    message: DENIED_MESSAGE.to_string(),
                });
            }
        }
        session.status
    }

    /// Advances the elapsed time by one second. Returns the new elapsed value,
    /// or `None` when no session is recording.
    pub fn tick(&self) -> Option<u32> {
        self.advance(None)
    }

    /// One tick, optionally only for the session started as `generation`.
    /// The check and the increment happen under the same lock.
    fn advance(&self, generation: Option<u64>) -> Option<u32> {
        let (elapsed, limit_reached) = {
            let mut session = self.inner.session.lock();
            if session.status != RecordingStatus::Recording {
                return None;
            }
            if generation.is_some_and(|generation| generation != session.generation) {
                return None;
            }
            session.elapsed_seconds += 1;
            let chunk = session.lease.as_mut().and_then(StreamLease::poll_chunk);
            if let (Some(chunk), Some(recorder)) = (chunk, session.recorder.as_mut()) {
                recorder.push(chunk);
            }
            let elapsed = session.elapsed_seconds;
            (
                elapsed,
                elapsed >= self.inner.settings.max_duration_seconds,
            )
        };

        self.emit(CaptureEvent::Tick {
            elapsed_seconds: elapsed,
        });
        if limit_reached {
            self.stop_with(StopReason::LimitReached);
        }
        Some(elapsed)
    }

    pub fn stop(&self) {
        self.stop_with(StopReason::Manual);
    }

    /// Single stop path for manual and timed stops. Only the first caller
    /// while recording does anything.
    pub fn stop_with(&self, reason: StopReason) {
        let completed = {
            let mut session = self.inner.session.lock();
            if session.status != RecordingStatus::Recording {
                return;
            }

            if let Some(ticker) = session.ticker.take() {
                ticker.abort();
            }
            let mut recorder = session.recorder.take();
            if let Some(mut lease) = session.lease.take() {
                if let (Some(chunk), Some(recorder)) = (lease.poll_chunk(), recorder.as_mut()) {
                    recorder.push(chunk);
                }
                lease.release();
            }

            let limit = self.inner.settings.max_duration_seconds;
            session.status = RecordingStatus::Stopped;
            session.stop_reason = Some(reason);
            session.message = reason.notice(limit);

            let session_id = session.id.unwrap_or_default();
            let elapsed = session.elapsed_seconds;
            session.recording =
                recorder.and_then(|recorder| recorder.finalize(session_id, elapsed, reason));
            info!(
                %session_id,
                ?reason,
                elapsed_seconds = elapsed,
                "capture session stopped"
            );
            session
                .recording
                .as_ref()
                .map(|recording| (recording.session_id, recording.bytes.len()))
        };

        self.emit(CaptureEvent::Stopped { reason });
        if let Some((session_id, bytes)) = completed {
            self.emit(CaptureEvent::Completed { session_id, bytes });
        }
    }

    /// Releases the device and cancels the timer from any state. An active
    /// session is abandoned back to `Idle`; finished sessions keep their
    /// status and recording.
    pub fn teardown(&self) {
        let mut session = self.inner.session.lock();
        session.release_resources();
        if matches!(
            session.status,
            RecordingStatus::Requesting | RecordingStatus::Recording
        ) {
            session.generation += 1;
            session.status = RecordingStatus::Idle;
            session.completion = None;
            debug!("capture session abandoned during teardown");
        }
    }

    /// Forgets the previous session entirely.
    pub fn reset(&self) {
        let mut session = self.inner.session.lock();
        session.release_resources();
        let generation = session.generation + 1;
        *session = Session {
            generation,
            ..Session::default()
        };
    }

    fn emit(&self, event: CaptureEvent) {
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

fn spawn_ticker(inner: Weak<Inner>, generation: u64, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let controller = CaptureController { inner };
            if controller.advance(Some(generation)).is_none() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::wizard::device::{DeviceError, MediaStream, SimulatedCamera};

    fn manual_controller(camera: &SimulatedCamera) -> CaptureController {
        CaptureController::with_settings(Arc::new(camera.clone()), CaptureSettings::manual_ticks())
    }

    #[tokio::test]
    async fn elapsed_increases_by_one_per_tick() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);

        assert_eq!(controller.start().await, RecordingStatus::Recording);
        for expected in 1..=10 {
            assert_eq!(controller.tick(), Some(expected));
            assert_eq!(controller.elapsed_seconds(), expected);
        }
        assert_eq!(camera.live_tracks(), 2);
        controller.stop();
    }

    #[tokio::test]
    async fn limit_stops_at_ninety_and_flags_the_reason() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.start().await;

        let mut last = 0;
        for _ in 0..91 {
            if let Some(elapsed) = controller.tick() {
                assert!(elapsed <= MAX_RECORDING_SECONDS);
                assert!(elapsed > last);
                last = elapsed;
            }
        }

        let snapshot = controller.snapshot();
        assert_eq!(last, MAX_RECORDING_SECONDS);
        assert_eq!(snapshot.status, RecordingStatus::Stopped);
        assert_eq!(snapshot.elapsed_seconds, MAX_RECORDING_SECONDS);
        assert_eq!(snapshot.stop_reason, Some(StopReason::LimitReached));
        assert_eq!(
            snapshot.message.as_deref(),
            Some("Recording stopped: 90 second limit reached.")
        );
        assert!(!snapshot.stream_held);
        assert_eq!(camera.live_tracks(), 0);

        let recording = controller.recording().expect("recording produced");
        assert_eq!(recording.duration_seconds(), MAX_RECORDING_SECONDS);
        assert_eq!(recording.stop_reason(), StopReason::LimitReached);
    }

    #[tokio::test]
    async fn manual_stop_releases_tracks_and_detaches_preview() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.start().await;
        assert!(controller.snapshot().preview_attached);
        controller.tick();
        controller.stop();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, RecordingStatus::Stopped);
        assert_eq!(snapshot.stop_reason, Some(StopReason::Manual));
        assert!(snapshot.message.is_none());
        assert!(!snapshot.stream_held);
        assert!(!snapshot.preview_attached);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn denied_device_holds_nothing_and_can_retry() {
        let camera = SimulatedCamera::denying();
        let controller = manual_controller(&camera);

        assert_eq!(controller.start().await, RecordingStatus::Denied);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.elapsed_seconds, 0);
        assert!(!snapshot.stream_held);
        assert_eq!(snapshot.message.as_deref(), Some(DENIED_MESSAGE));
        assert_eq!(controller.tick(), None);

        assert_eq!(controller.start().await, RecordingStatus::Denied);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn start_while_recording_is_a_no_op() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.start().await;
        let first = controller.snapshot().session_id;
        controller.tick();

        assert_eq!(controller.start().await, RecordingStatus::Recording);
        assert_eq!(controller.snapshot().session_id, first);
        assert_eq!(controller.elapsed_seconds(), 1);
        assert_eq!(camera.acquisitions(), 1);
        controller.teardown();
    }

    #[tokio::test]
    async fn stop_outside_recording_does_nothing() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.stop();
        assert_eq!(controller.status(), RecordingStatus::Idle);

        controller.start().await;
        controller.tick();
        controller.stop();
        let recording = controller.recording();
        controller.stop_with(StopReason::LimitReached);
        assert_eq!(controller.snapshot().stop_reason, Some(StopReason::Manual));
        assert_eq!(controller.recording(), recording);
    }

    #[tokio::test]
    async fn completion_signal_delivers_one_recording() {
        let camera = SimulatedCamera::granting().with_chunk_size(32);
        let controller = manual_controller(&camera);
        let mut events = controller.subscribe();
        controller.start().await;
        let completion = controller.completion().expect("signal available");
        assert!(controller.completion().is_none());

        controller.tick();
        controller.tick();
        controller.stop();

        let recording = completion.wait().await.expect("recording delivered");
        assert_eq!(recording.bytes().len(), 3 * 32);
        assert_eq!(recording.duration_seconds(), 2);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&CaptureEvent::Stopped {
            reason: StopReason::Manual
        }));
        assert!(seen.iter().any(|event| matches!(
            event,
            CaptureEvent::Completed { bytes, .. } if *bytes == 96
        )));
    }

    #[tokio::test]
    async fn session_without_data_produces_no_recording() {
        let camera = SimulatedCamera::granting().with_chunk_size(0);
        let controller = manual_controller(&camera);
        controller.start().await;
        let completion = controller.completion().expect("signal available");
        controller.tick();
        controller.stop();

        assert!(completion.wait().await.is_none());
        assert!(controller.recording().is_none());
    }

    #[tokio::test]
    async fn restarting_after_stop_discards_previous_recording() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.start().await;
        controller.tick();
        controller.stop();
        let first = controller.recording().expect("first take");

        controller.start().await;
        assert!(controller.recording().is_none());
        assert_eq!(controller.elapsed_seconds(), 0);
        assert_ne!(controller.snapshot().session_id, Some(first.session_id()));
        controller.stop();
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn teardown_is_idempotent_and_releases_everything() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.teardown();

        controller.start().await;
        controller.tick();
        controller.teardown();
        controller.teardown();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, RecordingStatus::Idle);
        assert!(!snapshot.stream_held);
        assert!(!snapshot.has_recording);
        assert_eq!(camera.live_tracks(), 0);
        assert_eq!(controller.tick(), None);
    }

    #[tokio::test]
    async fn dropping_the_controller_releases_the_device() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);
        controller.start().await;
        assert_eq!(camera.live_tracks(), 2);
        drop(controller);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_drives_ticks_in_real_time() {
        let camera = SimulatedCamera::granting();
        let controller = CaptureController::new(Arc::new(camera.clone()));
        controller.start().await;

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(controller.elapsed_seconds(), 3);

        controller.stop();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(controller.elapsed_seconds(), 3);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_auto_stop_uses_the_shared_stop_path() {
        let camera = SimulatedCamera::granting();
        let settings = CaptureSettings {
            max_duration_seconds: 2,
            ..CaptureSettings::default()
        };
        let controller = CaptureController::with_settings(Arc::new(camera.clone()), settings);
        controller.start().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, RecordingStatus::Stopped);
        assert_eq!(snapshot.elapsed_seconds, 2);
        assert_eq!(snapshot.stop_reason, Some(StopReason::LimitReached));
        assert_eq!(camera.live_tracks(), 0);
    }

    /// Holds every acquisition until the test releases the gate.
    struct GatedCamera {
        camera: SimulatedCamera,
        gate: Arc<tokio::sync::Notify>,
    }

    #[async_trait::async_trait]
    impl MediaDevice for GatedCamera {
        async fn acquire(
            &self,
            constraints: CaptureConstraints,
        ) -> Result<Box<dyn MediaStream>, DeviceError> {
            self.gate.notified().await;
            self.camera.acquire(constraints).await
        }
    }

    #[tokio::test]
    async fn teardown_while_requesting_releases_the_late_grant() {
        let camera = SimulatedCamera::granting();
        let gate = Arc::new(tokio::sync::Notify::new());
        let controller = CaptureController::with_settings(
            Arc::new(GatedCamera {
                camera: camera.clone(),
                gate: gate.clone(),
            }),
            CaptureSettings::manual_ticks(),
        );

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start().await }
        });
        while controller.status() != RecordingStatus::Requesting {
            tokio::task::yield_now().await;
        }

        controller.teardown();
        assert_eq!(controller.status(), RecordingStatus::Idle);
        gate.notify_one();

        assert_eq!(pending.await.expect("start task"), RecordingStatus::Idle);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, RecordingStatus::Idle);
        assert!(!snapshot.stream_held);
        assert_eq!(camera.acquisitions(), 1);
        assert_eq!(camera.live_tracks(), 0);

        gate.notify_one();
        assert_eq!(controller.start().await, RecordingStatus::Recording);
        assert_eq!(controller.tick(), Some(1));
        assert_eq!(camera.live_tracks(), 2);
        controller.stop();
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn ticks_for_an_earlier_session_are_ignored() {
        let camera = SimulatedCamera::granting();
        let controller = manual_controller(&camera);

        controller.start().await;
        let first = controller.inner.session.lock().generation;
        controller.teardown();
        controller.start().await;
        let second = controller.inner.session.lock().generation;
        assert_ne!(first, second);

        assert_eq!(controller.advance(Some(first)), None);
        assert_eq!(controller.elapsed_seconds(), 0);
        assert_eq!(controller.advance(Some(second)), Some(1));
        assert_eq!(controller.elapsed_seconds(), 1);
    }
}
