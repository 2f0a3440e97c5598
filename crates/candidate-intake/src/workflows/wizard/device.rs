//! Camera/microphone acquisition.
//!
//! A [`MediaDevice`] hands out [`MediaStream`]s. The controller never holds a
//! raw stream: it wraps it in a [`StreamLease`] which stops every track when
//! released or dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which tracks to request from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

impl CaptureConstraints {
    pub fn track_count(&self) -> usize {
        usize::from(self.video) + usize::from(self.audio)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("permission to use the camera or microphone was denied")]
    PermissionDenied,
    #[error("no camera or microphone is available")]
    NotFound,
    #[error("capture device failed: {0}")]
    Backend(String),
}

/// A live camera/microphone stream.
pub trait MediaStream: Send {
    fn live_tracks(&self) -> usize;

    /// Stops every track. Must be safe to call more than once.
    fn stop_tracks(&mut self);

    /// Encoded data produced since the previous poll, if any.
    fn poll_chunk(&mut self) -> Option<Vec<u8>>;
}

#[async_trait]
pub trait MediaDevice: Send + Sync {
    async fn acquire(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError>;
}

/// Exclusive hold on a device stream.
pub struct StreamLease {
    stream: Option<Box<dyn MediaStream>>,
    preview_attached: bool,
}

impl StreamLease {
    pub(crate) fn new(stream: Box<dyn MediaStream>) -> Self {
        Self {
            stream: Some(stream),
            preview_attached: true,
        }
    }

    pub fn live_tracks(&self) -> usize {
        self.stream
            .as_ref()
            .map(|stream| stream.live_tracks())
            .unwrap_or(0)
    }

    pub fn preview_attached(&self) -> bool {
        self.preview_attached
    }

    pub(crate) fn poll_chunk(&mut self) -> Option<Vec<u8>> {
        self.stream.as_mut().and_then(|stream| stream.poll_chunk())
    }

    /// Stops every track and detaches the preview. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
        self.preview_attached = false;
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StreamLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLease")
            .field("live_tracks", &self.live_tracks())
            .field("preview_attached", &self.preview_attached)
            .finish()
    }
}

const WEBM_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Scriptable device used by the CLI demo and tests.
///
/// Clones share counters, so a test can keep one handle and watch how many
/// tracks the controller still holds.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    grant: bool,
    chunk_size: usize,
    live: Arc<AtomicUsize>,
    acquisitions: Arc<AtomicUsize>,
}

impl SimulatedCamera {
    pub fn granting() -> Self {
        Self {
            grant: true,
            chunk_size: 4 * 1024,
            live: Arc::new(AtomicUsize::new(0)),
            acquisitions: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denying() -> Self {
        Self {
            grant: false,
            ..Self::granting()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Tracks still live across every stream this camera handed out.
    pub fn live_tracks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevice for SimulatedCamera {
    async fn acquire(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError> {
        tokio::task::yield_now().await;

        if !self.grant {
            return Err(DeviceError::PermissionDenied);
        }
        let tracks = constraints.track_count();
        if tracks == 0 {
            return Err(DeviceError::NotFound);
        }

        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(tracks, Ordering::SeqCst);
        Ok(Box::new(SimulatedStream {
            live_tracks: tracks,
            shared_live: self.live.clone(),
            chunk_size: self.chunk_size,
            emitted: 0,
        }))
    }
}

struct SimulatedStream {
    live_tracks: usize,
    shared_live: Arc<AtomicUsize>,
    chunk_size: usize,
    emitted: usize,
}

impl MediaStream for SimulatedStream {
    fn live_tracks(&self) -> usize {
        self.live_tracks
    }

    fn stop_tracks(&mut self) {
        if self.live_tracks > 0 {
            self.shared_live
                .fetch_sub(self.live_tracks, Ordering::SeqCst);
            self.live_tracks = 0;
        }
    }

    fn poll_chunk(&mut self) -> Option<Vec<u8>> {
        if self.live_tracks == 0 || self.chunk_size == 0 {
            return None;
        }
        let mut chunk = vec![0_u8; self.chunk_size];
        if self.emitted == 0 {
            let header = WEBM_MAGIC.len().min(chunk.len());
            chunk[..header].copy_from_slice(&WEBM_MAGIC[..header]);
        }
        self.emitted += 1;
        Some(chunk)
    }
}
