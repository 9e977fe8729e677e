//! Frame sinks
//!
//! A sink collects remote tracks and, once started, drains each on its own
//! reader task. Tracks added after `start` are read immediately.
//!
//! Shutdown is two steps: `stop_intake` aborts the readers so no frame is
//! read or published afterwards, and `stop` releases whatever the sink hands
//! frames to.

use super::{FrameProcessor, FrameSlot, MediaFrame, RemoteTrack, TrackKind};
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Forwarded frames waiting for a consumer; newer frames are dropped when full
pub const FORWARD_CAPACITY: usize = 64;

/// Consumer of inbound media tracks
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn add_track(&self, track: Arc<dyn RemoteTrack>) -> Result<()>;

    async fn start(&self) -> Result<()>;

    /// Stop reading frames and refuse new tracks. Repeated calls are no-ops.
    async fn stop_intake(&self) -> Result<()>;

    /// Release the sink, stopping intake first if needed. Repeated calls are
    /// no-ops.
    async fn stop(&self) -> Result<()>;
}

type FrameHandler = Arc<dyn Fn(MediaFrame) + Send + Sync>;

#[derive(Default)]
struct PumpState {
    pending: Vec<Arc<dyn RemoteTrack>>,
    readers: Vec<JoinHandle<()>>,
    started: bool,
    stopped: bool,
}

/// Reader-task bookkeeping shared by the sinks
struct TrackPump {
    state: Mutex<PumpState>,
    on_frame: FrameHandler,
    frames: Arc<AtomicU64>,
}

impl TrackPump {
    fn new(on_frame: FrameHandler) -> Self {
        Self {
            state: Mutex::new(PumpState::default()),
            on_frame,
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    fn spawn_reader(&self, track: Arc<dyn RemoteTrack>) -> JoinHandle<()> {
        let on_frame = Arc::clone(&self.on_frame);
        let frames = Arc::clone(&self.frames);
        tokio::spawn(async move {
            let track_id = track.id();
            loop {
                match track.read_frame().await {
                    Ok(Some(frame)) => {
                        frames.fetch_add(1, Ordering::Relaxed);
                        on_frame(frame);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("Track read error (normal on close): {}", e);
                        break;
                    }
                }
            }
            debug!("Track reader task exited: {}", track_id);
        })
    }

    fn add_track(&self, track: Arc<dyn RemoteTrack>) {
        let mut state = self.state.lock();
        if state.stopped {
            debug!("Sink stopped, ignoring track {}", track.id());
        } else if state.started {
            let reader = self.spawn_reader(track);
            state.readers.push(reader);
        } else {
            state.pending.push(track);
        }
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.stopped {
            return Err(Error::MediaTrackError("Sink already stopped".to_string()));
        }
        if state.started {
            return Ok(());
        }
        state.started = true;

        let pending = std::mem::take(&mut state.pending);
        for track in pending {
            let reader = self.spawn_reader(track);
            state.readers.push(reader);
        }
        Ok(())
    }

    /// Abort every reader. Returns `false` if already halted.
    fn halt(&self) -> bool {
        let readers = {
            let mut state = self.state.lock();
            if state.stopped {
                return false;
            }
            state.stopped = true;
            state.pending.clear();
            std::mem::take(&mut state.readers)
        };
        for reader in readers {
            reader.abort();
        }
        debug!(frames = self.frames(), "Frame intake stopped");
        true
    }

    fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

/// Reads and discards every frame
pub struct MediaBlackhole {
    pump: TrackPump,
    released: AtomicBool,
}

impl MediaBlackhole {
    pub fn new() -> Self {
        Self {
            pump: TrackPump::new(Arc::new(|_frame| {})),
            released: AtomicBool::new(false),
        }
    }

    /// Frames consumed so far
    pub fn frames_discarded(&self) -> u64 {
        self.pump.frames()
    }
}

impl Default for MediaBlackhole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSink for MediaBlackhole {
    async fn add_track(&self, track: Arc<dyn RemoteTrack>) -> Result<()> {
        self.pump.add_track(track);
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.pump.start()
    }

    async fn stop_intake(&self) -> Result<()> {
        self.pump.halt();
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.pump.halt();
        if !self.released.swap(true, Ordering::SeqCst) {
            info!(frames = self.pump.frames(), "Media blackhole stopped");
        }
        Ok(())
    }
}

/// Runs video frames through a [`FrameProcessor`] and forwards its output.
///
/// Audio frames are forwarded unchanged. Forwarded frames go to the receiver
/// from [`ProcessingSink::take_forwarded`]; the channel closes on `stop`.
pub struct ProcessingSink {
    pump: TrackPump,
    slot: FrameSlot,
    processed: Arc<AtomicU64>,
    forward_tx: Arc<Mutex<Option<mpsc::Sender<MediaFrame>>>>,
    forward_rx: Mutex<Option<mpsc::Receiver<MediaFrame>>>,
}

impl ProcessingSink {
    pub fn new<P: FrameProcessor>(processor: P, slot: FrameSlot) -> Self {
        let processor = Arc::new(processor);
        let processed = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::channel(FORWARD_CAPACITY);
        let forward_tx = Arc::new(Mutex::new(Some(tx)));

        let handler_slot = slot.clone();
        let handler_processed = Arc::clone(&processed);
        let handler_forward = Arc::clone(&forward_tx);
        let on_frame: FrameHandler = Arc::new(move |frame: MediaFrame| {
            let forwarded = if frame.kind == TrackKind::Video {
                let out = processor.process(frame, &handler_slot);
                handler_processed.fetch_add(1, Ordering::Relaxed);
                out
            } else {
                frame
            };

            if let Some(tx) = handler_forward.lock().as_ref() {
                if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(forwarded) {
                    debug!("Forward queue full, dropping frame");
                }
            }
        });

        Self {
            pump: TrackPump::new(on_frame),
            slot,
            processed,
            forward_tx,
            forward_rx: Mutex::new(Some(rx)),
        }
    }

    /// Slot the processor publishes into
    pub fn slot(&self) -> &FrameSlot {
        &self.slot
    }

    /// Receiver of forwarded frames; `None` after the first call
    pub fn take_forwarded(&self) -> Option<mpsc::Receiver<MediaFrame>> {
        self.forward_rx.lock().take()
    }

    /// Video frames run through the processor so far
    pub fn frames_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// All frames read so far, audio included
    pub fn frames_received(&self) -> u64 {
        self.pump.frames()
    }
}

#[async_trait]
impl FrameSink for ProcessingSink {
    async fn add_track(&self, track: Arc<dyn RemoteTrack>) -> Result<()> {
        self.pump.add_track(track);
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.pump.start()
    }

    async fn stop_intake(&self) -> Result<()> {
        // Closed first: a reader mid-frame can no longer publish
        self.slot.close();
        self.pump.halt();
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stop_intake().await?;
        let released = self.forward_tx.lock().take();
        if released.is_some() {
            info!(
                frames = self.pump.frames(),
                processed = self.frames_processed(),
                "Processing sink stopped"
            );
        }
        Ok(())
    }
}
