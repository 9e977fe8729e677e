//! Frame sink that releases peer events once started

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use whpp_viewer::{FrameSink, MediaBlackhole, PeerEvent, RemoteTrack, Result};

/// Wraps a [`MediaBlackhole`]. On `start`, which the coordinator calls right
/// after the answer is sent, it pushes the scripted events and drops its
/// sender.
pub struct ScriptedSink {
    inner: MediaBlackhole,
    on_start: Mutex<Option<(mpsc::UnboundedSender<PeerEvent>, Vec<PeerEvent>)>>,
}

impl ScriptedSink {
    pub fn new(events: mpsc::UnboundedSender<PeerEvent>, on_start: Vec<PeerEvent>) -> Arc<Self> {
        Arc::new(Self {
            inner: MediaBlackhole::new(),
            on_start: Mutex::new(Some((events, on_start))),
        })
    }
}

#[async_trait]
impl FrameSink for ScriptedSink {
    async fn add_track(&self, track: Arc<dyn RemoteTrack>) -> Result<()> {
        self.inner.add_track(track).await
    }

    async fn start(&self) -> Result<()> {
        self.inner.start().await?;
        if let Some((tx, events)) = self.on_start.lock().take() {
            for event in events {
                let _ = tx.send(event);
            }
        }
        Ok(())
    }

    async fn stop_intake(&self) -> Result<()> {
        self.inner.stop_intake().await
    }

    async fn stop(&self) -> Result<()> {
        self.inner.stop().await
    }
}
