//! In-memory peer connection

use super::ANSWER_SDP;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use whpp_viewer::{Error, PeerConnectionFacade, Result, SdpType};

type CloseHook = Box<dyn Fn() + Send + Sync>;

/// Records every facade call and answers with [`ANSWER_SDP`]
#[derive(Default)]
pub struct ScriptedPeer {
    remote: Mutex<Option<(String, SdpType)>>,
    local: Mutex<Option<String>>,
    fail_answer: bool,
    fail_close: bool,
    on_close: Option<CloseHook>,
    calls: Mutex<Vec<&'static str>>,
    close_count: AtomicUsize,
}

impl ScriptedPeer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create_answer` returns an SDP error
    pub fn with_failing_answer(mut self) -> Self {
        self.fail_answer = true;
        self
    }

    /// `close` is recorded, then returns an error
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Run `hook` inside every `close` call
    pub fn on_close(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn remote_description(&self) -> Option<(String, SdpType)> {
        self.remote.lock().clone()
    }

    /// Facade calls in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl PeerConnectionFacade for ScriptedPeer {
    async fn set_remote_description(&self, sdp: String, sdp_type: SdpType) -> Result<()> {
        self.record("set_remote_description");
        *self.remote.lock() = Some((sdp, sdp_type));
        Ok(())
    }

    async fn create_answer(&self) -> Result<String> {
        self.record("create_answer");
        if self.fail_answer {
            return Err(Error::SdpError("scripted answer failure".to_string()));
        }
        Ok(ANSWER_SDP.to_string())
    }

    async fn set_local_description(&self, sdp: String) -> Result<()> {
        self.record("set_local_description");
        *self.local.lock() = Some(sdp);
        Ok(())
    }

    async fn local_description(&self) -> Option<String> {
        self.local.lock().clone()
    }

    async fn close(&self) -> Result<()> {
        self.record("close");
        self.close_count.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_close {
            hook();
        }
        if self.fail_close {
            return Err(Error::PeerConnectionError(
                "scripted close failure".to_string(),
            ));
        }
        Ok(())
    }
}
