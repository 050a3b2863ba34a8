//! Audio playback controller
//!
//! Owns at most one live playback resource and exposes toggle-play/stop
//! semantics keyed by message id. Synthesis goes through the service client;
//! decoding through the codec; the actual device sits behind
//! [`PlaybackDevice`] so tests can substitute it.

use crate::audio::codec::{decode_transport_payload, pcm16_to_samples, DecodedAudio};
use crate::service::config::{SYNTHESIS_CHANNELS, SYNTHESIS_SAMPLE_RATE};
use crate::service::ResponseServiceClient;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Single-shot completion signal fired when a resource finishes on its own
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// A live, stoppable playback resource
pub trait PlaybackHandle: Send {
    fn stop(&mut self);
}

/// Playback device abstraction: resume a possibly-suspended context and start
/// resources bound to decoded samples.
pub trait PlaybackDevice: Send + Sync {
    /// Resume the shared device context if it is suspended. Platform policy may
    /// keep contexts suspended until a user interaction, so this runs before
    /// every start.
    fn resume(&self) -> Result<()>;

    /// Create a resource bound to `audio` and start it. `on_complete` fires
    /// exactly once if playback runs to the end; it must not fire after
    /// [`PlaybackHandle::stop`].
    fn start(&self, audio: DecodedAudio, on_complete: CompletionCallback)
        -> Result<Box<dyn PlaybackHandle>>;
}

/// Playback target plus the exclusively-owned live resource.
///
/// `epoch` increments whenever a new target takes the slot; async continuations
/// and completion callbacks compare it to detect that they were superseded.
struct PlaybackSlot {
    target: Option<Uuid>,
    handle: Option<Box<dyn PlaybackHandle>>,
    epoch: u64,
}

impl PlaybackSlot {
    fn stop_current(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        self.target = None;
    }
}

/// Controls spoken previews of messages, one at a time
pub struct AudioPlaybackController<C, D> {
    client: Arc<C>,
    device: Arc<D>,
    slot: Arc<Mutex<PlaybackSlot>>,
}

impl<C, D> AudioPlaybackController<C, D>
where
    C: ResponseServiceClient,
    D: PlaybackDevice,
{
    pub fn new(client: Arc<C>, device: Arc<D>) -> Self {
        Self {
            client,
            device,
            slot: Arc::new(Mutex::new(PlaybackSlot {
                target: None,
                handle: None,
                epoch: 0,
            })),
        }
    }

    /// Message currently audible (or pending synthesis), if any
    pub fn active_target(&self) -> Option<Uuid> {
        self.slot.lock().target
    }

    /// Toggle spoken playback of `text` for the message `message_id`.
    ///
    /// Re-toggling the active message stops it. Toggling a different message
    /// stops whatever was playing first, then fetches, decodes and starts the
    /// new audio. Failures clear the playback state silently.
    pub async fn toggle(&self, text: &str, message_id: Uuid) {
        let epoch = {
            let mut slot = self.slot.lock();
            if slot.target == Some(message_id) {
                debug!(%message_id, "Stopping active playback");
                slot.stop_current();
                // Invalidate any fetch still in flight for this target
                slot.epoch += 1;
                return;
            }
            // At-most-one-handle invariant: release the previous resource
            // before the new target takes the slot.
            slot.stop_current();
            slot.target = Some(message_id);
            slot.epoch += 1;
            slot.epoch
        };

        if let Err(e) = self.fetch_and_play(text, epoch).await {
            warn!(%message_id, "Playback attempt failed: {e}");
            self.clear_if_current(epoch);
        }
    }

    async fn fetch_and_play(&self, text: &str, epoch: u64) -> Result<()> {
        let payload = match self.client.request_speech_synthesis(text).await? {
            Some(payload) => payload,
            None => {
                // No audio available is a silent, recoverable outcome
                debug!("Synthesis returned no audio");
                self.clear_if_current(epoch);
                return Ok(());
            }
        };

        let bytes = decode_transport_payload(&payload)?;
        let audio = pcm16_to_samples(&bytes, SYNTHESIS_SAMPLE_RATE, SYNTHESIS_CHANNELS)?;

        // A newer toggle may have taken the slot while the request was in
        // flight; its audio must not start.
        if self.slot.lock().epoch != epoch {
            debug!("Playback superseded during synthesis");
            return Ok(());
        }

        self.device.resume()?;

        let slot = Arc::clone(&self.slot);
        let on_complete: CompletionCallback = Box::new(move || {
            let mut slot = slot.lock();
            if slot.epoch == epoch {
                slot.target = None;
                slot.handle = None;
            }
        });

        let handle = self.device.start(audio, on_complete)?;

        let mut slot = self.slot.lock();
        if slot.epoch == epoch && slot.target.is_some() {
            slot.handle = Some(handle);
        } else {
            // Superseded between the epoch check and start, or completed
            // synchronously; either way this resource must not stay live.
            let mut handle = handle;
            handle.stop();
        }
        Ok(())
    }

    fn clear_if_current(&self, epoch: u64) {
        let mut slot = self.slot.lock();
        if slot.epoch == epoch {
            slot.stop_current();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ChatTurnResponse, HistoryEntry};
    use crate::{ConfideError, Result};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted synthesis double: yields the same payload for every request
    struct FakeSynthClient {
        payload: Option<String>,
        fail: bool,
    }

    impl FakeSynthClient {
        fn with_pcm(samples: &[i16]) -> Self {
            let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
            Self {
                payload: Some(STANDARD.encode(bytes)),
                fail: false,
            }
        }

        fn silent() -> Self {
            Self {
                payload: None,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                payload: None,
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ResponseServiceClient for FakeSynthClient {
        async fn request_chat_turn(
            &self,
            _history: &[HistoryEntry],
            _new_text: &str,
        ) -> Result<ChatTurnResponse> {
            unimplemented!("playback tests never issue chat turns")
        }

        async fn request_speech_synthesis(&self, _text: &str) -> Result<Option<String>> {
            if self.fail {
                return Err(ConfideError::ServiceUnavailable("synthesis down".into()));
            }
            Ok(self.payload.clone())
        }

        async fn request_summary(&self, _history: &[HistoryEntry]) -> Result<String> {
            unimplemented!("playback tests never issue summaries")
        }
    }

    #[derive(Default)]
    struct FakeDevice {
        started: AtomicUsize,
        stopped: Arc<AtomicUsize>,
        completions: Mutex<Vec<CompletionCallback>>,
    }

    impl FakeDevice {
        /// Fire the oldest pending completion, as the device would on drain
        fn complete_oldest(&self) {
            let cb = self.completions.lock().remove(0);
            cb();
        }
    }

    struct FakeHandle {
        stopped: Arc<AtomicUsize>,
    }

    impl PlaybackHandle for FakeHandle {
        fn stop(&mut self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl PlaybackDevice for FakeDevice {
        fn resume(&self) -> Result<()> {
            Ok(())
        }

        fn start(
            &self,
            _audio: DecodedAudio,
            on_complete: CompletionCallback,
        ) -> Result<Box<dyn PlaybackHandle>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.completions.lock().push(on_complete);
            Ok(Box::new(FakeHandle {
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    fn controller(
        client: FakeSynthClient,
    ) -> (AudioPlaybackController<FakeSynthClient, FakeDevice>, Arc<FakeDevice>) {
        let device = Arc::new(FakeDevice::default());
        (
            AudioPlaybackController::new(Arc::new(client), Arc::clone(&device)),
            device,
        )
    }

    #[tokio::test]
    async fn test_toggle_starts_playback() {
        let (controller, device) = controller(FakeSynthClient::with_pcm(&[0, 100, -100]));
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;

        assert_eq!(controller.active_target(), Some(id));
        assert_eq!(device.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_double_toggle_same_id_ends_idle() {
        let (controller, device) = controller(FakeSynthClient::with_pcm(&[1, 2, 3]));
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;
        controller.toggle("hello", id).await;

        assert_eq!(controller.active_target(), None, "second toggle must cancel");
        assert_eq!(device.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_double_toggle_same_id_after_failed_synthesis() {
        let (controller, _device) = controller(FakeSynthClient::failing());
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;
        assert_eq!(controller.active_target(), None);

        controller.toggle("hello", id).await;
        assert_eq!(controller.active_target(), None);
    }

    #[tokio::test]
    async fn test_toggle_other_id_supersedes() {
        let (controller, device) = controller(FakeSynthClient::with_pcm(&[1, 2]));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        controller.toggle("first", a).await;
        controller.toggle("second", b).await;

        assert_eq!(controller.active_target(), Some(b));
        assert_eq!(device.started.load(Ordering::SeqCst), 2);
        assert_eq!(
            device.stopped.load(Ordering::SeqCst),
            1,
            "A's handle must be released before B starts"
        );
    }

    #[tokio::test]
    async fn test_no_payload_clears_state_silently() {
        let (controller, device) = controller(FakeSynthClient::silent());
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;

        assert_eq!(controller.active_target(), None);
        assert_eq!(device.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_clears_state() {
        let client = FakeSynthClient {
            payload: Some("???not-base64???".to_string()),
            fail: false,
        };
        let (controller, device) = controller(client);
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;

        assert_eq!(controller.active_target(), None);
        assert_eq!(device.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_odd_pcm_length_clears_state() {
        let client = FakeSynthClient {
            payload: Some(STANDARD.encode([0u8, 1, 2])),
            fail: false,
        };
        let (controller, _device) = controller(client);
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;

        assert_eq!(controller.active_target(), None);
    }

    #[tokio::test]
    async fn test_natural_completion_clears_state() {
        let (controller, device) = controller(FakeSynthClient::with_pcm(&[5, 6]));
        let id = Uuid::new_v4();

        controller.toggle("hello", id).await;
        device.complete_oldest();

        assert_eq!(controller.active_target(), None);
    }

    /// Synthesis double that blocks until the test releases it
    struct GatedSynthClient {
        payload: String,
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl ResponseServiceClient for GatedSynthClient {
        async fn request_chat_turn(
            &self,
            _history: &[HistoryEntry],
            _new_text: &str,
        ) -> Result<ChatTurnResponse> {
            unimplemented!("playback tests never issue chat turns")
        }

        async fn request_speech_synthesis(&self, _text: &str) -> Result<Option<String>> {
            self.gate.notified().await;
            Ok(Some(self.payload.clone()))
        }

        async fn request_summary(&self, _history: &[HistoryEntry]) -> Result<String> {
            unimplemented!("playback tests never issue summaries")
        }
    }

    #[tokio::test]
    async fn test_cancel_during_pending_fetch_discards_audio() {
        let client = Arc::new(GatedSynthClient {
            payload: STANDARD.encode(0i16.to_le_bytes()),
            gate: tokio::sync::Notify::new(),
        });
        let device = Arc::new(FakeDevice::default());
        let controller = Arc::new(AudioPlaybackController::new(
            Arc::clone(&client),
            Arc::clone(&device),
        ));
        let id = Uuid::new_v4();

        let pending = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.toggle("hello", id).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(controller.active_target(), Some(id), "optimistic target set");

        // Cancel while the synthesis request is still in flight
        controller.toggle("hello", id).await;
        assert_eq!(controller.active_target(), None);

        client.gate.notify_one();
        pending.await.unwrap();

        assert_eq!(controller.active_target(), None);
        assert_eq!(
            device.started.load(Ordering::SeqCst),
            0,
            "superseded fetch must not start playback"
        );
    }

    #[tokio::test]
    async fn test_stale_completion_does_not_clobber_new_target() {
        let (controller, device) = controller(FakeSynthClient::with_pcm(&[5, 6]));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        controller.toggle("first", a).await;
        controller.toggle("second", b).await;

        // A's completion fires late; B must stay the target.
        device.complete_oldest();
        assert_eq!(controller.active_target(), Some(b));

        // B's own completion still clears.
        device.complete_oldest();
        assert_eq!(controller.active_target(), None);
    }
}
