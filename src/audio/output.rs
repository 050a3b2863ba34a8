//! cpal-backed playback device
//!
//! Each started resource gets its own thread that owns the cpal stream
//! (streams are not `Send`) and watches for drain or stop. Mono sample planes
//! are duplicated across the device's output channels.

use crate::audio::codec::DecodedAudio;
use crate::audio::playback::{CompletionCallback, PlaybackDevice, PlaybackHandle};
use crate::{ConfideError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// Playback device backed by the default cpal output device
pub struct CpalPlaybackDevice;

impl CpalPlaybackDevice {
    /// Create the device, verifying an output device is present
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ConfideError::AudioDeviceError("No output device available".into()))?;
        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        Ok(Self)
    }
}

impl PlaybackDevice for CpalPlaybackDevice {
    fn resume(&self) -> Result<()> {
        // cpal streams start on build; resuming means re-checking the device
        // is still reachable before we commit to a playback thread.
        cpal::default_host()
            .default_output_device()
            .map(|_| ())
            .ok_or_else(|| ConfideError::AudioDeviceError("Output device went away".into()))
    }

    fn start(
        &self,
        audio: DecodedAudio,
        on_complete: CompletionCallback,
    ) -> Result<Box<dyn PlaybackHandle>> {
        if audio.is_empty() {
            return Err(ConfideError::FormatError("no samples to play".into()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let handle = CpalPlaybackHandle {
            stop: Arc::clone(&stop),
        };

        thread::spawn(move || run_playback(audio, stop, on_complete));

        Ok(Box::new(handle))
    }
}

struct CpalPlaybackHandle {
    stop: Arc<AtomicBool>,
}

impl PlaybackHandle for CpalPlaybackHandle {
    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for CpalPlaybackHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Owns the stream for one playback resource until drain or stop
fn run_playback(audio: DecodedAudio, stop: Arc<AtomicBool>, on_complete: CompletionCallback) {
    let Some(device) = cpal::default_host().default_output_device() else {
        error!("Output device disappeared before playback");
        on_complete();
        return;
    };

    let channels = match device.default_output_config() {
        Ok(config) => config.channels() as usize,
        Err(e) => {
            error!("Failed to get output config: {e}");
            on_complete();
            return;
        }
    };

    let config = StreamConfig {
        channels: channels as u16,
        sample_rate: SampleRate(audio.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    // Synthesized audio is mono; play the first plane on every channel.
    let samples = audio.planes.into_iter().next().unwrap_or_default();
    let total = samples.len();
    let finished = Arc::new(AtomicBool::new(false));

    let stream = {
        let finished = Arc::clone(&finished);
        let mut cursor = 0usize;
        device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = if cursor < total {
                        let s = samples[cursor];
                        cursor += 1;
                        s
                    } else {
                        finished.store(true, Ordering::SeqCst);
                        0.0
                    };
                    frame.fill(sample);
                }
            },
            |err| error!("Audio output stream error: {err}"),
            None,
        )
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to build output stream: {e}");
            on_complete();
            return;
        }
    };

    if let Err(e) = stream.play() {
        error!("Failed to start output stream: {e}");
        drop(stream);
        on_complete();
        return;
    }

    while !stop.load(Ordering::SeqCst) && !finished.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(20));
    }

    drop(stream);

    if stop.load(Ordering::SeqCst) {
        debug!("Playback stopped before completion");
    } else {
        debug!("Playback drained");
        on_complete();
    }
}
