pub mod codec;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod playback;

pub use codec::{decode_transport_payload, pcm16_to_samples, DecodedAudio};
#[cfg(feature = "audio-io")]
pub use output::CpalPlaybackDevice;
pub use playback::{AudioPlaybackController, CompletionCallback, PlaybackDevice, PlaybackHandle};
