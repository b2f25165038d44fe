//! Synthesis engine adapter.
//!
//! Wraps the external SoundFont synthesizer behind the narrow contract the
//! driver needs: open a session, open one MIDI input stream, feed it raw
//! MIDI bytes, render PCM one mix period at a time, and set the master
//! volume.

pub mod events;
pub mod session;

pub use events::{to_channel_message, ChannelMessage};
pub use session::{SynthConfig, SynthSession, MAX_VOLUME, SUPPORTED_SOUNDFONT_VERSION};
