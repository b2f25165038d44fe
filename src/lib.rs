//! mididriver - a software MIDI synthesizer driver.
//!
//! Bridges a SoundFont synthesizer (rustysynth) to an audio output queue
//! (rodio): the driver initializes both subsystems, pumps synthesized PCM
//! into a staging buffer from the device's playback thread, and forwards
//! raw MIDI bytes from the caller into the synthesizer under a shared
//! lock.
//!
//! ```no_run
//! use mididriver::MidiDriver;
//!
//! # fn main() -> Result<(), mididriver::DriverError> {
//! let mut driver = MidiDriver::new("bank.sf2")?;
//! driver.init()?;
//! driver.write(&[0x90, 0x3C, 0x64])?; // Note On, middle C
//! driver.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod driver;
pub mod error;
pub mod synth;

#[cfg(test)]
mod testutil;

// Re-export the host-facing surface
pub use audio::{AudioSink, PcmFormat};
pub use driver::{DriverState, MidiDriver};
pub use error::DriverError;
pub use synth::SynthConfig;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;
