//! The synthesis session: an owned wrapper around the external
//! SoundFont synthesizer.
//!
//! A session is created by the lifecycle controller during init and holds
//! the synthesizer plus the one MIDI input stream opened on it. It is the
//! only shared mutable resource in the driver: the render pump (device
//! thread) and the caller (write/volume) both reach it through a mutex,
//! each holding the lock for a single library call at a time.

use crate::error::DriverError;
use crate::synth::events::to_channel_message;
use midly::stream::MidiStream;
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::sync::Arc;

/// The SoundFont format generation this driver is built against.
pub const SUPPORTED_SOUNDFONT_VERSION: i32 = 2;

/// Master volume scale ceiling (EAS-style 0-100 percent scale).
pub const MAX_VOLUME: i32 = 100;

/// Configuration snapshot reported by the synthesis library at open time.
///
/// Used to size the PCM staging buffer and to describe the sample format
/// to the audio sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthConfig {
    /// Maximum simultaneous voices the synthesizer will allocate.
    pub max_voices: u32,
    /// Output channel count (the synthesizer renders stereo).
    pub num_channels: u32,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames produced per render call (one mix period).
    pub mix_buffer_size: u32,
}

/// A live synthesis session with at most one open MIDI input stream.
pub struct SynthSession {
    synth: Synthesizer,
    /// Byte-stream decoder for the open MIDI input stream, `None` until
    /// `open_stream` and after `close`.
    stream: Option<MidiStream>,
    config: SynthConfig,
    /// Master gain applied when converting rendered samples to PCM.
    gain: f32,
    /// Per-channel render scratch, one mix period long.
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SynthSession {
    /// Opens a synthesis session against the given SoundFont.
    ///
    /// Verifies the SoundFont's declared format generation, constructs the
    /// synthesizer with reverb enabled, and snapshots the library
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns `VersionMismatch` if the SoundFont is not a format-2 bank,
    /// or `ResourceCreation` if the synthesizer rejects it.
    pub fn open(soundfont: &Arc<SoundFont>, sample_rate: u32) -> Result<Self, DriverError> {
        let version = soundfont.get_info().get_version();
        if version.get_major() != SUPPORTED_SOUNDFONT_VERSION {
            return Err(DriverError::VersionMismatch {
                expected: SUPPORTED_SOUNDFONT_VERSION,
                found: version.get_major(),
            });
        }

        let mut settings = SynthesizerSettings::new(sample_rate as i32);
        settings.enable_reverb_and_chorus = true;

        let synth = Synthesizer::new(soundfont, &settings).map_err(|e| {
            DriverError::ResourceCreation(format!("failed to create synthesizer: {:?}", e))
        })?;

        let config = SynthConfig {
            max_voices: settings.maximum_polyphony as u32,
            num_channels: 2,
            sample_rate: settings.sample_rate as u32,
            mix_buffer_size: settings.block_size as u32,
        };

        let mix = config.mix_buffer_size as usize;
        Ok(Self {
            synth,
            stream: None,
            config,
            gain: 1.0,
            left: vec![0.0; mix],
            right: vec![0.0; mix],
        })
    }

    /// Opens the MIDI input stream on this session.
    ///
    /// Exactly one stream may be open at a time.
    pub fn open_stream(&mut self) -> Result<(), DriverError> {
        if self.stream.is_some() {
            return Err(DriverError::Protocol("MIDI stream already open".into()));
        }
        self.stream = Some(MidiStream::new());
        Ok(())
    }

    /// Whether the MIDI input stream is currently open.
    pub fn is_stream_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the configuration snapshot taken at open time.
    pub fn config(&self) -> SynthConfig {
        self.config
    }

    /// Appends raw MIDI-protocol bytes to the input stream.
    ///
    /// The bytes are decoded (running status included) and every channel
    /// voice message is applied to the synthesizer. System common and
    /// real-time events are dropped.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if no stream is open.
    pub fn write_events(&mut self, bytes: &[u8]) -> Result<(), DriverError> {
        let stream = self.stream.as_mut().ok_or(DriverError::NotInitialized)?;
        let synth = &mut self.synth;
        stream.feed(bytes, |event| {
            if let Some(msg) = to_channel_message(event) {
                synth.process_midi_message(
                    msg.channel as i32,
                    msg.command as i32,
                    msg.data1 as i32,
                    msg.data2 as i32,
                );
            }
        });
        Ok(())
    }

    /// Renders up to one mix period of interleaved 16-bit PCM into `out`.
    ///
    /// A single call may produce fewer frames than the caller wants; the
    /// render pump invokes this repeatedly until its staging buffer is
    /// full. Returns the number of frames produced.
    pub fn render(&mut self, out: &mut [i16]) -> usize {
        let channels = self.config.num_channels as usize;
        let frames = (self.config.mix_buffer_size as usize).min(out.len() / channels);
        if frames == 0 {
            return 0;
        }

        self.synth
            .render(&mut self.left[..frames], &mut self.right[..frames]);

        for i in 0..frames {
            out[i * channels] = pcm16(self.left[i] * self.gain);
            out[i * channels + 1] = pcm16(self.right[i] * self.gain);
        }
        frames
    }

    /// Sets the master output level on the EAS-style 0-100 scale.
    ///
    /// Out-of-range input clamps to the nearest bound.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if no stream is open.
    pub fn set_volume(&mut self, level: i32) -> Result<(), DriverError> {
        if self.stream.is_none() {
            return Err(DriverError::NotInitialized);
        }
        let level = level.clamp(0, MAX_VOLUME);
        self.gain = level as f32 / MAX_VOLUME as f32;
        Ok(())
    }

    /// Closes the MIDI input stream. Safe to call multiple times; the
    /// session itself is released when dropped.
    pub fn close(&mut self) {
        self.stream = None;
    }
}

/// Converts one float sample to 16-bit signed PCM with saturation.
fn pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
