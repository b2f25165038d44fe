//! Audio sink adapter: the platform audio output path.
//!
//! The sink owns the audio engine and player objects and drives the render
//! pump from its playback thread. The production implementation sits on
//! rodio; the `AudioSink` trait is the seam that lets tests substitute a
//! fake sink and drive the fill callback by hand.

use crate::audio::pump::RenderPump;
use crate::error::DriverError;
use crate::synth::SynthConfig;
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::time::Duration;

/// Sample format handed to the player: 16-bit signed little-endian PCM,
/// channel count and sample rate from the library configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl PcmFormat {
    /// Derives the player format from the library configuration snapshot.
    pub fn from_config(config: &SynthConfig) -> Self {
        Self {
            channels: config.num_channels as u16,
            sample_rate: config.sample_rate,
        }
    }
}

/// The audio output path: engine creation, player creation with a
/// registered fill callback, and teardown.
///
/// Handles are created in dependency order (engine before player) and
/// destroyed in reverse; `teardown` tolerates any subset already gone.
pub trait AudioSink {
    /// Creates and realizes the audio engine and its default output mix.
    ///
    /// Failure in any sub-step aborts the whole call with no further
    /// sub-steps attempted.
    fn create_engine(&mut self) -> Result<(), DriverError>;

    /// Builds the buffer-queue player, registers the pump as its fill
    /// callback, and starts playback. The playback thread begins pulling
    /// the instant this returns success.
    fn create_player(&mut self, format: PcmFormat, pump: RenderPump) -> Result<(), DriverError>;

    /// Destroys player, output mix, and engine in that order if present,
    /// nulling every handle. Destroying the player is what halts further
    /// fill-callback invocations.
    fn teardown(&mut self);
}

/// Production sink on rodio. The `OutputStream` bundles the engine and
/// output mix; `play_raw` is the player creation plus callback
/// registration, after which rodio's device thread pulls samples.
pub struct RodioSink {
    stream: Option<OutputStream>,
    handle: Option<OutputStreamHandle>,
}

impl RodioSink {
    pub fn new() -> Self {
        Self {
            stream: None,
            handle: None,
        }
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for RodioSink {
    fn create_engine(&mut self) -> Result<(), DriverError> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            DriverError::ResourceCreation(format!("failed to open audio output: {e}"))
        })?;
        self.stream = Some(stream);
        self.handle = Some(handle);
        Ok(())
    }

    fn create_player(&mut self, format: PcmFormat, pump: RenderPump) -> Result<(), DriverError> {
        let handle = self.handle.as_ref().ok_or_else(|| {
            DriverError::ResourceCreation("player requested before engine exists".into())
        })?;
        handle
            .play_raw(PumpSource::new(format, pump))
            .map_err(|e| DriverError::ResourceCreation(format!("failed to start player: {e}")))
    }

    fn teardown(&mut self) {
        // Dropping the stream stops the device thread and with it all
        // further pump invocations.
        self.handle = None;
        self.stream = None;
    }
}

/// Adapts the render pump to rodio's pull model.
///
/// Rodio drains one staging buffer, then the next `next()` call after
/// exhaustion is the fill callback: the pump refills the same buffer in
/// place. One fill is done at construction to seed the pipeline before
/// the device starts pulling.
struct PumpSource {
    pump: RenderPump,
    format: PcmFormat,
    /// Read cursor into the pump's staging buffer.
    pos: usize,
}

impl PumpSource {
    fn new(format: PcmFormat, mut pump: RenderPump) -> Self {
        pump.fill();
        Self {
            pump,
            format,
            pos: 0,
        }
    }
}

impl Iterator for PumpSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos >= self.pump.staging_len() {
            self.pump.fill();
            self.pos = 0;
        }
        let sample = self.pump.staging()[self.pos];
        self.pos += 1;
        Some(sample as f32 / 32768.0)
    }
}

impl Source for PumpSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        self.format.channels
    }

    fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}
