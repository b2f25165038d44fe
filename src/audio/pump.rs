//! The render pump: the audio sink's buffer fill callback.
//!
//! Owns the single PCM staging buffer and refills it on demand from the
//! synthesis session. The sink's playback thread invokes `fill` whenever
//! the queue needs another buffer; the same buffer is overwritten in place
//! on every invocation, so the queue must fully consume one fill before
//! the next fires (the sink's own sequencing guarantees this).

use crate::error::DriverError;
use crate::synth::{SynthConfig, SynthSession};
use std::sync::{Arc, Mutex};

/// How many mix periods of audio one staging buffer holds.
pub const NUM_BUFFERS: usize = 4;

/// Fills the staging buffer from the synthesis session.
///
/// The fill loop is the only real-time path in the driver: a partial or
/// overflowing fill means the contract with the synthesis library is
/// broken, and the pump treats that as fatal rather than producing an
/// audible glitch with no cause attached.
pub struct RenderPump {
    session: Arc<Mutex<SynthSession>>,
    /// Interleaved 16-bit PCM, `mix_buffer_size * num_channels * NUM_BUFFERS`
    /// samples. Touched only by the playback thread.
    buffer: Vec<i16>,
    channels: usize,
}

impl RenderPump {
    /// Allocates the staging buffer sized from the library configuration.
    pub fn new(
        session: Arc<Mutex<SynthSession>>,
        config: SynthConfig,
    ) -> Result<Self, DriverError> {
        let channels = config.num_channels as usize;
        let samples = config.mix_buffer_size as usize * channels * NUM_BUFFERS;
        if samples == 0 {
            return Err(DriverError::Allocation(format!(
                "degenerate library configuration: {} frames x {} channels",
                config.mix_buffer_size, config.num_channels
            )));
        }
        Ok(Self {
            session,
            buffer: vec![0; samples],
            channels,
        })
    }

    /// Renders until the staging buffer is exactly full.
    ///
    /// The synthesizer produces at most one mix period per call, so this
    /// loops `NUM_BUFFERS` times by construction. The lock is held for one
    /// render call at a time so MIDI writes can interleave between
    /// periods.
    pub fn fill(&mut self) {
        let mut filled = 0;
        while filled < self.buffer.len() {
            let frames = {
                let mut session = self.session.lock().expect("synthesizer lock poisoned");
                session.render(&mut self.buffer[filled..])
            };
            assert!(frames > 0, "synthesizer produced no frames");
            filled += frames * self.channels;
        }
        assert_eq!(
            filled,
            self.buffer.len(),
            "staging buffer fill did not land exactly on the buffer length"
        );
    }

    /// The staging buffer as last filled.
    pub fn staging(&self) -> &[i16] {
        &self.buffer
    }

    /// Staging buffer length in samples.
    pub fn staging_len(&self) -> usize {
        self.buffer.len()
    }
}
