//! The driver: lifecycle sequencing and the host-facing call surface.
//!
//! `MidiDriver` owns both subsystems and walks them through a strict
//! startup order: synthesis session, staging buffer, audio engine, player
//! with the fill callback registered. Any step failure tears down
//! everything allocated so far, so no partially initialized state is ever
//! reachable. Teardown runs in reverse and tolerates any subset already
//! gone, which makes `shutdown` idempotent and `init` re-entrant after it.

use crate::audio::{AudioSink, PcmFormat, RenderPump, RodioSink};
use crate::error::DriverError;
use crate::synth::{SynthConfig, SynthSession};
use crate::SAMPLE_RATE;
use rustysynth::SoundFont;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Startup/shutdown progress of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Nothing allocated.
    Uninitialized,
    /// Synthesis session open, MIDI stream attached.
    SynthReady,
    /// PCM staging buffer allocated.
    BufferAllocated,
    /// Audio engine and output mix created.
    SinkReady,
    /// Player created, fill callback registered, device pulling.
    PlayerReady,
    /// Fully up.
    Running,
    /// An init step failed; everything allocated so far was released.
    Failed,
}

/// A software MIDI synthesizer driver.
///
/// Renders a SoundFont synthesizer into an audio output queue in real
/// time and forwards raw MIDI bytes from the caller into the synthesizer.
/// The synthesis session is the one resource shared between the caller's
/// thread and the sink's playback thread; a single mutex serializes
/// access, held for one library call at a time.
///
/// Init and shutdown must not be invoked concurrently with themselves or
/// each other; `write` and `set_volume` are safe against the running
/// playback thread.
pub struct MidiDriver {
    soundfont: Arc<SoundFont>,
    sample_rate: u32,
    sink: Box<dyn AudioSink>,
    session: Option<Arc<Mutex<SynthSession>>>,
    config: Option<SynthConfig>,
    state: DriverState,
}

impl MidiDriver {
    /// Creates a driver for the given SoundFont file, playing to the
    /// default audio output device.
    ///
    /// The SoundFont is loaded here; the synthesizer and audio path are
    /// not touched until `init`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceCreation` if the file cannot be read or is not a
    /// parseable SoundFont.
    pub fn new<P: AsRef<Path>>(soundfont_path: P) -> Result<Self, DriverError> {
        let mut file = BufReader::new(File::open(soundfont_path.as_ref()).map_err(|e| {
            DriverError::ResourceCreation(format!(
                "failed to open SoundFont {}: {e}",
                soundfont_path.as_ref().display()
            ))
        })?);
        let soundfont = Arc::new(SoundFont::new(&mut file).map_err(|e| {
            DriverError::ResourceCreation(format!("failed to load SoundFont: {:?}", e))
        })?);
        Ok(Self::with_soundfont(soundfont))
    }

    /// Creates a driver for an already-loaded SoundFont, playing to the
    /// default audio output device.
    pub fn with_soundfont(soundfont: Arc<SoundFont>) -> Self {
        Self::with_sink(soundfont, Box::new(RodioSink::new()))
    }

    /// Creates a driver with a caller-supplied audio sink.
    pub fn with_sink(soundfont: Arc<SoundFont>, sink: Box<dyn AudioSink>) -> Self {
        Self {
            soundfont,
            sample_rate: SAMPLE_RATE,
            sink,
            session: None,
            config: None,
            state: DriverState::Uninitialized,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Brings the driver up: synthesis session, staging buffer, audio
    /// engine, then the player whose fill callback starts the pump.
    ///
    /// On any step failure the error is logged, everything allocated so
    /// far is released, and the driver lands in `Failed`; a later `init`
    /// may be attempted again. Calling `init` while already running is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error unchanged.
    pub fn init(&mut self) -> Result<(), DriverError> {
        if self.state == DriverState::Running {
            return Err(DriverError::Protocol(
                "init called while driver is running".into(),
            ));
        }

        match self.bring_up() {
            Ok(()) => {
                self.state = DriverState::Running;
                if let Some(config) = self.config {
                    tracing::debug!(
                        max_voices = config.max_voices,
                        num_channels = config.num_channels,
                        sample_rate = config.sample_rate,
                        mix_buffer_size = config.mix_buffer_size,
                        "synthesizer configuration"
                    );
                }
                tracing::info!("driver running");
                Ok(())
            }
            Err(e) => {
                tracing::error!("init failed: {e}");
                self.release_all();
                self.state = DriverState::Failed;
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> Result<(), DriverError> {
        let mut session = SynthSession::open(&self.soundfont, self.sample_rate)?;
        session.open_stream()?;
        let config = session.config();
        let session = Arc::new(Mutex::new(session));
        self.session = Some(Arc::clone(&session));
        self.config = Some(config);
        self.state = DriverState::SynthReady;

        let pump = RenderPump::new(session, config)?;
        self.state = DriverState::BufferAllocated;

        self.sink.create_engine()?;
        self.state = DriverState::SinkReady;

        // The pump moves into the sink here; the device thread owns it
        // (and with it the staging buffer) from now on.
        self.sink
            .create_player(PcmFormat::from_config(&config), pump)?;
        self.state = DriverState::PlayerReady;

        Ok(())
    }

    /// Returns the library configuration snapshot taken at init.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before a successful `init` or after
    /// `shutdown`.
    pub fn config(&self) -> Result<SynthConfig, DriverError> {
        self.config.ok_or(DriverError::NotInitialized)
    }

    /// Forwards raw MIDI-protocol bytes to the open stream.
    ///
    /// Safe to call while the playback thread is rendering; both sides
    /// take the session lock.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if no live session and stream exist.
    pub fn write(&self, bytes: &[u8]) -> Result<(), DriverError> {
        let session = self.session.as_ref().ok_or(DriverError::NotInitialized)?;
        let mut session = session
            .lock()
            .map_err(|_| DriverError::Protocol("synthesizer lock poisoned".into()))?;
        session.write_events(bytes)
    }

    /// Sets the master output level (0-100 scale; out-of-range clamps).
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if no live session and stream exist.
    pub fn set_volume(&self, level: i32) -> Result<(), DriverError> {
        let session = self.session.as_ref().ok_or(DriverError::NotInitialized)?;
        let mut session = session
            .lock()
            .map_err(|_| DriverError::Protocol("synthesizer lock poisoned".into()))?;
        session.set_volume(level)
    }

    /// Tears everything down: sink (which halts the pump and frees the
    /// staging buffer), then the synthesis session.
    ///
    /// Best-effort and idempotent: any subset already gone is skipped,
    /// and calling this without a successful `init` is fine.
    pub fn shutdown(&mut self) {
        self.release_all();
        self.state = DriverState::Uninitialized;
        tracing::debug!("driver shut down");
    }

    /// Reverse-order release of whatever is currently allocated. Used by
    /// both `shutdown` and the failed-init rollback path.
    fn release_all(&mut self) {
        self.sink.teardown();
        if let Some(session) = self.session.take() {
            if let Ok(mut session) = session.lock() {
                session.close();
            }
        }
        self.config = None;
    }
}

impl Drop for MidiDriver {
    fn drop(&mut self) {
        self.release_all();
    }
}
